//! Block faces and axis-aligned neighbor enumeration

use serde::{Deserialize, Serialize};

use crate::core::types::BlockPos;

/// One of the six axis-aligned faces of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockFace {
    Up,
    Down,
    /// -z
    North,
    /// +x
    East,
    /// +z
    South,
    /// -x
    West,
}

impl BlockFace {
    /// Iteration order used everywhere neighbors are enumerated
    pub const ALL: [BlockFace; 6] = [
        BlockFace::Up,
        BlockFace::Down,
        BlockFace::North,
        BlockFace::East,
        BlockFace::South,
        BlockFace::West,
    ];

    pub fn offset(&self) -> (i32, i32, i32) {
        match self {
            BlockFace::Up => (0, 1, 0),
            BlockFace::Down => (0, -1, 0),
            BlockFace::North => (0, 0, -1),
            BlockFace::East => (1, 0, 0),
            BlockFace::South => (0, 0, 1),
            BlockFace::West => (-1, 0, 0),
        }
    }
}

impl BlockPos {
    /// The block touching this one on `face`
    pub fn relative(&self, face: BlockFace) -> BlockPos {
        *self + face.offset()
    }

    /// Horizontal Chebyshev distance, ignoring y
    pub fn horizontal_reach(&self, other: &BlockPos) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dz = i64::from(self.z) - i64::from(other.z);
        dx.abs().max(dz.abs())
    }
}

/// The 6 face-adjacent positions of `pos`: up, down, north, east, south, west
pub fn neighbors(pos: BlockPos) -> [BlockPos; 6] {
    BlockFace::ALL.map(|face| pos.relative(face))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_neighbor_order() {
        let origin = BlockPos::new(0, 64, 0);
        assert_eq!(
            neighbors(origin),
            [
                BlockPos::new(0, 65, 0),
                BlockPos::new(0, 63, 0),
                BlockPos::new(0, 64, -1),
                BlockPos::new(1, 64, 0),
                BlockPos::new(0, 64, 1),
                BlockPos::new(-1, 64, 0),
            ]
        );
    }

    #[test]
    fn test_horizontal_reach_ignores_height() {
        let feet = BlockPos::new(0, 64, 0);
        assert_eq!(feet.horizontal_reach(&BlockPos::new(2, 10, -1)), 2);
        assert_eq!(feet.horizontal_reach(&BlockPos::new(-1, 90, 3)), 3);
        assert_eq!(feet.horizontal_reach(&BlockPos::new(0, 0, 0)), 0);
        assert_eq!(
            BlockPos::new(i32::MIN, 0, 0).horizontal_reach(&BlockPos::new(i32::MAX, 0, 0)),
            u32::MAX as i64
        );
    }

    proptest! {
        #[test]
        fn neighbors_are_six_distinct_unit_steps(
            x in -30_000_000_i32..30_000_000,
            y in -64_i32..320,
            z in -30_000_000_i32..30_000_000,
        ) {
            let pos = BlockPos::new(x, y, z);
            let adjacent = neighbors(pos);

            for (i, n) in adjacent.iter().enumerate() {
                let diffs = [(n.x - pos.x).abs(), (n.y - pos.y).abs(), (n.z - pos.z).abs()];
                prop_assert_eq!(diffs.iter().sum::<i32>(), 1);
                prop_assert_eq!(diffs.iter().filter(|d| **d == 1).count(), 1);
                for other in &adjacent[i + 1..] {
                    prop_assert_ne!(n, other);
                }
            }
        }
    }
}

//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Host tick counter (simulation time unit)
pub type Tick = u64;

/// Name of a realm as the host knows it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorldId(pub String);

impl WorldId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for acting subjects (players)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(pub Uuid);

impl SubjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Integer block coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    /// Largest magnitude any coordinate of a real block can have
    pub const LIMIT: u32 = 30_000_000;

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Whether unit steps and differences from here stay within `i32`
    pub fn is_addressable(&self) -> bool {
        [self.x, self.y, self.z]
            .iter()
            .all(|c| c.unsigned_abs() <= Self::LIMIT)
    }

    pub fn chunk(&self) -> ChunkCoord {
        ChunkCoord::of(*self)
    }
}

impl std::ops::Add<(i32, i32, i32)> for BlockPos {
    type Output = Self;
    fn add(self, (dx, dy, dz): (i32, i32, i32)) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }
}

/// Column-of-blocks coordinate, 16x16 blocks wide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const WIDTH: i32 = 16;

    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing the given block (floor division, so negatives land correctly)
    pub fn of(pos: BlockPos) -> Self {
        Self {
            x: pos.x.div_euclid(Self::WIDTH),
            z: pos.z.div_euclid(Self::WIDTH),
        }
    }

    pub fn min_x(&self) -> i32 {
        self.x * Self::WIDTH
    }

    pub fn min_z(&self) -> i32 {
        self.z * Self::WIDTH
    }

    /// Every (x, z) column in this chunk
    pub fn columns(&self) -> impl Iterator<Item = (i32, i32)> {
        let (min_x, min_z) = (self.min_x(), self.min_z());
        (0..Self::WIDTH)
            .flat_map(move |dx| (0..Self::WIDTH).map(move |dz| (min_x + dx, min_z + dz)))
    }
}

/// Environment kind of a realm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Normal,
    Nether,
    End,
}

/// Subject game mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Survival,
    Creative,
    Adventure,
}

impl GameMode {
    /// Creative subjects are exempt from most restrictions
    pub fn is_consequence_free(&self) -> bool {
        matches!(self, GameMode::Creative)
    }
}

/// Biome at a position, as far as the rules care
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Biome {
    #[default]
    Plains,
    Forest,
    Taiga,
    Swamp,
    Jungle,
    Ocean,
    Desert,
    DesertHills,
    Hell,
    Sky,
}

impl Biome {
    pub fn is_desert(&self) -> bool {
        matches!(self, Biome::Desert | Biome::DesertHills)
    }
}

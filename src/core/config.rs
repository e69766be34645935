//! Rule configuration snapshot
//!
//! Every option the rules consult is named by a typed key enum, so an
//! unrecognized key cannot be spelled in code at all. Files that mention a
//! key outside these enums are rejected by the loader before the engine
//! starts.
//!
//! A `RuleConfig` is never mutated once handed to the engine. Reloading swaps
//! the whole snapshot behind a [`ConfigHandle`]; a dispatch holds the `Arc` it
//! started with until it finishes.

use ahash::AHashSet;
use std::sync::{Arc, RwLock};

/// Boolean feature toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolKey {
    /// Only end stone may be broken in End realms, and only as a staircase
    EndNoBuilding,
    /// Stone needs an iron or diamond pick, and wears it down faster
    SuperHardStone,
    /// Breaking ore softens adjacent stone into cobblestone
    SuperHardStonePhysics,
    BetterTreeChopping,
    MoreFallingBlocks,
    NoFarmingNetherWart,
    WeakFoodCrops,
    LimitedBlockPlacement,
    LimitedTorchPlacement,
    SoundsTorchFizz,
    DontMoveWaterSourceBlocks,
    AridDeserts,
    RainBreaksTorches,
}

impl BoolKey {
    pub const ALL: [BoolKey; 13] = [
        BoolKey::EndNoBuilding,
        BoolKey::SuperHardStone,
        BoolKey::SuperHardStonePhysics,
        BoolKey::BetterTreeChopping,
        BoolKey::MoreFallingBlocks,
        BoolKey::NoFarmingNetherWart,
        BoolKey::WeakFoodCrops,
        BoolKey::LimitedBlockPlacement,
        BoolKey::LimitedTorchPlacement,
        BoolKey::SoundsTorchFizz,
        BoolKey::DontMoveWaterSourceBlocks,
        BoolKey::AridDeserts,
        BoolKey::RainBreaksTorches,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BoolKey::EndNoBuilding => "end_no_building",
            BoolKey::SuperHardStone => "super_hard_stone",
            BoolKey::SuperHardStonePhysics => "super_hard_stone_physics",
            BoolKey::BetterTreeChopping => "better_tree_chopping",
            BoolKey::MoreFallingBlocks => "more_falling_blocks",
            BoolKey::NoFarmingNetherWart => "no_farming_nether_wart",
            BoolKey::WeakFoodCrops => "weak_food_crops",
            BoolKey::LimitedBlockPlacement => "limited_block_placement",
            BoolKey::LimitedTorchPlacement => "limited_torch_placement",
            BoolKey::SoundsTorchFizz => "sounds_torch_fizz",
            BoolKey::DontMoveWaterSourceBlocks => "dont_move_water_source_blocks",
            BoolKey::AridDeserts => "arid_deserts",
            BoolKey::RainBreaksTorches => "rain_breaks_torches",
        }
    }
}

/// Integer options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntKey {
    IronPickDurabilityPenalty,
    DiamondPickDurabilityPenalty,
    /// Light sources below this y are refused in Normal realms; <= 0 disables
    StandardTorchMinY,
}

impl IntKey {
    pub const ALL: [IntKey; 3] = [
        IntKey::IronPickDurabilityPenalty,
        IntKey::DiamondPickDurabilityPenalty,
        IntKey::StandardTorchMinY,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            IntKey::IronPickDurabilityPenalty => "iron_pick_durability_penalty",
            IntKey::DiamondPickDurabilityPenalty => "diamond_pick_durability_penalty",
            IntKey::StandardTorchMinY => "standard_torch_min_y",
        }
    }

    fn default_value(&self) -> i64 {
        match self {
            IntKey::IronPickDurabilityPenalty => 32,
            IntKey::DiamondPickDurabilityPenalty => 64,
            IntKey::StandardTorchMinY => 30,
        }
    }
}

/// Chance options, 0-100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PercentKey {
    BrokenNetherrackCatchesFire,
    WeakFoodCropsLossRate,
}

impl PercentKey {
    pub const ALL: [PercentKey; 2] = [
        PercentKey::BrokenNetherrackCatchesFire,
        PercentKey::WeakFoodCropsLossRate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PercentKey::BrokenNetherrackCatchesFire => "broken_netherrack_catches_fire_percent",
            PercentKey::WeakFoodCropsLossRate => "weak_food_crops_loss_rate",
        }
    }

    fn default_value(&self) -> u8 {
        match self {
            PercentKey::BrokenNetherrackCatchesFire => 20,
            PercentKey::WeakFoodCropsLossRate => 25,
        }
    }
}

/// String-set options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetKey {
    /// Realms the rules apply to
    Worlds,
}

impl SetKey {
    pub const ALL: [SetKey; 1] = [SetKey::Worlds];

    pub fn name(&self) -> &'static str {
        match self {
            SetKey::Worlds => "worlds",
        }
    }
}

/// Immutable set of option values consulted by the rules
#[derive(Debug, Clone, PartialEq)]
pub struct RuleConfig {
    bools: [bool; BoolKey::ALL.len()],
    ints: [i64; IntKey::ALL.len()],
    percents: [u8; PercentKey::ALL.len()],
    sets: [AHashSet<String>; SetKey::ALL.len()],
}

impl Default for RuleConfig {
    /// Every toggle on, stock penalties, no active worlds
    fn default() -> Self {
        Self {
            bools: [true; BoolKey::ALL.len()],
            ints: IntKey::ALL.map(|k| k.default_value()),
            percents: PercentKey::ALL.map(|k| k.default_value()),
            sets: std::array::from_fn(|_| AHashSet::new()),
        }
    }
}

impl RuleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_bool(&self, key: BoolKey) -> bool {
        self.bools[key as usize]
    }

    pub fn get_int(&self, key: IntKey) -> i64 {
        self.ints[key as usize]
    }

    pub fn get_percent(&self, key: PercentKey) -> u8 {
        self.percents[key as usize]
    }

    pub fn get_string_set(&self, key: SetKey) -> &AHashSet<String> {
        &self.sets[key as usize]
    }

    /// Whether rules are switched on for the named realm
    pub fn is_active_world(&self, world: &str) -> bool {
        self.get_string_set(SetKey::Worlds).contains(world)
    }

    pub fn with_bool(mut self, key: BoolKey, value: bool) -> Self {
        self.bools[key as usize] = value;
        self
    }

    pub fn with_int(mut self, key: IntKey, value: i64) -> Self {
        self.ints[key as usize] = value;
        self
    }

    /// Values above 100 are clamped
    pub fn with_percent(mut self, key: PercentKey, value: u8) -> Self {
        self.percents[key as usize] = value.min(100);
        self
    }

    pub fn with_string_set<I, S>(mut self, key: SetKey, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sets[key as usize] = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_worlds<I, S>(self, worlds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_string_set(SetKey::Worlds, worlds)
    }
}

/// Shared pointer to the current snapshot
///
/// Cloning the handle shares the same slot, so a reload through any clone is
/// seen by every holder on its next `snapshot()`.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    current: Arc<RwLock<Arc<RuleConfig>>>,
}

impl ConfigHandle {
    pub fn new(config: RuleConfig) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// The snapshot in force right now
    pub fn snapshot(&self) -> Arc<RuleConfig> {
        // A poisoned slot still holds a whole snapshot
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Swap in a new snapshot
    pub fn reload(&self, config: RuleConfig) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(config);
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(RuleConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuleConfig::default();
        assert!(config.get_bool(BoolKey::SuperHardStone));
        assert_eq!(config.get_int(IntKey::IronPickDurabilityPenalty), 32);
        assert_eq!(config.get_int(IntKey::DiamondPickDurabilityPenalty), 64);
        assert_eq!(config.get_percent(PercentKey::BrokenNetherrackCatchesFire), 20);
        assert!(config.get_string_set(SetKey::Worlds).is_empty());
    }

    #[test]
    fn test_builders_set_single_key() {
        let config = RuleConfig::default()
            .with_bool(BoolKey::AridDeserts, false)
            .with_int(IntKey::StandardTorchMinY, 12)
            .with_percent(PercentKey::WeakFoodCropsLossRate, 250)
            .with_worlds(["world", "world_nether"]);

        assert!(!config.get_bool(BoolKey::AridDeserts));
        assert!(config.get_bool(BoolKey::SuperHardStone));
        assert_eq!(config.get_int(IntKey::StandardTorchMinY), 12);
        assert_eq!(config.get_percent(PercentKey::WeakFoodCropsLossRate), 100);
        assert!(config.is_active_world("world_nether"));
        assert!(!config.is_active_world("world_the_end"));
    }

    #[test]
    fn test_key_names_are_unique() {
        let mut names: Vec<&str> = BoolKey::ALL.iter().map(|k| k.name()).collect();
        names.extend(IntKey::ALL.iter().map(|k| k.name()));
        names.extend(PercentKey::ALL.iter().map(|k| k.name()));
        names.extend(SetKey::ALL.iter().map(|k| k.name()));
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_snapshot_survives_reload() {
        let handle = ConfigHandle::new(RuleConfig::default().with_worlds(["world"]));
        let before = handle.snapshot();

        handle.reload(RuleConfig::default().with_bool(BoolKey::SuperHardStone, false));

        assert!(before.get_bool(BoolKey::SuperHardStone));
        assert!(before.is_active_world("world"));
        let after = handle.snapshot();
        assert!(!after.get_bool(BoolKey::SuperHardStone));
        assert!(!after.is_active_world("world"));
    }

    #[test]
    fn test_reload_through_clone_is_shared() {
        let handle = ConfigHandle::default();
        let other = handle.clone();
        other.reload(RuleConfig::default().with_int(IntKey::StandardTorchMinY, 0));
        assert_eq!(handle.snapshot().get_int(IntKey::StandardTorchMinY), 0);
    }
}

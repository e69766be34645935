//! Block and item materials
//!
//! Materials travel over the host boundary by their upper-snake-case name
//! (`IRON_ORE`, `STATIONARY_LAVA`, ...). Names the crate has no rule for are
//! kept verbatim in [`Material::Other`] so suffix checks such as "is this an
//! ore" still work for blocks added by the host.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Material {
    Air,
    Stone,
    Cobblestone,
    EndStone,
    Netherrack,
    Fire,
    Torch,
    JackOLantern,
    Dirt,
    Grass,
    LongGrass,
    DeadShrub,
    Sand,
    Log,
    Water,
    StationaryWater,
    Lava,
    StationaryLava,
    // Crops (block form)
    NetherWarts,
    Crops,
    Carrot,
    Potato,
    // Ores
    CoalOre,
    IronOre,
    GoldOre,
    DiamondOre,
    EmeraldOre,
    LapisOre,
    RedstoneOre,
    GlowingRedstoneOre,
    QuartzOre,
    // Items
    NetherStalk,
    WaterBucket,
    WoodPickaxe,
    StonePickaxe,
    IronPickaxe,
    GoldPickaxe,
    DiamondPickaxe,
    Other(String),
}

/// Pickaxe tiers that are allowed to cut hardened stone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpgradedPick {
    Iron,
    Diamond,
}

const NAMED: &[(&str, Material)] = &[
    ("AIR", Material::Air),
    ("STONE", Material::Stone),
    ("COBBLESTONE", Material::Cobblestone),
    ("ENDER_STONE", Material::EndStone),
    ("NETHERRACK", Material::Netherrack),
    ("FIRE", Material::Fire),
    ("TORCH", Material::Torch),
    ("JACK_O_LANTERN", Material::JackOLantern),
    ("DIRT", Material::Dirt),
    ("GRASS", Material::Grass),
    ("LONG_GRASS", Material::LongGrass),
    ("DEAD_SHRUB", Material::DeadShrub),
    ("SAND", Material::Sand),
    ("LOG", Material::Log),
    ("WATER", Material::Water),
    ("STATIONARY_WATER", Material::StationaryWater),
    ("LAVA", Material::Lava),
    ("STATIONARY_LAVA", Material::StationaryLava),
    ("NETHER_WARTS", Material::NetherWarts),
    ("CROPS", Material::Crops),
    ("CARROT", Material::Carrot),
    ("POTATO", Material::Potato),
    ("COAL_ORE", Material::CoalOre),
    ("IRON_ORE", Material::IronOre),
    ("GOLD_ORE", Material::GoldOre),
    ("DIAMOND_ORE", Material::DiamondOre),
    ("EMERALD_ORE", Material::EmeraldOre),
    ("LAPIS_ORE", Material::LapisOre),
    ("REDSTONE_ORE", Material::RedstoneOre),
    ("GLOWING_REDSTONE_ORE", Material::GlowingRedstoneOre),
    ("QUARTZ_ORE", Material::QuartzOre),
    ("NETHER_STALK", Material::NetherStalk),
    ("WATER_BUCKET", Material::WaterBucket),
    ("WOOD_PICKAXE", Material::WoodPickaxe),
    ("STONE_PICKAXE", Material::StonePickaxe),
    ("IRON_PICKAXE", Material::IronPickaxe),
    ("GOLD_PICKAXE", Material::GoldPickaxe),
    ("DIAMOND_PICKAXE", Material::DiamondPickaxe),
];

impl Material {
    /// Parse a host material name; unknown names become [`Material::Other`]
    pub fn from_name(name: &str) -> Self {
        let upper = name.trim().to_ascii_uppercase();
        NAMED
            .iter()
            .find(|(n, _)| *n == upper)
            .map(|(_, m)| m.clone())
            .unwrap_or(Material::Other(upper))
    }

    pub fn name(&self) -> &str {
        if let Material::Other(name) = self {
            return name;
        }
        NAMED
            .iter()
            .find(|(_, m)| m == self)
            .map(|(n, _)| *n)
            .unwrap_or("AIR")
    }

    /// Anything whose name ends in `ORE` or `ORES` (the latter covers modded ore blocks)
    pub fn is_ore(&self) -> bool {
        let name = self.name();
        name.ends_with("ORE") || name.ends_with("ORES")
    }

    /// Stricter check used for piston moves: only `*_ORE`
    pub fn is_suffixed_ore(&self) -> bool {
        self.name().ends_with("_ORE")
    }

    /// Rock that resists mining without an upgraded pick
    pub fn is_hardened_rock(&self) -> bool {
        matches!(self, Material::Stone | Material::EndStone)
    }

    pub fn is_lava(&self) -> bool {
        matches!(self, Material::Lava | Material::StationaryLava)
    }

    pub fn is_water(&self) -> bool {
        matches!(self, Material::Water | Material::StationaryWater)
    }

    /// Surfaces a torch cannot hold on to
    pub fn is_soft_surface(&self) -> bool {
        matches!(
            self,
            Material::Dirt | Material::Grass | Material::LongGrass | Material::Sand
        )
    }

    /// Food crops that can wither when they reach full size
    pub fn is_food_crop(&self) -> bool {
        matches!(self, Material::Crops | Material::Carrot | Material::Potato)
    }

    pub fn upgraded_pick(&self) -> Option<UpgradedPick> {
        match self {
            Material::IronPickaxe => Some(UpgradedPick::Iron),
            Material::DiamondPickaxe => Some(UpgradedPick::Diamond),
            _ => None,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::Air
    }
}

impl From<String> for Material {
    fn from(name: String) -> Self {
        Material::from_name(&name)
    }
}

impl From<Material> for String {
    fn from(material: Material) -> Self {
        material.name().to_string()
    }
}

impl std::fmt::Display for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An item stack a broken block leaves behind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDrop {
    pub material: Material,
    pub amount: u32,
}

impl ItemDrop {
    pub fn new(material: Material, amount: u32) -> Self {
        Self { material, amount }
    }
}

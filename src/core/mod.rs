pub mod config;
pub mod error;
pub mod geometry;
pub mod material;
pub mod types;

pub use config::{BoolKey, ConfigHandle, IntKey, PercentKey, RuleConfig, SetKey};
pub use geometry::{neighbors, BlockFace};
pub use material::{ItemDrop, Material, UpgradedPick};
pub use types::{Biome, BlockPos, ChunkCoord, Environment, GameMode, SubjectId, Tick, WorldId};

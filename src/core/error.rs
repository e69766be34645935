use thiserror::Error;

use crate::core::types::{ChunkCoord, WorldId};

/// Problems with rule or message configuration. Always fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown config key: {0}")]
    UnknownKey(String),

    #[error("Config key '{key}' expects {expected}")]
    WrongType { key: String, expected: &'static str },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A mutation targeted a place the host can no longer touch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldStateError {
    #[error("World not found: {0}")]
    UnknownWorld(WorldId),

    #[error("Chunk {chunk:?} of {world} is not loaded")]
    ChunkUnloaded { world: WorldId, chunk: ChunkCoord },
}

/// The permission backend could not answer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Permission lookup failed: {0}")]
pub struct PermissionLookupError(pub String);

#[derive(Error, Debug)]
pub enum HardmodeError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Invalid replay step: {0}")]
    InvalidStep(String),
}

pub type Result<T> = std::result::Result<T, HardmodeError>;

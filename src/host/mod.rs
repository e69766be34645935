//! Narrow interfaces to the host runtime
//!
//! The engine never owns world state. It reads blocks through [`BlockView`],
//! writes through [`WorldMutator`], asks [`PermissionService`] about
//! capabilities, and talks to subjects through [`MessageCatalog`] and
//! [`MessageSink`]. [`Host`] bundles all of them for the dispatcher.

pub mod memory;

pub use memory::{HostOp, MemoryWorld};

use serde::{Deserialize, Serialize};

use crate::core::error::{PermissionLookupError, WorldStateError};
use crate::core::material::{ItemDrop, Material};
use crate::core::types::{BlockPos, ChunkCoord, Environment, SubjectId, WorldId};
use crate::notify::{Cue, MessageKey};

/// Named permissions a subject may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Exempt from every rule
    Bypass,
    SilentStoneMiningHelp,
    SilentNoTorchesHere,
    SilentRealisticBuilding,
    SilentLimitedTorchPlacement,
}

impl Capability {
    /// Permission node as the host's permission backend spells it
    pub fn node(&self) -> &'static str {
        match self {
            Capability::Bypass => "hardmode.bypass",
            Capability::SilentStoneMiningHelp => "hardmode.silent.stone_mining_help",
            Capability::SilentNoTorchesHere => "hardmode.silent.no_torches_here",
            Capability::SilentRealisticBuilding => "hardmode.silent.realistic_building",
            Capability::SilentLimitedTorchPlacement => "hardmode.silent.limited_torch_placement",
        }
    }
}

/// Read access to host world state and the realm registry
pub trait BlockView {
    /// `None` when the world is unknown or the chunk is not loaded
    fn material_at(&self, world: &WorldId, pos: BlockPos) -> Option<Material>;

    fn environment_of(&self, world: &WorldId) -> Option<Environment>;

    fn loaded_chunks(&self, world: &WorldId) -> Vec<ChunkCoord>;

    fn is_chunk_loaded(&self, world: &WorldId, chunk: ChunkCoord) -> bool;

    fn is_raining(&self, world: &WorldId) -> bool;

    /// Lowest block y in this world
    fn min_height(&self, world: &WorldId) -> i32;

    /// Exclusive upper bound of block y in this world
    fn max_height(&self, world: &WorldId) -> i32;
}

/// Write access to host world state
pub trait WorldMutator: BlockView {
    fn set_material(
        &mut self,
        world: &WorldId,
        pos: BlockPos,
        material: Material,
    ) -> Result<(), WorldStateError>;

    /// Drop list of the event currently being dispatched
    fn clear_drops(&mut self);

    fn add_drop(&mut self, drop: ItemDrop);

    /// Add wear to whatever the subject holds
    fn degrade_tool(&mut self, subject: SubjectId, amount: u32);

    /// Let the host's block physics reconsider this position (may make blocks fall)
    fn apply_physics(&mut self, world: &WorldId, pos: BlockPos);
}

pub trait PermissionService {
    fn has_capability(
        &self,
        subject: SubjectId,
        capability: Capability,
    ) -> Result<bool, PermissionLookupError>;
}

pub trait MessageCatalog {
    fn resolve(&self, key: MessageKey) -> Option<String>;
}

pub trait MessageSink {
    /// Returns false when the subject could not be reached
    fn send_message(&mut self, subject: SubjectId, text: &str) -> bool;

    fn play_cue(&mut self, subject: SubjectId, cue: Cue);
}

/// Everything the dispatcher needs from the host
pub trait Host: WorldMutator + PermissionService + MessageCatalog + MessageSink {}

impl<T> Host for T where T: WorldMutator + PermissionService + MessageCatalog + MessageSink {}

/// Capability check shared by every caller; a failed lookup counts as "not held"
pub fn has_capability<P>(permissions: &P, subject: SubjectId, capability: Capability) -> bool
where
    P: PermissionService + ?Sized,
{
    match permissions.has_capability(subject, capability) {
        Ok(held) => held,
        Err(err) => {
            tracing::warn!(%subject, node = capability.node(), "{}; treating as absent", err);
            false
        }
    }
}

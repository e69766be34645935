//! In-memory host used by tests and the replay tool
//!
//! Blocks live in sparse per-world maps; anything never set reads as air as
//! long as its chunk is loaded. Every mutation the engine performs is also
//! appended to `ops` so callers can assert on exactly what happened.

use ahash::{AHashMap, AHashSet};
use serde::Serialize;

use crate::core::error::{PermissionLookupError, WorldStateError};
use crate::core::material::{ItemDrop, Material};
use crate::core::types::{BlockPos, ChunkCoord, Environment, SubjectId, WorldId};
use crate::host::{
    BlockView, Capability, MessageCatalog, MessageSink, PermissionService, WorldMutator,
};
use crate::notify::{Cue, MessageKey, TomlCatalog};

/// Default build height for new worlds
pub const DEFAULT_MIN_HEIGHT: i32 = 0;
pub const DEFAULT_MAX_HEIGHT: i32 = 256;

/// A mutation the engine asked the host to perform
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HostOp {
    SetMaterial { world: WorldId, pos: BlockPos, material: Material },
    ClearDrops,
    AddDrop { drop: ItemDrop },
    DegradeTool { subject: SubjectId, amount: u32 },
    ApplyPhysics { world: WorldId, pos: BlockPos },
}

#[derive(Debug, Clone)]
struct WorldState {
    environment: Environment,
    blocks: AHashMap<BlockPos, Material>,
    loaded: AHashSet<ChunkCoord>,
    raining: bool,
    min_height: i32,
    max_height: i32,
}

#[derive(Debug, Default)]
pub struct MemoryWorld {
    worlds: AHashMap<WorldId, WorldState>,
    capabilities: AHashMap<SubjectId, AHashSet<Capability>>,
    permission_outage: bool,
    offline: AHashSet<SubjectId>,
    catalog: TomlCatalog,
    pub ops: Vec<HostOp>,
    pub messages: Vec<(SubjectId, String)>,
    pub cues: Vec<(SubjectId, Cue)>,
    pub tool_wear: AHashMap<SubjectId, u32>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: TomlCatalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    pub fn add_world(&mut self, world: WorldId, environment: Environment) {
        self.worlds.insert(
            world,
            WorldState {
                environment,
                blocks: AHashMap::new(),
                loaded: AHashSet::new(),
                raining: false,
                min_height: DEFAULT_MIN_HEIGHT,
                max_height: DEFAULT_MAX_HEIGHT,
            },
        );
    }

    /// Test/setup write: loads the chunk and does not touch `ops`
    pub fn set_block(&mut self, world: &WorldId, pos: BlockPos, material: Material) {
        if let Some(state) = self.worlds.get_mut(world) {
            state.loaded.insert(pos.chunk());
            if material == Material::Air {
                state.blocks.remove(&pos);
            } else {
                state.blocks.insert(pos, material);
            }
        }
    }

    pub fn load_chunk(&mut self, world: &WorldId, chunk: ChunkCoord) {
        if let Some(state) = self.worlds.get_mut(world) {
            state.loaded.insert(chunk);
        }
    }

    /// Blocks stay in memory; they just become unreachable
    pub fn unload_chunk(&mut self, world: &WorldId, chunk: ChunkCoord) {
        if let Some(state) = self.worlds.get_mut(world) {
            state.loaded.remove(&chunk);
        }
    }

    pub fn set_raining(&mut self, world: &WorldId, raining: bool) {
        if let Some(state) = self.worlds.get_mut(world) {
            state.raining = raining;
        }
    }

    pub fn set_max_height(&mut self, world: &WorldId, max_height: i32) {
        if let Some(state) = self.worlds.get_mut(world) {
            state.max_height = max_height;
        }
    }

    pub fn set_min_height(&mut self, world: &WorldId, min_height: i32) {
        if let Some(state) = self.worlds.get_mut(world) {
            state.min_height = min_height;
        }
    }

    pub fn grant(&mut self, subject: SubjectId, capability: Capability) {
        self.capabilities.entry(subject).or_default().insert(capability);
    }

    /// Make every permission lookup fail
    pub fn set_permission_outage(&mut self, outage: bool) {
        self.permission_outage = outage;
    }

    pub fn set_offline(&mut self, subject: SubjectId) {
        self.offline.insert(subject);
    }

    /// Material at `pos`, or air when unreachable
    pub fn block(&self, world: &WorldId, pos: BlockPos) -> Material {
        self.material_at(world, pos).unwrap_or_default()
    }

    fn reachable(&self, world: &WorldId, pos: BlockPos) -> Result<&WorldState, WorldStateError> {
        let state = self
            .worlds
            .get(world)
            .ok_or_else(|| WorldStateError::UnknownWorld(world.clone()))?;
        if !state.loaded.contains(&pos.chunk()) {
            return Err(WorldStateError::ChunkUnloaded {
                world: world.clone(),
                chunk: pos.chunk(),
            });
        }
        Ok(state)
    }
}

impl BlockView for MemoryWorld {
    fn material_at(&self, world: &WorldId, pos: BlockPos) -> Option<Material> {
        let state = self.reachable(world, pos).ok()?;
        Some(state.blocks.get(&pos).cloned().unwrap_or_default())
    }

    fn environment_of(&self, world: &WorldId) -> Option<Environment> {
        self.worlds.get(world).map(|s| s.environment)
    }

    fn loaded_chunks(&self, world: &WorldId) -> Vec<ChunkCoord> {
        let mut chunks: Vec<ChunkCoord> = self
            .worlds
            .get(world)
            .map(|s| s.loaded.iter().copied().collect())
            .unwrap_or_default();
        // Hash order is not stable across runs
        chunks.sort_by_key(|c| (c.x, c.z));
        chunks
    }

    fn is_chunk_loaded(&self, world: &WorldId, chunk: ChunkCoord) -> bool {
        self.worlds
            .get(world)
            .map(|s| s.loaded.contains(&chunk))
            .unwrap_or(false)
    }

    fn is_raining(&self, world: &WorldId) -> bool {
        self.worlds.get(world).map(|s| s.raining).unwrap_or(false)
    }

    fn min_height(&self, world: &WorldId) -> i32 {
        self.worlds
            .get(world)
            .map(|s| s.min_height)
            .unwrap_or(DEFAULT_MIN_HEIGHT)
    }

    fn max_height(&self, world: &WorldId) -> i32 {
        self.worlds
            .get(world)
            .map(|s| s.max_height)
            .unwrap_or(DEFAULT_MAX_HEIGHT)
    }
}

impl WorldMutator for MemoryWorld {
    fn set_material(
        &mut self,
        world: &WorldId,
        pos: BlockPos,
        material: Material,
    ) -> Result<(), WorldStateError> {
        self.reachable(world, pos)?;
        self.set_block(world, pos, material.clone());
        self.ops.push(HostOp::SetMaterial {
            world: world.clone(),
            pos,
            material,
        });
        Ok(())
    }

    fn clear_drops(&mut self) {
        self.ops.push(HostOp::ClearDrops);
    }

    fn add_drop(&mut self, drop: ItemDrop) {
        self.ops.push(HostOp::AddDrop { drop });
    }

    fn degrade_tool(&mut self, subject: SubjectId, amount: u32) {
        *self.tool_wear.entry(subject).or_default() += amount;
        self.ops.push(HostOp::DegradeTool { subject, amount });
    }

    fn apply_physics(&mut self, world: &WorldId, pos: BlockPos) {
        self.ops.push(HostOp::ApplyPhysics {
            world: world.clone(),
            pos,
        });
    }
}

impl PermissionService for MemoryWorld {
    fn has_capability(
        &self,
        subject: SubjectId,
        capability: Capability,
    ) -> Result<bool, PermissionLookupError> {
        if self.permission_outage {
            return Err(PermissionLookupError("permission backend unavailable".to_string()));
        }
        Ok(self
            .capabilities
            .get(&subject)
            .map(|caps| caps.contains(&capability))
            .unwrap_or(false))
    }
}

impl MessageCatalog for MemoryWorld {
    fn resolve(&self, key: MessageKey) -> Option<String> {
        self.catalog.resolve(key)
    }
}

impl MessageSink for MemoryWorld {
    fn send_message(&mut self, subject: SubjectId, text: &str) -> bool {
        if self.offline.contains(&subject) {
            return false;
        }
        self.messages.push((subject, text.to_string()));
        true
    }

    fn play_cue(&mut self, subject: SubjectId, cue: Cue) {
        if !self.offline.contains(&subject) {
            self.cues.push((subject, cue));
        }
    }
}

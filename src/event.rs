//! Raw host events and the per-event context the rules read

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::core::geometry::BlockFace;
use crate::core::material::Material;
use crate::core::types::{Biome, BlockPos, Environment, GameMode, SubjectId, WorldId};
use crate::host::BlockView;

/// The acting player, as captured when the event fired
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    /// Block the subject's feet are in
    pub feet: BlockPos,
    #[serde(default)]
    pub game_mode: GameMode,
    /// What the subject holds; `AIR` for an empty hand
    #[serde(default)]
    pub held_item: Material,
}

impl Subject {
    pub fn is_consequence_free(&self) -> bool {
        self.game_mode.is_consequence_free()
    }
}

/// A block and what it was made of
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSnapshot {
    pub pos: BlockPos,
    pub material: Material,
}

/// One event as delivered by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockEvent {
    Break {
        world: WorldId,
        subject: Subject,
        pos: BlockPos,
        material: Material,
    },
    Place {
        world: WorldId,
        subject: Subject,
        pos: BlockPos,
        material: Material,
        /// Face of the placed block that touches its support (torches)
        #[serde(default)]
        attached_face: Option<BlockFace>,
    },
    Dispense {
        world: WorldId,
        pos: BlockPos,
        item: Material,
        velocity: DVec3,
    },
    PistonExtend {
        world: WorldId,
        pos: BlockPos,
        pushed: Vec<BlockSnapshot>,
    },
    PistonRetract {
        world: WorldId,
        pos: BlockPos,
        sticky: bool,
        retract_location: BlockPos,
    },
    WeatherChange {
        world: WorldId,
        raining: bool,
    },
    BlockGrow {
        world: WorldId,
        pos: BlockPos,
        material: Material,
        new_stage: u8,
        #[serde(default)]
        biome: Biome,
    },
    StructureGrow {
        world: WorldId,
        pos: BlockPos,
        #[serde(default)]
        subject: Option<Subject>,
        biome: Biome,
    },
    /// Anything the engine has no pipeline for
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Break,
    Place,
    Dispense,
    PistonExtend,
    PistonRetract,
    WeatherChange,
    BlockGrow,
    StructureGrow,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::Break,
        EventKind::Place,
        EventKind::Dispense,
        EventKind::PistonExtend,
        EventKind::PistonRetract,
        EventKind::WeatherChange,
        EventKind::BlockGrow,
        EventKind::StructureGrow,
    ];
}

/// Kind-specific extras
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    None,
    Place { attached_face: Option<BlockFace> },
    Dispense { item: Material, velocity: DVec3 },
    PistonRetract { sticky: bool },
    Weather { raining: bool },
    Grow { new_stage: u8, biome: Biome },
    Structure { biome: Biome },
}

/// Immutable snapshot of one event, built once per dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct EventContext {
    pub kind: EventKind,
    pub world: WorldId,
    pub environment: Environment,
    pub subject: Option<Subject>,
    /// Primary block; the retract location for piston retracts
    pub target: BlockPos,
    pub material: Material,
    /// Pushed blocks for piston extends, empty otherwise
    pub affected: Vec<BlockSnapshot>,
    pub payload: EventPayload,
}

impl EventContext {
    /// `None` for events without a pipeline, and for events whose
    /// coordinates no real block can have
    pub fn from_event<V: BlockView + ?Sized>(event: &BlockEvent, view: &V) -> Option<Self> {
        let (kind, world, subject, target, material, affected, payload) = match event {
            BlockEvent::Break { world, subject, pos, material } => (
                EventKind::Break,
                world,
                Some(subject.clone()),
                *pos,
                material.clone(),
                Vec::new(),
                EventPayload::None,
            ),
            BlockEvent::Place { world, subject, pos, material, attached_face } => (
                EventKind::Place,
                world,
                Some(subject.clone()),
                *pos,
                material.clone(),
                Vec::new(),
                EventPayload::Place { attached_face: *attached_face },
            ),
            BlockEvent::Dispense { world, pos, item, velocity } => (
                EventKind::Dispense,
                world,
                None,
                *pos,
                view.material_at(world, *pos).unwrap_or_default(),
                Vec::new(),
                EventPayload::Dispense { item: item.clone(), velocity: *velocity },
            ),
            BlockEvent::PistonExtend { world, pos, pushed } => (
                EventKind::PistonExtend,
                world,
                None,
                *pos,
                view.material_at(world, *pos).unwrap_or_default(),
                pushed.clone(),
                EventPayload::None,
            ),
            BlockEvent::PistonRetract { world, sticky, retract_location, .. } => (
                EventKind::PistonRetract,
                world,
                None,
                *retract_location,
                view.material_at(world, *retract_location).unwrap_or_default(),
                Vec::new(),
                EventPayload::PistonRetract { sticky: *sticky },
            ),
            BlockEvent::WeatherChange { world, raining } => (
                EventKind::WeatherChange,
                world,
                None,
                BlockPos::default(),
                Material::Air,
                Vec::new(),
                EventPayload::Weather { raining: *raining },
            ),
            BlockEvent::BlockGrow { world, pos, material, new_stage, biome } => (
                EventKind::BlockGrow,
                world,
                None,
                *pos,
                material.clone(),
                Vec::new(),
                EventPayload::Grow { new_stage: *new_stage, biome: *biome },
            ),
            BlockEvent::StructureGrow { world, pos, subject, biome } => (
                EventKind::StructureGrow,
                world,
                subject.clone(),
                *pos,
                view.material_at(world, *pos).unwrap_or_default(),
                Vec::new(),
                EventPayload::Structure { biome: *biome },
            ),
            BlockEvent::Unknown => return None,
        };

        let in_range = target.is_addressable()
            && subject.as_ref().map_or(true, |s| s.feet.is_addressable())
            && affected.iter().all(|block| block.pos.is_addressable());
        if !in_range {
            tracing::debug!(?kind, %world, "event coordinates out of range");
            return None;
        }

        Some(Self {
            kind,
            world: world.clone(),
            environment: view.environment_of(world).unwrap_or_default(),
            subject,
            target,
            material,
            affected,
            payload,
        })
    }
}

//! Rules for subject-initiated block placement

use crate::core::config::{BoolKey, IntKey};
use crate::core::geometry::{neighbors, BlockFace};
use crate::core::material::Material;
use crate::core::types::Environment;
use crate::event::{EventKind, EventPayload};
use crate::host::Capability;
use crate::notify::{Cue, MessageKey, Notice};
use crate::rules::{PendingMutation, Pipeline, RuleEnv, RuleStep, Scope, Veto, VetoReason};

pub fn pipeline() -> Pipeline {
    Pipeline::new(EventKind::Place, Scope::ActiveWorlds)
        .rule("end_no_building", end_no_building)
        .rule("ore_against_stone", ore_against_stone)
        .rule("no_farming_nether_wart", no_farming_nether_wart)
        .rule("more_falling_blocks", more_falling_blocks)
        .rule("torch_altitude", torch_altitude)
        .rule("realistic_placement", realistic_placement)
        .rule("soft_surface_torch", soft_surface_torch)
}

pub fn end_no_building(env: &mut RuleEnv<'_>) -> RuleStep {
    if env.config.get_bool(BoolKey::EndNoBuilding) && env.ctx.environment == Environment::End {
        return RuleStep::Veto(
            Veto::new(VetoReason::LimitedEndBuilding)
                .notify(Notice::always(MessageKey::LimitedEndBuilding)),
        );
    }
    RuleStep::Continue
}

/// Placed ore next to stone would let the ore-break softening be farmed
pub fn ore_against_stone(env: &mut RuleEnv<'_>) -> RuleStep {
    if !env.config.get_bool(BoolKey::SuperHardStone)
        || env.consequence_free()
        || !env.ctx.material.is_ore()
    {
        return RuleStep::Continue;
    }
    let touches_stone = neighbors(env.ctx.target)
        .into_iter()
        .any(|pos| env.material_at(pos) == Material::Stone);
    if touches_stone {
        return RuleStep::Veto(
            Veto::new(VetoReason::OreAgainstStone)
                .notify(Notice::always(MessageKey::NoPlacingOreAgainstStone)),
        );
    }
    RuleStep::Continue
}

pub fn no_farming_nether_wart(env: &mut RuleEnv<'_>) -> RuleStep {
    if env.ctx.material == Material::NetherWarts
        && env.config.get_bool(BoolKey::NoFarmingNetherWart)
    {
        return RuleStep::Veto(Veto::new(VetoReason::NoWartFarming));
    }
    RuleStep::Continue
}

pub fn more_falling_blocks(env: &mut RuleEnv<'_>) -> RuleStep {
    if !env.config.get_bool(BoolKey::MoreFallingBlocks) || env.consequence_free() {
        return RuleStep::Continue;
    }
    RuleStep::Mutate(vec![PendingMutation::ApplyPhysics { pos: env.ctx.target }])
}

/// No open flames below the configured depth in the overworld
pub fn torch_altitude(env: &mut RuleEnv<'_>) -> RuleStep {
    let min_y = env.config.get_int(IntKey::StandardTorchMinY);
    if min_y <= 0 || env.consequence_free() || env.ctx.environment != Environment::Normal {
        return RuleStep::Continue;
    }
    if i64::from(env.ctx.target.y) >= min_y {
        return RuleStep::Continue;
    }

    let flame = match env.ctx.material {
        Material::Torch | Material::JackOLantern => true,
        Material::Fire => {
            env.material_at(env.ctx.target.relative(BlockFace::Down)) == Material::Netherrack
        }
        _ => false,
    };
    if !flame {
        return RuleStep::Continue;
    }

    RuleStep::Veto(
        Veto::new(VetoReason::TorchTooDeep).notify(
            Notice::unless(MessageKey::NoTorchesHere, Capability::SilentNoTorchesHere)
                .with_cue(Cue::fizz()),
        ),
    )
}

/// Blocks can't go straight down under the subject or out over a void
pub fn realistic_placement(env: &mut RuleEnv<'_>) -> RuleStep {
    if !env.config.get_bool(BoolKey::LimitedBlockPlacement) || env.consequence_free() {
        return RuleStep::Continue;
    }
    let Some(subject) = env.subject() else {
        return RuleStep::Continue;
    };
    let feet = subject.feet;
    let target = env.ctx.target;

    let veto = || {
        RuleStep::Veto(Veto::new(VetoReason::UnrealisticPlacement).notify(Notice::unless(
            MessageKey::RealisticBuilding,
            Capability::SilentRealisticBuilding,
        )))
    };

    if target.x == feet.x && target.z == feet.z && target.y < feet.y {
        return veto();
    }

    let under = feet.relative(BlockFace::Down);
    match env.material_at(under) {
        m if m.is_lava() => veto(),
        Material::Air => {
            let lower = env.material_at(under.relative(BlockFace::Down));
            if lower == Material::Air || lower.is_lava() {
                veto()
            } else {
                RuleStep::Continue
            }
        }
        _ => RuleStep::Continue,
    }
}

/// Torches won't hold on dirt, grass or sand
pub fn soft_surface_torch(env: &mut RuleEnv<'_>) -> RuleStep {
    if !env.config.get_bool(BoolKey::LimitedTorchPlacement)
        || env.ctx.material != Material::Torch
        || env.consequence_free()
    {
        return RuleStep::Continue;
    }

    let face = match env.ctx.payload {
        EventPayload::Place { attached_face: Some(face) } => face,
        _ => BlockFace::Down,
    };
    if !env.material_at(env.ctx.target.relative(face)).is_soft_surface() {
        return RuleStep::Continue;
    }

    let mut veto = Veto::new(VetoReason::SoftTorchSurface);
    if env.config.get_bool(BoolKey::SoundsTorchFizz) {
        veto = veto.notify(
            Notice::unless(
                MessageKey::LimitedTorchPlacement,
                Capability::SilentLimitedTorchPlacement,
            )
                .with_cue(Cue::fizz()),
        );
    }
    RuleStep::Veto(veto)
}

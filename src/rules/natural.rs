//! Rules for events the world raises on its own: dispensers, pistons,
//! weather and growth

use crate::core::config::{BoolKey, PercentKey};
use crate::core::material::Material;
use crate::event::{EventKind, EventPayload};
use crate::rules::{Pipeline, RuleEnv, RuleStep, Scope, Veto, VetoReason};
use crate::scheduler::{storm_decay_plan, ActionPayload, ScheduledAction};

/// Growth stage at which wheat, carrots and potatoes are ripe
pub const FULL_GROWTH: u8 = 7;

/// Extra wither chance for crops in a desert
pub const DESERT_LOSS_BONUS: u8 = 25;

pub fn pipelines() -> Vec<Pipeline> {
    vec![
        Pipeline::new(EventKind::Dispense, Scope::ActiveWorlds)
            .rule("evaporate_dispensed_water", evaporate_dispensed_water),
        Pipeline::new(EventKind::PistonExtend, Scope::ActiveWorlds)
            .rule("piston_pushes_ore", piston_pushes_ore),
        Pipeline::new(EventKind::PistonRetract, Scope::ActiveWorlds)
            .rule("piston_pulls_ore", piston_pulls_ore),
        Pipeline::new(EventKind::WeatherChange, Scope::ActiveWorlds)
            .rule("rain_breaks_torches", rain_breaks_torches),
        Pipeline::new(EventKind::BlockGrow, Scope::Everywhere).rule("crops_wither", crops_wither),
        Pipeline::new(EventKind::StructureGrow, Scope::ActiveWorlds)
            .rule("arid_deserts", arid_deserts),
    ]
}

/// Water placed by a dispenser is gone again a tick later
pub fn evaporate_dispensed_water(env: &mut RuleEnv<'_>) -> RuleStep {
    if !env.config.get_bool(BoolKey::DontMoveWaterSourceBlocks) {
        return RuleStep::Continue;
    }
    let EventPayload::Dispense { item, velocity } = &env.ctx.payload else {
        return RuleStep::Continue;
    };
    if *item != Material::WaterBucket {
        return RuleStep::Continue;
    }

    let step = if velocity.x > 0.0 {
        (1, 0, 0)
    } else if velocity.x < 0.0 {
        (-1, 0, 0)
    } else if velocity.z > 0.0 {
        (0, 0, 1)
    } else {
        (0, 0, -1)
    };

    RuleStep::Schedule(vec![ScheduledAction::new(
        env.ctx.world.clone(),
        1,
        ActionPayload::EvaporateWater(env.ctx.target + step),
    )])
}

fn piston_cargo(material: &Material) -> bool {
    *material == Material::Stone || material.is_suffixed_ore()
}

/// Pistons can't shove stone or ore around
pub fn piston_pushes_ore(env: &mut RuleEnv<'_>) -> RuleStep {
    if !env.config.get_bool(BoolKey::SuperHardStone) {
        return RuleStep::Continue;
    }
    if env.ctx.affected.iter().any(|block| piston_cargo(&block.material)) {
        return RuleStep::Veto(Veto::new(VetoReason::PistonMovesOre));
    }
    RuleStep::Continue
}

pub fn piston_pulls_ore(env: &mut RuleEnv<'_>) -> RuleStep {
    let sticky = matches!(env.ctx.payload, EventPayload::PistonRetract { sticky: true });
    if !sticky || !env.config.get_bool(BoolKey::SuperHardStone) {
        return RuleStep::Continue;
    }
    if piston_cargo(&env.ctx.material) {
        return RuleStep::Veto(Veto::new(VetoReason::PistonMovesOre));
    }
    RuleStep::Continue
}

/// When rain starts, sweep the loaded chunks for exposed torches, a chunk at a time
pub fn rain_breaks_torches(env: &mut RuleEnv<'_>) -> RuleStep {
    let raining = matches!(env.ctx.payload, EventPayload::Weather { raining: true });
    if !raining || !env.config.get_bool(BoolKey::RainBreaksTorches) {
        return RuleStep::Continue;
    }

    let chunks = env.world.loaded_chunks(&env.ctx.world);
    if chunks.is_empty() {
        return RuleStep::Continue;
    }
    tracing::debug!(world = %env.ctx.world, chunks = chunks.len(), "scheduling storm torch sweep");
    RuleStep::Schedule(storm_decay_plan(&env.ctx.world, &chunks, &mut *env.rng))
}

/// Wart never grows anywhere; ripe food crops in active worlds sometimes die instead
pub fn crops_wither(env: &mut RuleEnv<'_>) -> RuleStep {
    let (new_stage, biome) = match env.ctx.payload {
        EventPayload::Grow { new_stage, biome } => (new_stage, biome),
        _ => return RuleStep::Continue,
    };

    let dies = if env.ctx.material == Material::NetherWarts {
        env.config.get_bool(BoolKey::NoFarmingNetherWart)
    } else if env.ctx.material.is_food_crop()
        && new_stage >= FULL_GROWTH
        && env.config.get_bool(BoolKey::WeakFoodCrops)
        && env.config.is_active_world(env.ctx.world.as_str())
    {
        let mut chance = env.config.get_percent(PercentKey::WeakFoodCropsLossRate);
        if biome.is_desert() {
            chance = chance.saturating_add(DESERT_LOSS_BONUS).min(100);
        }
        env.roll(chance)
    } else {
        false
    };

    if dies {
        RuleStep::Veto(Veto::new(VetoReason::CropWithered).substitute(Material::DeadShrub))
    } else {
        RuleStep::Continue
    }
}

pub fn arid_deserts(env: &mut RuleEnv<'_>) -> RuleStep {
    let EventPayload::Structure { biome } = env.ctx.payload else {
        return RuleStep::Continue;
    };
    if env.config.get_bool(BoolKey::AridDeserts) && biome.is_desert() {
        return RuleStep::Veto(Veto::new(VetoReason::AridDesert));
    }
    RuleStep::Continue
}

//! Rules for subject-initiated block breaks

use crate::core::config::{BoolKey, IntKey, PercentKey};
use crate::core::geometry::{neighbors, BlockFace};
use crate::core::material::{ItemDrop, Material, UpgradedPick};
use crate::core::types::Environment;
use crate::event::EventKind;
use crate::host::Capability;
use crate::notify::{MessageKey, Notice};
use crate::rules::{PendingMutation, Pipeline, RuleEnv, RuleStep, Scope, Veto, VetoReason};

pub fn pipeline() -> Pipeline {
    Pipeline::new(EventKind::Break, Scope::ActiveWorlds)
        .rule("end_limited_building", end_limited_building)
        .rule("hardened_stone", hardened_stone)
        .rule("better_tree_chopping", better_tree_chopping)
        .rule("more_falling_blocks", more_falling_blocks)
        .rule("netherrack_ignition", netherrack_ignition)
        .post_effect("ore_softens_stone", ore_softens_stone)
        .post_effect("nether_wart_drops", nether_wart_drops)
}

/// In the End only end stone comes out, and only as a downward staircase:
/// the block may sit no closer below the feet than it is away horizontally.
pub fn end_limited_building(env: &mut RuleEnv<'_>) -> RuleStep {
    if !env.config.get_bool(BoolKey::EndNoBuilding) || env.ctx.environment != Environment::End {
        return RuleStep::Continue;
    }
    let Some(subject) = env.subject() else {
        return RuleStep::Continue;
    };

    let veto = || {
        RuleStep::Veto(
            Veto::new(VetoReason::LimitedEndBuilding)
                .notify(Notice::always(MessageKey::LimitedEndBuilding)),
        )
    };

    if env.ctx.material != Material::EndStone {
        return veto();
    }

    let reach = subject.feet.horizontal_reach(&env.ctx.target);
    let drop = i64::from(subject.feet.y) - i64::from(env.ctx.target.y);
    if drop < reach {
        return veto();
    }
    RuleStep::Continue
}

/// Stone needs an iron or diamond pick, and costs that pick extra wear
pub fn hardened_stone(env: &mut RuleEnv<'_>) -> RuleStep {
    if !env.config.get_bool(BoolKey::SuperHardStone) || env.consequence_free() {
        return RuleStep::Continue;
    }
    if !env.ctx.material.is_hardened_rock() {
        return RuleStep::Continue;
    }
    let Some(subject) = env.subject() else {
        return RuleStep::Continue;
    };

    let penalty = match subject.held_item.upgraded_pick() {
        None => {
            return RuleStep::Veto(
                Veto::new(VetoReason::StoneTooHard).notify(Notice::unless(
                    MessageKey::StoneMiningHelp,
                    Capability::SilentStoneMiningHelp,
                )),
            );
        }
        Some(UpgradedPick::Iron) => env.config.get_int(IntKey::IronPickDurabilityPenalty),
        Some(UpgradedPick::Diamond) => env.config.get_int(IntKey::DiamondPickDurabilityPenalty),
    };

    RuleStep::Mutate(vec![PendingMutation::DegradeTool {
        subject: subject.id,
        amount: penalty.clamp(0, u32::MAX as i64) as u32,
    }])
}

/// Chopping a log rooted in soil brings the rest of the trunk down with it
pub fn better_tree_chopping(env: &mut RuleEnv<'_>) -> RuleStep {
    if env.ctx.material != Material::Log || !env.config.get_bool(BoolKey::BetterTreeChopping) {
        return RuleStep::Continue;
    }

    let bottom = env.world.min_height(&env.ctx.world);
    let mut root = env.ctx.target.relative(BlockFace::Down);
    while root.y >= bottom && env.material_at(root) == Material::Log {
        root = root.relative(BlockFace::Down);
    }
    if !matches!(env.material_at(root), Material::Dirt | Material::Grass) {
        return RuleStep::Continue;
    }

    let top = env.world.max_height(&env.ctx.world);
    let mut falling = Vec::new();
    let mut log = env.ctx.target.relative(BlockFace::Up);
    while log.y < top && env.material_at(log) == Material::Log {
        falling.push(PendingMutation::ApplyPhysics { pos: log });
        log = log.relative(BlockFace::Up);
    }

    if falling.is_empty() {
        RuleStep::Continue
    } else {
        RuleStep::Mutate(falling)
    }
}

pub fn more_falling_blocks(env: &mut RuleEnv<'_>) -> RuleStep {
    if !env.config.get_bool(BoolKey::MoreFallingBlocks) {
        return RuleStep::Continue;
    }
    RuleStep::Mutate(vec![PendingMutation::ApplyPhysics { pos: env.ctx.target }])
}

/// Netherrack resting on netherrack may catch fire instead of breaking
pub fn netherrack_ignition(env: &mut RuleEnv<'_>) -> RuleStep {
    let percent = env.config.get_percent(PercentKey::BrokenNetherrackCatchesFire);
    if percent == 0 || env.ctx.material != Material::Netherrack {
        return RuleStep::Continue;
    }

    let below = env.material_at(env.ctx.target.relative(BlockFace::Down));
    if below == Material::Netherrack && env.roll(percent) {
        return RuleStep::Veto(Veto::new(VetoReason::NetherrackIgnited).substitute(Material::Fire));
    }
    RuleStep::Continue
}

/// Breaking ore turns adjacent stone into cobblestone so the ore stays reachable
pub fn ore_softens_stone(env: &RuleEnv<'_>) -> Vec<PendingMutation> {
    if !env.config.get_bool(BoolKey::SuperHardStonePhysics) || !env.ctx.material.is_ore() {
        return Vec::new();
    }

    neighbors(env.ctx.target)
        .into_iter()
        .filter(|pos| env.material_at(*pos) == Material::Stone)
        .map(|pos| PendingMutation::SetMaterial {
            pos,
            material: Material::Cobblestone,
        })
        .collect()
}

/// A harvested wart crop yields exactly one wart, so it can't be multiplied
pub fn nether_wart_drops(env: &RuleEnv<'_>) -> Vec<PendingMutation> {
    if !env.config.get_bool(BoolKey::NoFarmingNetherWart)
        || env.ctx.material != Material::NetherWarts
    {
        return Vec::new();
    }
    vec![PendingMutation::ReplaceDrops {
        drops: vec![ItemDrop::new(Material::NetherStalk, 1)],
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::RuleConfig;
    use crate::core::types::{BlockPos, GameMode};
    use crate::event::{BlockEvent, Subject};
    use crate::host::MemoryWorld;
    use crate::rules::testing::*;
    use crate::rules::RuleVerdict;

    fn break_event(subject: Subject, pos: BlockPos, material: Material) -> BlockEvent {
        BlockEvent::Break {
            world: world_id(),
            subject,
            pos,
            material,
        }
    }

    fn only(config: RuleConfig, keep: &[BoolKey]) -> RuleConfig {
        BoolKey::ALL
            .into_iter()
            .fold(config, |c, k| c.with_bool(k, keep.contains(&k)))
    }

    fn evaluate(host: &MemoryWorld, config: &RuleConfig, event: &BlockEvent) -> RuleVerdict {
        run(&pipeline(), event, host, config, 42)
    }

    #[test]
    fn test_end_staircase_geometry() {
        let host = host(Environment::End);
        let config = only(config(), &[BoolKey::EndNoBuilding]);
        let feet = BlockPos::new(0, 64, 0);

        let shallow = break_event(
            survivor(feet, Material::Air),
            BlockPos::new(2, 63, 0),
            Material::EndStone,
        );
        assert_eq!(
            evaluate(&host, &config, &shallow).veto_reason(),
            Some(VetoReason::LimitedEndBuilding)
        );

        let stair = break_event(
            survivor(feet, Material::Air),
            BlockPos::new(2, 62, 0),
            Material::EndStone,
        );
        assert!(!evaluate(&host, &config, &stair).is_vetoed());

        let diagonal = break_event(
            survivor(feet, Material::Air),
            BlockPos::new(-1, 63, 3),
            Material::EndStone,
        );
        assert!(evaluate(&host, &config, &diagonal).is_vetoed());
    }

    #[test]
    fn test_end_only_end_stone_may_break() {
        let host = host(Environment::End);
        let config = only(config(), &[BoolKey::EndNoBuilding]);
        let event = break_event(
            survivor(BlockPos::new(0, 64, 0), Material::DiamondPickaxe),
            BlockPos::new(0, 10, 0),
            Material::from_name("OBSIDIAN"),
        );
        let verdict = evaluate(&host, &config, &event);
        match verdict.decision {
            crate::rules::Decision::Veto(veto) => {
                assert_eq!(veto.notice, Some(Notice::always(MessageKey::LimitedEndBuilding)));
            }
            other => panic!("expected veto, got {other:?}"),
        }
    }

    #[test]
    fn test_end_rule_ignores_other_realms() {
        let host = host(Environment::Normal);
        let config = only(config(), &[BoolKey::EndNoBuilding]);
        let event = break_event(
            survivor(BlockPos::new(0, 64, 0), Material::Air),
            BlockPos::new(2, 63, 0),
            Material::Dirt,
        );
        assert!(!evaluate(&host, &config, &event).is_vetoed());
    }

    #[test]
    fn test_stone_needs_upgraded_pick() {
        let host = host(Environment::Normal);
        let config = only(config(), &[BoolKey::SuperHardStone]);

        let soft_tools = [
            Material::Air,
            Material::WoodPickaxe,
            Material::StonePickaxe,
            Material::GoldPickaxe,
        ];
        for tool in soft_tools {
            let event = break_event(
                survivor(BlockPos::new(0, 64, 0), tool),
                BlockPos::new(1, 64, 0),
                Material::Stone,
            );
            let verdict = evaluate(&host, &config, &event);
            assert_eq!(verdict.veto_reason(), Some(VetoReason::StoneTooHard));
            assert!(verdict.mutations.is_empty());
        }
    }

    #[test]
    fn test_upgraded_picks_take_tier_penalty() {
        let host = host(Environment::Normal);
        let config = only(config(), &[BoolKey::SuperHardStone])
            .with_int(IntKey::IronPickDurabilityPenalty, 7)
            .with_int(IntKey::DiamondPickDurabilityPenalty, 11);

        for (tool, expected) in [(Material::IronPickaxe, 7), (Material::DiamondPickaxe, 11)] {
            let subject = survivor(BlockPos::new(0, 64, 0), tool);
            let id = subject.id;
            let event = break_event(subject, BlockPos::new(1, 64, 0), Material::EndStone);
            let verdict = evaluate(&host, &config, &event);
            assert!(!verdict.is_vetoed());
            assert_eq!(
                verdict.mutations,
                vec![PendingMutation::DegradeTool { subject: id, amount: expected }]
            );
        }
    }

    #[test]
    fn test_creative_mines_stone_freely() {
        let host = host(Environment::Normal);
        let config = only(config(), &[BoolKey::SuperHardStone]);
        let mut subject = survivor(BlockPos::new(0, 64, 0), Material::Air);
        subject.game_mode = GameMode::Creative;
        let event = break_event(subject, BlockPos::new(1, 64, 0), Material::Stone);
        let verdict = evaluate(&host, &config, &event);
        assert_eq!(verdict, RuleVerdict::allow());
    }

    #[test]
    fn test_ore_softens_exactly_the_stone_neighbors() {
        let mut host = host(Environment::Normal);
        let ore = BlockPos::new(0, 30, 0);
        let world = world_id();
        host.set_block(&world, ore, Material::IronOre);
        let stone: Vec<BlockPos> = neighbors(ore).into_iter().take(3).collect();
        for pos in &stone {
            host.set_block(&world, *pos, Material::Stone);
        }
        host.set_block(&world, ore.relative(BlockFace::South), Material::Dirt);

        let config = only(config(), &[BoolKey::SuperHardStonePhysics]);
        let event = break_event(
            survivor(BlockPos::new(0, 31, 2), Material::IronPickaxe),
            ore,
            Material::IronOre,
        );
        let verdict = evaluate(&host, &config, &event);

        let expected: Vec<PendingMutation> = stone
            .into_iter()
            .map(|pos| PendingMutation::SetMaterial { pos, material: Material::Cobblestone })
            .collect();
        assert_eq!(verdict.mutations, expected);
    }

    #[test]
    fn test_vetoed_break_does_not_soften_stone() {
        let mut host = host(Environment::End);
        let ore = BlockPos::new(0, 30, 0);
        host.set_block(&world_id(), ore.relative(BlockFace::Up), Material::Stone);
        let config = only(config(), &[BoolKey::SuperHardStonePhysics, BoolKey::EndNoBuilding]);

        let event = break_event(
            survivor(BlockPos::new(0, 64, 0), Material::IronPickaxe),
            ore,
            Material::IronOre,
        );
        let verdict = evaluate(&host, &config, &event);
        assert!(verdict.is_vetoed());
        assert!(verdict.mutations.is_empty());
    }

    #[test]
    fn test_rooted_trunk_falls() {
        let mut host = host(Environment::Normal);
        let world = world_id();
        host.set_block(&world, BlockPos::new(0, 63, 0), Material::Grass);
        for y in 64..70 {
            host.set_block(&world, BlockPos::new(0, y, 0), Material::Log);
        }
        let config = only(config(), &[BoolKey::BetterTreeChopping]);

        let event = break_event(
            survivor(BlockPos::new(1, 64, 0), Material::Air),
            BlockPos::new(0, 65, 0),
            Material::Log,
        );
        let verdict = evaluate(&host, &config, &event);

        let falling: Vec<PendingMutation> = (66..70)
            .map(|y| PendingMutation::ApplyPhysics { pos: BlockPos::new(0, y, 0) })
            .collect();
        assert_eq!(verdict.mutations, falling);
    }

    #[test]
    fn test_trunk_below_zero_finds_its_root() {
        let mut host = host(Environment::Normal);
        let world = world_id();
        host.set_min_height(&world, -64);
        host.set_block(&world, BlockPos::new(0, -10, 0), Material::Dirt);
        for y in -9..-3 {
            host.set_block(&world, BlockPos::new(0, y, 0), Material::Log);
        }
        let config = only(config(), &[BoolKey::BetterTreeChopping]);

        let event = break_event(
            survivor(BlockPos::new(1, -8, 0), Material::Air),
            BlockPos::new(0, -6, 0),
            Material::Log,
        );
        let verdict = evaluate(&host, &config, &event);

        let falling: Vec<PendingMutation> = (-5..-3)
            .map(|y| PendingMutation::ApplyPhysics { pos: BlockPos::new(0, y, 0) })
            .collect();
        assert_eq!(verdict.mutations, falling);
    }

    #[test]
    fn test_floating_trunk_stays() {
        let mut host = host(Environment::Normal);
        let world = world_id();
        host.set_block(&world, BlockPos::new(0, 63, 0), Material::Stone);
        for y in 64..68 {
            host.set_block(&world, BlockPos::new(0, y, 0), Material::Log);
        }
        let config = only(config(), &[BoolKey::BetterTreeChopping]);
        let event = break_event(
            survivor(BlockPos::new(1, 64, 0), Material::Air),
            BlockPos::new(0, 64, 0),
            Material::Log,
        );
        assert!(evaluate(&host, &config, &event).mutations.is_empty());
    }

    #[test]
    fn test_netherrack_ignites_on_netherrack() {
        let mut host = host(Environment::Nether);
        let pos = BlockPos::new(0, 40, 0);
        host.set_block(&world_id(), pos.relative(BlockFace::Down), Material::Netherrack);
        let config = only(config(), &[]).with_percent(PercentKey::BrokenNetherrackCatchesFire, 100);

        let event = break_event(
            survivor(BlockPos::new(0, 41, 1), Material::Air),
            pos,
            Material::Netherrack,
        );
        let verdict = evaluate(&host, &config, &event);
        match verdict.decision {
            crate::rules::Decision::Veto(veto) => {
                assert_eq!(veto.reason, VetoReason::NetherrackIgnited);
                assert_eq!(veto.substitute, Some(Material::Fire));
            }
            other => panic!("expected veto, got {other:?}"),
        }
    }

    #[test]
    fn test_netherrack_over_air_never_ignites() {
        let host = host(Environment::Nether);
        let config = only(config(), &[]).with_percent(PercentKey::BrokenNetherrackCatchesFire, 100);
        let event = break_event(
            survivor(BlockPos::new(0, 41, 1), Material::Air),
            BlockPos::new(0, 40, 0),
            Material::Netherrack,
        );
        assert!(!evaluate(&host, &config, &event).is_vetoed());
    }

    #[test]
    fn test_zero_percent_never_ignites() {
        let mut host = host(Environment::Nether);
        let pos = BlockPos::new(0, 40, 0);
        host.set_block(&world_id(), pos.relative(BlockFace::Down), Material::Netherrack);
        let config = only(config(), &[]).with_percent(PercentKey::BrokenNetherrackCatchesFire, 0);
        let event = break_event(
            survivor(BlockPos::new(0, 41, 1), Material::Air),
            pos,
            Material::Netherrack,
        );
        for seed in 0..20 {
            assert!(!run(&pipeline(), &event, &host, &config, seed).is_vetoed());
        }
    }

    #[test]
    fn test_wart_harvest_drops_one() {
        let host = host(Environment::Nether);
        let config = only(config(), &[BoolKey::NoFarmingNetherWart]);
        let event = break_event(
            survivor(BlockPos::new(0, 41, 1), Material::Air),
            BlockPos::new(0, 40, 0),
            Material::NetherWarts,
        );
        let verdict = evaluate(&host, &config, &event);
        assert_eq!(
            verdict.mutations,
            vec![PendingMutation::ReplaceDrops {
                drops: vec![ItemDrop::new(Material::NetherStalk, 1)],
            }]
        );
    }
}

//! Deferred task scheduler
//!
//! Rules never wait. Anything that must happen later is handed here as a
//! [`ScheduledAction`] with a delay in ticks and fires when the host's tick
//! reaches it. Actions due on the same tick fire in submission order.
//!
//! An action whose chunk or world vanished before it fired does nothing.

use rand::seq::SliceRandom;
use rand::RngCore;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::core::material::Material;
use crate::core::types::{BlockPos, ChunkCoord, Tick, WorldId};
use crate::host::WorldMutator;

/// Delay between consecutive chunks of a storm torch sweep
pub const TORCH_DECAY_STRIDE: Tick = 20;

/// What a deferred action does when it fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionPayload {
    /// Turn a freshly dispensed water source back into air
    EvaporateWater(BlockPos),
    /// Knock out torches open to the sky in one chunk
    RemoveExposedTorches(ChunkCoord),
}

/// A follow-up mutation and how long to wait before it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledAction {
    pub world: WorldId,
    pub delay: Tick,
    pub payload: ActionPayload,
}

impl ScheduledAction {
    pub fn new(world: WorldId, delay: Tick, payload: ActionPayload) -> Self {
        Self { world, delay, payload }
    }
}

/// An action that came due
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueAction {
    pub due: Tick,
    pub world: WorldId,
    pub payload: ActionPayload,
}

/// Result of firing one action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action changed this many blocks
    Applied(usize),
    /// Target gone or conditions no longer hold
    NoOp,
}

#[derive(Debug, Clone)]
struct QueuedAction {
    due: Tick,
    seq: u64,
    world: WorldId,
    payload: ActionPayload,
}

// Ordering: (due ASC, seq ASC); payload does not take part.
impl PartialEq for QueuedAction {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for QueuedAction {}

impl PartialOrd for QueuedAction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedAction {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .cmp(&other.due)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

#[derive(Debug, Default)]
pub struct DeferredScheduler {
    queue: BinaryHeap<Reverse<QueuedAction>>,
    next_seq: u64,
    current_tick: Tick,
}

impl DeferredScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue `action` to fire `action.delay` ticks from now; returns the due tick
    pub fn schedule(&mut self, action: ScheduledAction) -> Tick {
        let due = self.current_tick.saturating_add(action.delay);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(QueuedAction {
            due,
            seq,
            world: action.world,
            payload: action.payload,
        }));
        due
    }

    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Advance the clock (never backwards) and pop everything due by then
    pub fn drain_due(&mut self, tick: Tick) -> Vec<DueAction> {
        if tick > self.current_tick {
            self.current_tick = tick;
        }

        let mut due = Vec::new();
        while let Some(Reverse(next)) = self.queue.peek() {
            if next.due > self.current_tick {
                break;
            }
            if let Some(Reverse(action)) = self.queue.pop() {
                due.push(DueAction {
                    due: action.due,
                    world: action.world,
                    payload: action.payload,
                });
            }
        }
        due
    }

    /// Fire every action due by `tick` against the host; returns how many fired
    pub fn on_tick<W: WorldMutator + ?Sized>(&mut self, tick: Tick, host: &mut W) -> usize {
        let due = self.drain_due(tick);
        let fired = due.len();
        for action in due {
            let outcome = execute(&action.world, &action.payload, host);
            tracing::trace!(
                world = %action.world,
                payload = ?action.payload,
                ?outcome,
                "deferred action fired"
            );
        }
        fired
    }
}

/// Run one action now
pub fn execute<W: WorldMutator + ?Sized>(
    world: &WorldId,
    payload: &ActionPayload,
    host: &mut W,
) -> ActionOutcome {
    match payload {
        ActionPayload::EvaporateWater(pos) => evaporate_water(world, *pos, host),
        ActionPayload::RemoveExposedTorches(chunk) => remove_exposed_torches(world, *chunk, host),
    }
}

fn evaporate_water<W: WorldMutator + ?Sized>(
    world: &WorldId,
    pos: BlockPos,
    host: &mut W,
) -> ActionOutcome {
    match host.material_at(world, pos) {
        Some(material) if material.is_water() => {
            match host.set_material(world, pos, Material::Air) {
                Ok(()) => ActionOutcome::Applied(1),
                Err(_) => ActionOutcome::NoOp,
            }
        }
        _ => ActionOutcome::NoOp,
    }
}

/// Scan each column from the sky down; torches above the first solid block go
fn remove_exposed_torches<W: WorldMutator + ?Sized>(
    world: &WorldId,
    chunk: ChunkCoord,
    host: &mut W,
) -> ActionOutcome {
    if !host.is_chunk_loaded(world, chunk) || !host.is_raining(world) {
        return ActionOutcome::NoOp;
    }

    let (bottom, top) = (host.min_height(world), host.max_height(world));
    let mut exposed = Vec::new();
    for (x, z) in chunk.columns() {
        for y in (bottom..top).rev() {
            let pos = BlockPos::new(x, y, z);
            match host.material_at(world, pos) {
                Some(Material::Air) => continue,
                Some(Material::Torch) => exposed.push(pos),
                _ => break,
            }
        }
    }

    let removed = exposed
        .into_iter()
        .filter(|pos| host.set_material(world, *pos, Material::Air).is_ok())
        .count();
    if removed == 0 {
        ActionOutcome::NoOp
    } else {
        ActionOutcome::Applied(removed)
    }
}

/// Uniformly random permutation of `0..len` (Fisher-Yates)
pub fn shuffled_order<R: RngCore + ?Sized>(len: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(rng);
    order
}

/// One torch sweep per chunk, in shuffled order, `TORCH_DECAY_STRIDE` ticks apart
pub fn storm_decay_plan<R: RngCore + ?Sized>(
    world: &WorldId,
    chunks: &[ChunkCoord],
    rng: &mut R,
) -> Vec<ScheduledAction> {
    shuffled_order(chunks.len(), rng)
        .into_iter()
        .enumerate()
        .map(|(slot, chunk_idx)| {
            ScheduledAction::new(
                world.clone(),
                slot as Tick * TORCH_DECAY_STRIDE,
                ActionPayload::RemoveExposedTorches(chunks[chunk_idx]),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Environment;
    use crate::host::MemoryWorld;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn world() -> WorldId {
        WorldId::new("world")
    }

    fn evaporate(x: i32) -> ScheduledAction {
        ScheduledAction::new(world(), 0, ActionPayload::EvaporateWater(BlockPos::new(x, 64, 0)))
    }

    #[test]
    fn test_same_tick_fires_in_submission_order() {
        let mut scheduler = DeferredScheduler::new();
        for x in 0..5 {
            scheduler.schedule(ScheduledAction { delay: 3, ..evaporate(x) });
        }

        assert!(scheduler.drain_due(2).is_empty());
        let due = scheduler.drain_due(3);
        let xs: Vec<i32> = due
            .iter()
            .map(|a| match a.payload {
                ActionPayload::EvaporateWater(pos) => pos.x,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(xs, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_earlier_due_fires_first_regardless_of_submission() {
        let mut scheduler = DeferredScheduler::new();
        scheduler.schedule(ScheduledAction { delay: 10, ..evaporate(1) });
        scheduler.schedule(ScheduledAction { delay: 2, ..evaporate(2) });

        let due = scheduler.drain_due(20);
        assert_eq!(due[0].due, 2);
        assert_eq!(due[1].due, 10);
    }

    #[test]
    fn test_delay_is_relative_to_current_tick() {
        let mut scheduler = DeferredScheduler::new();
        scheduler.drain_due(100);
        assert_eq!(scheduler.schedule(ScheduledAction { delay: 1, ..evaporate(0) }), 101);
        assert!(scheduler.drain_due(100).is_empty());
        assert_eq!(scheduler.drain_due(101).len(), 1);
    }

    #[test]
    fn test_clock_never_runs_backwards() {
        let mut scheduler = DeferredScheduler::new();
        scheduler.drain_due(50);
        scheduler.drain_due(10);
        assert_eq!(scheduler.current_tick(), 50);
    }

    #[test]
    fn test_evaporate_only_touches_water() {
        let mut host = MemoryWorld::new();
        host.add_world(world(), Environment::Normal);
        let wet = BlockPos::new(0, 64, 0);
        let dry = BlockPos::new(1, 64, 0);
        host.set_block(&world(), wet, Material::StationaryWater);
        host.set_block(&world(), dry, Material::Stone);

        assert_eq!(
            execute(&world(), &ActionPayload::EvaporateWater(wet), &mut host),
            ActionOutcome::Applied(1)
        );
        assert_eq!(
            execute(&world(), &ActionPayload::EvaporateWater(dry), &mut host),
            ActionOutcome::NoOp
        );
        assert_eq!(host.block(&world(), wet), Material::Air);
        assert_eq!(host.block(&world(), dry), Material::Stone);
    }

    #[test]
    fn test_unloaded_target_is_silent_noop() {
        let mut host = MemoryWorld::new();
        host.add_world(world(), Environment::Normal);
        let pos = BlockPos::new(0, 64, 0);
        host.set_block(&world(), pos, Material::Water);
        host.unload_chunk(&world(), pos.chunk());

        let mut scheduler = DeferredScheduler::new();
        scheduler.schedule(ScheduledAction::new(world(), 1, ActionPayload::EvaporateWater(pos)));
        scheduler.schedule(ScheduledAction::new(
            WorldId::new("gone"),
            1,
            ActionPayload::RemoveExposedTorches(ChunkCoord::new(0, 0)),
        ));

        assert_eq!(scheduler.on_tick(1, &mut host), 2);
        assert!(host.ops.is_empty());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_torch_sweep_removes_only_sky_exposed_torches() {
        let mut host = MemoryWorld::new();
        host.add_world(world(), Environment::Normal);
        host.set_max_height(&world(), 80);
        host.set_raining(&world(), true);

        let open = BlockPos::new(3, 70, 3);
        let roofed = BlockPos::new(5, 65, 5);
        let cave = BlockPos::new(3, 40, 3);
        host.set_block(&world(), open, Material::Torch);
        host.set_block(&world(), BlockPos::new(3, 69, 3), Material::Grass);
        host.set_block(&world(), cave, Material::Torch);
        host.set_block(&world(), roofed, Material::Torch);
        host.set_block(&world(), BlockPos::new(5, 72, 5), Material::Stone);

        let outcome = execute(
            &world(),
            &ActionPayload::RemoveExposedTorches(ChunkCoord::new(0, 0)),
            &mut host,
        );

        assert_eq!(outcome, ActionOutcome::Applied(1));
        assert_eq!(host.block(&world(), open), Material::Air);
        assert_eq!(host.block(&world(), roofed), Material::Torch);
        assert_eq!(host.block(&world(), cave), Material::Torch);
    }

    #[test]
    fn test_torch_sweep_reaches_below_zero() {
        let mut host = MemoryWorld::new();
        host.add_world(world(), Environment::Normal);
        host.set_min_height(&world(), -64);
        host.set_raining(&world(), true);

        let deep = BlockPos::new(2, -20, 2);
        host.set_block(&world(), BlockPos::new(2, -21, 2), Material::Stone);
        host.set_block(&world(), deep, Material::Torch);

        let outcome = execute(
            &world(),
            &ActionPayload::RemoveExposedTorches(ChunkCoord::new(0, 0)),
            &mut host,
        );
        assert_eq!(outcome, ActionOutcome::Applied(1));
        assert_eq!(host.block(&world(), deep), Material::Air);
    }

    #[test]
    fn test_torch_sweep_waits_for_rain() {
        let mut host = MemoryWorld::new();
        host.add_world(world(), Environment::Normal);
        host.set_block(&world(), BlockPos::new(0, 100, 0), Material::Torch);

        let outcome = execute(
            &world(),
            &ActionPayload::RemoveExposedTorches(ChunkCoord::new(0, 0)),
            &mut host,
        );
        assert_eq!(outcome, ActionOutcome::NoOp);
        assert_eq!(host.block(&world(), BlockPos::new(0, 100, 0)), Material::Torch);
    }

    #[test]
    fn test_shuffled_order_is_seed_reproducible() {
        let a = shuffled_order(32, &mut ChaCha8Rng::seed_from_u64(7));
        let b = shuffled_order(32, &mut ChaCha8Rng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn shuffled_order_is_a_permutation(len in 0_usize..200, seed in any::<u64>()) {
            let mut order = shuffled_order(len, &mut ChaCha8Rng::seed_from_u64(seed));
            order.sort_unstable();
            prop_assert_eq!(order, (0..len).collect::<Vec<_>>());
        }

        #[test]
        fn storm_delays_are_fixed_stride_multiset(k in 0_i32..120, seed in any::<u64>()) {
            let chunks: Vec<ChunkCoord> = (0..k).map(|i| ChunkCoord::new(i, -i)).collect();
            let plan = storm_decay_plan(&world(), &chunks, &mut ChaCha8Rng::seed_from_u64(seed));

            let mut delays: Vec<Tick> = plan.iter().map(|a| a.delay).collect();
            delays.sort_unstable();
            let expected: Vec<Tick> = (0..k as Tick).map(|i| i * TORCH_DECAY_STRIDE).collect();
            prop_assert_eq!(delays, expected);

            let mut swept: Vec<ChunkCoord> = plan
                .iter()
                .map(|a| match a.payload {
                    ActionPayload::RemoveExposedTorches(c) => c,
                    _ => unreachable!(),
                })
                .collect();
            swept.sort_by_key(|c| (c.x, c.z));
            let mut all = chunks.clone();
            all.sort_by_key(|c| (c.x, c.z));
            prop_assert_eq!(swept, all);
        }
    }
}

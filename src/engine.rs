//! Event dispatcher
//!
//! The engine owns the rule book, the deferred scheduler, the config handle
//! and the rng. The host is passed into every call, never stored, so the
//! engine can sit beside whatever owns the world.
//!
//! One dispatch works from one config snapshot: the `Arc` is taken before
//! the pipeline runs, so a reload landing mid-dispatch is only seen by the
//! next event.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::sync::Arc;

use crate::core::config::{ConfigHandle, RuleConfig, SetKey};
use crate::core::types::{Tick, WorldId};
use crate::event::{BlockEvent, EventContext};
use crate::host::{has_capability, Capability, Host, WorldMutator};
use crate::notify::{notify, Delivery};
use crate::rules::{Decision, PendingMutation, RuleBook, RuleEnv, RuleVerdict, Scope, VetoReason};
use crate::scheduler::DeferredScheduler;

/// What the host should do with the event it handed over
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Let the event proceed; the engine already applied its side effects
    Allowed { mutations: usize, scheduled: usize },
    /// Cancel the event
    Cancelled { reason: VetoReason },
}

impl DispatchOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DispatchOutcome::Cancelled { .. })
    }
}

pub struct Engine {
    config: ConfigHandle,
    rules: RuleBook,
    scheduler: DeferredScheduler,
    rng: ChaCha8Rng,
}

impl Engine {
    pub fn new(config: RuleConfig, seed: u64) -> Self {
        Self::with_handle(ConfigHandle::new(config), seed)
    }

    /// Share an existing handle, e.g. one a file watcher reloads
    pub fn with_handle(config: ConfigHandle, seed: u64) -> Self {
        Self {
            config,
            rules: RuleBook::standard(),
            scheduler: DeferredScheduler::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn with_rules(mut self, rules: RuleBook) -> Self {
        self.rules = rules;
        self
    }

    /// Run the pipeline for `event` without touching the host
    ///
    /// `None` when no pipeline handles the event.
    pub fn evaluate<H: Host>(&mut self, event: &BlockEvent, host: &H) -> Option<RuleVerdict> {
        let config = self.config.snapshot();
        let ctx = EventContext::from_event(event, host)?;
        Some(self.evaluate_with(&ctx, &config, host))
    }

    fn evaluate_with<H: Host>(
        &mut self,
        ctx: &EventContext,
        config: &RuleConfig,
        host: &H,
    ) -> RuleVerdict {
        let Some(pipeline) = self.rules.pipeline(ctx.kind) else {
            return RuleVerdict::allow();
        };

        // Only scoped pipelines care, and only inside active worlds
        let scoped = pipeline.scope == Scope::ActiveWorlds
            && config.is_active_world(ctx.world.as_str());
        let bypass = match &ctx.subject {
            Some(subject) if scoped => has_capability(host, subject.id, Capability::Bypass),
            _ => false,
        };

        let mut env = RuleEnv {
            ctx,
            config,
            world: host,
            bypass,
            rng: &mut self.rng,
        };
        pipeline.evaluate(&mut env)
    }

    /// Evaluate `event` and apply the verdict to `host`
    pub fn dispatch<H: Host>(&mut self, event: &BlockEvent, host: &mut H) -> DispatchOutcome {
        let config: Arc<RuleConfig> = self.config.snapshot();
        let Some(ctx) = EventContext::from_event(event, &*host) else {
            tracing::trace!("event not handled, passing through");
            return DispatchOutcome::Allowed { mutations: 0, scheduled: 0 };
        };

        let verdict = self.evaluate_with(&ctx, &config, &*host);
        match verdict.decision {
            Decision::Veto(veto) => {
                if let Some(material) = veto.substitute {
                    if let Err(err) = host.set_material(&ctx.world, ctx.target, material) {
                        tracing::debug!(%err, "substitute block not placed");
                    }
                }
                if let (Some(notice), Some(subject)) = (veto.notice, &ctx.subject) {
                    if notify(host, subject.id, &notice) == Delivery::Suppressed {
                        tracing::trace!(subject = %subject.id, "notice suppressed");
                    }
                }
                DispatchOutcome::Cancelled { reason: veto.reason }
            }
            Decision::Allow => {
                let mutations = verdict
                    .mutations
                    .into_iter()
                    .filter(|m| apply_mutation(&ctx.world, m, host))
                    .count();
                let scheduled = verdict.scheduled.len();
                for action in verdict.scheduled {
                    self.scheduler.schedule(action);
                }
                DispatchOutcome::Allowed { mutations, scheduled }
            }
        }
    }

    /// Fire deferred actions due by `tick`
    pub fn on_tick<H: WorldMutator + ?Sized>(&mut self, tick: Tick, host: &mut H) -> usize {
        self.scheduler.on_tick(tick, host)
    }

    pub fn reload_config(&self, config: RuleConfig) {
        let worlds = config.get_string_set(SetKey::Worlds).len();
        self.config.reload(config);
        tracing::info!(worlds, "rule config reloaded");
    }

    pub fn config_handle(&self) -> ConfigHandle {
        self.config.clone()
    }

    pub fn scheduler(&self) -> &DeferredScheduler {
        &self.scheduler
    }
}

/// Returns false when the host refused the mutation
fn apply_mutation<W: WorldMutator + ?Sized>(
    world: &WorldId,
    mutation: &PendingMutation,
    host: &mut W,
) -> bool {
    match mutation {
        PendingMutation::SetMaterial { pos, material } => {
            match host.set_material(world, *pos, material.clone()) {
                Ok(()) => true,
                Err(err) => {
                    tracing::debug!(%err, "mutation skipped");
                    false
                }
            }
        }
        PendingMutation::DegradeTool { subject, amount } => {
            host.degrade_tool(*subject, *amount);
            true
        }
        PendingMutation::ReplaceDrops { drops } => {
            host.clear_drops();
            for drop in drops {
                host.add_drop(drop.clone());
            }
            true
        }
        PendingMutation::ApplyPhysics { pos } => {
            host.apply_physics(world, *pos);
            true
        }
    }
}

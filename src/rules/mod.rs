//! Rule pipelines - one ordered rule list per event kind
//!
//! A rule looks at the event and the config snapshot and answers with a
//! [`RuleStep`]. A pipeline folds its rules left to right: mutations and
//! scheduled actions accumulate, and the first veto ends the fold and throws
//! the accumulated work away. Post-effects run only after a fold that did not
//! veto, and can never veto themselves.

pub mod breaking;
pub mod loader;
pub mod natural;
pub mod placing;

pub use loader::{load_rule_config, parse_rule_config};

use ahash::AHashMap;
use rand::RngCore;
use serde::Serialize;

use crate::core::config::RuleConfig;
use crate::core::material::{ItemDrop, Material};
use crate::core::types::{BlockPos, SubjectId};
use crate::event::{EventContext, EventKind, Subject};
use crate::host::BlockView;
use crate::notify::Notice;
use crate::scheduler::ScheduledAction;

/// Why an event was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VetoReason {
    LimitedEndBuilding,
    StoneTooHard,
    OreAgainstStone,
    NoWartFarming,
    TorchTooDeep,
    UnrealisticPlacement,
    SoftTorchSurface,
    NetherrackIgnited,
    PistonMovesOre,
    CropWithered,
    AridDesert,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Veto {
    pub reason: VetoReason,
    pub notice: Option<Notice>,
    /// Material the target block becomes instead of what the event wanted
    pub substitute: Option<Material>,
}

impl Veto {
    pub fn new(reason: VetoReason) -> Self {
        Self {
            reason,
            notice: None,
            substitute: None,
        }
    }

    pub fn notify(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }

    pub fn substitute(mut self, material: Material) -> Self {
        self.substitute = Some(material);
        self
    }
}

/// A host mutation applied right after an allowed event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingMutation {
    SetMaterial { pos: BlockPos, material: Material },
    DegradeTool { subject: SubjectId, amount: u32 },
    /// Replace the event's drops with exactly these
    ReplaceDrops { drops: Vec<ItemDrop> },
    ApplyPhysics { pos: BlockPos },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuleStep {
    Continue,
    Veto(Veto),
    Mutate(Vec<PendingMutation>),
    Schedule(Vec<ScheduledAction>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Allow,
    Veto(Veto),
}

/// Aggregate result of one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct RuleVerdict {
    pub decision: Decision,
    pub mutations: Vec<PendingMutation>,
    pub scheduled: Vec<ScheduledAction>,
}

impl RuleVerdict {
    pub fn allow() -> Self {
        Self {
            decision: Decision::Allow,
            mutations: Vec::new(),
            scheduled: Vec::new(),
        }
    }

    pub fn veto(veto: Veto) -> Self {
        Self {
            decision: Decision::Veto(veto),
            mutations: Vec::new(),
            scheduled: Vec::new(),
        }
    }

    pub fn is_vetoed(&self) -> bool {
        matches!(self.decision, Decision::Veto(_))
    }

    pub fn veto_reason(&self) -> Option<VetoReason> {
        match &self.decision {
            Decision::Veto(v) => Some(v.reason),
            Decision::Allow => None,
        }
    }
}

/// Everything a rule may look at
pub struct RuleEnv<'a> {
    pub ctx: &'a EventContext,
    pub config: &'a RuleConfig,
    pub world: &'a dyn BlockView,
    /// Subject holds the universal bypass capability (resolved once per dispatch)
    pub bypass: bool,
    pub rng: &'a mut dyn RngCore,
}

impl<'a> RuleEnv<'a> {
    pub fn subject(&self) -> Option<&Subject> {
        self.ctx.subject.as_ref()
    }

    /// False for natural events
    pub fn consequence_free(&self) -> bool {
        self.subject().map(|s| s.is_consequence_free()).unwrap_or(false)
    }

    /// Unreachable blocks read as air
    pub fn material_at(&self, pos: BlockPos) -> Material {
        self.world.material_at(&self.ctx.world, pos).unwrap_or_default()
    }

    /// True with `percent`% probability
    pub fn roll(&mut self, percent: u8) -> bool {
        use rand::Rng;
        self.rng.gen_range(0..100u8) < percent
    }

    /// Realm is active and the subject (if any) is not exempt
    fn in_scope(&self) -> bool {
        self.config.is_active_world(self.ctx.world.as_str()) && !self.bypass
    }
}

pub type RuleFn = fn(&mut RuleEnv<'_>) -> RuleStep;
pub type EffectFn = fn(&RuleEnv<'_>) -> Vec<PendingMutation>;

#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub check: RuleFn,
}

#[derive(Clone, Copy)]
pub struct PostEffect {
    pub name: &'static str,
    pub apply: EffectFn,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

impl std::fmt::Debug for PostEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// Whether a pipeline honours the active-realm and bypass pre-check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Skip unless the realm is active and the subject lacks bypass
    ActiveWorlds,
    /// Always evaluate
    Everywhere,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    pub kind: EventKind,
    pub scope: Scope,
    pub rules: Vec<Rule>,
    pub post_effects: Vec<PostEffect>,
}

impl Pipeline {
    pub fn new(kind: EventKind, scope: Scope) -> Self {
        Self {
            kind,
            scope,
            rules: Vec::new(),
            post_effects: Vec::new(),
        }
    }

    pub fn rule(mut self, name: &'static str, check: RuleFn) -> Self {
        self.rules.push(Rule { name, check });
        self
    }

    pub fn post_effect(mut self, name: &'static str, apply: EffectFn) -> Self {
        self.post_effects.push(PostEffect { name, apply });
        self
    }

    pub fn evaluate(&self, env: &mut RuleEnv<'_>) -> RuleVerdict {
        if self.scope == Scope::ActiveWorlds && !env.in_scope() {
            return RuleVerdict::allow();
        }

        let mut verdict = RuleVerdict::allow();
        for rule in &self.rules {
            match (rule.check)(env) {
                RuleStep::Continue => {}
                RuleStep::Mutate(mutations) => verdict.mutations.extend(mutations),
                RuleStep::Schedule(actions) => verdict.scheduled.extend(actions),
                RuleStep::Veto(veto) => {
                    tracing::debug!(
                        rule = rule.name,
                        reason = ?veto.reason,
                        world = %env.ctx.world,
                        pos = ?env.ctx.target,
                        "event vetoed"
                    );
                    return RuleVerdict::veto(veto);
                }
            }
        }

        for effect in &self.post_effects {
            verdict.mutations.extend((effect.apply)(env));
        }
        verdict
    }
}

/// The full set of pipelines, keyed by event kind
#[derive(Debug, Clone)]
pub struct RuleBook {
    pipelines: AHashMap<EventKind, Pipeline>,
}

impl RuleBook {
    pub fn empty() -> Self {
        Self {
            pipelines: AHashMap::new(),
        }
    }

    /// Stock rule set covering every event kind
    pub fn standard() -> Self {
        let mut book = Self::empty();
        book.insert(breaking::pipeline());
        book.insert(placing::pipeline());
        for pipeline in natural::pipelines() {
            book.insert(pipeline);
        }
        book
    }

    pub fn insert(&mut self, pipeline: Pipeline) {
        self.pipelines.insert(pipeline.kind, pipeline);
    }

    pub fn pipeline(&self, kind: EventKind) -> Option<&Pipeline> {
        self.pipelines.get(&kind)
    }
}

impl Default for RuleBook {
    fn default() -> Self {
        Self::standard()
    }
}

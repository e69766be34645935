//! Hardmode Rules - block-event rule engine for hardened survival worlds
//!
//! The host hands each world event to [`Engine::dispatch`], which runs the
//! matching rule pipeline against a config snapshot and either cancels the
//! event or applies its side effects. Follow-up work (evaporating dispensed
//! water, storm torch sweeps) is queued in the engine's scheduler and fired
//! from [`Engine::on_tick`].

pub mod core;
pub mod engine;
pub mod event;
pub mod host;
pub mod notify;
pub mod rules;
pub mod scheduler;

pub use engine::{DispatchOutcome, Engine};
pub use event::{BlockEvent, Subject};
pub use host::{Host, MemoryWorld};

//! Replay Runner
//!
//! Feeds a JSON-lines script of world setup steps and block events through the
//! engine against an in-memory world, and prints one JSON line per event
//! followed by a summary.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use hardmode_rules::core::error::{HardmodeError, Result};
use hardmode_rules::core::material::Material;
use hardmode_rules::core::types::{BlockPos, ChunkCoord, Environment, SubjectId, Tick, WorldId};
use hardmode_rules::host::Capability;
use hardmode_rules::notify::TomlCatalog;
use hardmode_rules::rules::load_rule_config;
use hardmode_rules::{BlockEvent, DispatchOutcome, Engine, MemoryWorld};

/// Replay block events against the hardmode rules
#[derive(Parser, Debug)]
#[command(name = "replay")]
#[command(about = "Replay a JSON-lines event script through the hardmode rule engine")]
struct Args {
    /// Rule config TOML
    #[arg(long)]
    config: PathBuf,

    /// Message catalog TOML (English defaults when omitted)
    #[arg(long)]
    messages: Option<PathBuf>,

    /// JSON-lines script of steps
    #[arg(long)]
    events: PathBuf,

    /// Random seed for deterministic runs
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Pre-register a world, as name=environment (normal, nether, end)
    #[arg(long = "world", value_parser = parse_world)]
    worlds: Vec<(WorldId, Environment)>,
}

fn parse_world(arg: &str) -> std::result::Result<(WorldId, Environment), String> {
    let (name, env) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected name=environment, got '{}'", arg))?;
    let environment = match env.to_ascii_lowercase().as_str() {
        "normal" => Environment::Normal,
        "nether" => Environment::Nether,
        "end" => Environment::End,
        other => return Err(format!("unknown environment '{}'", other)),
    };
    Ok((WorldId::new(name), environment))
}

/// One line of the script
#[derive(Debug, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
enum Step {
    AddWorld { world: WorldId, environment: Environment },
    SetBlock { world: WorldId, pos: BlockPos, material: Material },
    LoadChunk { world: WorldId, chunk: ChunkCoord },
    Rain { world: WorldId, raining: bool },
    Grant { subject: SubjectId, capability: Capability },
    Tick { tick: Tick },
    Event { event: BlockEvent },
}

#[derive(Serialize)]
struct EventLine {
    line: usize,
    #[serde(flatten)]
    outcome: DispatchOutcome,
}

#[derive(Serialize, Default)]
struct Summary {
    last_tick: Tick,
    events: usize,
    allowed: usize,
    cancelled: usize,
    actions_fired: usize,
    actions_pending: usize,
    host_ops: usize,
    messages: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("hardmode_rules=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = load_rule_config(&args.config)?;
    let catalog = match &args.messages {
        Some(path) => TomlCatalog::load(path)?,
        None => TomlCatalog::english(),
    };

    let mut host = MemoryWorld::with_catalog(catalog);
    for (world, environment) in &args.worlds {
        host.add_world(world.clone(), *environment);
    }
    let mut engine = Engine::new(config, args.seed);
    let mut summary = Summary::default();

    let reader = BufReader::new(File::open(&args.events)?);
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let number = idx + 1;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        let step: Step = serde_json::from_str(&line)
            .map_err(|e| HardmodeError::InvalidStep(format!("line {}: {}", number, e)))?;

        match step {
            Step::AddWorld { world, environment } => host.add_world(world, environment),
            Step::SetBlock { world, pos, material } => host.set_block(&world, pos, material),
            Step::LoadChunk { world, chunk } => host.load_chunk(&world, chunk),
            Step::Rain { world, raining } => host.set_raining(&world, raining),
            Step::Grant { subject, capability } => host.grant(subject, capability),
            Step::Tick { tick } => summary.actions_fired += engine.on_tick(tick, &mut host),
            Step::Event { event } => {
                let outcome = engine.dispatch(&event, &mut host);
                summary.events += 1;
                if outcome.is_cancelled() {
                    summary.cancelled += 1;
                } else {
                    summary.allowed += 1;
                }
                println!("{}", serde_json::to_string(&EventLine { line: number, outcome })?);
            }
        }
    }

    summary.last_tick = engine.scheduler().current_tick();
    summary.actions_pending = engine.scheduler().len();
    summary.host_ops = host.ops.len();
    summary.messages = host.messages.len();
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

// src/main.rs
//
// Research-harness CLI for the gloam agent core.
//
// Runs one deterministic episode in the scripted arena: the controller
// drives evaluation/decision/memory/reward, the SimWorld emulates combat
// and movement, and lifecycle events are fed back as reward signals.
// Prints the episode summary as JSON on exit.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};

use gloam::config::AgentConfig;
use gloam::controller::AgentController;
use gloam::policy::{HeuristicPolicy, NoopPolicy, Policy};
use gloam::reward::EpisodeSummary;
use gloam::sim::SimWorld;
use gloam::telemetry::{FileSink, NoopSink, TelemetrySink};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum PolicyArg {
    /// Deterministic rule-based brain.
    Heuristic,
    /// Brain that always idles (fallback steering drives movement).
    Noop,
    /// No brain at all: fallback-only movement, no learning signal.
    None,
}

#[derive(Debug, Parser)]
#[command(
    name = "gloam",
    about = "Agent decision/reward harness simulator",
    version
)]
struct Args {
    /// Number of simulated ticks to run.
    #[arg(long, default_value_t = 2000)]
    ticks: u64,

    /// Fixed tick duration in seconds.
    #[arg(long, default_value_t = 0.05)]
    dt: f32,

    /// Deterministic world seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Policy wired into the controller.
    #[arg(long, value_enum, default_value_t = PolicyArg::Heuristic)]
    policy: PolicyArg,

    /// Optional JSONL telemetry output path.
    #[arg(long)]
    telemetry: Option<String>,

    /// Verbosity: -v, -vv
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let cfg = AgentConfig::default();
    println!(
        "gloam | cfg={} | ticks={} | dt={} | seed={} | policy={:?}",
        cfg.version, args.ticks, args.dt, args.seed, args.policy
    );

    let summary = match &args.telemetry {
        Some(path) => {
            let sink = FileSink::create(path)
                .with_context(|| format!("creating telemetry sink at {path}"))?;
            run_episode(&args, cfg, sink)
        }
        None => run_episode(&args, cfg, NoopSink),
    };

    match summary {
        Some(summary) => {
            let json = serde_json::to_string(&summary).context("serializing summary")?;
            println!("{json}");
        }
        None => println!("episode did not close"),
    }

    Ok(())
}

fn run_episode<S: TelemetrySink>(
    args: &Args,
    cfg: AgentConfig,
    sink: S,
) -> Option<EpisodeSummary> {
    let world = SimWorld::new(args.seed);
    let mut controller = AgentController::new(cfg, world, sink);

    let policy: Option<Box<dyn Policy>> = match args.policy {
        PolicyArg::Heuristic => Some(Box::new(HeuristicPolicy::new())),
        PolicyArg::Noop => Some(Box::new(NoopPolicy)),
        PolicyArg::None => None,
    };
    if let Some(policy) = policy {
        controller = controller.with_policy(policy);
    }

    let dt = args.dt.max(0.001);
    let mut now: f64 = 0.0;
    controller.activate(now);

    for tick in 0..args.ticks {
        now = tick as f64 * dt as f64;
        controller.tick(now, dt);

        // Host-side combat: resolve the latched attack intent, then let
        // the world fight back.
        if controller.take_attack_request() {
            if let Some(damage) = controller.world_mut().try_agent_attack() {
                controller.notify_damage_dealt(damage, now);
                if controller.world().opponent_defeated() {
                    controller.notify_opponent_killed(now);
                    controller.world_mut().respawn_opponent();
                }
            }
        }

        let events = controller.world_mut().step(dt);
        if let Some(damage) = events.damage_taken {
            controller.notify_damage_taken(damage, now);
        }
        if events.agent_died {
            let summary = controller.notify_death(now);
            if args.verbose > 0 {
                eprintln!("agent died at t={now:.2}");
            }
            return summary;
        }

        if args.verbose > 1 {
            if let Some(state) = controller.latest_state() {
                eprintln!(
                    "t={now:.2} hp={:.2} dist={:.2} atk={:.2} ret={:.2} exp={:.2}",
                    state.agent_health_ratio,
                    state.distance_to_opponent,
                    state.attack_opportunity,
                    state.retreat_urgency,
                    state.explore_value,
                );
            }
        }
    }

    controller.end_episode(now)
}

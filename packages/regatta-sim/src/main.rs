//! main.rs - Headless regatta harness entry point
//!
//! Lays out a windward/leeward course, spawns a fleet driven by the
//! tactical AI and runs the race to the finish or the time limit:
//!   1. Countdown: boats hold and time their run at the line
//!   2. Gun: OCS boats are flagged and must dip back
//!   3. Racing: upwind/downwind legs through gates, gusts drifting over
//!
//! Runs flat out by default; `--realtime` paces ticks on a tokio interval.
//! `--telemetry out.jsonl` records frames and race events.

mod conditions;
mod gusts;
mod performance;
mod race;
mod telemetry;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{ensure, Context};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use tokio::time::interval;
use tracing::{info, warn};

use conditions::{ConditionsPreset, ConditionsSection};
use race::{BoatPhysicsConfig, RaceConfig, RaceEvent, RaceSim};
use regatta_ai::TacticsConfig;
use telemetry::TelemetryWriter;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "regatta-sim", about = "Regatta Suite tactical AI race harness")]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
    /// RNG seed; random when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Fleet size (overrides [race] n_boats)
    #[arg(long)]
    boats: Option<usize>,
    /// Race time limit in seconds (overrides [race] duration_s)
    #[arg(long)]
    duration: Option<f64>,
    /// Wind conditions preset (overrides [conditions] preset)
    #[arg(long, value_enum)]
    conditions: Option<ConditionsPreset>,
    /// Pace the simulation against the wall clock
    #[arg(long)]
    realtime: bool,
    /// Simulation speed multiplier when pacing (1.0 = real-time)
    #[arg(long, default_value = "1.0")]
    speed: f64,
    /// Write JSON-lines telemetry here
    #[arg(long)]
    telemetry: Option<PathBuf>,
    /// Record every Nth tick to telemetry
    #[arg(long, default_value = "10")]
    telemetry_every: u64,
}

// ── Config ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FullConfig {
    race: RaceConfig,
    boat_physics: BoatPhysicsConfig,
    conditions: ConditionsSection,
    tactics: TacticsConfig,
}

fn load_config(args: &Args) -> anyhow::Result<FullConfig> {
    let raw = match std::fs::read_to_string(&args.config) {
        Ok(s) => s,
        Err(e) => {
            warn!("{}: {e}; using built-in config", args.config.display());
            include_str!("../config.toml").to_string()
        }
    };
    let mut cfg: FullConfig = toml::from_str(&raw).context("parsing config.toml")?;

    if let Some(n) = args.boats {
        cfg.race.n_boats = n;
    }
    if let Some(d) = args.duration {
        cfg.race.duration_s = d;
    }
    if let Some(preset) = args.conditions {
        // a preset picked on the command line wins over file overrides too
        cfg.conditions = ConditionsSection { preset, ..ConditionsSection::default() };
    }

    cfg.tactics.validate().context("invalid [tactics] config")?;
    ensure!(cfg.race.update_rate_hz > 0.0, "race.update_rate_hz must be > 0");
    ensure!(cfg.race.duration_s > 0.0, "race.duration_s must be > 0");
    ensure!(cfg.boat_physics.knots_to_units > 0.0, "boat_physics.knots_to_units must be > 0");
    ensure!(args.speed > 0.0, "--speed must be > 0");
    Ok(cfg)
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "regatta_sim=info,regatta_ai=info".into()),
        )
        .init();

    let args = Args::parse();
    let cfg = load_config(&args)?;
    let conditions = cfg.conditions.resolve();
    let seed = args.seed.unwrap_or_else(rand::random);

    info!(
        "⛵ Regatta sim starting — {} boats, {:?} conditions ({} kt), T-minus {}s, seed {seed}",
        cfg.race.n_boats, conditions.preset, conditions.base_speed, cfg.race.t_minus_seconds
    );

    let mut sim = RaceSim::new(
        &cfg.race,
        &cfg.boat_physics,
        &cfg.tactics,
        &conditions,
        StdRng::seed_from_u64(seed),
    );
    let mut recorder = args.telemetry.as_deref().map(TelemetryWriter::create).transpose()?;

    let dt = 1.0 / cfg.race.update_rate_hz;
    let mut ticker = args
        .realtime
        .then(|| interval(Duration::from_secs_f64(dt / args.speed)));
    let log_every = (cfg.race.update_rate_hz * 10.0).round().max(1.0) as u64;
    let every = args.telemetry_every.max(1);
    let mut epoch: u64 = 0;

    info!("⚓ Sim loop running at {} Hz", cfg.race.update_rate_hz);

    while sim.clock < cfg.race.t_minus_seconds + cfg.race.duration_s && !sim.all_finished() {
        if let Some(t) = ticker.as_mut() {
            t.tick().await;
        }
        let events = sim.step(dt);
        epoch += 1;

        for event in &events {
            log_event(event);
            if let Some(rec) = recorder.as_mut() {
                rec.write_event(event);
            }
        }
        if let Some(rec) = recorder.as_mut() {
            if epoch % every == 0 {
                rec.write_frame(&sim, epoch);
            }
        }

        if epoch % log_every == 0 {
            let wind = sim.wind.global_wind(sim.clock);
            let finished = sim.boats.iter().filter(|b| b.snapshot.race.finished).count();
            info!(
                "⏱ t={:.0}s T-{:.0}s | wind {:.0}° {:.1}kt | zones={} | finished {}/{}",
                sim.clock,
                sim.time_to_start.max(0.0),
                wind.direction.to_degrees(),
                wind.speed,
                sim.wind.zones().len(),
                finished,
                sim.boats.len(),
            );
        }
    }

    if let Some(rec) = recorder.as_mut() {
        rec.write_frame(&sim, epoch);
        rec.flush();
    }

    info!("🏁 Race over at t={:.1}s", sim.clock);
    for (place, s) in sim.standings().iter().enumerate() {
        match s.finish_time {
            Some(t) => info!("  {:>2}. boat {:>2}  finished {:.1}s  tacks {}", place + 1, s.id, t, s.tacks),
            None => info!("  {:>2}. boat {:>2}  leg {}  tacks {}", place + 1, s.id, s.leg, s.tacks),
        }
    }
    Ok(())
}

fn log_event(event: &RaceEvent) {
    match event {
        RaceEvent::Start { time } => info!("🔫 Start signal at t={time:.1}s"),
        RaceEvent::Ocs { id, .. } => info!("🚩 Boat {id} OCS"),
        RaceEvent::LegComplete { id, leg, time } => info!("↪ Boat {id} completed leg {leg} at t={time:.1}s"),
        RaceEvent::Finished { id, time } => info!("🏁 Boat {id} finished at t={time:.1}s"),
    }
}

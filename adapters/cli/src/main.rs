#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a barrage scenario headless.

mod logging;
mod report;
mod rig;
mod scenario;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use barrage_core::Command;
use barrage_world::{self as world, query, World};
use clap::Parser;

use crate::{
    report::RunReport,
    scenario::{Scenario, Volley},
};

/// Throws batches of projectiles at a target and reports the damage.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario file to run; defaults to assets/scenario.toml.
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Overrides the scenario's random seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Overrides the number of ticks to simulate.
    #[arg(long)]
    ticks: Option<u32>,
    /// Overrides the tick length in milliseconds.
    #[arg(long = "dt-ms")]
    dt_ms: Option<u64>,
    /// Extra volleys of randomly chosen projectiles, one amount per flag.
    #[arg(long = "volley")]
    volleys: Vec<i32>,
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

/// Entry point for the barrage command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let path = args.scenario.unwrap_or_else(Scenario::default_path);
    let mut scenario = Scenario::load(&path)?;
    if let Some(seed) = args.seed {
        scenario.seed = seed;
    }
    if let Some(ticks) = args.ticks {
        scenario.ticks = ticks;
    }
    if let Some(dt_ms) = args.dt_ms.filter(|dt_ms| *dt_ms > 0) {
        scenario.dt_ms = dt_ms;
    }
    for amount in args.volleys {
        scenario.volleys.push(Volley { amount, kind: None });
    }

    log::info!(
        "running {} for {} ticks of {} ms (seed {})",
        path.display(),
        scenario.ticks,
        scenario.dt_ms,
        scenario.seed
    );
    run(&scenario)
}

fn run(scenario: &Scenario) -> Result<()> {
    let mut world = World::new(scenario.world_config());
    let mut report = RunReport::default();
    let mut rig = rig::standard_rig();
    let mut events = Vec::new();

    let setup = scenario
        .setup_commands(query::catalog(&world))
        .context("failed to prepare scenario commands")?;
    for command in setup {
        world::apply(&mut world, command, &mut events);
    }
    report.record(&events);

    let dt = Duration::from_millis(scenario.dt_ms);
    let mut elapsed = Duration::ZERO;
    let mut next_summary = Duration::from_secs(1);
    for _ in 0..scenario.ticks {
        events.clear();
        world::apply(&mut world, Command::Tick { dt }, &mut events);
        report.record(&events);
        elapsed += dt;

        rig::reset(&mut rig);
        if let Some(target) = query::target(&world) {
            target.blend_pose(&mut rig);
        }

        if elapsed >= next_summary {
            next_summary += Duration::from_secs(1);
            let [x, y, z] = rig::head_angles(&rig);
            println!(
                "t={:>5.1}s live={:>4} pending={:>5} damage={:.4} head=({x:>6.2}, {y:>6.2}, {z:>6.2})",
                elapsed.as_secs_f32(),
                query::projectiles(&world).len(),
                query::pending(&world),
                query::damage(&world),
            );
        }
    }

    println!("{report}");
    println!("final damage {:.4}", query::damage(&world));
    Ok(())
}

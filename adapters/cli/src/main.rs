#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Maze Chase sessions headlessly.

mod config;
mod headless;
mod simulation;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use maze_chase_rendering::{palette, Presentation, RenderingBackend, Scene};
use maze_chase_system_ghost_ai::GhostAi;
use maze_chase_system_scheduler::{input_channel, TickScheduler};
use maze_chase_world::{query, World};
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;

use crate::{
    config::{load_map, AppConfig},
    headless::{parse_script, HeadlessBackend},
    simulation::{Autopilot, Simulation},
};

/// Runs a Maze Chase session without a window.
#[derive(Debug, Parser)]
#[command(name = "maze-chase", version, about)]
struct Args {
    /// Map file with one row per line; defaults to the classic layout.
    #[arg(long)]
    map: Option<PathBuf>,
    /// TOML file with `[game]`, `[ghosts]` and `[scheduler]` tables.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for ghost behaviour and the autopilot.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of frames to present before stopping.
    #[arg(long, default_value_t = 3_600)]
    frames: u64,
    /// Simulated length of a frame in milliseconds.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
    /// Overrides the tick rate from the config file.
    #[arg(long)]
    tick_hz: Option<u32>,
    /// Scripted key presses as `frame:key` pairs, e.g. `0:ArrowLeft,90:Space`.
    #[arg(long, default_value = "")]
    inputs: String,
    /// Let the player wander on its own whenever it stops.
    #[arg(long)]
    autopilot: bool,
    /// Print a text frame every N frames.
    #[arg(long)]
    render_every: Option<u64>,
    /// Write the session record as JSON to this file instead of stdout.
    #[arg(long)]
    record: Option<PathBuf>,
    /// Maximum level of emitted log records.
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .init();

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config.ghosts.seed = seed;
    }
    if let Some(rate) = args.tick_hz {
        config.scheduler.tick_rate_hz = rate;
    }

    let rows = load_map(args.map.as_deref())?;
    let world = World::from_layout(&rows, config.game.clone()).context("failed to build world")?;
    println!("{}", query::welcome_banner(&world));

    let scene = Scene::from_snapshot(&query::snapshot(&world))?;
    let presentation = Presentation::new("Maze Chase", palette::BACKGROUND, scene);

    let (sender, inputs) = input_channel();
    let script = parse_script(&args.inputs)?;
    let backend = HeadlessBackend::new(
        args.frames,
        Duration::from_millis(args.frame_ms),
        script,
        sender,
        args.render_every,
    );
    let autopilot = args.autopilot.then(|| Autopilot::new(config.ghosts.seed));
    let mut simulation = Simulation::new(
        world,
        GhostAi::new(&config.ghosts),
        TickScheduler::new(&config.scheduler),
        inputs,
        autopilot,
    );

    backend.run(presentation, |elapsed, input, scene| {
        let control = simulation.frame(elapsed, input);
        scene.refresh(&query::snapshot(simulation.world()));
        scene.paused = simulation.paused();
        control
    })?;

    let Some(record) = simulation.record() else {
        let session = query::session(simulation.world());
        warn!(
            score = session.score,
            level = session.level,
            lives = session.lives,
            "frame budget exhausted before the session ended"
        );
        return Ok(());
    };

    let json = serde_json::to_string_pretty(&record).context("failed to encode session record")?;
    match args.record {
        Some(path) => {
            fs::write(&path, json)
                .with_context(|| format!("failed to write record to {}", path.display()))?;
            info!(path = %path.display(), "session record written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

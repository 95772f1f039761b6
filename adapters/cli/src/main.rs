#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Rabbit Escape level headlessly.

mod summary;

use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use rabbit_escape_core::{Event, Level};
use rabbit_escape_rendering::{render, Presenter, TextPresenter};
use rabbit_escape_system_outcome::Outcome;
use rabbit_escape_world::{self as world, query, World};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::summary::RunSummary;

/// Runs a Rabbit Escape level and prints each tick.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the level text file.
    level: PathBuf,

    /// Maximum number of ticks to simulate.
    #[arg(short, long, default_value_t = 200)]
    ticks: u64,

    /// Overlay the change each rabbit will make on the next tick.
    #[arg(short, long)]
    lookahead: bool,

    /// Suppress frame output.
    #[arg(short, long)]
    quiet: bool,

    /// Print the final summary as JSON.
    #[arg(long)]
    json: bool,

    /// Override the number of rabbits waiting in the entrances.
    #[arg(long)]
    rabbits: Option<u32>,

    /// Override the number of ticks between spawns.
    #[arg(long)]
    spawn_delay: Option<u32>,

    /// Override the fall distance that kills a rabbit.
    #[arg(long)]
    fatal_fall_distance: Option<u32>,
}

/// Entry point for the Rabbit Escape command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let level = load_level(&args)?;
    let summary = run(level, &args)?;

    let mut stdout = io::stdout().lock();
    if args.json {
        serde_json::to_writer(&mut stdout, &summary).context("failed to encode summary")?;
        writeln!(stdout)?;
    } else {
        writeln!(stdout, "{summary}")?;
    }
    Ok(())
}

fn load_level(args: &Args) -> Result<Level> {
    let text = fs::read_to_string(&args.level)
        .with_context(|| format!("failed to read level {}", args.level.display()))?;
    let level = rabbit_escape_level::parse(&text)
        .with_context(|| format!("failed to parse level {}", args.level.display()))?;

    let mut settings = level.settings();
    if let Some(rabbits) = args.rabbits {
        settings = settings.with_num_rabbits(rabbits);
    }
    if let Some(delay) = args.spawn_delay {
        settings = settings.with_spawn_delay(delay);
    }
    if let Some(distance) = args.fatal_fall_distance {
        settings = settings.with_fatal_fall_distance(distance);
    }
    Ok(level.with_settings(settings))
}

fn run(level: Level, args: &Args) -> Result<RunSummary> {
    let name = level.name().map(str::to_owned);
    let num_to_save = level.settings().num_to_save();
    let mut world = World::new(level).context("level cannot be played")?;
    let mut outcome = Outcome::new(num_to_save);
    let mut presenter = (!args.quiet).then(|| TextPresenter::new(io::stdout()));

    info!(level = name.as_deref().unwrap_or("unnamed"), "level loaded");
    if let Some(presenter) = presenter.as_mut() {
        present(presenter, &world, args.lookahead)?;
    }

    for _ in 0..args.ticks {
        let mut events = Vec::new();
        world::step(&mut world, &mut events);

        let mut completed = Vec::new();
        outcome.handle(&events, query::census(&world), &mut completed);

        if let Some(presenter) = presenter.as_mut() {
            present(presenter, &world, args.lookahead)?;
        }
        if let Some(Event::LevelCompleted { result }) = completed.first() {
            info!(?result, tick = query::counters(&world).tick, "level completed");
            break;
        }
    }

    if outcome.result().is_none() {
        warn!(ticks = args.ticks, "tick limit reached before the level finished");
    }
    Ok(RunSummary::new(name, outcome.result(), query::census(&world)))
}

fn present<P: Presenter>(presenter: &mut P, world: &World, lookahead: bool) -> Result<()> {
    let frame = render(&query::snapshot(world), lookahead);
    presenter.present(query::counters(world).tick, &frame)
}

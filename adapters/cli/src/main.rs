#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a droidworks scenario headlessly.
//!
//! Builds a small demo yard around the landing pad, runs the requested
//! number of ticks and prints either the movement journal or the final
//! world snapshot. Set `RUST_LOG=debug` to follow the engine's tracing.

use std::{fs, path::Path, path::PathBuf};

use anyhow::{ensure, Context as _, Result};
use clap::Parser;
use droidworks_core::{EntityId, Location, MoveOutcome, SimulationConfig, ToolCall};
use droidworks_world::{models, query, World};
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// Run a droidworks scenario and print what moved.
#[derive(Debug, Parser)]
#[command(name = "droidworks")]
struct Cli {
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 20)]
    ticks: u64,

    /// TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random walkers placed along the top row of the map.
    #[arg(long, default_value_t = 4)]
    walkers: u32,

    /// Print the final snapshot as JSON instead of the journal.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    install_tracing();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let seed = config.seed;
    let mut world = World::with_config(config)?;
    populate(&mut world, seed, cli.walkers)?;

    for _ in 0..cli.ticks {
        world.tick();
    }
    tracing::info!(ticks = world.tick_count(), journal = world.journal().len(), "run finished");

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&query::snapshot_json(&world)?)?);
    } else {
        print_journal(&world);
    }
    Ok(())
}

fn install_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let source =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    SimulationConfig::from_toml_str(&source)
        .with_context(|| format!("parsing {}", path.display()))
}

/// Places the demo yard: an astromech heading for the pad, a tug towing a
/// power droid, a vaporator and the requested walkers.
fn populate(world: &mut World, seed: u64, walkers: u32) -> Result<()> {
    let (width, height) = (world.config().map.width, world.config().map.height);
    ensure!(
        width >= 16 && height >= 16,
        "the demo yard needs at least a 16x16 map, got {width}x{height}"
    );
    let centre = Location::new(i32::try_from(width / 2)?, i32::try_from(height / 2)?);

    let r2 = world.add_entity(models::entity("R2Astromech", centre.offset(-4, -2))?)?;
    call(world, &r2, "move_to_location", json!({ "x": centre.x, "y": centre.y }))?;

    let mut tug = models::entity("R2Astromech", centre.offset(-3, 3))?.named("Tug");
    tug.chassis_mut()
        .install_component("manipulator_1", models::component("TowCable")?)?;
    let tug = world.add_entity(tug)?;
    let gonk = world.add_entity(models::entity("GonkDroid", centre.offset(-4, 3))?)?;
    call(world, &tug, "attach_tow_cable", json!({ "identifier": gonk.as_str() }))?;
    call(world, &tug, "move_to_location", json!({ "x": centre.x + 3, "y": centre.y + 3 }))?;

    let _ = world.add_entity(models::entity("GX8Vaporator", centre.offset(4, -4))?)?;

    let columns = width.saturating_sub(2) / 2;
    for index in 0..walkers.min(columns) {
        let location = Location::new(1 + 2 * i32::try_from(index)?, 1);
        let walker = models::random_walker(location, seed.wrapping_add(u64::from(index)));
        let _ = world.add_entity(walker)?;
    }
    if walkers > columns {
        tracing::warn!(requested = walkers, placed = columns, "not enough room for every walker");
    }
    Ok(())
}

fn call(world: &mut World, id: &EntityId, tool: &str, arguments: serde_json::Value) -> Result<()> {
    let outcome = world.invoke_tool(id, &ToolCall::new(tool, arguments))?;
    tracing::debug!(entity = %id, tool, message = %outcome.message, "scenario call");
    Ok(())
}

fn print_journal(world: &World) {
    for entry in world.journal().iter() {
        let outcome = match entry.outcome {
            MoveOutcome::Applied => String::from("applied"),
            MoveOutcome::Blocked(reason) => match &entry.blocker {
                Some(blocker) => format!("{reason} by {blocker}"),
                None => reason.to_string(),
            },
        };
        println!(
            "tick {:>4}  {:<24} {} -> {}  {outcome}",
            entry.tick,
            entry.entity.as_str(),
            entry.from,
            entry.to
        );
    }
    for entity in world.entities() {
        println!("{:<24} at {}", entity.id().as_str(), entity.location());
    }
}

//! Colony Sim - headless runner
//!
//! Builds a small demo colony (or loads a save), runs it for a number of
//! ticks, logs what happened and optionally writes a save at the end.

use std::path::PathBuf;

use clap::Parser;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use colony_sim::core::config::SimulationConfig;
use colony_sim::core::error::Result;
use colony_sim::core::types::TilePos;
use colony_sim::data::Dictionaries;
use colony_sim::ecs::world::World;
use colony_sim::events::{EventType, SimEvent};
use colony_sim::pathfinding::{Terrain, TileGrid};
use colony_sim::persistence::autosave::AutosaveWorker;

/// Headless colony simulation runner
#[derive(Parser, Debug)]
#[command(name = "colony_sim")]
#[command(about = "Run the colony simulation headless and report what happened")]
struct Args {
    /// Number of ticks to run
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Real seconds per tick
    #[arg(long, default_value_t = 1.0)]
    delta: f32,

    /// Simulation config (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Definition dictionaries (TOML); built-in defaults otherwise
    #[arg(long)]
    dictionaries: Option<PathBuf>,

    /// Write a save document here when done
    #[arg(long)]
    save: Option<PathBuf>,

    /// Start from this save document instead of the demo colony
    #[arg(long)]
    load: Option<PathBuf>,

    /// Settlers in the demo colony
    #[arg(long, default_value_t = 3)]
    settlers: usize,

    /// RNG seed, overrides the config
    #[arg(long)]
    seed: Option<u64>,

    /// Autosave to the --save path every N ticks
    #[arg(long)]
    autosave_every: Option<u64>,
}

const SETTLER_NAMES: [&str; 8] = ["Urist", "Bomrek", "Kib", "Doren", "Litast", "Mafol", "Sodel", "Tobul"];

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("colony_sim=info")))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let dictionaries = match &args.dictionaries {
        Some(path) => Dictionaries::load(path)?,
        None => Dictionaries::with_defaults(),
    };

    let mut world = match &args.load {
        Some(path) => World::load_from_file(path, dictionaries, config)?,
        None => demo_colony(config, dictionaries, args.settlers)?,
    };

    world.bus.subscribe(EventType::EntityDied, |event| {
        if let SimEvent::EntityDied { entity, cause, .. } = event {
            tracing::info!(entity = %entity, ?cause, "death reported");
        }
    });

    // Autosave IO runs on the tokio runtime, never on the tick thread
    let rt = Runtime::new()?;
    let autosave = match (&args.save, args.autosave_every) {
        (Some(path), Some(_)) => Some(AutosaveWorker::start(rt.handle(), path.clone())),
        _ => None,
    };

    tracing::info!(
        entities = world.entity_count(),
        ticks = args.ticks,
        "simulation starting"
    );

    let mut completed = 0usize;
    let mut abandoned = 0usize;
    for _ in 0..args.ticks {
        for event in world.tick(args.delta) {
            match event {
                SimEvent::GoalCompleted { .. } => completed += 1,
                SimEvent::GoalAbandoned { .. } => abandoned += 1,
                _ => {}
            }
        }
        if let (Some(worker), Some(every)) = (&autosave, args.autosave_every) {
            if every > 0 && world.current_tick() % every == 0 {
                worker.submit(&world)?;
            }
        }
    }

    if let Some(worker) = autosave {
        let written = rt.block_on(worker.shutdown());
        tracing::info!(written, "autosaves written");
    }

    tracing::info!(
        tick = world.current_tick(),
        hours = world.now(),
        living = world.living_count(),
        completed,
        abandoned,
        "simulation finished"
    );
    for entity in world.entities().filter(|e| e.needs().is_some()) {
        let needs = entity.needs().cloned().unwrap_or_default();
        let statuses = entity.status().map(|s| s.kinds()).unwrap_or_default();
        println!(
            "{:>6} {:<8} food {:>5.1} drink {:>5.1} sleep {:>5.1} mood {:>4} {:?}",
            entity.id().to_string(),
            entity.name().unwrap_or("?"),
            needs.food,
            needs.drink,
            needs.sleep,
            entity.mood_total(),
            statuses
        );
    }

    if let Some(path) = &args.save {
        world.save_to_file(path)?;
        tracing::info!(path = %path.display(), "saved");
    }
    Ok(())
}

/// A walled 24x24 field with a pond, some food and drink, logs to haul and
/// a 2x2 stockpile
fn demo_colony(config: SimulationConfig, dictionaries: Dictionaries, settlers: usize) -> Result<World> {
    let mut grid = TileGrid::new(24, 24);
    for x in 0..24 {
        grid.set_terrain(TilePos::new(x, 0), Terrain::Wall);
        grid.set_terrain(TilePos::new(x, 23), Terrain::Wall);
    }
    for y in 0..24 {
        grid.set_terrain(TilePos::new(0, y), Terrain::Wall);
        grid.set_terrain(TilePos::new(23, y), Terrain::Wall);
    }
    for x in 16..20 {
        for y in 16..20 {
            grid.set_terrain(TilePos::new(x, y), Terrain::Water);
        }
    }
    for y in 4..12 {
        grid.set_terrain(TilePos::new(12, y), Terrain::Rough);
    }

    let mut world = World::new(config, grid, dictionaries);
    for i in 0..settlers {
        let name = SETTLER_NAMES[i % SETTLER_NAMES.len()];
        world.spawn_settler(name, TilePos::new(3 + i as i32 % 8, 3 + i as i32 / 8))?;
    }
    world.spawn_animal("Billy", "goat", TilePos::new(10, 18))?;

    world.spawn_item_named("bread", Some("wheat"), 12, TilePos::new(6, 10))?;
    world.spawn_item_named("raw_meat", Some("beef"), 5, TilePos::new(14, 6))?;
    world.spawn_item_named("water_barrel", Some("water"), 20, TilePos::new(8, 12))?;
    world.spawn_item_named("ale", Some("barley"), 6, TilePos::new(9, 12))?;
    world.spawn_item_named("log", Some("oak"), 8, TilePos::new(18, 5))?;
    world.spawn_item_named("stone_block", Some("granite"), 4, TilePos::new(5, 18))?;
    world.spawn_mechanism("lever", TilePos::new(2, 20));
    world.spawn_plant("plump_helmet", TilePos::new(20, 3));

    for x in 3..5 {
        for y in 14..16 {
            world.add_stockpile_slot(TilePos::new(x, y));
        }
    }
    Ok(world)
}

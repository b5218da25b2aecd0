use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;

use colony_sim::core::config::SimulationConfig;
use colony_sim::core::types::{EntityId, TilePos};
use colony_sim::data::Dictionaries;
use colony_sim::ecs::world::World;
use colony_sim::pathfinding::{find_path, PathGoal, PathService, SearchBudget, Terrain, TileGrid};

/// Open field with a comb of walls, each with a gap at alternating ends
fn maze(size: u32) -> TileGrid {
    let mut grid = TileGrid::new(size, size);
    let size = size as i32;
    for (n, x) in (4..size - 4).step_by(6).enumerate() {
        for y in 0..size {
            let gap = if n % 2 == 0 { y == size - 2 } else { y == 1 };
            if !gap {
                grid.set_terrain(TilePos::new(x, y), Terrain::Wall);
            }
        }
    }
    grid
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn bench_single_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("astar");
    group.sample_size(env_usize("COLONY_BENCH_SAMPLES", 30));
    group.measurement_time(Duration::from_secs(5));

    let budget = SearchBudget {
        max_expansions: 1_000_000,
        allow_diagonal: true,
    };
    for size in [32u32, 64, 128] {
        let grid = maze(size);
        let start = TilePos::new(1, 1);
        let goal = TilePos::new(size as i32 - 2, size as i32 - 2);
        group.bench_function(format!("maze{size}"), |b| {
            b.iter(|| find_path(black_box(&grid), start, goal, budget))
        });
    }
    group.finish();
}

fn bench_batch_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_service");
    group.sample_size(env_usize("COLONY_BENCH_SAMPLES", 30));

    let grid = maze(64);
    let budget = SimulationConfig::default().pathfinding.budget();
    let requests = env_usize("COLONY_BENCH_REQUESTS", 64);
    group.bench_function(format!("resolve{requests}_maze64"), |b| {
        b.iter_batched(
            || {
                let mut service = PathService::new();
                for i in 0..requests as i32 {
                    let start = TilePos::new(1 + i % 3, 1 + (i * 7) % 60);
                    let goal = TilePos::new(62 - i % 3, 1 + (i * 13) % 60);
                    service.request(EntityId(i as u64), start, PathGoal::Tile(goal));
                }
                service
            },
            |mut service| service.resolve_pending(&grid, budget),
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_colony_ticks(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_tick");
    group.sample_size(env_usize("COLONY_BENCH_SAMPLES", 20));
    let settlers = env_usize("COLONY_BENCH_SETTLERS", 50);
    let steps = env_usize("COLONY_BENCH_STEPS", 120);

    group.bench_function(format!("steps{steps}_settlers{settlers}"), |b| {
        b.iter_batched(
            || {
                let mut config = SimulationConfig::default();
                config.clock.game_hours_per_second = 0.25;
                let mut world = World::new(config, maze(64), Dictionaries::with_defaults());
                for i in 0..settlers as i32 {
                    let tile = TilePos::new(1 + i % 3, 1 + (i * 7) % 60);
                    if let Ok(id) = world.spawn_settler("Urist", tile) {
                        if let Some(entity) = world.entity_mut(id) {
                            entity.needs_mut().food = 40.0;
                        }
                    }
                }
                for i in 0..8 {
                    let _ = world.spawn_item_named("bread", Some("wheat"), 20, TilePos::new(60, 4 + i * 7));
                }
                world
            },
            |mut world| {
                for _ in 0..steps {
                    world.tick(1.0);
                }
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_single_search, bench_batch_resolve, bench_colony_ticks);
criterion_main!(benches);

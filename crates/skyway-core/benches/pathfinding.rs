//! A* throughput on an open grid, cold and through the cache.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use skyway_logic::grid::{Scenery, SceneryKind, TileRegion};
use skyway_logic::traversal::{FlyingPolicy, GroundPolicy};
use skyway_logic::stats::AltitudeBand;
use skyway_logic::{Grid, Pathfinder, TilePosition};

fn open_grid(size: i32) -> Grid {
    let mut grid = Grid::new(size, size, 8);
    grid.fill(
        TileRegion::new(TilePosition::new(0, 0, 0), TilePosition::new(size - 1, size - 1, 0)),
        Some(Scenery::new(SceneryKind::Road)),
    );
    grid
}

fn bench_pathfinding(c: &mut Criterion) {
    let grid = open_grid(64);
    let ground = GroundPolicy::default();
    let flying = FlyingPolicy {
        band: AltitudeBand {
            min: 2,
            max: 6,
            preferred: Some(4),
        },
    };
    let start = TilePosition::new(0, 0, 0);
    let goal = TilePosition::new(63, 63, 0);

    c.bench_function("ground corner to corner, cold", |b| {
        let mut pathfinder = Pathfinder::with_capacity(0);
        b.iter(|| pathfinder.find_path(&grid, black_box(start), black_box(goal), &ground, 1 << 20))
    });

    c.bench_function("ground corner to corner, cached", |b| {
        let mut pathfinder = Pathfinder::new();
        b.iter(|| pathfinder.find_path(&grid, black_box(start), black_box(goal), &ground, 1 << 20))
    });

    c.bench_function("flying across band, cold", |b| {
        let mut pathfinder = Pathfinder::with_capacity(0);
        let from = TilePosition::new(0, 0, 4);
        let to = TilePosition::new(63, 63, 4);
        b.iter(|| pathfinder.find_path(&grid, black_box(from), black_box(to), &flying, 1 << 20))
    });
}

criterion_group!(benches, bench_pathfinding);
criterion_main!(benches);

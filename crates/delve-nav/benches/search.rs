use criterion::{black_box, criterion_group, criterion_main, Criterion};
use delve_core::SplitMix64;
use delve_nav::{
    greedy_walk, search, AgentState, GoalRegion, GreedyConfig, GreedyEpisode, Mobility, PathQuery,
    Voxel, VoxelGrid,
};

/// Open floor with a ring of pillars every fourth cell.
fn floor(size: usize) -> VoxelGrid {
    let rows: Vec<String> = (0..size)
        .map(|z| {
            (0..size)
                .map(|x| if x % 4 == 2 && z % 4 == 2 { '#' } else { '.' })
                .collect()
        })
        .collect();
    let headroom = vec![".".repeat(size); size];
    VoxelGrid::from_layers(&[rows, headroom]).expect("grid")
}

fn bench_search(c: &mut Criterion) {
    let grid = floor(64);
    let start = Voxel::new(0, 0, 0);
    let far = GoalRegion::single(Voxel::new(63, 0, 63));

    let mut group = c.benchmark_group("delve-nav/search");

    for weight in [1.0, 5.0] {
        let query = PathQuery::new(start, far)
            .with_mobility(Mobility::settler())
            .with_heuristic_weight(weight);
        group.bench_function(format!("weight_{weight}"), |b| {
            b.iter(|| {
                let outcome = search(&grid, black_box(&query));
                black_box(outcome.path.len());
            })
        });
    }

    let ring = PathQuery::new(start, GoalRegion::adjacent(Voxel::new(40, 0, 40)))
        .with_mobility(Mobility::walker());
    group.bench_function("adjacent_ring", |b| {
        b.iter(|| black_box(search(&grid, &ring).expansions))
    });

    let config = GreedyConfig::default();
    group.bench_function("greedy_walk", |b| {
        b.iter(|| {
            let mut episode = GreedyEpisode::new();
            let mut rng = SplitMix64::new(11);
            let state = AgentState::new(start, Mobility::walker());
            let path = greedy_walk(&grid, state, &far, &config, &mut episode, &mut rng);
            black_box(path.len());
        })
    });

    group.finish();
}

criterion_group!(benches, bench_search);
criterion_main!(benches);

//! Tick throughput benchmarks.
//!
//! Run with: `cargo bench -p evw_sim` (add `--features parallel` to compare)

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use evw_sim::{Faction, SimConfig, SimWorld, UnitKind};

const LINEUP: [UnitKind; 6] = [
    UnitKind::Soldier,
    UnitKind::Soldier,
    UnitKind::Tank,
    UnitKind::Sniper,
    UnitKind::Artillery,
    UnitKind::AntiAir,
];

/// Two opposing blocks of `per_side` units, just out of range of each other.
fn battle(per_side: usize) -> SimWorld {
    let mut sim = SimWorld::with_config(SimConfig {
        seed: 11,
        ..Default::default()
    });
    for i in 0..per_side {
        let kind = LINEUP[i % LINEUP.len()];
        let y = 130.0 + (i % 30) as f32 * 10.0;
        let depth = (i / 30) as f32 * 12.0;
        sim.spawn_unit_at(Faction::West, kind, 150.0 - depth, y);
        sim.spawn_unit_at(Faction::East, kind, 650.0 + depth, y);
    }
    sim
}

fn bench_ticks(c: &mut Criterion) {
    for per_side in [50, 200] {
        c.bench_function(&format!("tick_{per_side}_per_side"), |b| {
            let mut sim = battle(per_side);
            b.iter(|| {
                sim.tick();
                black_box(sim.current_tick())
            })
        });
    }

    c.bench_function("snapshot_json_200_per_side", |b| {
        let mut sim = battle(200);
        for _ in 0..30 {
            sim.tick();
        }
        b.iter(|| black_box(sim.snapshot_json()))
    });

    c.bench_function("terrain_generation", |b| {
        let config = SimConfig::default();
        let mut seed = 0u64;
        b.iter(|| {
            seed += 1;
            let sim = SimWorld::with_config(SimConfig {
                seed,
                ..config.clone()
            });
            black_box(sim.terrain().to_json().map(|json| json.len()).unwrap_or(0))
        })
    });
}

criterion_group!(benches, bench_ticks);
criterion_main!(benches);

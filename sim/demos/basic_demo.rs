//! Basic demonstration of the East vs West simulation.
//!
//! Run with: RUST_LOG=evw_sim=info cargo run --example basic_demo

use evw_sim::{Faction, SimConfig, SimWorld, UnitKind};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== East vs West - Simulation Demo ===\n");

    let mut sim = SimWorld::with_config(SimConfig {
        seed: 42,
        ..Default::default()
    });

    let orders = [
        (Faction::West, UnitKind::Soldier, None),
        (Faction::West, UnitKind::Tank, None),
        (Faction::West, UnitKind::Artillery, None),
        (Faction::East, UnitKind::Soldier, None),
        (Faction::East, UnitKind::Helicopter, None),
        (Faction::East, UnitKind::AntiAir, None),
        (Faction::East, UnitKind::MineTank, Some((250.0, 300.0))),
    ];
    for (faction, kind, target) in orders {
        if let Err(err) = sim.purchase(faction, kind, target) {
            println!("order refused: {err}");
        }
    }

    // 30 seconds at 60 ticks/sec, reported every 5 seconds
    for second in 1..=30 {
        sim.step(1.0);
        if second == 10 {
            if let Err(err) = sim.purchase(Faction::West, UnitKind::MissileStrike, Some((600.0, 280.0))) {
                println!("order refused: {err}");
            }
        }
        if second % 5 == 0 {
            print_summary(&mut sim);
        }
    }

    println!("\nEvents in the last stretch: {}", sim.drain_events().len());

    println!("\n=== Final State (JSON) ===\n");
    match sim.snapshot().to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(err) => println!("snapshot failed: {err}"),
    }
}

fn print_summary(sim: &mut SimWorld) {
    let snapshot = sim.snapshot();
    println!(
        "--- Tick {} (t={:.1}s, {:?}) ---",
        snapshot.tick, snapshot.time, snapshot.weather
    );
    for faction in [Faction::West, Faction::East] {
        let units: Vec<_> = snapshot.units_of(faction).collect();
        let health: f32 = units.iter().map(|u| u.health).sum();
        println!(
            "  {:?}: {} units, {:.0} total health, score {}, money {:.0}",
            faction,
            units.len(),
            health,
            snapshot.score.get(faction),
            snapshot.money.get(faction),
        );
    }
}

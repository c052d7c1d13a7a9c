//! Public API for the simulation.
//!
//! This module provides the main interface for a presentation layer (or a
//! test, or a headless AI) to drive one match.
//!
//! ## Fixed Timestep
//!
//! The simulation uses a fixed timestep internally (default 60 Hz). When
//! `step(dt)` is called, the simulation accumulates time and runs whole ticks
//! as needed, so results do not depend on frame rate.
//!
//! ## Commands
//!
//! Purchases are validated and queued immediately, then materialised and paid
//! for at the start of the next tick. Nothing issued between ticks is ever
//! partially simulated.

use crate::components::*;
use crate::config::SimConfig;
use crate::constants::*;
use crate::economy::{economy_income_system, EconomyLedger};
use crate::error::{SimError, SimResult};
use crate::events::{EventBuffer, SimEvent};
use crate::spatial::{spatial_grid_update_system, SpatialGrid};
use crate::systems::*;
use crate::terrain::TerrainField;
use crate::units::{Delivery, Payload, UnitKind};
use crate::weather::{weather_system, Weather};
use crate::world::Snapshot;
use bevy_ecs::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Members in a purchased infantry squad.
pub const SQUAD_SIZE: usize = 6;

/// The main simulation world container.
///
/// Holds the ECS world and schedule, providing a clean API for:
/// - Initializing a match from a seed
/// - Stepping the simulation forward
/// - Extracting state snapshots and feedback events
/// - Issuing purchases
pub struct SimWorld {
    world: World,
    schedule: Schedule,
    time: f32,
    /// Accumulated time for fixed timestep.
    time_accumulator: f32,
    next_squad: u32,
}

impl SimWorld {
    /// Create a match with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    /// Create a match, generating terrain from the configured seed.
    pub fn with_config(config: SimConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let terrain = TerrainField::generate(&config.terrain, &mut rng);
        Self::build(config, terrain, rng)
    }

    /// Create a match on a fixed terrain.
    pub fn with_terrain(config: SimConfig, terrain: TerrainField) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::build(config, terrain, rng)
    }

    fn build(config: SimConfig, terrain: TerrainField, rng: ChaCha8Rng) -> Self {
        let mut world = World::new();

        world.insert_resource(SimTick(0));
        world.insert_resource(SimRng(rng));
        world.insert_resource(IdAllocator::default());
        world.insert_resource(WorldFlash::default());
        world.insert_resource(MatchOutcome::default());
        world.insert_resource(EconomyLedger::new(config.initial_money));
        world.insert_resource(Weather::default());
        world.insert_resource(SpatialGrid::default());
        world.insert_resource(SpawnQueue::default());
        world.insert_resource(EventBuffer::default());
        world.insert_resource(terrain);
        world.insert_resource(config);

        let mut schedule = Schedule::default();

        // Group 1: intake and the grid snapshot every later query reads
        schedule.add_systems(
            (
                spawn_intake_system,
                economy_income_system,
                weather_system,
                spatial_grid_update_system,
            )
                .chain(),
        );

        // Group 2: ordnance already in flight
        schedule.add_systems(
            (projectile_system, guided_missile_system, flyover_system)
                .chain()
                .after(spatial_grid_update_system),
        );

        // Group 3: terrain state and per-unit terrain flags
        schedule.add_systems(
            (terrain_state_system, terrain_awareness_system)
                .chain()
                .after(flyover_system),
        );

        // Group 4: units act
        schedule.add_systems(
            (hazard_system, movement_system, targeting_system, arrival_system)
                .chain()
                .after(terrain_awareness_system),
        );

        // Group 5: cosmetics, removal of the dead, win check
        schedule.add_systems(
            (particle_system, death_sweep_system, victory_system)
                .chain()
                .after(arrival_system),
        );

        Self {
            world,
            schedule,
            time: 0.0,
            time_accumulator: 0.0,
            next_squad: 1,
        }
    }

    /// Step the simulation forward by `dt` seconds of wall time.
    ///
    /// Uses fixed timestep internally. Returns the number of ticks run.
    pub fn step(&mut self, dt: f32) -> u32 {
        let fixed_dt = self.fixed_timestep();
        self.time_accumulator += dt;

        let mut ran = 0;
        while self.time_accumulator >= fixed_dt {
            self.tick();
            self.time_accumulator -= fixed_dt;
            ran += 1;
        }
        ran
    }

    /// Run exactly one tick. Does nothing once the match is decided.
    pub fn tick(&mut self) {
        if self.outcome().is_over() {
            return;
        }
        self.world.resource_mut::<SimTick>().increment();
        self.schedule.run(&mut self.world);
        self.time += self.fixed_timestep();
    }

    fn fixed_timestep(&self) -> f32 {
        self.world
            .get_resource::<SimConfig>()
            .map(|c| c.fixed_timestep)
            .filter(|dt| *dt > 0.0)
            .unwrap_or(1.0 / 60.0)
    }

    /// Get a snapshot of the current simulation state.
    pub fn snapshot(&mut self) -> Snapshot {
        Snapshot::from_world(&mut self.world, self.time)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&mut self) -> String {
        self.snapshot().to_json().unwrap_or_else(|_| "{}".to_string())
    }

    /// The match terrain, including current tree states.
    pub fn terrain(&self) -> &TerrainField {
        self.world.resource::<TerrainField>()
    }

    /// Terrain as JSON (for initial load, and after tree state changes).
    pub fn terrain_json(&self) -> String {
        self.terrain().to_json().unwrap_or_else(|_| "{}".to_string())
    }

    /// Take every feedback event produced since the last call.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.world.resource_mut::<EventBuffer>().drain()
    }

    pub fn ledger(&self) -> &EconomyLedger {
        self.world.resource::<EconomyLedger>()
    }

    pub fn outcome(&self) -> MatchOutcome {
        self.world
            .get_resource::<MatchOutcome>()
            .copied()
            .unwrap_or_default()
    }

    /// Get the current tick number.
    pub fn current_tick(&self) -> u64 {
        self.world.get_resource::<SimTick>().map(|t| t.0).unwrap_or(0)
    }

    /// Get the elapsed simulation time.
    pub fn current_time(&self) -> f32 {
        self.time
    }

    /// Reject requests the tick would never honour.
    fn validate(&self, faction: Faction, kind: UnitKind, target: Option<(f32, f32)>) -> SimResult<()> {
        if let Some(winner) = self.outcome().winner {
            return Err(SimError::MatchOver(winner));
        }
        let delivery = kind.profile().delivery;
        if delivery == Delivery::Derived {
            return Err(SimError::NotPurchasable(kind));
        }
        if delivery.needs_target() && target.is_none() {
            return Err(SimError::MissingTarget(kind));
        }
        if let Some((x, y)) = target {
            let on_field = (0.0..=FIELD_WIDTH).contains(&x) && (PLAY_MIN_Y..=PLAY_MAX_Y).contains(&y);
            let friendly_nuke = delivery == Delivery::Flyover(Payload::Nuke) && !faction.is_enemy_territory(x);
            if !on_field || friendly_nuke {
                return Err(SimError::InvalidTarget { kind, x, y });
            }
        }
        Ok(())
    }

    /// Money left after everything already queued is paid for.
    fn uncommitted_money(&self, faction: Faction) -> f64 {
        let committed = self.world.resource::<SpawnQueue>().committed(faction);
        self.ledger().money(faction) - committed as f64
    }

    fn ensure_funds(&self, faction: Faction, kind: UnitKind, cost: u32) -> SimResult<()> {
        let available = self.uncommitted_money(faction);
        if available < cost as f64 {
            tracing::warn!(?faction, ?kind, cost, available, "purchase refused");
            return Err(SimError::InsufficientFunds {
                faction,
                kind,
                required: cost,
                available,
            });
        }
        Ok(())
    }

    /// Queue one raw spawn request for the next tick.
    pub fn queue_spawn(&mut self, request: SpawnRequest) -> SimResult<()> {
        self.validate(request.faction, request.kind, request.target)?;
        self.ensure_funds(request.faction, request.kind, request.cost)?;
        self.world.resource_mut::<SpawnQueue>().push(request);
        Ok(())
    }

    /// Buy a unit at list price.
    ///
    /// A soldier purchase becomes a squad of six around the spawn row, the
    /// first member carrying the whole cost. Airborne drops get a squad id.
    pub fn purchase(&mut self, faction: Faction, kind: UnitKind, target: Option<(f32, f32)>) -> SimResult<()> {
        self.validate(faction, kind, target)?;
        let cost = kind.profile().cost;
        self.ensure_funds(faction, kind, cost)?;

        let mut request = SpawnRequest::new(faction, kind);
        request.target = target;

        match kind {
            UnitKind::Soldier => {
                let squad = self.allocate_squad();
                let mut members = Vec::with_capacity(SQUAD_SIZE);
                {
                    let mut rng = self.world.resource_mut::<SimRng>();
                    for i in 0..SQUAD_SIZE {
                        let column = if i % 2 == 0 { -15.0 } else { 15.0 };
                        let dx = column + rng.0.gen_range(-5.0..5.0);
                        let dy = (i / 2) as f32 * 25.0 - 25.0 + rng.0.gen_range(-5.0..5.0);
                        let member_cost = if i == 0 { cost } else { 0 };
                        members.push(request.with_cost(member_cost).in_squad(squad).with_offset(dx, dy));
                    }
                }
                let mut queue = self.world.resource_mut::<SpawnQueue>();
                for member in members {
                    queue.push(member);
                }
            }
            UnitKind::Airborne => {
                let squad = self.allocate_squad();
                self.world.resource_mut::<SpawnQueue>().push(request.in_squad(squad));
            }
            _ => self.world.resource_mut::<SpawnQueue>().push(request),
        }
        tracing::debug!(?faction, ?kind, ?target, "purchase queued");
        Ok(())
    }

    fn allocate_squad(&mut self) -> u32 {
        let squad = self.next_squad;
        self.next_squad += 1;
        squad
    }

    /// Place a unit directly, free of charge, bypassing the queue.
    pub fn spawn_unit_at(&mut self, faction: Faction, kind: UnitKind, x: f32, y: f32) -> Entity {
        let tick = self.current_tick();
        let id = self.world.resource_mut::<IdAllocator>().next_id();
        self.world.spawn(UnitBundle::new(id, kind, faction, x, y, tick)).id()
    }

    /// Get the spatial grid reference (for debugging/visualization).
    pub fn spatial_grid(&self) -> Option<&SpatialGrid> {
        self.world.get_resource::<SpatialGrid>()
    }

    /// Get direct access to the ECS world (for advanced usage).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world (for advanced usage).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> SimConfig {
        SimConfig {
            seed: 1,
            income_per_tick: 0.0,
            weather_enabled: false,
            ..Default::default()
        }
    }

    fn open_field() -> SimWorld {
        SimWorld::with_terrain(quiet_config(), TerrainField::empty())
    }

    fn run(sim: &mut SimWorld, ticks: u32) {
        for _ in 0..ticks {
            sim.tick();
        }
    }

    fn health_of(sim: &SimWorld, entity: Entity) -> Option<f32> {
        sim.world().get::<Health>(entity).map(|h| h.current)
    }

    #[test]
    fn test_new_world() {
        let sim = SimWorld::new();
        assert_eq!(sim.current_tick(), 0);
        assert_eq!(sim.ledger().money(Faction::West), INITIAL_MONEY);
    }

    #[test]
    fn test_step_runs_whole_ticks() {
        let mut sim = open_field();
        assert_eq!(sim.step(1.0 / 120.0), 0);
        assert_eq!(sim.step(1.0 / 120.0 + 1e-4), 1);
        assert_eq!(sim.step(0.05), 3);
        assert_eq!(sim.current_tick(), 4);
    }

    #[test]
    fn test_lone_soldier_scores_and_is_refunded() {
        let mut sim = open_field();
        sim.queue_spawn(SpawnRequest::new(Faction::West, UnitKind::Soldier).with_offset(0.0, 0.0))
            .unwrap();
        sim.tick();
        assert_eq!(sim.ledger().money(Faction::West), 1975.0);

        run(&mut sim, 1800);
        assert_eq!(sim.ledger().score(Faction::West), 1);
        assert_eq!(sim.ledger().money(Faction::West), 2000.0);
        assert!(sim.snapshot().units.is_empty());
        assert!(sim
            .drain_events()
            .iter()
            .any(|e| matches!(e, SimEvent::UnitScored { points: 1, .. })));
    }

    #[test]
    fn test_tanks_trade_one_shell_each() {
        let mut sim = open_field();
        let west = sim.spawn_unit_at(Faction::West, UnitKind::Tank, 300.0, 300.0);
        let east = sim.spawn_unit_at(Faction::East, UnitKind::Tank, 440.0, 300.0);
        run(&mut sim, 60);

        for tank in [west, east] {
            let hp = health_of(&sim, tank).unwrap();
            assert!(hp <= 120.0 + 1e-3 && hp > 0.0, "tank health {hp}");
        }
    }

    #[test]
    fn test_mine_blast_spares_nobody() {
        let mut sim = open_field();
        sim.purchase(Faction::West, UnitKind::MinePersonal, Some((400.0, 300.0)))
            .unwrap();
        let foe = sim.spawn_unit_at(Faction::East, UnitKind::Soldier, 420.0, 300.0);
        let friend = sim.spawn_unit_at(Faction::West, UnitKind::Soldier, 440.0, 300.0);
        sim.tick();

        assert_eq!(health_of(&sim, foe), None);
        let snapshot = sim.snapshot();
        assert!(snapshot.units.iter().all(|u| u.kind != UnitKind::MinePersonal));
        assert!((health_of(&sim, friend).unwrap() - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_nuke_friendly_fire_versus_missile() {
        let target = (600.0, 300.0);

        let mut nuked = open_field();
        nuked.purchase(Faction::West, UnitKind::MinePersonal, Some(target)).unwrap();
        nuked.purchase(Faction::West, UnitKind::Nuke, Some(target)).unwrap();
        run(&mut nuked, 300);
        assert!(nuked.snapshot().units.is_empty(), "the nuke takes its own side's mine");
        assert!(nuked
            .drain_events()
            .iter()
            .any(|e| matches!(e, SimEvent::NukeFlash { .. })));

        let mut struck = open_field();
        struck.purchase(Faction::West, UnitKind::MinePersonal, Some(target)).unwrap();
        struck.purchase(Faction::West, UnitKind::MissileStrike, Some(target)).unwrap();
        run(&mut struck, 300);
        let snapshot = struck.snapshot();
        assert_eq!(snapshot.units.len(), 1);
        assert_eq!(snapshot.units[0].kind, UnitKind::MinePersonal);
        assert!(snapshot.missiles.is_empty());
    }

    #[test]
    fn test_tank_cannot_ford_without_bridge() {
        let mut sim = SimWorld::with_terrain(quiet_config(), TerrainField::with_straight_river(400.0, &[]));
        let tank = sim.spawn_unit_at(Faction::West, UnitKind::Tank, 300.0, 300.0);
        run(&mut sim, 1500);
        let x = sim.world().get::<Position>(tank).unwrap().x;
        assert!(x < 400.0, "tank crossed to {x}");
    }

    #[test]
    fn test_same_seed_same_match() {
        let play = || {
            let mut sim = SimWorld::with_config(SimConfig {
                seed: 7,
                ..Default::default()
            });
            sim.purchase(Faction::West, UnitKind::Soldier, None).unwrap();
            sim.purchase(Faction::West, UnitKind::Tank, None).unwrap();
            sim.purchase(Faction::East, UnitKind::Artillery, None).unwrap();
            sim.purchase(Faction::East, UnitKind::Helicopter, None).unwrap();
            run(&mut sim, 300);
            sim.purchase(Faction::East, UnitKind::Airborne, Some((300.0, 250.0))).unwrap();
            sim.purchase(Faction::West, UnitKind::MissileStrike, Some((650.0, 300.0))).unwrap();
            run(&mut sim, 600);
            (sim.snapshot_json(), sim.terrain_json())
        };
        assert_eq!(play(), play());
    }

    #[test]
    fn test_squad_purchase_charges_once() {
        let mut sim = open_field();
        sim.purchase(Faction::East, UnitKind::Soldier, None).unwrap();
        sim.tick();

        let mut query = sim.world_mut().query::<(&UnitKind, &Lifecycle)>();
        let members: Vec<(UnitKind, Lifecycle)> = query.iter(sim.world()).map(|(k, l)| (*k, *l)).collect();
        assert_eq!(members.len(), SQUAD_SIZE);
        assert!(members.iter().all(|(k, l)| *k == UnitKind::Soldier && l.squad == members[0].1.squad));
        assert_eq!(members.iter().map(|(_, l)| l.paid_cost).sum::<u32>(), 25);
        assert_eq!(sim.ledger().money(Faction::East), 1975.0);
    }

    #[test]
    fn test_rejected_purchases() {
        let mut sim = open_field();
        assert!(matches!(
            sim.purchase(Faction::West, UnitKind::Nuke, Some((200.0, 300.0))),
            Err(SimError::InvalidTarget { .. })
        ));
        assert!(matches!(
            sim.purchase(Faction::East, UnitKind::Airstrike, None),
            Err(SimError::MissingTarget(UnitKind::Airstrike))
        ));
        assert!(matches!(
            sim.purchase(Faction::East, UnitKind::MineTank, Some((300.0, 20.0))),
            Err(SimError::InvalidTarget { .. })
        ));
        assert!(matches!(
            sim.purchase(Faction::West, UnitKind::Napalm, Some((300.0, 300.0))),
            Err(SimError::NotPurchasable(UnitKind::Napalm))
        ));

        // Two nukes do not fit in 2000 once the first is queued.
        sim.purchase(Faction::West, UnitKind::Nuke, Some((600.0, 300.0))).unwrap();
        assert!(matches!(
            sim.purchase(Faction::West, UnitKind::Nuke, Some((600.0, 300.0))),
            Err(SimError::InsufficientFunds { required: 1000, .. })
        ));
    }

    #[test]
    fn test_match_over_freezes_the_world() {
        let mut sim = SimWorld::with_terrain(
            SimConfig {
                win_score: 1,
                ..quiet_config()
            },
            TerrainField::empty(),
        );
        sim.spawn_unit_at(Faction::East, UnitKind::Drone, 10.0, 300.0);
        run(&mut sim, 20);

        assert_eq!(sim.outcome().winner, Some(Faction::East));
        let frozen = sim.current_tick();
        sim.tick();
        assert_eq!(sim.current_tick(), frozen);
        assert!(matches!(
            sim.purchase(Faction::West, UnitKind::Tank, None),
            Err(SimError::MatchOver(Faction::East))
        ));
    }

    #[test]
    fn test_health_never_exceeds_max() {
        let mut sim = SimWorld::with_config(SimConfig {
            seed: 3,
            ..Default::default()
        });
        for kind in [UnitKind::Soldier, UnitKind::Tank, UnitKind::Rambo, UnitKind::Tesla] {
            sim.purchase(Faction::West, kind, None).unwrap();
            sim.purchase(Faction::East, kind, None).unwrap();
        }
        for _ in 0..40 {
            run(&mut sim, 25);
            let snapshot = sim.snapshot();
            assert!(snapshot.units.iter().all(|u| u.health > 0.0 && u.health <= u.health_max));
            assert!(snapshot.money.west >= 0.0 && snapshot.money.east >= 0.0);
        }
    }
}

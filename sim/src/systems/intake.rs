//! Spawn intake: queued purchases become units or aircraft at tick start.
//!
//! All requests queued before a tick are materialised, and paid for, before
//! any movement or combat runs in that tick.

use crate::components::*;
use crate::constants::*;
use crate::economy::EconomyLedger;
use crate::events::{EventBuffer, SimEvent};
use crate::systems::clock::{IdAllocator, SimRng, SimTick};
use crate::units::{Delivery, UnitKind};
use bevy_ecs::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A purchase issued by a player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnRequest {
    pub faction: Faction,
    pub kind: UnitKind,
    /// Amount deducted when the request is materialised.
    pub cost: u32,
    pub squad: Option<u32>,
    /// Offset from the home-edge spawn point.
    pub offset: Option<(f32, f32)>,
    /// Absolute ground coordinate for placed and air-delivered kinds.
    pub target: Option<(f32, f32)>,
}

impl SpawnRequest {
    /// A request at the kind's list price.
    pub fn new(faction: Faction, kind: UnitKind) -> Self {
        Self {
            faction,
            kind,
            cost: kind.profile().cost,
            squad: None,
            offset: None,
            target: None,
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.target = Some((x, y));
        self
    }

    pub fn with_offset(mut self, dx: f32, dy: f32) -> Self {
        self.offset = Some((dx, dy));
        self
    }

    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    pub fn in_squad(mut self, squad: u32) -> Self {
        self.squad = Some(squad);
        self
    }
}

/// Requests waiting for the next tick.
#[derive(Resource, Debug, Default)]
pub struct SpawnQueue {
    pending: Vec<SpawnRequest>,
}

impl SpawnQueue {
    pub fn push(&mut self, request: SpawnRequest) {
        self.pending.push(request);
    }

    pub fn drain(&mut self) -> Vec<SpawnRequest> {
        std::mem::take(&mut self.pending)
    }

    /// Money already promised to queued requests of a faction.
    pub fn committed(&self, faction: Faction) -> u32 {
        self.pending
            .iter()
            .filter(|r| r.faction == faction)
            .map(|r| r.cost)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Drains the queue, deducting each request's cost.
pub fn spawn_intake_system(
    mut commands: Commands,
    tick: Res<SimTick>,
    mut queue: ResMut<SpawnQueue>,
    mut ledger: ResMut<EconomyLedger>,
    mut ids: ResMut<IdAllocator>,
    mut rng: ResMut<SimRng>,
    mut events: ResMut<EventBuffer>,
) {
    let requests = queue.drain();
    if requests.is_empty() {
        return;
    }
    // Squad members share one spawn row.
    let mut squad_rows: HashMap<u32, f32> = HashMap::new();

    for req in requests {
        let profile = req.kind.profile();
        if profile.delivery.needs_target() && req.target.is_none() {
            tracing::warn!(kind = ?req.kind, faction = ?req.faction, "dropping targeted spawn without a target");
            continue;
        }
        ledger.spend(req.faction, req.cost as f64);

        if let (Delivery::Flyover(payload), Some(target)) = (profile.delivery, req.target) {
            let mut flyover = Flyover::new(req.faction, payload, target, req.cost);
            flyover.squad = req.squad;
            commands.spawn(flyover);
            tracing::debug!(kind = ?req.kind, faction = ?req.faction, ?target, "aircraft launched");
            continue;
        }

        let (x, y) = match req.target {
            Some(target) => target,
            None => {
                let (dx, dy) = req.offset.unwrap_or((0.0, 0.0));
                let row = match req.squad {
                    Some(squad) => *squad_rows
                        .entry(squad)
                        .or_insert_with(|| rng.0.gen_range(SPAWN_MIN_Y..SPAWN_MAX_Y)),
                    None => rng.0.gen_range(SPAWN_MIN_Y..SPAWN_MAX_Y),
                };
                (req.faction.home_x() + dx, (row + dy).clamp(PLAY_MIN_Y, PLAY_MAX_Y))
            }
        };

        let id = ids.next_id();
        commands.spawn(
            UnitBundle::new(id, req.kind, req.faction, x, y, tick.0)
                .with_cost(req.cost)
                .with_squad(req.squad),
        );
        if !profile.caps.static_hazard() {
            events.push(SimEvent::UnitSpawned {
                faction: req.faction,
                kind: req.kind,
            });
        }
        tracing::debug!(id, kind = ?req.kind, faction = ?req.faction, x, y, "unit spawned");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intake_world(money: f64) -> World {
        let mut world = World::new();
        world.insert_resource(SimTick(1));
        world.insert_resource(SpawnQueue::default());
        world.insert_resource(EconomyLedger::new(money));
        world.insert_resource(IdAllocator::default());
        world.insert_resource(SimRng::from_seed(7));
        world.insert_resource(EventBuffer::default());
        world
    }

    fn run(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems(spawn_intake_system);
        schedule.run(world);
    }

    #[test]
    fn test_intake_deducts_and_spawns() {
        let mut world = intake_world(2000.0);
        world
            .resource_mut::<SpawnQueue>()
            .push(SpawnRequest::new(Faction::West, UnitKind::Tank).with_offset(0.0, 0.0));
        run(&mut world);

        assert_eq!(world.resource::<EconomyLedger>().money(Faction::West), 1900.0);
        let mut query = world.query::<(&UnitKind, &Position, &Lifecycle)>();
        let (kind, pos, life) = query.single(&world);
        assert_eq!(*kind, UnitKind::Tank);
        assert_eq!(pos.x, HOME_EDGE_INSET);
        assert!(pos.y >= SPAWN_MIN_Y && pos.y <= SPAWN_MAX_Y);
        assert_eq!(life.paid_cost, 100);
        assert!(world.resource::<SpawnQueue>().is_empty());
    }

    #[test]
    fn test_spend_never_goes_negative() {
        let mut world = intake_world(30.0);
        world
            .resource_mut::<SpawnQueue>()
            .push(SpawnRequest::new(Faction::East, UnitKind::Tank));
        run(&mut world);
        assert_eq!(world.resource::<EconomyLedger>().money(Faction::East), 0.0);
    }

    #[test]
    fn test_targeted_kind_without_target_is_dropped() {
        let mut world = intake_world(2000.0);
        world
            .resource_mut::<SpawnQueue>()
            .push(SpawnRequest::new(Faction::West, UnitKind::Nuke));
        run(&mut world);
        assert_eq!(world.resource::<EconomyLedger>().money(Faction::West), 2000.0);
        assert_eq!(world.query::<&Flyover>().iter(&world).count(), 0);
    }

    #[test]
    fn test_air_delivery_creates_flyover() {
        let mut world = intake_world(2000.0);
        world
            .resource_mut::<SpawnQueue>()
            .push(SpawnRequest::new(Faction::East, UnitKind::MissileStrike).at(200.0, 300.0));
        run(&mut world);
        let mut query = world.query::<&Flyover>();
        let flyover = query.single(&world);
        assert_eq!(flyover.target, (200.0, 300.0));
        assert_eq!(flyover.salvo_left, 3);
        assert!(flyover.speed < 0.0);
        assert_eq!(world.query::<&UnitId>().iter(&world).count(), 0);
    }

    #[test]
    fn test_squad_shares_spawn_row() {
        let mut world = intake_world(2000.0);
        {
            let mut queue = world.resource_mut::<SpawnQueue>();
            queue.push(SpawnRequest::new(Faction::West, UnitKind::Soldier).in_squad(4).with_offset(-15.0, 0.0));
            queue.push(SpawnRequest::new(Faction::West, UnitKind::Soldier).in_squad(4).with_offset(15.0, 0.0).with_cost(0));
        }
        run(&mut world);
        let mut query = world.query::<&Position>();
        let ys: Vec<f32> = query.iter(&world).map(|p| p.y).collect();
        assert_eq!(ys.len(), 2);
        assert_eq!(ys[0], ys[1]);
        assert_eq!(world.resource::<EconomyLedger>().money(Faction::West), 1975.0);
    }
}

//! Read-only snapshot of the simulation state.
//!
//! The `Snapshot` struct is what presentation layers render from each tick.

use crate::components::*;
use crate::economy::EconomyLedger;
use crate::systems::{MatchOutcome, SimTick, WorldFlash};
use crate::terrain::{FeatureKind, TerrainField, TreeState};
use crate::units::{Payload, UnitKind};
use crate::weather::{Weather, WeatherMode};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Snapshot of a single unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub id: u32,
    pub faction: Faction,
    pub kind: UnitKind,
    pub x: f32,
    pub y: f32,
    pub health: f32,
    pub health_max: f32,
    pub in_cover: bool,
    pub on_hill: bool,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub faction: Faction,
    pub x: f32,
    pub y: f32,
    pub domain: TargetDomain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlyoverSnapshot {
    pub faction: Faction,
    pub payload: Payload,
    pub x: f32,
    pub altitude: f32,
    pub health: f32,
    /// Row of the falling napalm canister, if one is in the air.
    pub canister_y: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissileSnapshot {
    pub faction: Faction,
    pub x: f32,
    pub y: f32,
    pub nuke: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleSnapshot {
    pub kind: ParticleKind,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub life: u32,
}

/// A tree whose state has changed from intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub id: u32,
    pub state: TreeState,
}

/// Complete simulation state for one tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current simulation tick.
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub time: f32,
    /// Live units, ordered by id.
    pub units: Vec<UnitSnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub flyovers: Vec<FlyoverSnapshot>,
    pub missiles: Vec<MissileSnapshot>,
    pub particles: Vec<ParticleSnapshot>,
    /// Burning, burnt or broken trees.
    pub trees: Vec<TreeSnapshot>,
    pub score: FactionPair<u32>,
    pub money: FactionPair<f64>,
    pub weather: WeatherMode,
    /// Nuke white-out, 1.0 at detonation fading to 0.
    pub flash: f32,
    pub winner: Option<Faction>,
}

impl Snapshot {
    /// Create a snapshot from the ECS world.
    pub fn from_world(world: &mut World, time: f32) -> Self {
        let tick = world.get_resource::<SimTick>().map(|t| t.0).unwrap_or(0);

        let mut unit_query = world.query::<(
            &UnitId,
            &Faction,
            &UnitKind,
            &Position,
            &Health,
            &CoverState,
            &TerrainFlags,
            &Lifecycle,
        )>();
        let mut units: Vec<UnitSnapshot> = unit_query
            .iter(world)
            .filter(|(.., health, _, _, _)| health.is_alive())
            .map(|(id, faction, kind, pos, health, cover, flags, life)| UnitSnapshot {
                id: id.0,
                faction: *faction,
                kind: *kind,
                x: pos.x,
                y: pos.y,
                health: health.current,
                health_max: health.max,
                in_cover: cover.in_cover,
                on_hill: flags.on_hill,
                descending: life.is_descending(tick),
            })
            .collect();
        units.sort_by_key(|u| u.id);

        let projectiles = world
            .query::<&Projectile>()
            .iter(world)
            .map(|p| ProjectileSnapshot {
                faction: p.faction,
                x: p.x,
                y: p.y,
                domain: p.domain,
            })
            .collect();

        let flyovers = world
            .query::<&Flyover>()
            .iter(world)
            .map(|f| FlyoverSnapshot {
                faction: f.faction,
                payload: f.payload,
                x: f.x,
                altitude: f.altitude,
                health: f.health,
                canister_y: f.canister.map(|c| c.y),
            })
            .collect();

        let missiles = world
            .query::<&GuidedMissile>()
            .iter(world)
            .map(|m| MissileSnapshot {
                faction: m.faction,
                x: m.x,
                y: m.y,
                nuke: m.warhead.friendly_fire(),
            })
            .collect();

        let particles = world
            .query::<&Particle>()
            .iter(world)
            .map(|p| ParticleSnapshot {
                kind: p.kind,
                x: p.x,
                y: p.y,
                size: p.size,
                life: p.life,
            })
            .collect();

        let trees: Vec<TreeSnapshot> = world
            .get_resource::<TerrainField>()
            .map(|terrain| {
                terrain
                    .trees()
                    .filter_map(|t| match t.kind {
                        FeatureKind::Tree(state) if state != TreeState::Normal => {
                            Some(TreeSnapshot { id: t.id, state })
                        }
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let (score, money) = world
            .get_resource::<EconomyLedger>()
            .map(|l| (l.score, l.money))
            .unwrap_or_default();

        Self {
            tick,
            time,
            units,
            projectiles,
            flyovers,
            missiles,
            particles,
            trees,
            score,
            money,
            weather: world
                .get_resource::<Weather>()
                .map(|w| w.mode)
                .unwrap_or(WeatherMode::Clear),
            flash: world.get_resource::<WorldFlash>().map(|f| f.0).unwrap_or(0.0),
            winner: world.get_resource::<MatchOutcome>().and_then(|o| o.winner),
        }
    }

    /// Live units of one faction.
    pub fn units_of(&self, faction: Faction) -> impl Iterator<Item = &UnitSnapshot> {
        self.units.iter().filter(move |u| u.faction == faction)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty JSON (for debugging).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

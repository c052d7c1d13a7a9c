//! ECS components for the East vs West simulation.
//!
//! Components are plain data. Behaviour lives in `systems`.

use crate::constants::*;
use crate::units::{Payload, UnitKind};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// Ground position of a unit (x = west/east, y = screen row).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

// ============================================================================
// IDENTITY COMPONENTS
// ============================================================================

/// Stable unit identifier, also used to seed per-unit wobble.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

/// One of the two symmetric sides.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    West,
    East,
}

impl Faction {
    /// Sign of the x axis this faction advances along.
    #[inline]
    pub fn direction(self) -> f32 {
        match self {
            Faction::West => 1.0,
            Faction::East => -1.0,
        }
    }

    pub fn opponent(self) -> Faction {
        match self {
            Faction::West => Faction::East,
            Faction::East => Faction::West,
        }
    }

    pub fn home_x(self) -> f32 {
        match self {
            Faction::West => HOME_EDGE_INSET,
            Faction::East => FIELD_WIDTH - HOME_EDGE_INSET,
        }
    }

    /// True once `x` is past the enemy edge.
    pub fn has_crossed(self, x: f32) -> bool {
        match self {
            Faction::West => x > FIELD_WIDTH,
            Faction::East => x < 0.0,
        }
    }

    /// True if `x` lies in the half of the field this faction attacks.
    pub fn is_enemy_territory(self, x: f32) -> bool {
        let mid = FIELD_WIDTH / 2.0;
        match self {
            Faction::West => x >= mid,
            Faction::East => x <= mid,
        }
    }
}

/// A value held per faction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FactionPair<T> {
    pub west: T,
    pub east: T,
}

impl<T> FactionPair<T> {
    pub fn new(west: T, east: T) -> Self {
        Self { west, east }
    }

    pub fn get(&self, faction: Faction) -> &T {
        match faction {
            Faction::West => &self.west,
            Faction::East => &self.east,
        }
    }

    pub fn get_mut(&mut self, faction: Faction) -> &mut T {
        match faction {
            Faction::West => &mut self.west,
            Faction::East => &mut self.east,
        }
    }
}

// ============================================================================
// COMBAT COMPONENTS
// ============================================================================

/// Hit points. Never exceeds `max`, never drops below zero.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    pub fn damage(&mut self, amount: f32) {
        self.current = (self.current - amount).max(0.0);
    }

    pub fn kill(&mut self) {
        self.current = 0.0;
    }
}

/// Weapon readiness.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Attack {
    /// Ticks until the next shot. Decremented by one every tick.
    pub cooldown: u32,
    /// Rounds left in the current burst.
    pub burst_left: u8,
}

/// Cover occupancy of an infantry unit.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CoverState {
    pub in_cover: bool,
    pub cover_id: Option<u32>,
    pub entered_tick: u64,
    pub dwell: u32,
    /// The last cover left. Never re-entered straight away.
    pub last_cover: Option<u32>,
}

impl CoverState {
    pub fn enter(&mut self, cover_id: u32, tick: u64, dwell: u32) {
        self.in_cover = true;
        self.cover_id = Some(cover_id);
        self.entered_tick = tick;
        self.dwell = dwell;
    }

    pub fn dwell_elapsed(&self, tick: u64) -> bool {
        tick.saturating_sub(self.entered_tick) >= self.dwell as u64
    }

    pub fn leave(&mut self) {
        self.in_cover = false;
        self.last_cover = self.cover_id.take();
    }
}

/// Terrain flags recomputed every tick before movement and targeting.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TerrainFlags {
    pub on_hill: bool,
    pub in_water: bool,
}

/// Bookkeeping from spawn to removal.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Lifecycle {
    pub spawn_tick: u64,
    /// Money actually paid for this unit, refunded on arrival.
    pub paid_cost: u32,
    pub squad: Option<u32>,
    /// Paratroopers are under canopy until this tick.
    pub descent_until: Option<u64>,
    /// Reached the enemy edge. Removed without a death effect.
    pub arrived: bool,
}

impl Lifecycle {
    #[inline]
    pub fn is_descending(&self, tick: u64) -> bool {
        self.descent_until.is_some_and(|until| tick < until)
    }
}

/// Everything a live unit carries.
#[derive(Bundle)]
pub struct UnitBundle {
    pub id: UnitId,
    pub kind: UnitKind,
    pub faction: Faction,
    pub position: Position,
    pub health: Health,
    pub attack: Attack,
    pub cover: CoverState,
    pub terrain: TerrainFlags,
    pub lifecycle: Lifecycle,
}

impl UnitBundle {
    pub fn new(id: u32, kind: UnitKind, faction: Faction, x: f32, y: f32, spawn_tick: u64) -> Self {
        Self {
            id: UnitId(id),
            kind,
            faction,
            position: Position::new(x, y),
            health: Health::new(kind.profile().health),
            attack: Attack::default(),
            cover: CoverState::default(),
            terrain: TerrainFlags::default(),
            lifecycle: Lifecycle {
                spawn_tick,
                ..Default::default()
            },
        }
    }

    pub fn with_cost(mut self, paid_cost: u32) -> Self {
        self.lifecycle.paid_cost = paid_cost;
        self
    }

    pub fn with_squad(mut self, squad: Option<u32>) -> Self {
        self.lifecycle.squad = squad;
        self
    }

    pub fn descending_until(mut self, tick: u64) -> Self {
        self.lifecycle.descent_until = Some(tick);
        self
    }
}

// ============================================================================
// ORDNANCE COMPONENTS
// ============================================================================

/// Which targets a round can hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetDomain {
    Ground,
    Air,
}

/// A round in flight.
#[derive(Component, Debug, Clone, Copy)]
pub struct Projectile {
    pub faction: Faction,
    pub source: UnitKind,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub damage: f32,
    pub explosion_radius: Option<f32>,
    pub domain: TargetDomain,
    pub traveled: f32,
    pub max_range: f32,
}

impl Projectile {
    /// True once the round has left the field for its domain.
    pub fn out_of_bounds(&self) -> bool {
        let top = match self.domain {
            TargetDomain::Air => -50.0,
            TargetDomain::Ground => HORIZON_Y,
        };
        self.x < 0.0 || self.x > FIELD_WIDTH || self.y < top || self.y > FIELD_HEIGHT + 50.0
    }
}

/// Falling napalm canister released by an airstrike.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Canister {
    pub y: f32,
    pub vy: f32,
}

/// An aircraft crossing the field to deliver a payload.
#[derive(Component, Debug, Clone, Copy)]
pub struct Flyover {
    pub faction: Faction,
    pub payload: Payload,
    pub x: f32,
    pub altitude: f32,
    pub target: (f32, f32),
    /// Signed horizontal speed.
    pub speed: f32,
    pub dropped: bool,
    pub salvo_left: u8,
    pub health: f32,
    pub canister: Option<Canister>,
    pub paid_cost: u32,
    pub squad: Option<u32>,
}

impl Flyover {
    pub fn new(faction: Faction, payload: Payload, target: (f32, f32), paid_cost: u32) -> Self {
        let start_x = match faction {
            Faction::West => -FLYOVER_START_OFFSET,
            Faction::East => FIELD_WIDTH + FLYOVER_START_OFFSET,
        };
        Self {
            faction,
            payload,
            x: start_x,
            altitude: payload.altitude(),
            target,
            speed: payload.cruise_speed() * faction.direction(),
            dropped: false,
            salvo_left: payload.salvo_size(),
            health: FLYOVER_HEALTH,
            canister: None,
            paid_cost,
            squad: None,
        }
    }

    pub fn in_release_window(&self) -> bool {
        (self.x - self.target.0).abs() < FLYOVER_RELEASE_WINDOW
    }

    pub fn has_exited(&self) -> bool {
        self.x.abs() > FLYOVER_EXIT_DISTANCE
    }
}

/// Warhead carried by a guided missile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Warhead {
    /// Hits enemies only.
    Conventional { damage: f32, radius: f32 },
    /// Hits everything in a huge radius, flashes the sky, leaves a cloud.
    Nuke { damage: f32, radius: f32 },
}

impl Warhead {
    pub fn damage(&self) -> f32 {
        match *self {
            Warhead::Conventional { damage, .. } | Warhead::Nuke { damage, .. } => damage,
        }
    }

    pub fn radius(&self) -> f32 {
        match *self {
            Warhead::Conventional { radius, .. } | Warhead::Nuke { radius, .. } => radius,
        }
    }

    pub fn friendly_fire(&self) -> bool {
        matches!(self, Warhead::Nuke { .. })
    }
}

/// A missile descending toward a ground coordinate.
#[derive(Component, Debug, Clone, Copy)]
pub struct GuidedMissile {
    pub faction: Faction,
    pub target: (f32, f32),
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub warhead: Warhead,
}

// ============================================================================
// COSMETIC COMPONENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    Fire,
    Debris,
    Blood,
    Smoke,
    Cloud,
}

/// Cosmetic token with no gameplay effect.
#[derive(Component, Debug, Clone, Copy)]
pub struct Particle {
    pub kind: ParticleKind,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Velocity multiplier applied every tick.
    pub drag: f32,
    pub life: u32,
    pub size: f32,
}

impl Particle {
    pub fn still(kind: ParticleKind, x: f32, y: f32, life: u32, size: f32) -> Self {
        Self {
            kind,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            drag: 1.0,
            life,
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_clamps_at_zero() {
        let mut health = Health::new(12.0);
        health.damage(5.0);
        assert!((health.current - 7.0).abs() < 1e-6);
        health.damage(50.0);
        assert_eq!(health.current, 0.0);
        assert!(!health.is_alive());
    }

    #[test]
    fn test_faction_geometry() {
        assert!(Faction::West.has_crossed(800.5));
        assert!(!Faction::West.has_crossed(799.0));
        assert!(Faction::East.has_crossed(-0.1));
        assert!(Faction::West.is_enemy_territory(400.0));
        assert!(!Faction::West.is_enemy_territory(399.0));
        assert!(Faction::East.is_enemy_territory(120.0));
        assert_eq!(Faction::West.opponent(), Faction::East);
    }

    #[test]
    fn test_cover_state_remembers_last_cover() {
        let mut cover = CoverState::default();
        cover.enter(7, 100, 120);
        assert!(!cover.dwell_elapsed(200));
        assert!(cover.dwell_elapsed(220));
        cover.leave();
        assert!(!cover.in_cover);
        assert_eq!(cover.last_cover, Some(7));
        assert_eq!(cover.cover_id, None);
    }

    #[test]
    fn test_flyover_starts_off_field() {
        let west = Flyover::new(Faction::West, Payload::Nuke, (600.0, 300.0), 1000);
        assert_eq!(west.x, -FLYOVER_START_OFFSET);
        assert!(west.speed > 0.0);
        assert_eq!(west.salvo_left, 1);
        let east = Flyover::new(Faction::East, Payload::MissileSalvo, (200.0, 300.0), 110);
        assert!(east.speed < 0.0);
        assert_eq!(east.salvo_left, 3);
        assert_eq!(east.altitude, 35.0);
    }

    #[test]
    fn test_descent_window() {
        let life = Lifecycle {
            descent_until: Some(180),
            ..Default::default()
        };
        assert!(life.is_descending(179));
        assert!(!life.is_descending(180));
        assert!(!Lifecycle::default().is_descending(0));
    }
}

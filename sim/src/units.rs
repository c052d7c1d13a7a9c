//! Unit roster and the per-kind capability table.
//!
//! Every behavioural branch in movement and combat consults a [`UnitProfile`]
//! instead of matching on the kind, so adding a kind means adding one row.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// The sixteen purchasable or derived unit kinds.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    Tank,
    Soldier,
    Artillery,
    Rambo,
    Airborne,
    Airstrike,
    MissileStrike,
    Napalm,
    MinePersonal,
    MineTank,
    Drone,
    AntiAir,
    Nuke,
    Helicopter,
    Sniper,
    Tesla,
}

impl UnitKind {
    pub const ALL: [UnitKind; 16] = [
        UnitKind::Tank,
        UnitKind::Soldier,
        UnitKind::Artillery,
        UnitKind::Rambo,
        UnitKind::Airborne,
        UnitKind::Airstrike,
        UnitKind::MissileStrike,
        UnitKind::Napalm,
        UnitKind::MinePersonal,
        UnitKind::MineTank,
        UnitKind::Drone,
        UnitKind::AntiAir,
        UnitKind::Nuke,
        UnitKind::Helicopter,
        UnitKind::Sniper,
        UnitKind::Tesla,
    ];

    /// Static stats and capabilities for this kind.
    pub fn profile(self) -> &'static UnitProfile {
        match self {
            UnitKind::Tank => &TANK,
            UnitKind::Soldier => &SOLDIER,
            UnitKind::Artillery => &ARTILLERY,
            UnitKind::Rambo => &RAMBO,
            UnitKind::Airborne => &AIRBORNE,
            UnitKind::Airstrike => &AIRSTRIKE,
            UnitKind::MissileStrike => &MISSILE_STRIKE,
            UnitKind::Napalm => &NAPALM,
            UnitKind::MinePersonal => &MINE_PERSONAL,
            UnitKind::MineTank => &MINE_TANK,
            UnitKind::Drone => &DRONE,
            UnitKind::AntiAir => &ANTI_AIR,
            UnitKind::Nuke => &NUKE,
            UnitKind::Helicopter => &HELICOPTER,
            UnitKind::Sniper => &SNIPER,
            UnitKind::Tesla => &TESLA,
        }
    }

    #[inline]
    pub fn caps(self) -> &'static Capabilities {
        &self.profile().caps
    }
}

/// What an aircraft carries to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    /// Drops a canister that ignites a napalm field.
    Napalm,
    Paratroopers,
    MissileSalvo,
    Nuke,
}

impl Payload {
    /// Cruise altitude (screen row) of the carrying aircraft.
    pub fn altitude(self) -> f32 {
        match self {
            Payload::MissileSalvo | Payload::Nuke => 35.0,
            Payload::Paratroopers => 45.0,
            Payload::Napalm => 55.0,
        }
    }

    /// Horizontal speed magnitude of the carrying aircraft.
    pub fn cruise_speed(self) -> f32 {
        match self {
            Payload::MissileSalvo | Payload::Nuke => 5.0,
            Payload::Paratroopers | Payload::Napalm => 6.0,
        }
    }

    pub fn salvo_size(self) -> u8 {
        match self {
            Payload::MissileSalvo => 3,
            Payload::Nuke => 1,
            Payload::Paratroopers | Payload::Napalm => 0,
        }
    }
}

/// How a purchase materialises on the battlefield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Walks or drives in from the home edge.
    Ground,
    /// Placed at a target coordinate (mines).
    Placed,
    /// Delivered by an aircraft flying to a target coordinate.
    Flyover(Payload),
    /// Only ever created by the simulation itself.
    Derived,
}

impl Delivery {
    pub fn needs_target(self) -> bool {
        matches!(self, Delivery::Placed | Delivery::Flyover(_))
    }
}

/// Per-kind firing modifiers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FirePattern {
    /// One round per interval, straight at the target.
    Direct,
    /// Random angular spread and an extended shell range.
    Spread { half_angle: f32, range_mult: f32 },
    /// Fixed miss chance. A miss fires a harmless round off-angle.
    Marksman { miss_chance: f64 },
    /// Several rounds spaced a few ticks apart, then the full interval.
    Burst { rounds: u8, spacing: u32 },
    /// Does not fire at all.
    Inert,
}

/// Cosmetic side effect when a unit dies in combat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathEffect {
    Explosion,
    Scream,
    Silent,
}

/// Behaviour flags queried by movement and combat.
#[derive(Debug, Clone, Copy, Default)]
pub struct Capabilities {
    pub flies: bool,
    /// Flying units that hold at stand-off range instead of ramming.
    pub hovers: bool,
    /// Damage is spread over an area with falloff.
    pub area_weapon: bool,
    /// Rounds from this kind are not reduced by cover.
    pub ignores_cover: bool,
    /// Cannot ford the river.
    pub heavy_vehicle: bool,
    pub crushes_trees: bool,
    pub avoids_obstacles: bool,
    pub seeks_cover: bool,
    /// Napalm ground fire.
    pub ground_fire: bool,
    pub mine: bool,
    /// May target aircraft and paratroopers still under canopy.
    pub engages_air: bool,
    /// Fires air-domain rounds and only at air targets.
    pub anti_air: bool,
    pub reload_bonus: bool,
}

impl Capabilities {
    /// Mines and ground fire: never move, never targeted by direct fire.
    #[inline]
    pub fn static_hazard(&self) -> bool {
        self.ground_fire || self.mine
    }
}

/// Stats and capabilities of one unit kind.
#[derive(Debug, Clone, Copy)]
pub struct UnitProfile {
    pub cost: u32,
    pub health: f32,
    pub damage: f32,
    pub speed: f32,
    pub range: f32,
    /// Ticks between shots.
    pub attack_interval: u32,
    /// Body width, used for hit tests.
    pub width: f32,
    /// Explosion, burn or trigger radius, depending on the kind.
    pub blast_radius: Option<f32>,
    pub score_value: u32,
    pub delivery: Delivery,
    pub fire: FirePattern,
    pub death: DeathEffect,
    pub caps: Capabilities,
}

const NONE: Capabilities = Capabilities {
    flies: false,
    hovers: false,
    area_weapon: false,
    ignores_cover: false,
    heavy_vehicle: false,
    crushes_trees: false,
    avoids_obstacles: false,
    seeks_cover: false,
    ground_fire: false,
    mine: false,
    engages_air: false,
    anti_air: false,
    reload_bonus: false,
};

const INFANTRY: Capabilities = Capabilities {
    seeks_cover: true,
    reload_bonus: true,
    ..NONE
};

const BASE: UnitProfile = UnitProfile {
    cost: 0,
    health: 1.0,
    damage: 0.0,
    speed: 0.0,
    range: 0.0,
    attack_interval: 0,
    width: 16.0,
    blast_radius: None,
    score_value: 1,
    delivery: Delivery::Ground,
    fire: FirePattern::Direct,
    death: DeathEffect::Silent,
    caps: NONE,
};

static TANK: UnitProfile = UnitProfile {
    cost: 100,
    health: 210.0,
    damage: 90.0,
    speed: 0.6,
    range: 220.0,
    attack_interval: 100,
    width: 40.0,
    score_value: 3,
    death: DeathEffect::Explosion,
    caps: Capabilities {
        ignores_cover: true,
        heavy_vehicle: true,
        crushes_trees: true,
        avoids_obstacles: true,
        reload_bonus: true,
        ..NONE
    },
    ..BASE
};

static SOLDIER: UnitProfile = UnitProfile {
    cost: 25,
    health: 12.0,
    damage: 8.0,
    speed: 0.45,
    range: 140.0,
    attack_interval: 60,
    width: 16.0,
    death: DeathEffect::Scream,
    caps: INFANTRY,
    ..BASE
};

static ARTILLERY: UnitProfile = UnitProfile {
    cost: 55,
    health: 30.0,
    damage: 25.0,
    speed: 0.35,
    range: 700.0,
    attack_interval: 500,
    width: 35.0,
    blast_radius: Some(60.0),
    fire: FirePattern::Spread {
        half_angle: 0.125,
        range_mult: 1.5,
    },
    death: DeathEffect::Explosion,
    caps: Capabilities {
        area_weapon: true,
        ignores_cover: true,
        heavy_vehicle: true,
        crushes_trees: true,
        avoids_obstacles: true,
        reload_bonus: true,
        ..NONE
    },
    ..BASE
};

static RAMBO: UnitProfile = UnitProfile {
    cost: 70,
    health: 100.0,
    damage: 25.0,
    speed: 0.55,
    range: 180.0,
    attack_interval: 15,
    width: 24.0,
    death: DeathEffect::Scream,
    caps: INFANTRY,
    ..BASE
};

static AIRBORNE: UnitProfile = UnitProfile {
    cost: 60,
    health: 15.0,
    damage: 12.0,
    speed: 0.5,
    range: 160.0,
    attack_interval: 50,
    width: 18.0,
    delivery: Delivery::Flyover(Payload::Paratroopers),
    death: DeathEffect::Scream,
    caps: INFANTRY,
    ..BASE
};

static AIRSTRIKE: UnitProfile = UnitProfile {
    cost: 90,
    health: 40.0,
    delivery: Delivery::Flyover(Payload::Napalm),
    fire: FirePattern::Inert,
    ..BASE
};

static MISSILE_STRIKE: UnitProfile = UnitProfile {
    cost: 110,
    health: 40.0,
    damage: 200.0,
    blast_radius: Some(60.0),
    delivery: Delivery::Flyover(Payload::MissileSalvo),
    fire: FirePattern::Inert,
    caps: Capabilities {
        area_weapon: true,
        ignores_cover: true,
        ..NONE
    },
    ..BASE
};

static NAPALM: UnitProfile = UnitProfile {
    cost: 0,
    // Burn timer: loses one point per tick.
    health: 300.0,
    damage: 1.2,
    width: 100.0,
    blast_radius: Some(100.0),
    delivery: Delivery::Derived,
    fire: FirePattern::Inert,
    caps: Capabilities {
        area_weapon: true,
        ignores_cover: true,
        ground_fire: true,
        ..NONE
    },
    ..BASE
};

static MINE_PERSONAL: UnitProfile = UnitProfile {
    cost: 15,
    health: 1.0,
    damage: 50.0,
    width: 10.0,
    blast_radius: Some(25.0),
    delivery: Delivery::Placed,
    fire: FirePattern::Inert,
    caps: Capabilities {
        area_weapon: true,
        ignores_cover: true,
        mine: true,
        ..NONE
    },
    ..BASE
};

static MINE_TANK: UnitProfile = UnitProfile {
    cost: 25,
    health: 1.0,
    damage: 120.0,
    width: 14.0,
    blast_radius: Some(40.0),
    delivery: Delivery::Placed,
    fire: FirePattern::Inert,
    caps: Capabilities {
        area_weapon: true,
        ignores_cover: true,
        heavy_vehicle: true,
        mine: true,
        ..NONE
    },
    ..BASE
};

static DRONE: UnitProfile = UnitProfile {
    cost: 45,
    health: 15.0,
    damage: 5.0,
    speed: 1.8,
    range: 30.0,
    attack_interval: 45,
    width: 16.0,
    death: DeathEffect::Explosion,
    caps: Capabilities {
        flies: true,
        ignores_cover: true,
        ..NONE
    },
    ..BASE
};

static ANTI_AIR: UnitProfile = UnitProfile {
    cost: 50,
    health: 40.0,
    damage: 60.0,
    speed: 0.5,
    range: 400.0,
    attack_interval: 50,
    width: 30.0,
    death: DeathEffect::Explosion,
    caps: Capabilities {
        heavy_vehicle: true,
        engages_air: true,
        anti_air: true,
        reload_bonus: true,
        ..NONE
    },
    ..BASE
};

static NUKE: UnitProfile = UnitProfile {
    cost: 1000,
    health: 40.0,
    damage: 1000.0,
    blast_radius: Some(3000.0),
    delivery: Delivery::Flyover(Payload::Nuke),
    fire: FirePattern::Inert,
    caps: Capabilities {
        area_weapon: true,
        ignores_cover: true,
        ..NONE
    },
    ..BASE
};

static HELICOPTER: UnitProfile = UnitProfile {
    cost: 150,
    health: 100.0,
    damage: 25.0,
    speed: 1.2,
    range: 250.0,
    attack_interval: 25,
    width: 45.0,
    death: DeathEffect::Explosion,
    caps: Capabilities {
        flies: true,
        hovers: true,
        ignores_cover: true,
        engages_air: true,
        ..NONE
    },
    ..BASE
};

static SNIPER: UnitProfile = UnitProfile {
    cost: 80,
    health: 10.0,
    damage: 80.0,
    speed: 0.4,
    range: 350.0,
    attack_interval: 200,
    width: 16.0,
    fire: FirePattern::Marksman { miss_chance: 0.25 },
    death: DeathEffect::Scream,
    caps: INFANTRY,
    ..BASE
};

static TESLA: UnitProfile = UnitProfile {
    cost: 175,
    health: 150.0,
    damage: 110.0,
    speed: 0.55,
    range: 140.0,
    attack_interval: 200,
    width: 32.0,
    fire: FirePattern::Burst {
        rounds: 3,
        spacing: 8,
    },
    death: DeathEffect::Explosion,
    caps: Capabilities {
        ignores_cover: true,
        reload_bonus: true,
        ..NONE
    },
    ..BASE
};

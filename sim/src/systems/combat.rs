//! Combat: target search, firing, and damage rules.
//!
//! ## Phases
//!
//! 1. **Gather** - for every ready shooter, query the spatial grid for a
//!    target. Read-only, so it runs on rayon with `--features parallel`.
//! 2. **Fire** - serially spawn rounds, draw spread and miss rolls from the
//!    match RNG, and reset cooldowns.
//! 3. **Cooldown** - every live unit's cooldown drops by exactly one.
//!
//! Damage from rounds and explosions is gathered into [`CombatResults`] and
//! applied after all hit tests in a system have run. Nothing is removed here;
//! the death sweep at the end of the tick does that.

use crate::components::*;
use crate::constants::*;
use crate::events::{EventBuffer, SimEvent};
use crate::spatial::{SpatialEntry, SpatialGrid};
use crate::systems::clock::{SimRng, SimTick};
use crate::units::{FirePattern, UnitKind};
use bevy_ecs::prelude::*;
use rand::Rng;
use std::collections::{HashMap, HashSet};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Damage intents collected during hit tests.
#[derive(Debug, Default, Clone)]
pub struct CombatResults {
    pub damage: HashMap<Entity, f32>,
}

impl CombatResults {
    pub fn add(&mut self, entity: Entity, amount: f32) {
        if amount > 0.0 {
            *self.damage.entry(entity).or_insert(0.0) += amount;
        }
    }

    /// Apply every intent. Health clamps at zero; removal is left to the sweep.
    pub fn apply(self, healths: &mut Query<&mut Health>) {
        for (entity, dmg) in self.damage {
            if let Ok(mut health) = healths.get_mut(entity) {
                health.damage(dmg);
            }
        }
    }
}

/// Linear falloff: full damage at the centre, nothing at `radius`.
#[inline]
pub fn falloff_damage(damage: f32, distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 || distance >= radius {
        0.0
    } else {
        damage * (1.0 - distance / radius)
    }
}

/// Direct-hit damage after cover. Area and heavy sources ignore cover.
#[inline]
pub fn direct_damage(damage: f32, source: UnitKind, target_in_cover: bool) -> f32 {
    let caps = source.caps();
    if target_in_cover && !caps.area_weapon && !caps.ignores_cover {
        damage * (1.0 - COVER_DAMAGE_REDUCTION)
    } else {
        damage
    }
}

/// Attack range after terrain and perspective.
pub fn effective_range(base: f32, flags: &TerrainFlags, y: f32) -> f32 {
    let terrain = if flags.on_hill {
        HILL_RANGE_BONUS
    } else if flags.in_water {
        WATER_RANGE_PENALTY
    } else {
        1.0
    };
    base * terrain * perspective_scale(y)
}

/// Reload time, shortened on a hill for eligible kinds.
pub fn reload_ticks(kind: UnitKind, on_hill: bool) -> u32 {
    let profile = kind.profile();
    if on_hill && profile.caps.reload_bonus {
        (profile.attack_interval as f32 * HILL_RELOAD_BONUS).floor() as u32
    } else {
        profile.attack_interval
    }
}

/// Explosive damage around a point to every enemy of `faction` in `radius`.
/// Ground fire is never a victim.
pub fn explosion_victims(
    grid: &SpatialGrid,
    faction: Faction,
    (x, y): (f32, f32),
    radius: f32,
    damage: f32,
    dead: &HashSet<Entity>,
    results: &mut CombatResults,
) {
    for victim in grid.query_enemies(x, y, radius, faction) {
        if victim.kind.caps().ground_fire || dead.contains(&victim.entity) {
            continue;
        }
        let d = victim.distance_sq(x, y).sqrt();
        results.add(victim.entity, falloff_damage(damage, d, radius));
    }
}

/// A unit ready to fire this tick.
#[derive(Debug, Clone, Copy)]
struct Shooter {
    entity: Entity,
    kind: UnitKind,
    faction: Faction,
    x: f32,
    y: f32,
    range: f32,
    on_hill: bool,
}

/// Where a shooter aims.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Aim {
    x: f32,
    y: f32,
    domain: TargetDomain,
}

/// Read-only target search for one shooter.
fn find_target(
    shooter: &Shooter,
    grid: &SpatialGrid,
    dead: &HashSet<Entity>,
    aircraft: &[(Faction, f32, f32)],
) -> Option<Aim> {
    let caps = shooter.kind.caps();
    let range_sq = shooter.range * shooter.range;
    let candidates = grid.query_enemies(shooter.x, shooter.y, shooter.range, shooter.faction);
    let live = |e: &&SpatialEntry| !dead.contains(&e.entity);

    if caps.anti_air {
        if let Some(target) = candidates
            .iter()
            .filter(live)
            .find(|e| e.is_air_target() && e.distance_sq(shooter.x, shooter.y) < range_sq)
        {
            return Some(Aim {
                x: target.x,
                y: target.y,
                domain: TargetDomain::Air,
            });
        }
        return aircraft
            .iter()
            .find(|(f, ax, ay)| {
                *f != shooter.faction && (ax - shooter.x).powi(2) + (ay - shooter.y).powi(2) < range_sq
            })
            .map(|&(_, x, y)| Aim {
                x,
                y,
                domain: TargetDomain::Air,
            });
    }

    candidates
        .iter()
        .filter(live)
        .filter(|e| !e.kind.caps().static_hazard())
        .filter(|e| caps.engages_air || !e.is_aerial_only())
        .find(|e| {
            // Engagements favour horizontal alignment.
            let dx = e.x - shooter.x;
            let dy = (e.y - shooter.y) * 2.0;
            dx * dx + dy * dy < range_sq
        })
        .map(|e| Aim {
            x: e.x,
            y: e.y,
            domain: TargetDomain::Ground,
        })
}

/// Finds targets, fires rounds and counts cooldowns down.
#[allow(clippy::too_many_arguments)]
pub fn targeting_system(
    mut commands: Commands,
    tick: Res<SimTick>,
    grid: Res<SpatialGrid>,
    mut rng: ResMut<SimRng>,
    mut events: ResMut<EventBuffer>,
    flyovers: Query<&Flyover>,
    mut units: Query<(
        Entity,
        &UnitKind,
        &Faction,
        &Position,
        &Health,
        &TerrainFlags,
        &Lifecycle,
        &mut Attack,
    )>,
) {
    let now = tick.0;

    // GATHER: ready shooters, dead units, live aircraft.
    let mut dead = HashSet::new();
    let mut shooters = Vec::new();
    for (entity, kind, faction, pos, health, flags, life, attack) in units.iter() {
        if !health.is_alive() {
            dead.insert(entity);
            continue;
        }
        let profile = kind.profile();
        if attack.cooldown > 0
            || life.is_descending(now)
            || life.arrived
            || profile.caps.static_hazard()
            || matches!(profile.fire, FirePattern::Inert)
        {
            continue;
        }
        shooters.push(Shooter {
            entity,
            kind: *kind,
            faction: *faction,
            x: pos.x,
            y: pos.y,
            range: effective_range(profile.range, flags, pos.y),
            on_hill: flags.on_hill,
        });
    }
    let aircraft: Vec<(Faction, f32, f32)> = flyovers
        .iter()
        .filter(|f| f.health > 0.0)
        .map(|f| (f.faction, f.x, f.altitude))
        .collect();

    #[cfg(feature = "parallel")]
    let aims: Vec<Option<Aim>> = shooters
        .par_iter()
        .map(|s| find_target(s, &grid, &dead, &aircraft))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let aims: Vec<Option<Aim>> = shooters
        .iter()
        .map(|s| find_target(s, &grid, &dead, &aircraft))
        .collect();

    // FIRE: serial, uses the match RNG.
    for (shooter, aim) in shooters.iter().zip(aims) {
        let Some(aim) = aim else {
            // Target lost: the next engagement starts a fresh burst.
            if let Ok((.., mut attack)) = units.get_mut(shooter.entity) {
                attack.burst_left = 0;
            }
            continue;
        };
        let profile = shooter.kind.profile();
        let mut angle = (aim.y - shooter.y).atan2(aim.x - shooter.x);
        let mut damage = profile.damage;
        let mut max_range = shooter.range;

        match profile.fire {
            FirePattern::Spread { half_angle, range_mult } => {
                angle += rng.0.gen_range(-half_angle..=half_angle);
                max_range *= range_mult;
            }
            FirePattern::Marksman { miss_chance } => {
                if rng.0.gen_bool(miss_chance) {
                    damage = 0.0;
                    let wide = rng.0.gen_range(0.3..0.6);
                    angle += if rng.0.gen_bool(0.5) { wide } else { -wide };
                }
            }
            FirePattern::Direct | FirePattern::Burst { .. } | FirePattern::Inert => {}
        }

        commands.spawn(Projectile {
            faction: shooter.faction,
            source: shooter.kind,
            x: shooter.x,
            y: shooter.y,
            vx: angle.cos() * PROJECTILE_SPEED,
            vy: angle.sin() * PROJECTILE_SPEED,
            damage,
            explosion_radius: profile.blast_radius,
            domain: aim.domain,
            traveled: 0.0,
            max_range,
        });
        events.push(SimEvent::ShotFired {
            faction: shooter.faction,
            kind: shooter.kind,
            x: shooter.x,
            y: shooter.y,
        });

        if let Ok((.., mut attack)) = units.get_mut(shooter.entity) {
            let reload = reload_ticks(shooter.kind, shooter.on_hill);
            match profile.fire {
                FirePattern::Burst { rounds, spacing } => {
                    attack.burst_left = if attack.burst_left == 0 {
                        rounds.saturating_sub(1)
                    } else {
                        attack.burst_left - 1
                    };
                    attack.cooldown = if attack.burst_left > 0 { spacing } else { reload };
                }
                _ => attack.cooldown = reload,
            }
        }
    }

    // COOLDOWN: exactly one tick off, fired or not.
    for (.., mut attack) in units.iter_mut() {
        attack.cooldown = attack.cooldown.saturating_sub(1);
    }
}

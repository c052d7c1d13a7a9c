//! Movement - layered steering for every mobile unit.
//!
//! Layers run in a fixed order and later layers may override earlier ones:
//!
//! 1. base advance toward the enemy edge, with a per-unit wobble
//! 2. flight (flyers only): ram or hover at stand-off range
//! 3. hill seeking, and damping while camped on a hill
//! 4. cover seeking and holding (infantry)
//! 5. obstacle avoidance (vehicles)
//! 6. separation from friendly units
//! 7. river gating: heavy vehicles only cross on bridges, infantry wade
//!
//! Neighbour lookups use the grid snapshot taken at the start of the tick.

use crate::components::*;
use crate::constants::*;
use crate::spatial::SpatialGrid;
use crate::systems::clock::{SimRng, SimTick};
use crate::terrain::TerrainField;
use crate::units::{UnitKind, UnitProfile};
use crate::weather::Weather;
use bevy_ecs::prelude::*;
use rand::Rng;

type Steer = (f32, f32);

#[inline]
fn toward((fx, fy): (f32, f32), (tx, ty): (f32, f32), speed: f32) -> Option<Steer> {
    let dx = tx - fx;
    let dy = ty - fy;
    let dist = (dx * dx + dy * dy).sqrt();
    (dist > f32::EPSILON).then(|| (dx / dist * speed, dy / dist * speed))
}

/// Flight layer. Returns `None` with no enemy in acquisition range.
fn flight_steering(
    me: Entity,
    profile: &UnitProfile,
    faction: Faction,
    pos: &Position,
    speed: f32,
    grid: &SpatialGrid,
    rng: &mut impl Rng,
) -> Option<Steer> {
    let target = grid.nearest(pos.x, pos.y, FLIGHT_ACQUIRE_RADIUS, |e| {
        e.entity != me && e.faction != faction && !e.kind.caps().static_hazard()
    })?;
    let dist = target.distance_sq(pos.x, pos.y).sqrt();

    if profile.caps.hovers {
        let standoff = profile.range * HOVER_STANDOFF * perspective_scale(pos.y);
        if dist <= standoff {
            return Some((
                rng.gen_range(-HOVER_JITTER..=HOVER_JITTER),
                rng.gen_range(-HOVER_JITTER..=HOVER_JITTER),
            ));
        }
    }
    toward((pos.x, pos.y), (target.x, target.y), speed)
}

/// Closest hill ahead within attraction range with no friendly camped on it.
fn hill_target(
    me: Entity,
    faction: Faction,
    pos: &Position,
    terrain: &TerrainField,
    grid: &SpatialGrid,
) -> Option<(f32, f32)> {
    terrain
        .hills()
        .filter(|h| (h.x - pos.x) * faction.direction() >= 0.0)
        .map(|h| (h.distance_to(pos.x, pos.y), h))
        .filter(|(d, _)| *d <= HILL_ATTRACT_RADIUS)
        .filter(|(_, h)| {
            !grid.any_within(h.x, h.y, h.size * HILL_OCCUPIED_FRACTION, |e| {
                e.entity != me && e.faction == faction
            })
        })
        .fold(None, |best: Option<(f32, (f32, f32))>, (d, h)| match best {
            Some((bd, _)) if bd <= d => best,
            _ => Some((d, (h.x, h.y))),
        })
        .map(|(_, centre)| centre)
}

/// Repulsion away from trees and rocks, stronger the closer they are.
/// Always carries a sideways component so a head-on approach slides past.
fn obstacle_avoidance(pos: &Position, terrain: &TerrainField) -> Steer {
    terrain
        .features
        .iter()
        .filter_map(|f| f.avoid_radius().map(|r| (f, r)))
        .fold((0.0, 0.0), |(ax, ay), (f, r)| {
            let dx = pos.x - f.x;
            let dy = pos.y - f.y;
            let d = (dx * dx + dy * dy).sqrt();
            if d >= r || d <= f32::EPSILON {
                return (ax, ay);
            }
            let push = AVOID_STRENGTH * (1.0 - d / r);
            let side = if dy.abs() <= f32::EPSILON { 1.0 } else { dy.signum() };
            (ax + dx / d * push, ay + side * (dy / d).abs().max(0.5) * push)
        })
}

/// Averaged push away from moving friendlies inside personal space.
fn separation(me: Entity, faction: Faction, pos: &Position, grid: &SpatialGrid) -> Steer {
    let mut sum = (0.0, 0.0);
    let mut neighbours = 0;
    for other in grid.query_friendlies(pos.x, pos.y, SEPARATION_RADIUS, faction) {
        if other.entity == me || !other.is_moving() {
            continue;
        }
        let dx = pos.x - other.x;
        let dy = pos.y - other.y;
        let d = (dx * dx + dy * dy).sqrt();
        if d > 0.0 && d < SEPARATION_RADIUS {
            sum.0 += dx / d;
            sum.1 += dy / d;
            neighbours += 1;
        }
    }
    if neighbours == 0 {
        return (0.0, 0.0);
    }
    let n = neighbours as f32;
    (sum.0 / n * SEPARATION_STRENGTH, sum.1 / n * SEPARATION_STRENGTH)
}

/// River layer for ground units standing in the water off a bridge.
fn river_gate(mv: Steer, kind: UnitKind, faction: Faction, pos: &Position, speed: f32, terrain: &TerrainField) -> Steer {
    if !terrain.in_river_band(pos.x, pos.y) || terrain.is_on_bridge_at(pos.x, pos.y) {
        return mv;
    }
    if !kind.caps().heavy_vehicle {
        return (mv.0 * RIVER_WADE_FACTOR, mv.1 * RIVER_WADE_FACTOR);
    }
    if !terrain.river_crossing_needed(faction, pos.x, pos.y) {
        return mv;
    }
    match terrain.nearest_bridge_by_row_distance(pos.y) {
        Some(bridge) => {
            let dy = bridge.y - pos.y;
            if dy.abs() < BRIDGE_ALIGNED_DISTANCE {
                (faction.direction() * speed, mv.1)
            } else {
                let pull = dy.signum() * dy.abs().min(speed * BRIDGE_ALIGN_PULL);
                (0.0, pull)
            }
        }
        None => (0.0, mv.1),
    }
}

/// Steers and moves every live unit that is not static, descending or done.
#[allow(clippy::too_many_arguments)]
pub fn movement_system(
    tick: Res<SimTick>,
    grid: Res<SpatialGrid>,
    terrain: Res<TerrainField>,
    weather: Res<Weather>,
    mut rng: ResMut<SimRng>,
    mut units: Query<(
        Entity,
        &UnitId,
        &UnitKind,
        &Faction,
        &mut Position,
        &Health,
        &TerrainFlags,
        &Lifecycle,
        &mut CoverState,
    )>,
) {
    let now = tick.0;

    for (entity, id, kind, faction, mut pos, health, flags, life, mut cover) in units.iter_mut() {
        let profile = kind.profile();
        let caps = &profile.caps;
        if !health.is_alive() || caps.static_hazard() || life.is_descending(now) || life.arrived {
            continue;
        }

        // 1. base advance
        let weather_factor = if caps.flies { 1.0 } else { weather.ground_speed_factor() };
        let speed = profile.speed * weather_factor;
        let wobble = (now as f32 * WOBBLE_RATE + id.0 as f32).sin() * WOBBLE_AMPLITUDE * weather_factor;
        let mut mv: Steer = (faction.direction() * speed, wobble);

        if caps.flies {
            // 2. flight
            if let Some(steer) = flight_steering(entity, profile, *faction, &pos, speed, &grid, &mut rng.0) {
                mv = steer;
            }
        } else {
            // 3. hills
            let mut hill_bound = false;
            if flags.on_hill {
                mv = (mv.0 * ON_HILL_DAMPING, mv.1 * ON_HILL_DAMPING);
                hill_bound = true;
            } else if let Some(centre) = hill_target(entity, *faction, &pos, &terrain, &grid) {
                if let Some(steer) = toward((pos.x, pos.y), centre, speed) {
                    mv = steer;
                    hill_bound = true;
                }
            }

            // 4. cover
            if cover.in_cover {
                if cover.dwell_elapsed(now) {
                    tracing::trace!(id = id.0, cover = ?cover.cover_id, "leaving cover");
                    cover.leave();
                } else {
                    // Holding: no separation, no river logic.
                    continue;
                }
            } else if caps.seeks_cover && !hill_bound {
                let candidate = terrain.cover_candidate_near(
                    pos.x,
                    pos.y,
                    COVER_SEEK_RADIUS,
                    cover.last_cover,
                    faction.direction(),
                    |f| {
                        !grid.any_within(f.x, f.y, COVER_OCCUPIED_RADIUS, |e| {
                            e.entity != entity && e.faction == *faction
                        })
                    },
                );
                if let Some(spot) = candidate {
                    let dist = spot.distance_to(pos.x, pos.y);
                    if dist > COVER_ARRIVE_DISTANCE {
                        if let Some((sx, sy)) = toward((pos.x, pos.y), (spot.x, spot.y), speed) {
                            mv = (mv.0 * 0.4 + sx * 0.6, mv.1 * 0.4 + sy * 0.6);
                        }
                    } else {
                        let dwell = rng.0.gen_range(COVER_DWELL_MIN..=COVER_DWELL_MAX);
                        cover.enter(spot.id, now, dwell);
                        tracing::trace!(id = id.0, cover = spot.id, dwell, "taking cover");
                        continue;
                    }
                }
            }

            // 5. vehicles steer around obstacles
            if caps.avoids_obstacles && !hill_bound {
                let (ax, ay) = obstacle_avoidance(&pos, &terrain);
                mv = (mv.0 + ax, mv.1 + ay);
            }
        }

        // 6. separation
        let (sx, sy) = separation(entity, *faction, &pos, &grid);
        mv = (mv.0 + sx, mv.1 + sy);

        // 7. river
        if !caps.flies {
            mv = river_gate(mv, *kind, *faction, &pos, speed, &terrain);
        }

        pos.x += mv.0;
        pos.y = (pos.y + mv.1).clamp(PLAY_MIN_Y, PLAY_MAX_Y);
    }
}

//! Rounds in flight, guided missiles and aircraft payloads.
//!
//! Every system here gathers hits against the tick's grid snapshot and only
//! then applies damage, so the order in which rounds are visited never
//! changes who is alive during hit tests.

use crate::components::*;
use crate::constants::*;
use crate::events::{EventBuffer, SimEvent};
use crate::spatial::SpatialGrid;
use crate::systems::clock::{IdAllocator, SimRng, SimTick, WorldFlash};
use crate::systems::combat::{direct_damage, explosion_victims, falloff_damage, CombatResults};
use crate::systems::effects::{spawn_burst, spawn_cloud};
use crate::terrain::TerrainField;
use crate::units::{Payload, UnitKind};
use crate::weather::Weather;
use bevy_ecs::prelude::*;
use std::collections::HashSet;

/// Chance that a qualifying impact sets a nearby tree alight.
fn ignition_chance(weather: &Weather) -> f64 {
    if weather.is_raining() {
        IGNITION_CHANCE / 2.0
    } else {
        IGNITION_CHANCE
    }
}

/// Moves rounds and resolves at most one hit per round.
#[allow(clippy::too_many_arguments)]
pub fn projectile_system(
    mut commands: Commands,
    grid: Res<SpatialGrid>,
    weather: Res<Weather>,
    mut terrain: ResMut<TerrainField>,
    mut rng: ResMut<SimRng>,
    mut events: ResMut<EventBuffer>,
    mut projectiles: Query<(Entity, &mut Projectile)>,
    mut flyovers: Query<(Entity, &mut Flyover)>,
    mut healths: Query<&mut Health>,
) {
    let aircraft: Vec<(Entity, Faction, f32, f32)> = flyovers
        .iter()
        .filter(|(_, f)| f.health > 0.0)
        .map(|(e, f)| (e, f.faction, f.x, f.altitude))
        .collect();
    let no_dead = HashSet::new();
    let mut results = CombatResults::default();
    let mut aircraft_hits: Vec<(Entity, f32)> = Vec::new();
    let mut ignitions: Vec<(f32, f32)> = Vec::new();

    for (entity, mut p) in projectiles.iter_mut() {
        p.x += p.vx;
        p.y += p.vy;
        p.traveled += PROJECTILE_SPEED;
        if p.traveled >= p.max_range || p.out_of_bounds() {
            commands.entity(entity).despawn();
            continue;
        }

        let resolved = match p.domain {
            TargetDomain::Air => {
                let r_sq = AIR_HIT_RADIUS_UNIT * AIR_HIT_RADIUS_UNIT;
                let unit_hit = grid
                    .query_enemies(p.x, p.y, AIR_HIT_RADIUS_UNIT, p.faction)
                    .into_iter()
                    .find(|e| e.is_air_target() && e.distance_sq(p.x, p.y) < r_sq);
                if let Some(target) = unit_hit {
                    let multiplier = if target.kind.caps().flies { ANTI_AIR_MULTIPLIER } else { 1.0 };
                    results.add(target.entity, p.damage * multiplier);
                    true
                } else if let Some(&(plane, ..)) = aircraft.iter().find(|(_, f, ax, ay)| {
                    *f != p.faction && (ax - p.x).powi(2) + (ay - p.y).powi(2) < AIR_HIT_RADIUS_FLYOVER.powi(2)
                }) {
                    aircraft_hits.push((plane, p.damage));
                    true
                } else {
                    false
                }
            }
            TargetDomain::Ground => {
                let engages_air = p.source.caps().engages_air;
                let hit = grid
                    .query_enemies(p.x, p.y, PROJECTILE_QUERY_RADIUS, p.faction)
                    .into_iter()
                    .filter(|e| !e.kind.caps().static_hazard())
                    .filter(|e| engages_air || !e.is_aerial_only())
                    .find(|e| {
                        let hit_radius = e.kind.profile().width * perspective_scale(e.y) / 1.2;
                        e.distance_sq(p.x, p.y) < hit_radius * hit_radius
                    });
                match hit {
                    Some(target) => {
                        match p.explosion_radius {
                            Some(radius) => {
                                let radius = radius * perspective_scale(p.y);
                                explosion_victims(&grid, p.faction, (p.x, p.y), radius, p.damage, &no_dead, &mut results);
                                events.push(SimEvent::Explosion { x: p.x, y: p.y, radius });
                                spawn_burst(&mut commands, &mut rng.0, ParticleKind::Fire, (p.x, p.y), 8, radius * 0.5, 30);
                            }
                            None => {
                                results.add(target.entity, direct_damage(p.damage, p.source, target.in_cover));
                                events.push(SimEvent::Impact { x: p.x, y: p.y });
                            }
                        }
                        if p.damage >= IGNITION_DAMAGE_THRESHOLD || p.explosion_radius.is_some() {
                            ignitions.push((p.x, p.y));
                        }
                        true
                    }
                    None => false,
                }
            }
        };

        if resolved {
            commands.entity(entity).despawn();
        }
    }

    let chance = ignition_chance(&weather);
    for (x, y) in ignitions {
        let lit = terrain.ignite_near(x, y, IGNITION_RADIUS, chance, &mut rng.0);
        if !lit.is_empty() {
            tracing::trace!(?lit, "trees ignited");
        }
    }
    for (plane, damage) in aircraft_hits {
        if let Ok((_, mut flyover)) = flyovers.get_mut(plane) {
            flyover.health -= damage;
        }
    }
    results.apply(&mut healths);
}

/// Descends missiles and detonates them on arrival.
#[allow(clippy::too_many_arguments)]
pub fn guided_missile_system(
    mut commands: Commands,
    weather: Res<Weather>,
    mut terrain: ResMut<TerrainField>,
    mut flash: ResMut<WorldFlash>,
    mut rng: ResMut<SimRng>,
    mut events: ResMut<EventBuffer>,
    mut missiles: Query<(Entity, &mut GuidedMissile)>,
    units: Query<(Entity, &Faction, &UnitKind, &Position)>,
    mut healths: Query<&mut Health>,
) {
    let mut results = CombatResults::default();

    for (entity, mut m) in missiles.iter_mut() {
        m.x += m.vx;
        m.y += m.vy;
        if m.y < m.target.1 {
            continue;
        }
        let (tx, ty) = m.target;
        let radius = m.warhead.radius();

        for (victim, faction, kind, pos) in units.iter() {
            if kind.caps().ground_fire || (!m.warhead.friendly_fire() && *faction == m.faction) {
                continue;
            }
            let d = ((pos.x - tx).powi(2) + (pos.y - ty).powi(2)).sqrt();
            results.add(victim, falloff_damage(m.warhead.damage(), d, radius));
        }

        match m.warhead {
            Warhead::Nuke { .. } => {
                flash.0 = 1.0;
                tracing::info!(faction = ?m.faction, x = tx, y = ty, "nuclear detonation");
                events.push(SimEvent::NukeFlash { x: tx, y: ty });
                spawn_cloud(&mut commands, &mut rng.0, (tx, ty), NUKE_CLOUD_PARTICLES);
            }
            Warhead::Conventional { .. } => {
                spawn_burst(&mut commands, &mut rng.0, ParticleKind::Fire, (tx, ty), 20, radius, 40);
            }
        }
        events.push(SimEvent::Explosion { x: tx, y: ty, radius });
        let chance = ignition_chance(&weather);
        terrain.ignite_near(tx, ty, radius.max(IGNITION_RADIUS), chance, &mut rng.0);
        commands.entity(entity).despawn();
    }

    results.apply(&mut healths);
}

/// Spawns the missile for one salvo slot.
fn launch_missile(commands: &mut Commands, flyover: &Flyover) {
    let (tx, ty) = flyover.target;
    let warhead = match flyover.payload {
        Payload::Nuke => {
            let p = UnitKind::Nuke.profile();
            Warhead::Nuke {
                damage: p.damage,
                radius: p.blast_radius.unwrap_or(0.0),
            }
        }
        _ => {
            let p = UnitKind::MissileStrike.profile();
            Warhead::Conventional {
                damage: p.damage,
                radius: p.blast_radius.unwrap_or(0.0),
            }
        }
    };
    let offset = match flyover.payload {
        Payload::Nuke => 0.0,
        _ => (2.0 - flyover.salvo_left as f32) * SALVO_SPACING,
    };
    let target = (tx + offset, ty);
    commands.spawn(GuidedMissile {
        faction: flyover.faction,
        target,
        x: flyover.x,
        y: flyover.altitude,
        vx: (target.0 - flyover.x) / MISSILE_DESCENT_TICKS,
        vy: (target.1 - flyover.altitude) / MISSILE_DESCENT_TICKS,
        warhead,
    });
}

/// Flies aircraft across the field and releases payloads over the target.
pub fn flyover_system(
    mut commands: Commands,
    tick: Res<SimTick>,
    mut ids: ResMut<IdAllocator>,
    mut rng: ResMut<SimRng>,
    mut events: ResMut<EventBuffer>,
    mut flyovers: Query<(Entity, &mut Flyover)>,
) {
    for (entity, mut f) in flyovers.iter_mut() {
        if f.health <= 0.0 {
            spawn_burst(&mut commands, &mut rng.0, ParticleKind::Debris, (f.x, f.altitude), 12, 40.0, 60);
            events.push(SimEvent::AircraftDown {
                faction: f.faction,
                x: f.x,
                y: f.altitude,
            });
            tracing::debug!(faction = ?f.faction, payload = ?f.payload, "aircraft shot down");
            commands.entity(entity).despawn();
            continue;
        }

        f.x += f.speed;
        let (tx, ty) = f.target;

        match f.payload {
            Payload::MissileSalvo | Payload::Nuke => {
                if !f.dropped && f.salvo_left > 0 && f.in_release_window() {
                    launch_missile(&mut commands, &f);
                    f.salvo_left -= 1;
                    if f.salvo_left == 0 {
                        f.dropped = true;
                    }
                }
            }
            Payload::Napalm => {
                if !f.dropped && f.canister.is_none() && f.in_release_window() {
                    f.canister = Some(Canister {
                        y: f.altitude,
                        vy: CANISTER_START_SPEED,
                    });
                }
                if let Some(mut canister) = f.canister {
                    canister.y += canister.vy;
                    canister.vy += CANISTER_GRAVITY;
                    if canister.y >= ty {
                        let id = ids.next_id();
                        commands.spawn(
                            UnitBundle::new(id, UnitKind::Napalm, f.faction, tx, ty, tick.0)
                                .with_cost(f.paid_cost)
                                .with_squad(f.squad),
                        );
                        events.push(SimEvent::Explosion {
                            x: tx,
                            y: ty,
                            radius: UnitKind::Napalm.profile().blast_radius.unwrap_or(0.0),
                        });
                        f.canister = None;
                        f.dropped = true;
                    } else {
                        f.canister = Some(canister);
                    }
                }
            }
            Payload::Paratroopers => {
                if !f.dropped && f.in_release_window() {
                    for j in 0..PARATROOPER_COUNT {
                        let id = ids.next_id();
                        let x = tx + (j as f32 - 1.0) * PARATROOPER_SPACING;
                        let cost = if j == 0 { f.paid_cost } else { 0 };
                        commands.spawn(
                            UnitBundle::new(id, UnitKind::Airborne, f.faction, x, ty.clamp(PLAY_MIN_Y, PLAY_MAX_Y), tick.0)
                                .with_cost(cost)
                                .with_squad(f.squad)
                                .descending_until(tick.0 + DESCENT_GRACE_TICKS),
                        );
                        events.push(SimEvent::UnitSpawned {
                            faction: f.faction,
                            kind: UnitKind::Airborne,
                        });
                    }
                    f.dropped = true;
                }
            }
        }

        if f.has_exited() {
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::spatial_grid_update_system;

    fn ordnance_world() -> World {
        let mut world = World::new();
        world.insert_resource(SimTick(1));
        world.insert_resource(SpatialGrid::default());
        world.insert_resource(Weather::default());
        world.insert_resource(TerrainField::empty());
        world.insert_resource(WorldFlash::default());
        world.insert_resource(IdAllocator::default());
        world.insert_resource(SimRng::from_seed(5));
        world.insert_resource(EventBuffer::default());
        world
    }

    fn run(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                spatial_grid_update_system,
                projectile_system,
                guided_missile_system,
                flyover_system,
            )
                .chain(),
        );
        schedule.run(world);
    }

    fn round(faction: Faction, source: UnitKind, x: f32, y: f32, vx: f32) -> Projectile {
        Projectile {
            faction,
            source,
            x,
            y,
            vx,
            vy: 0.0,
            damage: source.profile().damage,
            explosion_radius: source.profile().blast_radius,
            domain: TargetDomain::Ground,
            traveled: 0.0,
            max_range: 500.0,
        }
    }

    #[test]
    fn test_round_hits_first_enemy_once() {
        let mut world = ordnance_world();
        let target = world
            .spawn(UnitBundle::new(1, UnitKind::Tank, Faction::East, 306.0, 300.0, 0))
            .id();
        world.spawn(round(Faction::West, UnitKind::Soldier, 300.0, 300.0, 6.0));
        run(&mut world);

        assert!((world.get::<Health>(target).unwrap().current - 202.0).abs() < 1e-4);
        assert_eq!(world.query::<&Projectile>().iter(&world).count(), 0);
    }

    #[test]
    fn test_tank_shell_hits_helicopter() {
        let mut world = ordnance_world();
        let heli = world
            .spawn(UnitBundle::new(1, UnitKind::Helicopter, Faction::East, 306.0, 300.0, 0))
            .id();
        world.spawn(round(Faction::West, UnitKind::Tank, 300.0, 300.0, 6.0));
        run(&mut world);
        assert!((world.get::<Health>(heli).unwrap().current - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_air_bonus_only_against_flyers() {
        let mut world = ordnance_world();
        let drone = world
            .spawn(UnitBundle::new(1, UnitKind::Drone, Faction::East, 306.0, 200.0, 0))
            .id();
        let para = world
            .spawn(UnitBundle::new(2, UnitKind::Airborne, Faction::East, 306.0, 350.0, 0).descending_until(100))
            .id();
        for y in [200.0, 350.0] {
            world.spawn(Projectile {
                domain: TargetDomain::Air,
                damage: 5.0,
                ..round(Faction::West, UnitKind::AntiAir, 300.0, y, 6.0)
            });
        }
        run(&mut world);

        assert!((world.get::<Health>(drone).unwrap().current - 5.0).abs() < 1e-4);
        let para_health = *world.get::<Health>(para).unwrap();
        assert!((para_health.max - para_health.current - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_cover_reduces_small_arms() {
        let mut world = ordnance_world();
        let target = world
            .spawn(UnitBundle::new(1, UnitKind::Rambo, Faction::East, 306.0, 300.0, 0))
            .id();
        world.get_mut::<CoverState>(target).unwrap().enter(9, 0, 200);
        world.spawn(round(Faction::West, UnitKind::Soldier, 300.0, 300.0, 6.0));
        run(&mut world);
        // 8 * 0.6
        assert!((world.get::<Health>(target).unwrap().current - 95.2).abs() < 1e-4);
    }

    #[test]
    fn test_round_expires_at_max_range() {
        let mut world = ordnance_world();
        let mut p = round(Faction::West, UnitKind::Soldier, 300.0, 300.0, 6.0);
        p.max_range = 6.0;
        world.spawn(p);
        run(&mut world);
        assert_eq!(world.query::<&Projectile>().iter(&world).count(), 0);
    }

    #[test]
    fn test_air_round_damages_flyover() {
        let mut world = ordnance_world();
        let mut plane = Flyover::new(Faction::East, Payload::MissileSalvo, (100.0, 300.0), 110);
        plane.x = 406.0;
        let plane = world.spawn(plane).id();
        world.spawn(Projectile {
            domain: TargetDomain::Air,
            y: 35.0,
            damage: 60.0,
            ..round(Faction::West, UnitKind::AntiAir, 400.0, 35.0, 6.0)
        });
        run(&mut world);
        // Shot down flyovers are removed on the next pass.
        assert!(world.get::<Flyover>(plane).map_or(true, |f| f.health <= 0.0));
    }

    #[test]
    fn test_conventional_missile_spares_friendlies() {
        let mut world = ordnance_world();
        let friend = world
            .spawn(UnitBundle::new(1, UnitKind::Tank, Faction::West, 600.0, 300.0, 0))
            .id();
        let foe = world
            .spawn(UnitBundle::new(2, UnitKind::Tank, Faction::East, 610.0, 300.0, 0))
            .id();
        world.spawn(GuidedMissile {
            faction: Faction::West,
            target: (600.0, 300.0),
            x: 600.0,
            y: 299.0,
            vx: 0.0,
            vy: 2.0,
            warhead: Warhead::Conventional {
                damage: 200.0,
                radius: 60.0,
            },
        });
        run(&mut world);

        assert_eq!(world.get::<Health>(friend).unwrap().current, 210.0);
        assert!(world.get::<Health>(foe).unwrap().current < 210.0 - 150.0);
        assert_eq!(world.query::<&GuidedMissile>().iter(&world).count(), 0);
    }

    #[test]
    fn test_nuke_hits_everyone_and_flashes() {
        let mut world = ordnance_world();
        let friend = world
            .spawn(UnitBundle::new(1, UnitKind::Soldier, Faction::West, 200.0, 300.0, 0))
            .id();
        world.spawn(GuidedMissile {
            faction: Faction::West,
            target: (600.0, 300.0),
            x: 600.0,
            y: 300.0,
            vx: 0.0,
            vy: 0.0,
            warhead: Warhead::Nuke {
                damage: 1000.0,
                radius: 3000.0,
            },
        });
        run(&mut world);

        assert!(!world.get::<Health>(friend).unwrap().is_alive());
        assert_eq!(world.resource::<WorldFlash>().0, 1.0);
        assert!(world
            .resource::<EventBuffer>()
            .iter()
            .any(|e| matches!(e, SimEvent::NukeFlash { .. })));
        assert_eq!(
            world.query::<&Particle>().iter(&world).count(),
            NUKE_CLOUD_PARTICLES
        );
    }

    #[test]
    fn test_salvo_releases_three_staggered_missiles() {
        let mut world = ordnance_world();
        let mut plane = Flyover::new(Faction::West, Payload::MissileSalvo, (400.0, 300.0), 110);
        plane.x = 380.0;
        world.spawn(plane);
        for _ in 0..3 {
            run(&mut world);
        }
        let mut query = world.query::<&GuidedMissile>();
        let mut targets: Vec<f32> = query.iter(&world).map(|m| m.target.0).collect();
        targets.sort_by(f32::total_cmp);
        assert_eq!(targets, vec![370.0, 400.0, 430.0]);
    }

    #[test]
    fn test_paratroopers_land_under_canopy() {
        let mut world = ordnance_world();
        let mut plane = Flyover::new(Faction::East, Payload::Paratroopers, (300.0, 250.0), 60);
        plane.x = 310.0;
        plane.squad = Some(2);
        world.spawn(plane);
        run(&mut world);

        let mut query = world.query::<(&UnitKind, &Lifecycle)>();
        let troops: Vec<_> = query.iter(&world).collect();
        assert_eq!(troops.len(), PARATROOPER_COUNT);
        assert!(troops.iter().all(|(k, l)| **k == UnitKind::Airborne && l.is_descending(100)));
        assert_eq!(troops.iter().map(|(_, l)| l.paid_cost).sum::<u32>(), 60);
    }

    #[test]
    fn test_napalm_canister_ignites_ground() {
        let mut world = ordnance_world();
        let mut plane = Flyover::new(Faction::West, Payload::Napalm, (500.0, 200.0), 90);
        plane.x = 490.0;
        world.spawn(plane);
        for _ in 0..60 {
            run(&mut world);
        }
        let mut query = world.query::<(&UnitKind, &Position)>();
        let (kind, pos) = query.single(&world);
        assert_eq!(*kind, UnitKind::Napalm);
        assert_eq!((pos.x, pos.y), (500.0, 200.0));
    }

    #[test]
    fn test_shot_down_aircraft_leaves_wreckage() {
        let mut world = ordnance_world();
        let mut plane = Flyover::new(Faction::West, Payload::Nuke, (600.0, 300.0), 1000);
        plane.health = 0.0;
        world.spawn(plane);
        run(&mut world);
        assert_eq!(world.query::<&Flyover>().iter(&world).count(), 0);
        assert_eq!(world.query::<&GuidedMissile>().iter(&world).count(), 0);
        assert!(world
            .resource::<EventBuffer>()
            .iter()
            .any(|e| matches!(e, SimEvent::AircraftDown { .. })));
    }
}

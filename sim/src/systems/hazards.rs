//! Static hazards: mines and napalm ground fire.

use crate::components::*;
use crate::events::{EventBuffer, SimEvent};
use crate::spatial::SpatialGrid;
use crate::systems::clock::SimRng;
use crate::systems::combat::{falloff_damage, CombatResults};
use crate::systems::effects::spawn_burst;
use crate::units::UnitKind;
use bevy_ecs::prelude::*;

/// Burns napalm down, scorches what stands in it, and detonates mines.
///
/// A triggered mine zeroes its own health and hits every unit, its own side
/// included, within twice its trigger radius.
pub fn hazard_system(
    mut commands: Commands,
    grid: Res<SpatialGrid>,
    mut rng: ResMut<SimRng>,
    mut events: ResMut<EventBuffer>,
    units: Query<(Entity, &UnitKind, &Faction, &Position)>,
    mut healths: Query<&mut Health>,
) {
    let mut results = CombatResults::default();
    let mut burnt_down: Vec<Entity> = Vec::new();
    let mut detonated: Vec<Entity> = Vec::new();

    for (entity, kind, faction, pos) in units.iter() {
        let profile = kind.profile();
        if !profile.caps.static_hazard() || !healths.get(entity).is_ok_and(|h| h.is_alive()) {
            continue;
        }
        let radius = profile.blast_radius.unwrap_or(profile.width);
        let r_sq = radius * radius;

        if profile.caps.ground_fire {
            burnt_down.push(entity);
            for victim in grid.query_enemies(pos.x, pos.y, radius, *faction) {
                let caps = victim.kind.caps();
                if !caps.flies && !caps.static_hazard() && victim.distance_sq(pos.x, pos.y) < r_sq {
                    results.add(victim.entity, profile.damage);
                }
            }
            continue;
        }

        let triggered = grid
            .query_enemies(pos.x, pos.y, radius, *faction)
            .iter()
            .any(|e| {
                !e.kind.caps().flies
                    && !e.descending
                    && !e.kind.caps().static_hazard()
                    && e.distance_sq(pos.x, pos.y) < r_sq
                    && healths.get(e.entity).is_ok_and(|h| h.is_alive())
            });
        if !triggered {
            continue;
        }

        detonated.push(entity);
        let blast = radius * 2.0;
        for victim in grid.query_radius(pos.x, pos.y, blast) {
            if victim.entity == entity || victim.kind.caps().ground_fire {
                continue;
            }
            let d = victim.distance_sq(pos.x, pos.y).sqrt();
            results.add(victim.entity, falloff_damage(profile.damage, d, blast));
        }
        events.push(SimEvent::Explosion {
            x: pos.x,
            y: pos.y,
            radius: blast,
        });
        spawn_burst(&mut commands, &mut rng.0, ParticleKind::Fire, (pos.x, pos.y), 10, blast, 30);
        tracing::debug!(?kind, ?faction, x = pos.x, y = pos.y, "mine detonated");
    }

    for entity in detonated {
        if let Ok(mut health) = healths.get_mut(entity) {
            health.kill();
        }
    }
    // Napalm health doubles as its burn timer.
    for entity in burnt_down {
        if let Ok(mut health) = healths.get_mut(entity) {
            health.damage(1.0);
        }
    }
    results.apply(&mut healths);
}

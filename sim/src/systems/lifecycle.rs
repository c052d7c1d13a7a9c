//! Arrival scoring, the end-of-tick death sweep, and the victory check.

use crate::components::*;
use crate::config::SimConfig;
use crate::economy::EconomyLedger;
use crate::events::{EventBuffer, SimEvent};
use crate::systems::clock::{MatchOutcome, SimRng};
use crate::systems::effects::spawn_burst;
use crate::units::{DeathEffect, UnitKind};
use bevy_ecs::prelude::*;
use rand::Rng;

/// Units past the enemy edge score, refund what was paid, and leave.
pub fn arrival_system(
    mut ledger: ResMut<EconomyLedger>,
    mut events: ResMut<EventBuffer>,
    mut units: Query<(&UnitId, &UnitKind, &Faction, &Position, &mut Health, &mut Lifecycle)>,
) {
    for (id, kind, faction, pos, mut health, mut life) in units.iter_mut() {
        if life.arrived || !health.is_alive() || !faction.has_crossed(pos.x) {
            continue;
        }
        let points = kind.profile().score_value;
        ledger.add_score(*faction, points);
        ledger.refund(*faction, life.paid_cost as f64);
        life.arrived = true;
        health.kill();
        events.push(SimEvent::UnitScored {
            faction: *faction,
            kind: *kind,
            points,
        });
        tracing::info!(
            id = id.0,
            ?kind,
            ?faction,
            points,
            refund = life.paid_cost,
            score = ledger.score(*faction),
            "unit reached the enemy edge"
        );
    }
}

/// Removes every unit at zero health, playing its death effect once.
pub fn death_sweep_system(
    mut commands: Commands,
    mut rng: ResMut<SimRng>,
    mut events: ResMut<EventBuffer>,
    units: Query<(Entity, &UnitKind, &Faction, &Position, &Health, &Lifecycle)>,
) {
    for (entity, kind, faction, pos, health, life) in units.iter() {
        if health.is_alive() {
            continue;
        }
        commands.entity(entity).despawn();
        if life.arrived {
            continue;
        }

        match kind.profile().death {
            DeathEffect::Explosion => {
                let radius = kind.profile().width;
                events.push(SimEvent::Explosion {
                    x: pos.x,
                    y: pos.y,
                    radius,
                });
                spawn_burst(&mut commands, &mut rng.0, ParticleKind::Debris, (pos.x, pos.y), 15, radius, 45);
            }
            DeathEffect::Scream => {
                events.push(SimEvent::DeathScream {
                    faction: *faction,
                    x: pos.x,
                    y: pos.y,
                });
                let life = rng.0.gen_range(200..400);
                commands.spawn(Particle::still(ParticleKind::Blood, pos.x, pos.y, life, 6.0));
            }
            DeathEffect::Silent => {}
        }
        if *kind != UnitKind::Napalm {
            tracing::debug!(?kind, ?faction, x = pos.x, y = pos.y, "unit destroyed");
        }
    }
}

/// Declares a winner once a faction reaches the score threshold.
pub fn victory_system(
    config: Res<SimConfig>,
    ledger: Res<EconomyLedger>,
    mut outcome: ResMut<MatchOutcome>,
    mut events: ResMut<EventBuffer>,
) {
    if outcome.is_over() {
        return;
    }
    if let Some(winner) = ledger.winner(config.win_score) {
        outcome.winner = Some(winner);
        events.push(SimEvent::Victory { winner });
        tracing::info!(
            ?winner,
            west = ledger.score(Faction::West),
            east = ledger.score(Faction::East),
            "match decided"
        );
    }
}

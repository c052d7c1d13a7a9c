//! Per-tick terrain state: burning trees, crushing, and unit terrain flags.

use crate::components::*;
use crate::constants::CRUSH_RADIUS;
use crate::terrain::TerrainField;
use crate::units::UnitKind;
use bevy_ecs::prelude::*;

/// Advances tree fires and lets heavy vehicles flatten trees they touch.
pub fn terrain_state_system(
    mut terrain: ResMut<TerrainField>,
    crushers: Query<(&UnitKind, &Position, &Health)>,
) {
    terrain.advance_fires();

    for (kind, pos, health) in crushers.iter() {
        if health.is_alive() && kind.caps().crushes_trees {
            let crushed = terrain.crush_near(pos.x, pos.y, CRUSH_RADIUS);
            if crushed > 0 {
                tracing::trace!(?kind, crushed, "trees crushed");
            }
        }
    }
}

/// Recomputes hill and water flags for targeting and movement.
pub fn terrain_awareness_system(
    terrain: Res<TerrainField>,
    mut units: Query<(&UnitKind, &Position, &mut TerrainFlags)>,
) {
    for (kind, pos, mut flags) in units.iter_mut() {
        if kind.caps().flies {
            *flags = TerrainFlags::default();
            continue;
        }
        flags.on_hill = terrain.hill_at(pos.x, pos.y).is_some();
        flags.in_water = terrain.in_water(pos.x, pos.y);
    }
}

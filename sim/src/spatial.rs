//! Spatial partitioning for neighbour and target queries.
//!
//! The grid is rebuilt from scratch once per tick, after spawn intake and
//! before any system that looks for neighbours, so every query in a tick sees
//! the same positions.

use crate::components::{CoverState, Faction, Health, Lifecycle, Position, UnitId};
use crate::systems::SimTick;
use crate::units::UnitKind;
use bevy_ecs::prelude::*;
use std::collections::HashMap;

/// Cell size in world units, about one melee engagement distance.
pub const GRID_CELL_SIZE: f32 = 60.0;

/// Uniform grid hash over live units.
#[derive(Resource, Debug)]
pub struct SpatialGrid {
    /// Cell size in world units.
    pub cell_size: f32,
    cells: HashMap<(i32, i32), Vec<SpatialEntry>>,
    count: usize,
}

/// Tick-scoped copy of the unit data neighbour queries need.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialEntry {
    pub entity: Entity,
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub faction: Faction,
    pub kind: UnitKind,
    pub descending: bool,
    pub in_cover: bool,
}

impl SpatialEntry {
    /// Mobile and not holding cover.
    pub fn is_moving(&self) -> bool {
        !self.kind.caps().static_hazard() && !self.in_cover && !self.descending
    }

    /// Flying units and paratroopers still under canopy.
    pub fn is_air_target(&self) -> bool {
        self.kind.caps().flies || self.descending
    }

    /// Reachable only from the air: drones and paratroopers under canopy.
    /// Helicopters fly low enough for ground fire.
    pub fn is_aerial_only(&self) -> bool {
        self.kind == UnitKind::Drone || self.descending
    }

    pub fn distance_sq(&self, x: f32, y: f32) -> f32 {
        (self.x - x).powi(2) + (self.y - y).powi(2)
    }
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(GRID_CELL_SIZE)
    }
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            count: 0,
        }
    }

    /// Convert world coordinates to cell coordinates.
    #[inline]
    pub fn world_to_cell(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    /// Discard every bucket.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.count = 0;
    }

    pub fn insert(&mut self, entry: SpatialEntry) {
        let cell = self.world_to_cell(entry.x, entry.y);
        self.cells.entry(cell).or_default().push(entry);
        self.count += 1;
    }

    /// Broad-phase query: every entry in a bucket overlapping the square
    /// `[x-r, x+r] x [y-r, y+r]`. Callers apply the exact distance test.
    ///
    /// Entries come back in a fixed order (row-major cell scan, insertion
    /// order within a cell), so "first match" is deterministic.
    pub fn query_radius(&self, x: f32, y: f32, radius: f32) -> Vec<SpatialEntry> {
        let (min_cx, min_cy) = self.world_to_cell(x - radius, y - radius);
        let (max_cx, max_cy) = self.world_to_cell(x + radius, y + radius);

        let mut results = Vec::new();
        for cy in min_cy..=max_cy {
            for cx in min_cx..=max_cx {
                if let Some(entries) = self.cells.get(&(cx, cy)) {
                    results.extend_from_slice(entries);
                }
            }
        }
        results
    }

    /// Broad-phase candidates that are not of `my_faction`.
    pub fn query_enemies(&self, x: f32, y: f32, radius: f32, my_faction: Faction) -> Vec<SpatialEntry> {
        let mut results = self.query_radius(x, y, radius);
        results.retain(|e| e.faction != my_faction);
        results
    }

    /// Broad-phase candidates of `my_faction`.
    pub fn query_friendlies(&self, x: f32, y: f32, radius: f32, my_faction: Faction) -> Vec<SpatialEntry> {
        let mut results = self.query_radius(x, y, radius);
        results.retain(|e| e.faction == my_faction);
        results
    }

    /// Nearest entry within `max_radius` (exact Euclidean) matching `filter`.
    pub fn nearest(
        &self,
        x: f32,
        y: f32,
        max_radius: f32,
        filter: impl Fn(&SpatialEntry) -> bool,
    ) -> Option<SpatialEntry> {
        let max_sq = max_radius * max_radius;
        self.query_radius(x, y, max_radius)
            .into_iter()
            .filter(|e| filter(e))
            .map(|e| (e.distance_sq(x, y), e))
            .filter(|(d, _)| *d < max_sq)
            .fold(None, |best: Option<(f32, SpatialEntry)>, (d, e)| match best {
                Some((bd, _)) if bd <= d => best,
                _ => Some((d, e)),
            })
            .map(|(_, e)| e)
    }

    /// True if any entry other than `exclude` matching `filter` lies strictly
    /// within `radius` of the point.
    pub fn any_within(
        &self,
        x: f32,
        y: f32,
        radius: f32,
        filter: impl Fn(&SpatialEntry) -> bool,
    ) -> bool {
        let r_sq = radius * radius;
        self.query_radius(x, y, radius)
            .iter()
            .any(|e| filter(e) && e.distance_sq(x, y) < r_sq)
    }

    pub fn total_count(&self) -> usize {
        self.count
    }
}

/// Rebuilds the grid from every live unit.
pub fn spatial_grid_update_system(
    tick: Res<SimTick>,
    mut grid: ResMut<SpatialGrid>,
    query: Query<(Entity, &UnitId, &UnitKind, &Faction, &Position, &Health, &Lifecycle, &CoverState)>,
) {
    grid.clear();

    for (entity, id, kind, faction, pos, health, lifecycle, cover) in query.iter() {
        if !health.is_alive() {
            continue;
        }
        grid.insert(SpatialEntry {
            entity,
            id: id.0,
            x: pos.x,
            y: pos.y,
            faction: *faction,
            kind: *kind,
            descending: lifecycle.is_descending(tick.0),
            in_cover: cover.in_cover,
        });
    }
    tracing::trace!(tick = tick.0, units = grid.total_count(), "spatial grid rebuilt");
}

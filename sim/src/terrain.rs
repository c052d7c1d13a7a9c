//! Terrain field: hills, trees, rocks, a winding river and its bridges.
//!
//! Generated once per match by seeded rejection sampling. Each placement is a
//! single attempt that is skipped on rejection, so feature counts are upper
//! bounds, not guarantees. Only trees change afterwards (burning, crushing).

use crate::constants::*;
use crate::components::Faction;
use bevy_ecs::prelude::*;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Plateau height of a hill.
pub const HILL_HEIGHT: f32 = 40.0;
/// Total width of the river band.
pub const RIVER_WIDTH: f32 = 55.0;
/// Vertical spacing of river polyline points.
pub const RIVER_SEGMENT_STEP: f32 = 20.0;
pub const BRIDGE_WIDTH: f32 = 85.0;
pub const BRIDGE_HEIGHT: f32 = 40.0;

/// Placement attempt counts and rejection radii.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainGenConfig {
    pub river_chance: f64,
    pub bridge_count: usize,
    pub hill_attempts: usize,
    pub tree_attempts: usize,
    pub rock_attempts: usize,
    /// Extra clearance between a hill rim and the river.
    pub hill_river_buffer: f32,
    pub hill_spacing: f32,
    pub tree_river_buffer: f32,
    pub tree_spacing: f32,
    pub rock_river_buffer: f32,
    pub rock_spacing: f32,
    /// Clearance between a rock and any hill or tree rim.
    pub rock_feature_buffer: f32,
    /// Half extents of the box around a bridge kept free of obstacles.
    pub bridge_clearance: (f32, f32),
}

impl Default for TerrainGenConfig {
    fn default() -> Self {
        Self {
            river_chance: 0.5,
            bridge_count: 2,
            hill_attempts: 6,
            tree_attempts: 25,
            rock_attempts: 30,
            hill_river_buffer: 80.0,
            hill_spacing: 120.0,
            tree_river_buffer: 80.0,
            tree_spacing: 60.0,
            rock_river_buffer: 60.0,
            rock_spacing: 40.0,
            rock_feature_buffer: 20.0,
            bridge_clearance: (50.0, 30.0),
        }
    }
}

/// Burn and crush state of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeState {
    Normal,
    Burning { remaining: u32 },
    Burnt,
    Broken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    Hill,
    Tree(TreeState),
    Rock,
}

/// A hill, tree or rock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainFeature {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub kind: FeatureKind,
}

impl TerrainFeature {
    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        ((self.x - x).powi(2) + (self.y - y).powi(2)).sqrt()
    }

    /// Intact trees and rocks shelter infantry.
    pub fn provides_cover(&self) -> bool {
        matches!(
            self.kind,
            FeatureKind::Rock | FeatureKind::Tree(TreeState::Normal)
        )
    }

    /// Obstacles heavy vehicles steer around, with their avoidance radius.
    pub fn avoid_radius(&self) -> Option<f32> {
        match self.kind {
            FeatureKind::Rock => Some(ROCK_AVOID_RADIUS),
            FeatureKind::Tree(TreeState::Normal | TreeState::Burning { .. } | TreeState::Burnt) => {
                Some(TREE_AVOID_RADIUS)
            }
            _ => None,
        }
    }
}

/// River as a dense polyline of (x, y) points ordered by y.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct River {
    pub points: Vec<(f32, f32)>,
    pub width: f32,
}

impl River {
    /// River centre x at row `y`, linearly interpolated between points.
    pub fn x_at(&self, y: f32) -> f32 {
        let pts = &self.points;
        match pts.len() {
            0 => FIELD_WIDTH / 2.0,
            1 => pts[0].0,
            _ => {
                let idx = pts.partition_point(|p| p.1 < y);
                if idx == 0 {
                    return pts[0].0;
                }
                if idx >= pts.len() {
                    return pts[pts.len() - 1].0;
                }
                let (x0, y0) = pts[idx - 1];
                let (x1, y1) = pts[idx];
                let span = y1 - y0;
                if span.abs() < f32::EPSILON {
                    x0
                } else {
                    x0 + (x1 - x0) * (y - y0) / span
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bridge {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bridge {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        (y - self.y).abs() < self.height / 2.0
            && (x - self.x).abs() < self.width / 2.0 + BRIDGE_X_TOLERANCE
    }
}

/// The whole terrain of one match.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TerrainField {
    pub features: Vec<TerrainFeature>,
    pub river: Option<River>,
    pub bridges: Vec<Bridge>,
}

impl TerrainField {
    /// Open ground: no river, no features.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A straight river at `x` with bridges at the given rows.
    pub fn with_straight_river(x: f32, bridge_rows: &[f32]) -> Self {
        let points = river_rows().map(|y| (x, y)).collect();
        Self {
            features: Vec::new(),
            river: Some(River {
                points,
                width: RIVER_WIDTH,
            }),
            bridges: bridge_rows
                .iter()
                .map(|&y| Bridge {
                    x,
                    y,
                    width: BRIDGE_WIDTH,
                    height: BRIDGE_HEIGHT,
                })
                .collect(),
        }
    }

    /// Add a feature by hand, returning its id.
    pub fn add_feature(&mut self, kind: FeatureKind, x: f32, y: f32, size: f32) -> u32 {
        let id = self.features.iter().map(|f| f.id).max().unwrap_or(0) + 1;
        self.features.push(TerrainFeature { id, x, y, size, kind });
        id
    }

    /// Seeded procedural generation.
    pub fn generate(config: &TerrainGenConfig, rng: &mut ChaCha8Rng) -> Self {
        let mut field = Self::empty();
        let mut next_id = 1u32;

        // River and bridges
        if rng.gen_bool(config.river_chance.clamp(0.0, 1.0)) {
            let center = FIELD_WIDTH / 2.0 + rng.gen_range(-100.0..100.0);
            let amplitude: f32 = rng.gen_range(30.0..70.0);
            let frequency: f32 = rng.gen_range(0.005..0.01);
            let phase: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
            let points = river_rows()
                .map(|y| (center + amplitude * (frequency * y + phase).sin(), y))
                .collect();
            let river = River {
                points,
                width: RIVER_WIDTH,
            };
            for _ in 0..config.bridge_count {
                let y = 150.0 + rng.gen::<f32>() * 250.0;
                field.bridges.push(Bridge {
                    x: river.x_at(y),
                    y,
                    width: BRIDGE_WIDTH,
                    height: BRIDGE_HEIGHT,
                });
            }
            field.river = Some(river);
        }

        // Hills
        for _ in 0..config.hill_attempts {
            let x = rng.gen_range(100.0..700.0);
            let y = rng.gen_range(140.0..410.0);
            let size = rng.gen_range(70.0..110.0);
            let near_river = field.river_distance(x, y) < size + config.hill_river_buffer;
            let near_hill = field
                .hills()
                .any(|h| h.distance_to(x, y) < config.hill_spacing);
            if near_river || near_hill {
                continue;
            }
            field.push(&mut next_id, FeatureKind::Hill, x, y, size);
        }

        // Trees
        for _ in 0..config.tree_attempts {
            let x = rng.gen_range(60.0..740.0);
            let y = rng.gen_range(120.0..430.0);
            let size = rng.gen_range(40.0..70.0);
            let rejected = field.hills().any(|h| h.distance_to(x, y) < h.size)
                || field.in_bridge_clearance(x, y, config.bridge_clearance)
                || field.river_distance(x, y) < config.tree_river_buffer
                || field.trees().any(|t| t.distance_to(x, y) < config.tree_spacing);
            if rejected {
                continue;
            }
            field.push(&mut next_id, FeatureKind::Tree(TreeState::Normal), x, y, size);
        }

        // Rocks
        for _ in 0..config.rock_attempts {
            let x = rng.gen_range(40.0..760.0);
            let y = rng.gen_range(110.0..440.0);
            let size = rng.gen_range(10.0..25.0);
            let rejected = field.features.iter().any(|f| match f.kind {
                FeatureKind::Rock => f.distance_to(x, y) < config.rock_spacing,
                _ => f.distance_to(x, y) < f.size + config.rock_feature_buffer,
            }) || field.in_bridge_clearance(x, y, config.bridge_clearance)
                || field.river_distance(x, y) < config.rock_river_buffer;
            if rejected {
                continue;
            }
            field.push(&mut next_id, FeatureKind::Rock, x, y, size);
        }

        tracing::debug!(
            river = field.river.is_some(),
            bridges = field.bridges.len(),
            hills = field.hills().count(),
            trees = field.trees().count(),
            rocks = field.features.iter().filter(|f| f.kind == FeatureKind::Rock).count(),
            "terrain generated"
        );
        field
    }

    fn push(&mut self, next_id: &mut u32, kind: FeatureKind, x: f32, y: f32, size: f32) {
        self.features.push(TerrainFeature {
            id: *next_id,
            x,
            y,
            size,
            kind,
        });
        *next_id += 1;
    }

    pub fn hills(&self) -> impl Iterator<Item = &TerrainFeature> {
        self.features.iter().filter(|f| f.kind == FeatureKind::Hill)
    }

    pub fn trees(&self) -> impl Iterator<Item = &TerrainFeature> {
        self.features
            .iter()
            .filter(|f| matches!(f.kind, FeatureKind::Tree(_)))
    }

    pub fn feature(&self, id: u32) -> Option<&TerrainFeature> {
        self.features.iter().find(|f| f.id == id)
    }

    /// Horizontal distance from the river centre line, or infinity without a river.
    pub fn river_distance(&self, x: f32, y: f32) -> f32 {
        self.river
            .as_ref()
            .map(|r| (x - r.x_at(y)).abs())
            .unwrap_or(f32::INFINITY)
    }

    pub fn river_x_at(&self, y: f32) -> Option<f32> {
        self.river.as_ref().map(|r| r.x_at(y))
    }

    fn in_bridge_clearance(&self, x: f32, y: f32, (hx, hy): (f32, f32)) -> bool {
        self.bridges
            .iter()
            .any(|b| (x - b.x).abs() < hx && (y - b.y).abs() < hy)
    }

    /// Ground height: plateau inside half the hill radius, linear slope to
    /// zero at the rim, zero elsewhere.
    pub fn height_at(&self, x: f32, y: f32) -> f32 {
        self.hills()
            .map(|h| {
                let d = h.distance_to(x, y);
                let plateau = h.size * 0.5;
                if d <= plateau {
                    HILL_HEIGHT
                } else if d < h.size {
                    HILL_HEIGHT * (1.0 - (d - plateau) / (h.size - plateau))
                } else {
                    0.0
                }
            })
            .fold(0.0, f32::max)
    }

    /// Hill the point stands on, if any.
    pub fn hill_at(&self, x: f32, y: f32) -> Option<&TerrainFeature> {
        self.hills()
            .find(|h| h.distance_to(x, y) < h.size * ON_HILL_FRACTION)
    }

    /// Nearest intact tree or rock within `max_dist` that lies strictly ahead
    /// along `direction`, is not `exclude`, and passes `is_free`.
    pub fn cover_candidate_near(
        &self,
        x: f32,
        y: f32,
        max_dist: f32,
        exclude: Option<u32>,
        direction: f32,
        is_free: impl Fn(&TerrainFeature) -> bool,
    ) -> Option<&TerrainFeature> {
        self.features
            .iter()
            .filter(|f| f.provides_cover())
            .filter(|f| Some(f.id) != exclude)
            .filter(|f| (f.x - x) * direction > 0.0)
            .map(|f| (f.distance_to(x, y), f))
            .filter(|(d, _)| *d <= max_dist)
            .filter(|(_, f)| is_free(f))
            .fold(None, |best: Option<(f32, &TerrainFeature)>, (d, f)| match best {
                Some((bd, _)) if bd <= d => best,
                _ => Some((d, f)),
            })
            .map(|(_, f)| f)
    }

    pub fn is_on_bridge_at(&self, x: f32, y: f32) -> bool {
        self.bridges.iter().any(|b| b.contains(x, y))
    }

    /// True if a body centred at `x` overlaps the river band at row `y`.
    pub fn in_river_band(&self, x: f32, y: f32) -> bool {
        match &self.river {
            Some(river) => {
                let half = river.width / 2.0;
                let rx = river.x_at(y);
                x + UNIT_BODY_HALF_WIDTH > rx - half && x - UNIT_BODY_HALF_WIDTH < rx + half
            }
            None => false,
        }
    }

    /// Standing in the river off any bridge.
    pub fn in_water(&self, x: f32, y: f32) -> bool {
        self.in_river_band(x, y) && !self.is_on_bridge_at(x, y)
    }

    /// True if the faction still has to cross the river to advance from `x`.
    pub fn river_crossing_needed(&self, faction: Faction, x: f32, y: f32) -> bool {
        match self.river_x_at(y) {
            Some(rx) => match faction {
                Faction::West => x < rx,
                Faction::East => x > rx,
            },
            None => false,
        }
    }

    /// Bridge with the smallest row distance to `y`.
    pub fn nearest_bridge_by_row_distance(&self, y: f32) -> Option<&Bridge> {
        self.bridges.iter().fold(None, |best: Option<&Bridge>, b| match best {
            Some(cur) if (cur.y - y).abs() <= (b.y - y).abs() => best,
            _ => Some(b),
        })
    }

    /// Set intact trees near an impact alight, each with probability `chance`.
    /// Returns the ids of trees that caught fire.
    pub fn ignite_near(&mut self, x: f32, y: f32, radius: f32, chance: f64, rng: &mut ChaCha8Rng) -> Vec<u32> {
        let mut ignited = Vec::new();
        for f in self.features.iter_mut() {
            if f.kind == FeatureKind::Tree(TreeState::Normal)
                && f.distance_to(x, y) < radius
                && rng.gen_bool(chance.clamp(0.0, 1.0))
            {
                f.kind = FeatureKind::Tree(TreeState::Burning {
                    remaining: TREE_BURN_TICKS,
                });
                ignited.push(f.id);
            }
        }
        ignited
    }

    /// Break every tree not yet burnt within `radius`. Returns how many broke.
    pub fn crush_near(&mut self, x: f32, y: f32, radius: f32) -> usize {
        let mut crushed = 0;
        for f in self.features.iter_mut() {
            if let FeatureKind::Tree(state) = f.kind {
                let crushable = matches!(state, TreeState::Normal | TreeState::Burning { .. });
                if crushable && f.distance_to(x, y) < radius {
                    f.kind = FeatureKind::Tree(TreeState::Broken);
                    crushed += 1;
                }
            }
        }
        crushed
    }

    /// Advance burning trees by one tick.
    pub fn advance_fires(&mut self) {
        for f in self.features.iter_mut() {
            if let FeatureKind::Tree(TreeState::Burning { remaining }) = f.kind {
                f.kind = if remaining <= 1 {
                    FeatureKind::Tree(TreeState::Burnt)
                } else {
                    FeatureKind::Tree(TreeState::Burning {
                        remaining: remaining - 1,
                    })
                };
            }
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Rows of river polyline points, from just above the field to just below it.
fn river_rows() -> impl Iterator<Item = f32> {
    let start = -RIVER_SEGMENT_STEP;
    let end = FIELD_HEIGHT + RIVER_SEGMENT_STEP;
    let steps = ((end - start) / RIVER_SEGMENT_STEP).ceil() as usize;
    (0..=steps).map(move |i| start + i as f32 * RIVER_SEGMENT_STEP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_generation_respects_spacing() {
        let config = TerrainGenConfig::default();
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let field = TerrainField::generate(&config, &mut rng);

            assert!(field.hills().count() <= config.hill_attempts);
            assert!(field.trees().count() <= config.tree_attempts);

            let hills: Vec<_> = field.hills().collect();
            for (i, a) in hills.iter().enumerate() {
                for b in &hills[i + 1..] {
                    assert!(a.distance_to(b.x, b.y) >= config.hill_spacing);
                }
                assert!(field.river_distance(a.x, a.y) >= a.size + config.hill_river_buffer);
            }
            for t in field.trees() {
                assert!(field.river_distance(t.x, t.y) >= config.tree_river_buffer);
                assert!(hills.iter().all(|h| h.distance_to(t.x, t.y) >= h.size));
            }
            if field.river.is_some() {
                assert_eq!(field.bridges.len(), config.bridge_count);
            } else {
                assert!(field.bridges.is_empty());
            }
        }
    }

    #[test]
    fn test_generation_is_seeded() {
        let config = TerrainGenConfig::default();
        let a = TerrainField::generate(&config, &mut ChaCha8Rng::seed_from_u64(9));
        let b = TerrainField::generate(&config, &mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_river_spans_field() {
        let config = TerrainGenConfig {
            river_chance: 1.0,
            ..Default::default()
        };
        let field = TerrainField::generate(&config, &mut ChaCha8Rng::seed_from_u64(3));
        let river = field.river.as_ref().unwrap();
        assert!(river.points.first().unwrap().1 < 0.0);
        assert!(river.points.last().unwrap().1 > FIELD_HEIGHT);
        for b in &field.bridges {
            assert!((b.x - river.x_at(b.y)).abs() < 1e-3);
        }
    }

    #[test]
    fn test_height_profile() {
        let mut field = TerrainField::empty();
        field.add_feature(FeatureKind::Hill, 300.0, 300.0, 100.0);
        assert_eq!(field.height_at(300.0, 300.0), HILL_HEIGHT);
        assert_eq!(field.height_at(340.0, 300.0), HILL_HEIGHT);
        assert!((field.height_at(375.0, 300.0) - HILL_HEIGHT * 0.5).abs() < 1e-3);
        assert_eq!(field.height_at(420.0, 300.0), 0.0);
        assert!(field.hill_at(360.0, 300.0).is_some());
        assert!(field.hill_at(380.0, 300.0).is_none());
    }

    #[test]
    fn test_cover_candidate_is_forward_only() {
        let mut field = TerrainField::empty();
        let behind = field.add_feature(FeatureKind::Rock, 80.0, 200.0, 15.0);
        let ahead = field.add_feature(FeatureKind::Tree(TreeState::Normal), 180.0, 200.0, 50.0);

        let found = field.cover_candidate_near(100.0, 200.0, 150.0, None, 1.0, |_| true);
        assert_eq!(found.map(|f| f.id), Some(ahead));

        let found = field.cover_candidate_near(100.0, 200.0, 150.0, None, -1.0, |_| true);
        assert_eq!(found.map(|f| f.id), Some(behind));

        let found = field.cover_candidate_near(100.0, 200.0, 150.0, Some(ahead), 1.0, |_| true);
        assert!(found.is_none());

        let found = field.cover_candidate_near(100.0, 200.0, 150.0, None, 1.0, |f| f.id != ahead);
        assert!(found.is_none());
    }

    #[test]
    fn test_tree_state_machine() {
        let mut field = TerrainField::empty();
        let id = field.add_feature(FeatureKind::Tree(TreeState::Normal), 200.0, 200.0, 50.0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let lit = field.ignite_near(210.0, 200.0, 40.0, 1.0, &mut rng);
        assert_eq!(lit, vec![id]);
        assert!(!field.feature(id).unwrap().provides_cover());

        for _ in 0..TREE_BURN_TICKS {
            field.advance_fires();
        }
        assert_eq!(field.feature(id).unwrap().kind, FeatureKind::Tree(TreeState::Burnt));

        // Burnt trees cannot be crushed or re-ignited.
        assert_eq!(field.crush_near(200.0, 200.0, 20.0), 0);
        assert!(field.ignite_near(200.0, 200.0, 40.0, 1.0, &mut rng).is_empty());
    }

    #[test]
    fn test_crush_from_normal_or_burning() {
        let mut field = TerrainField::empty();
        let a = field.add_feature(FeatureKind::Tree(TreeState::Normal), 100.0, 200.0, 50.0);
        let b = field.add_feature(FeatureKind::Tree(TreeState::Burning { remaining: 10 }), 300.0, 200.0, 50.0);
        assert_eq!(field.crush_near(105.0, 200.0, 20.0), 1);
        assert_eq!(field.crush_near(300.0, 210.0, 20.0), 1);
        assert_eq!(field.feature(a).unwrap().kind, FeatureKind::Tree(TreeState::Broken));
        assert_eq!(field.feature(b).unwrap().kind, FeatureKind::Tree(TreeState::Broken));
    }

    #[test]
    fn test_river_and_bridge_queries() {
        let field = TerrainField::with_straight_river(400.0, &[150.0, 350.0]);
        assert!(field.in_river_band(380.0, 300.0));
        assert!(!field.in_river_band(360.0, 300.0));
        assert!(field.is_on_bridge_at(400.0, 150.0));
        assert!(!field.in_water(400.0, 160.0));
        assert!(field.in_water(400.0, 250.0));
        assert!(field.river_crossing_needed(Faction::West, 390.0, 250.0));
        assert!(!field.river_crossing_needed(Faction::East, 390.0, 250.0));
        assert_eq!(field.nearest_bridge_by_row_distance(300.0).map(|b| b.y), Some(350.0));

        let dry = TerrainField::empty();
        assert!(!dry.river_crossing_needed(Faction::West, 100.0, 200.0));
        assert!(dry.nearest_bridge_by_row_distance(200.0).is_none());
    }
}

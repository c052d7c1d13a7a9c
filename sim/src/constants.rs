//! Battlefield geometry and tuning constants shared across systems.

/// Width of the battlefield. West's home edge is x = 0, East's is x = FIELD_WIDTH.
pub const FIELD_WIDTH: f32 = 800.0;
/// Height of the battlefield (screen-space rows, top to bottom).
pub const FIELD_HEIGHT: f32 = 450.0;
/// Row of the horizon. Rows above it are sky.
pub const HORIZON_Y: f32 = 100.0;

/// Playable band for ground units.
pub const PLAY_MIN_Y: f32 = HORIZON_Y + 10.0;
pub const PLAY_MAX_Y: f32 = FIELD_HEIGHT - 10.0;

/// Distance from the home edge where ground units appear.
pub const HOME_EDGE_INSET: f32 = 30.0;
/// Rows where ground units spawn when no position is given.
pub const SPAWN_MIN_Y: f32 = HORIZON_Y + 50.0;
pub const SPAWN_MAX_Y: f32 = FIELD_HEIGHT - 50.0;

/// Far-field and near-field perspective scale.
pub const MIN_SCALE: f32 = 0.5;
pub const MAX_SCALE: f32 = 1.0;

// ============================================================================
// ECONOMY
// ============================================================================

pub const INITIAL_MONEY: f64 = 2000.0;
pub const MONEY_PER_TICK: f64 = 0.15;
pub const WIN_SCORE: u32 = 100;

// ============================================================================
// COMBAT
// ============================================================================

pub const PROJECTILE_SPEED: f32 = 6.0;
pub const HILL_RANGE_BONUS: f32 = 1.3;
pub const HILL_RELOAD_BONUS: f32 = 0.8;
pub const WATER_RANGE_PENALTY: f32 = 0.7;
/// Fraction of direct-fire damage absorbed by cover.
pub const COVER_DAMAGE_REDUCTION: f32 = 0.4;
/// Air-domain rounds hitting an aircraft deal this multiple of their damage.
pub const ANTI_AIR_MULTIPLIER: f32 = 2.0;
/// Broad-phase radius for projectile hit tests.
pub const PROJECTILE_QUERY_RADIUS: f32 = 50.0;
pub const AIR_HIT_RADIUS_UNIT: f32 = 18.0;
pub const AIR_HIT_RADIUS_FLYOVER: f32 = 35.0;
/// Impacts at least this strong may set nearby trees alight.
pub const IGNITION_DAMAGE_THRESHOLD: f32 = 50.0;
pub const IGNITION_RADIUS: f32 = 40.0;
pub const IGNITION_CHANCE: f64 = 0.35;
pub const TREE_BURN_TICKS: u32 = 300;
pub const CRUSH_RADIUS: f32 = 20.0;

// ============================================================================
// MOVEMENT
// ============================================================================

pub const WOBBLE_AMPLITUDE: f32 = 0.3;
pub const WOBBLE_RATE: f32 = 0.067;
pub const FLIGHT_ACQUIRE_RADIUS: f32 = 600.0;
/// Hovering aircraft hold at this fraction of their attack range.
pub const HOVER_STANDOFF: f32 = 0.6;
pub const HOVER_JITTER: f32 = 0.2;
pub const HILL_ATTRACT_RADIUS: f32 = 220.0;
pub const HILL_OCCUPIED_FRACTION: f32 = 0.6;
pub const ON_HILL_FRACTION: f32 = 0.7;
pub const ON_HILL_DAMPING: f32 = 0.1;
pub const COVER_SEEK_RADIUS: f32 = 150.0;
pub const COVER_ARRIVE_DISTANCE: f32 = 25.0;
/// Anyone sitting in a cover spot counts as occupying it.
pub const COVER_OCCUPIED_RADIUS: f32 = COVER_ARRIVE_DISTANCE;
pub const COVER_DWELL_MIN: u32 = 120;
pub const COVER_DWELL_MAX: u32 = 360;
pub const TREE_AVOID_RADIUS: f32 = 40.0;
pub const ROCK_AVOID_RADIUS: f32 = 30.0;
pub const AVOID_STRENGTH: f32 = 2.0;
pub const SEPARATION_RADIUS: f32 = 20.0;
pub const SEPARATION_STRENGTH: f32 = 0.5;
/// Half-width of a unit body when testing river overlap.
pub const UNIT_BODY_HALF_WIDTH: f32 = 5.0;
pub const BRIDGE_X_TOLERANCE: f32 = 10.0;
pub const BRIDGE_ALIGN_PULL: f32 = 0.8;
pub const BRIDGE_ALIGNED_DISTANCE: f32 = 20.0;
pub const RIVER_WADE_FACTOR: f32 = 0.3;
pub const RAIN_SPEED_FACTOR: f32 = 0.7;

// ============================================================================
// ORDNANCE
// ============================================================================

pub const FLYOVER_START_OFFSET: f32 = 250.0;
pub const FLYOVER_EXIT_DISTANCE: f32 = FIELD_WIDTH + 300.0;
pub const FLYOVER_RELEASE_WINDOW: f32 = 30.0;
pub const FLYOVER_HEALTH: f32 = 40.0;
pub const MISSILE_DESCENT_TICKS: f32 = 40.0;
pub const SALVO_SPACING: f32 = 30.0;
pub const CANISTER_START_SPEED: f32 = 2.0;
pub const CANISTER_GRAVITY: f32 = 0.2;
pub const PARATROOPER_COUNT: usize = 3;
pub const PARATROOPER_SPACING: f32 = 25.0;
/// Ticks a dropped paratrooper spends under canopy.
pub const DESCENT_GRACE_TICKS: u64 = 180;
pub const FLASH_DECAY: f32 = 0.02;
pub const NUKE_CLOUD_PARTICLES: usize = 600;

/// Perspective scale at a screen row: 0.5 at the horizon, 1.0 at the bottom edge.
#[inline]
pub fn perspective_scale(y: f32) -> f32 {
    let t = ((y - HORIZON_Y) / (FIELD_HEIGHT - HORIZON_Y)).clamp(0.0, 1.0);
    MIN_SCALE + t * (MAX_SCALE - MIN_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perspective_scale_bounds() {
        assert!((perspective_scale(HORIZON_Y) - 0.5).abs() < 1e-6);
        assert!((perspective_scale(FIELD_HEIGHT) - 1.0).abs() < 1e-6);
        assert!((perspective_scale(0.0) - 0.5).abs() < 1e-6);
        let mid = perspective_scale(275.0);
        assert!((mid - 0.75).abs() < 1e-6);
    }
}

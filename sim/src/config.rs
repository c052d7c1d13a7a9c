//! Match configuration.

use crate::constants::{INITIAL_MONEY, MONEY_PER_TICK, WIN_SCORE};
use crate::error::SimResult;
use crate::terrain::TerrainGenConfig;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for one match. Missing JSON fields take their defaults.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for terrain generation and every random draw in the tick.
    pub seed: u64,
    /// Seconds of wall time per tick.
    pub fixed_timestep: f32,
    pub initial_money: f64,
    pub income_per_tick: f64,
    pub win_score: u32,
    pub weather_enabled: bool,
    pub terrain: TerrainGenConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            fixed_timestep: 1.0 / 60.0,
            initial_money: INITIAL_MONEY,
            income_per_tick: MONEY_PER_TICK,
            win_score: WIN_SCORE,
            weather_enabled: true,
            terrain: TerrainGenConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

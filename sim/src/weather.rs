//! Clear/rain weather cycle. Rain slows ground units.

use crate::config::SimConfig;
use crate::constants::RAIN_SPEED_FACTOR;
use crate::systems::SimRng;
use bevy_ecs::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

const CLEAR_DWELL: RangeInclusive<u32> = 1800..=3600;
const RAIN_DWELL: RangeInclusive<u32> = 900..=1800;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherMode {
    Clear,
    Rain,
}

#[derive(Resource, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Weather {
    pub mode: WeatherMode,
    /// Ticks until the next change.
    pub remaining: u32,
}

impl Default for Weather {
    fn default() -> Self {
        Self {
            mode: WeatherMode::Clear,
            remaining: *CLEAR_DWELL.start(),
        }
    }
}

impl Weather {
    pub fn is_raining(&self) -> bool {
        self.mode == WeatherMode::Rain
    }

    /// Multiplier for ground-unit advance speed.
    pub fn ground_speed_factor(&self) -> f32 {
        if self.is_raining() {
            RAIN_SPEED_FACTOR
        } else {
            1.0
        }
    }

    fn advance(&mut self, rng: &mut impl Rng) {
        if self.remaining > 0 {
            self.remaining -= 1;
            return;
        }
        let (mode, dwell) = match self.mode {
            WeatherMode::Clear => (WeatherMode::Rain, RAIN_DWELL),
            WeatherMode::Rain => (WeatherMode::Clear, CLEAR_DWELL),
        };
        self.mode = mode;
        self.remaining = rng.gen_range(dwell);
        tracing::trace!(?mode, remaining = self.remaining, "weather changed");
    }
}

/// Counts the weather dwell down and flips mode when it expires.
pub fn weather_system(config: Res<SimConfig>, mut weather: ResMut<Weather>, mut rng: ResMut<SimRng>) {
    if !config.weather_enabled {
        return;
    }
    weather.advance(&mut rng.0);
}

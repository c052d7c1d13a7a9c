//! Per-faction money and score.

use crate::components::{Faction, FactionPair};
use crate::config::SimConfig;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Money and score for both factions.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct EconomyLedger {
    pub money: FactionPair<f64>,
    pub score: FactionPair<u32>,
}

impl EconomyLedger {
    pub fn new(initial_money: f64) -> Self {
        Self {
            money: FactionPair::new(initial_money, initial_money),
            score: FactionPair::default(),
        }
    }

    pub fn money(&self, faction: Faction) -> f64 {
        *self.money.get(faction)
    }

    pub fn score(&self, faction: Faction) -> u32 {
        *self.score.get(faction)
    }

    /// Passive income for both factions.
    pub fn accrue(&mut self, amount: f64) {
        self.money.west += amount;
        self.money.east += amount;
    }

    /// Deduct `cost`, never going below zero. Returns the amount actually taken.
    pub fn spend(&mut self, faction: Faction, cost: f64) -> f64 {
        let money = self.money.get_mut(faction);
        let taken = cost.max(0.0).min(*money);
        *money = (*money - cost.max(0.0)).max(0.0);
        taken
    }

    pub fn refund(&mut self, faction: Faction, amount: f64) {
        *self.money.get_mut(faction) += amount.max(0.0);
    }

    pub fn add_score(&mut self, faction: Faction, points: u32) {
        *self.score.get_mut(faction) += points;
    }

    /// First faction at or past the threshold. West is checked first.
    pub fn winner(&self, win_score: u32) -> Option<Faction> {
        [Faction::West, Faction::East]
            .into_iter()
            .find(|f| self.score(*f) >= win_score)
    }
}

impl Default for EconomyLedger {
    fn default() -> Self {
        Self::new(crate::constants::INITIAL_MONEY)
    }
}

/// Adds the configured income to both factions every tick.
pub fn economy_income_system(config: Res<SimConfig>, mut ledger: ResMut<EconomyLedger>) {
    ledger.accrue(config.income_per_tick);
}

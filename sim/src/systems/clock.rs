//! Match-wide clock, randomness and bookkeeping resources.

use crate::components::Faction;
use bevy_ecs::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Global simulation tick counter. Incremented before each schedule run.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimTick(pub u64);

impl SimTick {
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

/// Seeded generator behind every random draw inside the tick.
#[derive(Resource, Debug, Clone)]
pub struct SimRng(pub ChaCha8Rng);

impl SimRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}

/// Hands out unit ids.
#[derive(Resource, Debug, Clone, Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn next_id(&mut self) -> u32 {
        self.next += 1;
        self.next
    }
}

/// White-out intensity after a nuke, decaying to zero.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct WorldFlash(pub f32);

/// Terminal state of the match.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    pub winner: Option<Faction>,
}

impl MatchOutcome {
    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let mut ids = IdAllocator::default();
        let a = ids.next_id();
        let b = ids.next_id();
        assert!(b > a);
        assert_ne!(a, 0);
    }

    #[test]
    fn test_rng_is_seeded() {
        let mut a = SimRng::from_seed(11);
        let mut b = SimRng::from_seed(11);
        let xs: Vec<u32> = (0..8).map(|_| a.0.gen()).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.0.gen()).collect();
        assert_eq!(xs, ys);
    }
}

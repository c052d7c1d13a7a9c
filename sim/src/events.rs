//! One-shot feedback events for audio and presentation collaborators.

use crate::components::Faction;
use crate::units::UnitKind;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// A discrete simulation transition worth a sound or a visual cue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    UnitSpawned { faction: Faction, kind: UnitKind },
    ShotFired { faction: Faction, kind: UnitKind, x: f32, y: f32 },
    Impact { x: f32, y: f32 },
    Explosion { x: f32, y: f32, radius: f32 },
    DeathScream { faction: Faction, x: f32, y: f32 },
    NukeFlash { x: f32, y: f32 },
    AircraftDown { faction: Faction, x: f32, y: f32 },
    UnitScored { faction: Faction, kind: UnitKind, points: u32 },
    Victory { winner: Faction },
}

/// Events produced since the last drain.
#[derive(Resource, Debug, Default)]
pub struct EventBuffer {
    events: Vec<SimEvent>,
}

impl EventBuffer {
    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_buffer() {
        let mut buffer = EventBuffer::default();
        buffer.push(SimEvent::Impact { x: 1.0, y: 2.0 });
        buffer.push(SimEvent::Victory { winner: Faction::East });
        assert_eq!(buffer.len(), 2);
        let drained = buffer.drain();
        assert_eq!(drained.len(), 2);
        assert!(buffer.is_empty());
    }
}

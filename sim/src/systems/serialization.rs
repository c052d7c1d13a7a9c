//! Serialization utilities for simulation state.

use crate::error::SimResult;
use crate::world::Snapshot;

/// Serialize a snapshot to JSON bytes.
pub fn snapshot_to_json(snapshot: &Snapshot) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(snapshot)
}

/// Serialize a snapshot to a JSON string.
pub fn snapshot_to_json_string(snapshot: &Snapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string(snapshot)
}

/// Deserialize a snapshot from JSON bytes.
pub fn snapshot_from_json(data: &[u8]) -> SimResult<Snapshot> {
    Ok(serde_json::from_slice(data)?)
}

/// Deserialize a snapshot from a JSON string.
pub fn snapshot_from_json_string(data: &str) -> SimResult<Snapshot> {
    Ok(serde_json::from_str(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Faction, FactionPair};
    use crate::units::UnitKind;
    use crate::weather::WeatherMode;
    use crate::world::UnitSnapshot;

    #[test]
    fn test_snapshot_survives_json() {
        let snapshot = Snapshot {
            tick: 42,
            time: 0.7,
            units: vec![UnitSnapshot {
                id: 1,
                faction: Faction::East,
                kind: UnitKind::Sniper,
                x: 10.0,
                y: 200.0,
                health: 10.0,
                health_max: 10.0,
                in_cover: true,
                on_hill: false,
                descending: false,
            }],
            projectiles: vec![],
            flyovers: vec![],
            missiles: vec![],
            particles: vec![],
            trees: vec![],
            score: FactionPair::new(3, 1),
            money: FactionPair::new(1200.5, 80.0),
            weather: WeatherMode::Rain,
            flash: 0.0,
            winner: None,
        };

        let bytes = snapshot_to_json(&snapshot).unwrap();
        let restored = snapshot_from_json(&bytes).unwrap();
        assert_eq!(restored.tick, 42);
        assert_eq!(restored.units, snapshot.units);
        assert_eq!(restored.score, snapshot.score);
        assert_eq!(restored.weather, WeatherMode::Rain);
    }

    #[test]
    fn test_garbage_json_is_rejected() {
        assert!(snapshot_from_json_string("{ not json").is_err());
    }
}

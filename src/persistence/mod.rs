//! Snapshot envelope
//!
//! A versioned JSON wrapper around [`GameState`]. Snapshots live in memory
//! only; restoring one continues the run exactly, RNG stream included.

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::sim::GameState;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub state: GameState,
}

impl Snapshot {
    pub fn capture(state: &GameState) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            state: state.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and check the version
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(snapshot)
    }

    pub fn into_state(self) -> GameState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Tuning;
    use crate::sim::{TickInput, tick};

    #[test]
    fn test_restore_continues_identically() {
        let mut state = GameState::new(2024, Tuning::default());
        let start = TickInput {
            start: true,
            ..Default::default()
        };
        tick(&mut state, &start, 0.016).unwrap();
        for _ in 0..120 {
            tick(&mut state, &TickInput::default(), 0.016).unwrap();
        }

        let json = Snapshot::capture(&state).to_json().unwrap();
        let mut restored = Snapshot::from_json(&json).unwrap().into_state();

        for _ in 0..120 {
            let a = tick(&mut state, &TickInput::default(), 0.016).unwrap();
            let b = tick(&mut restored, &TickInput::default(), 0.016).unwrap();
            assert_eq!(a, b);
        }
        assert_eq!(state.world.enemies, restored.world.enemies);
        assert_eq!(state.session.score, restored.session.score);
    }

    #[test]
    fn test_rejects_other_versions() {
        let state = GameState::new(1, Tuning::default());
        let mut snapshot = Snapshot::capture(&state);
        snapshot.version = 99;
        let json = snapshot.to_json().unwrap();
        assert!(matches!(
            Snapshot::from_json(&json),
            Err(SnapshotError::Version { found: 99, expected: 1 })
        ));
        assert!(matches!(Snapshot::from_json("{}"), Err(SnapshotError::Json(_))));
    }
}

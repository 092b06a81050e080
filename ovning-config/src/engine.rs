//! Engine configuration parameters.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Engine parameters: snapshot fan-out sizing and session limits.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct EngineConfig {
    /// Depth of the broadcast channel carrying state snapshots. A slow
    /// subscriber may skip intermediate snapshots but always sees the latest.
    #[serde(default = "default_snapshot_capacity")]
    #[validate(range(min = 16, max = 65536))]
    pub snapshot_capacity: usize,

    /// Maximum number of non-terminal sessions (running or paused) at once.
    #[serde(default = "default_max_active_sessions")]
    #[validate(range(min = 1, max = 4096))]
    pub max_active_sessions: usize,
}

fn default_snapshot_capacity() -> usize {
    256
}

fn default_max_active_sessions() -> usize {
    64
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snapshot_capacity: default_snapshot_capacity(),
            max_active_sessions: default_max_active_sessions(),
        }
    }
}

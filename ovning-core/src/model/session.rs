//! Live session records: one timed run of a scenario.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::scenario::Severity;

/// Lifecycle of a session. `Stopped` and `Completed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Paused,
    Stopped,
    Completed,
}

impl SessionStatus {
    /// True once a session can never dispatch again.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Stopped | SessionStatus::Completed)
    }
}

/// Completion state of one objective inside one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectiveProgress {
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

/// One timed run of a scenario.
///
/// `elapsed_seconds` is a snapshot of the pausable clock, refreshed on every
/// dispatch and on pause/stop; the authoritative clock lives in the engine's
/// runtime record while the session is non-terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSession {
    pub id: String,
    pub scenario_id: String,
    pub operation_id: Option<String>,
    pub starter_id: String,
    pub started_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub elapsed_seconds: u64,
    /// Exactly one entry per scenario objective, seeded at start.
    pub objective_state: BTreeMap<String, ObjectiveProgress>,
    pub dispatched_trigger_ids: Vec<String>,
    pub paused_at: Option<DateTime<Utc>>,
    pub resumed_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
}

/// An operator-injected event, dispatched at the session's current elapsed
/// time rather than a scripted offset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectedEvent {
    pub event_type: String,
    pub title: String,
    pub message: String,
    pub severity: Option<Severity>,
    pub payload: Option<Value>,
}

//! Append-only record of dispatched triggers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::scenario::Severity;

/// The durable record of one dispatched trigger, scripted or injected.
///
/// `time_offset_seconds` is the session's true elapsed time at the moment of
/// emission, not the trigger's static offset, so manual injections land at
/// their real position on the timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationTimelineEvent {
    pub id: String,
    pub session_id: String,
    pub scenario_id: String,
    pub operation_id: Option<String>,
    pub event_type: String,
    pub title: String,
    pub message: String,
    pub emitted_at: DateTime<Utc>,
    pub time_offset_seconds: u64,
    pub severity: Severity,
    /// Always true for records produced by this engine.
    pub is_simulation: bool,
    pub payload: Value,
}

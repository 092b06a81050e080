//! Scored debrief produced once per terminated session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::scenario::Severity;

/// Outcome band of a scored debrief.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Partial,
    Fail,
}

/// Per-objective line of the debrief.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveSummary {
    pub objective_id: String,
    pub title: String,
    pub completed: bool,
    pub required: bool,
    pub rescue_weighted: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Condensed timeline line of the debrief.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineSummary {
    pub event_type: String,
    pub time_offset_seconds: u64,
    pub severity: Severity,
    pub title: String,
}

/// The one-time, deterministic scored summary of a finished session.
/// Produced exactly once per stop, never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingResult {
    pub id: String,
    pub session_id: String,
    pub scenario_id: String,
    pub operation_id: Option<String>,
    pub participant_ids: Vec<String>,
    pub generated_at: DateTime<Utc>,
    pub outcome: Outcome,
    /// 0..=100
    pub score: u8,
    /// 0..=100
    pub rescue_score: u8,
    pub objective_summaries: Vec<ObjectiveSummary>,
    pub timeline_summaries: Vec<TimelineSummary>,
    pub recommendations: Vec<String>,
    pub narrative: String,
    /// Provenance tag, `"simulation"` for everything this engine emits.
    pub source: String,
}

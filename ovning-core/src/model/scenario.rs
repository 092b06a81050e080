//! Authored scenario records and their raw authoring inputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Difficulty band an author assigns to a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Intro,
    #[default]
    Standard,
    Advanced,
    Extreme,
}

/// Severity attached to a trigger and carried onto its timeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// A reusable, authored exercise definition.
///
/// Objectives keep author order; triggers are kept sorted ascending by
/// `offset_seconds` (normalization guarantees this on every write).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingScenario {
    pub id: String,
    pub title: String,
    pub description: String,
    pub narrative_context: Option<String>,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub prerequisite_ids: Vec<String>,
    pub tested_procedure_ids: Vec<String>,
    pub objectives: Vec<TrainingObjective>,
    pub triggers: Vec<SimulationTrigger>,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One measurable goal of a scenario. Immutable once the scenario is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingObjective {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub required: bool,
    pub rescue_weighted: bool,
    pub target_seconds: Option<u64>,
}

/// A scripted event fired at a fixed scenario-relative offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationTrigger {
    pub id: String,
    pub offset_seconds: u64,
    pub event_type: String,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub payload: Value,
    pub objective_id: Option<String>,
    pub requires_response: bool,
}

/// Raw authoring input for a scenario, as received from a form or YAML file.
///
/// Everything is optional at this layer; `ScenarioCatalog` decides what is
/// mandatory on create versus merge-over on upsert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub narrative_context: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub tags: Vec<String>,
    pub prerequisite_ids: Vec<String>,
    pub tested_procedure_ids: Vec<String>,
    pub objectives: Option<Vec<ObjectiveInput>>,
    pub triggers: Option<Vec<TriggerInput>>,
    pub author_id: Option<String>,
}

/// Raw objective input before normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveInput {
    pub id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub required: Option<bool>,
    pub rescue_weighted: Option<bool>,
    pub target_seconds: Option<u64>,
}

/// Raw trigger input before normalization. Offsets may arrive negative from
/// sloppy authoring tools; normalization clamps them to zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerInput {
    pub id: Option<String>,
    pub offset_seconds: i64,
    pub event_type: String,
    pub title: String,
    pub message: String,
    pub severity: Option<Severity>,
    pub payload: Option<Value>,
    pub objective_id: Option<String>,
    pub requires_response: bool,
}

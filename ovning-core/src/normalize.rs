//! Pure canonicalization of authored objectives and triggers.
//!
//! Runs on every catalog write so stored scenarios always satisfy:
//! - every objective/trigger has an id (`obj_N` / `trg_N` fallback, 1-based)
//! - `required` defaults true, severity defaults Medium
//! - trigger offsets are non-negative
//! - triggers are sorted ascending by offset, ties keeping input order

use serde_json::Value;

use crate::model::{ObjectiveInput, SimulationTrigger, TrainingObjective, TriggerInput};

/// Canonicalizes authored objectives. Author order is preserved.
pub fn normalize_objectives(inputs: Vec<ObjectiveInput>) -> Vec<TrainingObjective> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(idx, input)| TrainingObjective {
            id: input
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("obj_{}", idx + 1)),
            title: input.title,
            description: input.description,
            required: input.required.unwrap_or(true),
            rescue_weighted: input.rescue_weighted.unwrap_or(false),
            target_seconds: input.target_seconds,
        })
        .collect()
}

/// Canonicalizes authored triggers: ids, defaults, clamped offsets, and a
/// stable ascending sort by offset.
pub fn normalize_triggers(inputs: Vec<TriggerInput>) -> Vec<SimulationTrigger> {
    let mut triggers: Vec<SimulationTrigger> = inputs
        .into_iter()
        .enumerate()
        .map(|(idx, input)| SimulationTrigger {
            id: input
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("trg_{}", idx + 1)),
            offset_seconds: input.offset_seconds.max(0) as u64,
            event_type: input.event_type,
            title: input.title,
            message: input.message,
            severity: input.severity.unwrap_or_default(),
            payload: input.payload.unwrap_or(Value::Null),
            objective_id: input.objective_id,
            requires_response: input.requires_response,
        })
        .collect();
    // Stable sort: offset ties keep original input order.
    triggers.sort_by_key(|t| t.offset_seconds);
    triggers
}

/// Unions `extra` into `base`, de-duplicating while preserving first-seen
/// order. Used for scenario tag/prerequisite/tested-id merges on upsert.
pub fn union_preserving_order(base: Vec<String>, extra: Vec<String>) -> Vec<String> {
    let mut merged = Vec::with_capacity(base.len() + extra.len());
    for item in base.into_iter().chain(extra) {
        if !merged.contains(&item) {
            merged.push(item);
        }
    }
    merged
}

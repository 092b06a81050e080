//! Boundary towards the live operational context.
//!
//! The engine consumes this trait, it never implements it. Sink failures are
//! logged and swallowed at the call site; the simulation's internal record
//! stays authoritative regardless of sink outcome.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use ovning_core::model::Severity;

/// One dispatched trigger, as reported to the operational context.
#[derive(Debug, Clone, Serialize)]
pub struct OperationEvent {
    pub operation_id: String,
    /// Scope tag, always `"simulation"` from this engine.
    pub scope: String,
    pub event_type: String,
    /// Id of whoever started the session.
    pub actor_id: String,
    /// Always true; lets the receiver separate drills from real traffic.
    pub is_simulation: bool,
    pub session_id: String,
    pub scenario_id: String,
    pub trigger_id: String,
    pub title: String,
    pub severity: Severity,
    pub message: String,
    pub payload: Value,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Sink unavailable: {0}")]
    Unavailable(String),

    #[error("Sink rejected event: {0}")]
    Rejected(String),
}

/// Receives a record of every dispatched trigger whose session carries an
/// operation id. Best-effort: errors never propagate to engine callers.
#[async_trait]
pub trait OperationEventSink: Send + Sync {
    async fn record(&self, event: OperationEvent) -> Result<(), SinkError>;
}

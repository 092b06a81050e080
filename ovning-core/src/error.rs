//! Error taxonomy for the engine. All errors are synchronous and local;
//! they are raised before any state mutation takes place.

use thiserror::Error;

use crate::model::SessionStatus;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Scenario authoring rejected (empty title/description).
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Objective {objective_id} not found in session {session_id}")]
    ObjectiveNotFound {
        session_id: String,
        objective_id: String,
    },

    /// Operation not valid for the session's current status, e.g. injecting
    /// into a stopped session. Pause/resume on the wrong status are silent
    /// no-ops instead.
    #[error("Session {session_id} is {status:?}; operation not permitted")]
    InvalidState {
        session_id: String,
        status: SessionStatus,
    },

    /// Active-session limit from configuration reached.
    #[error("Active session limit reached ({0})")]
    SessionLimit(usize),
}

pub type EngineResult<T> = Result<T, EngineError>;

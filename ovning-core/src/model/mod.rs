//! Shared record types for scenarios, sessions, timelines, and results.

mod result;
mod scenario;
mod session;
mod timeline;

pub use result::{ObjectiveSummary, Outcome, TimelineSummary, TrainingResult};
pub use scenario::{
    Difficulty, ObjectiveInput, ScenarioInput, Severity, SimulationTrigger, TrainingObjective,
    TrainingScenario, TriggerInput,
};
pub use session::{InjectedEvent, ObjectiveProgress, SessionStatus, SimulationSession};
pub use timeline::SimulationTimelineEvent;

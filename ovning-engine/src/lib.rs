//! # ovning-engine
//!
//! The training-scenario simulation engine: authors repeatable exercise
//! scenarios, runs timed rehearsal sessions on a pausable clock, dispatches
//! scripted and operator-injected events, and produces a deterministic
//! scored debrief when a session terminates.
//!
//! ## Key Components:
//! - **ScenarioCatalog** (`catalog`): create/upsert/list scenarios with
//!   normalized objectives and triggers.
//! - **SessionEngine** (`session`): the per-session state machine, elapsed
//!   clock, and cancellable trigger timers.
//! - **DebriefGenerator** (`debrief`): pure scoring of a terminated session.
//! - **ChangeNotifier** (`notify`): sorted full-state snapshots broadcast
//!   after every mutation.
//! - **OperationEventSink** (`sink`): best-effort boundary towards a live
//!   operational context.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use ovning_config::EngineConfig;
use ovning_core::ids::IdGen;
use ovning_core::model::{
    SimulationSession, SimulationTimelineEvent, TrainingResult, TrainingScenario,
};
use ovning_telemetry::MetricsRecorder;

mod catalog;
mod debrief;
mod notify;
mod session;
mod sink;

pub use debrief::{generate_debrief, outcome_for};
pub use notify::EngineSnapshot;
pub use sink::{OperationEvent, OperationEventSink, SinkError};

use session::SessionRuntime;

pub mod prelude {
    pub use crate::{EngineSnapshot, OperationEvent, OperationEventSink, SimulationEngine};
    pub use ovning_core::prelude::*;
}

/// Process-wide stores, only ever mutated through engine operations while
/// holding the state lock.
pub(crate) struct EngineState {
    pub(crate) scenarios: BTreeMap<String, TrainingScenario>,
    pub(crate) sessions: BTreeMap<String, SimulationSession>,
    pub(crate) timeline: Vec<SimulationTimelineEvent>,
    pub(crate) results: Vec<TrainingResult>,
    /// Session id -> live runtime. Exactly one runtime per non-terminal
    /// session; removed atomically on stop/auto-complete.
    pub(crate) runtimes: HashMap<String, SessionRuntime>,
}

pub(crate) struct Inner {
    pub(crate) state: Mutex<EngineState>,
    pub(crate) ids: IdGen,
    pub(crate) snapshots: broadcast::Sender<EngineSnapshot>,
    pub(crate) sink: Option<Arc<dyn OperationEventSink>>,
    pub(crate) metrics: MetricsRecorder,
    pub(crate) config: EngineConfig,
}

/// Cloneable handle to one engine instance. All state lives behind the
/// handle; there is no global singleton.
#[derive(Clone)]
pub struct SimulationEngine {
    pub(crate) inner: Arc<Inner>,
}

impl SimulationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::build(config, None)
    }

    /// Engine wired to an operation event sink; every dispatched trigger of
    /// an operation-linked session is forwarded to it, best-effort.
    pub fn with_sink(config: EngineConfig, sink: Arc<dyn OperationEventSink>) -> Self {
        Self::build(config, Some(sink))
    }

    fn build(config: EngineConfig, sink: Option<Arc<dyn OperationEventSink>>) -> Self {
        let (snapshots, _) = broadcast::channel(config.snapshot_capacity);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(EngineState {
                    scenarios: BTreeMap::new(),
                    sessions: BTreeMap::new(),
                    timeline: Vec::new(),
                    results: Vec::new(),
                    runtimes: HashMap::new(),
                }),
                ids: IdGen::new(),
                snapshots,
                sink,
                metrics: MetricsRecorder::new(),
                config,
            }),
        }
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.inner.metrics
    }
}

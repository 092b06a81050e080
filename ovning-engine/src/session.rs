//! The per-session state machine: pausable elapsed clock, cancellable
//! trigger timers, dispatch, and termination.
//!
//! Concurrency contract: every mutation of a session happens under the one
//! engine state lock, and dispatch re-checks the session status after
//! acquiring it. Pause/stop abort all pending timers before returning, so a
//! timer that outlives the transition is a no-op either way.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

use ovning_core::model::{
    InjectedEvent, ObjectiveProgress, SessionStatus, SimulationSession, SimulationTimelineEvent,
    SimulationTrigger, TrainingResult,
};
use ovning_core::{EngineError, EngineResult};

use crate::debrief::generate_debrief;
use crate::sink::OperationEvent;
use crate::{EngineState, SimulationEngine};

/// Live clock and timer handles for one non-terminal session.
///
/// `accrued` is the elapsed time of all finished RUNNING intervals;
/// `interval_started` anchors the current one. The pausable clock reads
/// `accrued` alone while PAUSED, so wall time spent paused never counts.
pub(crate) struct SessionRuntime {
    interval_started: Instant,
    accrued: Duration,
    timers: HashMap<String, JoinHandle<()>>,
}

impl SessionRuntime {
    fn elapsed(&self, status: SessionStatus) -> Duration {
        match status {
            SessionStatus::Running => self.accrued + self.interval_started.elapsed(),
            _ => self.accrued,
        }
    }
}

impl SimulationEngine {
    /// Starts a session on a scenario: status RUNNING from the first
    /// instant, objective state seeded one entry per scenario objective,
    /// and one timer scheduled per scripted trigger.
    ///
    /// Must be called within a tokio runtime; timers are spawned tasks.
    #[instrument(skip(self, operation_id))]
    pub fn start_session(
        &self,
        scenario_id: &str,
        operation_id: Option<String>,
        starter_id: &str,
    ) -> EngineResult<SimulationSession> {
        let session = {
            let mut state = self.inner.state.lock();
            let scenario = state
                .scenarios
                .get(scenario_id)
                .cloned()
                .ok_or_else(|| EngineError::ScenarioNotFound(scenario_id.to_string()))?;
            if state.runtimes.len() >= self.inner.config.max_active_sessions {
                return Err(EngineError::SessionLimit(
                    self.inner.config.max_active_sessions,
                ));
            }

            let id = self.inner.ids.next("ses");
            let objective_state = scenario
                .objectives
                .iter()
                .map(|o| (o.id.clone(), ObjectiveProgress::default()))
                .collect();
            let session = SimulationSession {
                id: id.clone(),
                scenario_id: scenario.id.clone(),
                operation_id,
                starter_id: starter_id.to_string(),
                started_at: Utc::now(),
                status: SessionStatus::Running,
                elapsed_seconds: 0,
                objective_state,
                dispatched_trigger_ids: Vec::new(),
                paused_at: None,
                resumed_at: None,
                stopped_at: None,
            };
            state.sessions.insert(id.clone(), session.clone());

            let mut runtime = SessionRuntime {
                interval_started: Instant::now(),
                accrued: Duration::ZERO,
                timers: HashMap::new(),
            };
            for trigger in &scenario.triggers {
                let delay = Duration::from_millis(trigger.offset_seconds.saturating_mul(1000));
                runtime.timers.insert(
                    trigger.id.clone(),
                    self.spawn_timer(id.clone(), trigger.id.clone(), delay),
                );
            }
            state.runtimes.insert(id, runtime);
            session
        };

        self.inner.metrics.sessions_started.inc();
        info!(session_id = %session.id, "Session started");
        self.publish();
        Ok(session)
    }

    /// Freezes the clock and cancels pending timers. No-op unless RUNNING.
    #[instrument(skip(self))]
    pub fn pause_session(&self, session_id: &str) -> EngineResult<SimulationSession> {
        let session = {
            let mut state = self.inner.state.lock();
            let current = state
                .sessions
                .get(session_id)
                .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;
            if current.status != SessionStatus::Running {
                return Ok(current.clone());
            }
            let elapsed = state.runtimes.get_mut(session_id).map(|runtime| {
                runtime.accrued += runtime.interval_started.elapsed();
                for (_, handle) in runtime.timers.drain() {
                    handle.abort();
                }
                runtime.accrued.as_secs()
            });
            let session = state
                .sessions
                .get_mut(session_id)
                .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;
            if let Some(elapsed) = elapsed {
                session.elapsed_seconds = elapsed;
            }
            session.status = SessionStatus::Paused;
            session.paused_at = Some(Utc::now());
            session.clone()
        };
        debug!(session_id, elapsed = session.elapsed_seconds, "Session paused");
        self.publish();
        Ok(session)
    }

    /// Restarts the clock and re-schedules every not-yet-dispatched trigger
    /// with its remaining delay. No-op unless PAUSED.
    #[instrument(skip(self))]
    pub fn resume_session(&self, session_id: &str) -> EngineResult<SimulationSession> {
        let session = {
            let mut state = self.inner.state.lock();
            let session = state
                .sessions
                .get_mut(session_id)
                .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;
            if session.status != SessionStatus::Paused {
                return Ok(session.clone());
            }
            session.status = SessionStatus::Running;
            session.resumed_at = Some(Utc::now());
            let session = session.clone();

            let scenario = state.scenarios.get(&session.scenario_id).cloned();
            if let Some(runtime) = state.runtimes.get_mut(session_id) {
                runtime.interval_started = Instant::now();
                if let Some(scenario) = scenario {
                    let accrued_ms = runtime.accrued.as_millis() as u64;
                    for trigger in scenario
                        .triggers
                        .iter()
                        .filter(|t| !session.dispatched_trigger_ids.contains(&t.id))
                    {
                        let delay = Duration::from_millis(
                            trigger
                                .offset_seconds
                                .saturating_mul(1000)
                                .saturating_sub(accrued_ms),
                        );
                        runtime.timers.insert(
                            trigger.id.clone(),
                            self.spawn_timer(session_id.to_string(), trigger.id.clone(), delay),
                        );
                    }
                }
            }
            session
        };
        debug!(session_id, "Session resumed");
        self.publish();
        Ok(session)
    }

    /// Dispatches an operator-injected event at the session's current true
    /// elapsed time. Valid while RUNNING or PAUSED.
    #[instrument(skip(self, event))]
    pub async fn inject_event(
        &self,
        session_id: &str,
        event: InjectedEvent,
    ) -> EngineResult<SimulationTimelineEvent> {
        let (timeline_event, operation_event) = {
            let mut state = self.inner.state.lock();
            let session = state
                .sessions
                .get(session_id)
                .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;
            if session.status.is_terminal() {
                return Err(EngineError::InvalidState {
                    session_id: session_id.to_string(),
                    status: session.status,
                });
            }
            let status = session.status;
            let fallback = Duration::from_secs(session.elapsed_seconds);
            let elapsed = state
                .runtimes
                .get(session_id)
                .map(|r| r.elapsed(status))
                .unwrap_or(fallback);

            let trigger = SimulationTrigger {
                id: self.inner.ids.next("inj"),
                offset_seconds: elapsed.as_secs(),
                event_type: event.event_type,
                title: event.title,
                message: event.message,
                severity: event.severity.unwrap_or_default(),
                payload: event.payload.unwrap_or(Value::Null),
                objective_id: None,
                requires_response: false,
            };
            // Same dispatch path as scripted triggers, but injections never
            // count toward the scenario's auto-completion tally, so the
            // completion check is not run here.
            match self.dispatch_locked(&mut state, session_id, trigger, elapsed.as_secs()) {
                Some(pair) => pair,
                None => {
                    return Err(EngineError::SessionNotFound(session_id.to_string()));
                }
            }
        };
        self.deliver(operation_event).await;
        self.publish();
        Ok(timeline_event)
    }

    /// Sets completion state on one objective of the session.
    #[instrument(skip(self, note))]
    pub fn mark_objective(
        &self,
        session_id: &str,
        objective_id: &str,
        completed: bool,
        note: Option<String>,
    ) -> EngineResult<SimulationSession> {
        let session = {
            let mut state = self.inner.state.lock();
            let session = state
                .sessions
                .get_mut(session_id)
                .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;
            let progress = session.objective_state.get_mut(objective_id).ok_or_else(|| {
                EngineError::ObjectiveNotFound {
                    session_id: session_id.to_string(),
                    objective_id: objective_id.to_string(),
                }
            })?;
            progress.completed = completed;
            progress.completed_at = completed.then(Utc::now);
            progress.note = note;
            session.clone()
        };
        self.publish();
        Ok(session)
    }

    /// Terminates the session, cancels pending timers, and produces the
    /// one-time debrief. Idempotent: stopping a terminal session returns
    /// the stored result.
    #[instrument(skip(self))]
    pub fn stop_session(&self, session_id: &str, as_completed: bool) -> EngineResult<TrainingResult> {
        let result = {
            let mut state = self.inner.state.lock();
            let status = state
                .sessions
                .get(session_id)
                .map(|s| s.status)
                .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;
            match self.finalize_locked(&mut state, session_id, as_completed) {
                Some(result) => result,
                None => state
                    .results
                    .iter()
                    .rev()
                    .find(|r| r.session_id == session_id)
                    .cloned()
                    .ok_or(EngineError::InvalidState {
                        session_id: session_id.to_string(),
                        status,
                    })?,
            }
        };
        self.publish();
        Ok(result)
    }

    pub fn session(&self, id: &str) -> EngineResult<SimulationSession> {
        self.inner
            .state
            .lock()
            .sessions
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::SessionNotFound(id.to_string()))
    }

    /// All sessions, in snapshot order (started descending, id ascending).
    pub fn list_sessions(&self) -> Vec<SimulationSession> {
        self.snapshot().sessions
    }

    /// The session's timeline slice, in emission order.
    pub fn timeline_for(&self, session_id: &str) -> Vec<SimulationTimelineEvent> {
        self.inner
            .state
            .lock()
            .timeline
            .iter()
            .filter(|e| e.session_id == session_id)
            .cloned()
            .collect()
    }

    pub fn result_for(&self, session_id: &str) -> Option<TrainingResult> {
        self.inner
            .state
            .lock()
            .results
            .iter()
            .find(|r| r.session_id == session_id)
            .cloned()
    }

    fn spawn_timer(&self, session_id: String, trigger_id: String, delay: Duration) -> JoinHandle<()> {
        let engine = self.clone();
        tokio::spawn(async move {
            sleep(delay).await;
            engine.dispatch_scheduled(&session_id, &trigger_id).await;
        })
    }

    /// Timer callback for a scripted trigger. Runs the shared dispatch path
    /// and the auto-completion check.
    pub(crate) async fn dispatch_scheduled(&self, session_id: &str, trigger_id: &str) {
        let delivery = {
            let mut state = self.inner.state.lock();
            let Some(session) = state.sessions.get(session_id) else {
                return;
            };
            // Status guard: a timer that outlived a pause/stop (abort race)
            // must not mutate anything.
            if session.status != SessionStatus::Running {
                return;
            }
            let scenario_id = session.scenario_id.clone();
            let elapsed = match state.runtimes.get_mut(session_id) {
                Some(runtime) => {
                    runtime.timers.remove(trigger_id);
                    runtime.elapsed(SessionStatus::Running)
                }
                None => return,
            };
            let Some(trigger) = state
                .scenarios
                .get(&scenario_id)
                .and_then(|s| s.triggers.iter().find(|t| t.id == trigger_id).cloned())
            else {
                return;
            };

            let delivery =
                self.dispatch_locked(&mut state, session_id, trigger, elapsed.as_secs());

            // Auto-completion counts scenario-defined triggers only; manual
            // injections neither satisfy nor block it.
            let all_dispatched = match (
                state.sessions.get(session_id),
                state.scenarios.get(&scenario_id),
            ) {
                (Some(session), Some(scenario)) => scenario
                    .triggers
                    .iter()
                    .all(|t| session.dispatched_trigger_ids.contains(&t.id)),
                _ => false,
            };
            if all_dispatched {
                info!(session_id, "All scripted triggers dispatched; completing session");
                self.finalize_locked(&mut state, session_id, true);
            }
            delivery
        };

        if let Some((_, operation_event)) = delivery {
            self.deliver(operation_event).await;
        }
        self.publish();
    }

    /// Shared dispatch core. Appends the timeline event, marks the trigger
    /// dispatched, refreshes the session's elapsed snapshot, and prepares
    /// the operation-sink record when the session is operation-linked.
    fn dispatch_locked(
        &self,
        state: &mut EngineState,
        session_id: &str,
        trigger: SimulationTrigger,
        offset_seconds: u64,
    ) -> Option<(SimulationTimelineEvent, Option<OperationEvent>)> {
        let session = state.sessions.get_mut(session_id)?;
        let event = SimulationTimelineEvent {
            id: self.inner.ids.next("evt"),
            session_id: session.id.clone(),
            scenario_id: session.scenario_id.clone(),
            operation_id: session.operation_id.clone(),
            event_type: trigger.event_type.clone(),
            title: trigger.title.clone(),
            message: trigger.message.clone(),
            emitted_at: Utc::now(),
            time_offset_seconds: offset_seconds,
            severity: trigger.severity,
            is_simulation: true,
            payload: trigger.payload.clone(),
        };
        session.dispatched_trigger_ids.push(trigger.id.clone());
        session.elapsed_seconds = offset_seconds;

        let operation_event = session.operation_id.clone().map(|operation_id| OperationEvent {
            operation_id,
            scope: "simulation".to_string(),
            event_type: trigger.event_type.clone(),
            actor_id: session.starter_id.clone(),
            is_simulation: true,
            session_id: session.id.clone(),
            scenario_id: session.scenario_id.clone(),
            trigger_id: trigger.id,
            title: trigger.title,
            severity: trigger.severity,
            message: trigger.message,
            payload: trigger.payload,
        });

        debug!(
            session_id,
            event_id = %event.id,
            offset_seconds,
            "Trigger dispatched"
        );
        state.timeline.push(event.clone());
        self.inner.metrics.triggers_dispatched.inc();
        Some((event, operation_event))
    }

    /// Terminal transition shared by explicit stop and auto-completion.
    /// Cancels timers, releases the runtime, and stores the debrief.
    fn finalize_locked(
        &self,
        state: &mut EngineState,
        session_id: &str,
        as_completed: bool,
    ) -> Option<TrainingResult> {
        let session = state.sessions.get_mut(session_id)?;
        if session.status.is_terminal() {
            return None;
        }
        if let Some(runtime) = state.runtimes.remove(session_id) {
            let elapsed = runtime.elapsed(session.status);
            for (_, handle) in runtime.timers {
                handle.abort();
            }
            session.elapsed_seconds = elapsed.as_secs();
        }
        session.status = if as_completed {
            SessionStatus::Completed
        } else {
            SessionStatus::Stopped
        };
        session.stopped_at = Some(Utc::now());
        let session = session.clone();

        self.inner.metrics.sessions_completed.inc();
        self.inner
            .metrics
            .session_duration
            .observe(session.elapsed_seconds as f64);
        info!(
            session_id,
            status = ?session.status,
            elapsed = session.elapsed_seconds,
            "Session terminated"
        );

        let scenario = state.scenarios.get(&session.scenario_id)?.clone();
        let events: Vec<SimulationTimelineEvent> = state
            .timeline
            .iter()
            .filter(|e| e.session_id == session.id)
            .cloned()
            .collect();
        let result = generate_debrief(&scenario, &session, &events, self.inner.ids.next("res"));
        state.results.push(result.clone());
        Some(result)
    }

    /// Best-effort hand-off to the operation event sink. Failures are
    /// logged and swallowed; the internal record stays authoritative.
    async fn deliver(&self, event: Option<OperationEvent>) {
        let Some(event) = event else { return };
        let Some(sink) = self.inner.sink.clone() else {
            return;
        };
        if let Err(error) = sink.record(event).await {
            warn!(%error, "Operation event sink rejected the record");
        }
    }
}

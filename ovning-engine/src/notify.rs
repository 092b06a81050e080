//! Snapshot fan-out after every mutation.
//!
//! Subscribers get a full, deterministically sorted image of the four
//! stores. Fan-out rides a tokio broadcast channel: dropping the receiver
//! unsubscribes, and a lagging receiver skips intermediate snapshots but
//! always observes the newest one.

use tokio::sync::broadcast;

use ovning_core::model::{
    SimulationSession, SimulationTimelineEvent, TrainingResult, TrainingScenario,
};

use crate::{EngineState, SimulationEngine};

/// A consistent, sorted image of all engine state.
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    /// Sorted by updated timestamp descending, id ascending on ties.
    pub scenarios: Vec<TrainingScenario>,
    /// Sorted by start timestamp descending, id ascending on ties.
    pub sessions: Vec<SimulationSession>,
    /// Sorted by emission timestamp ascending, id ascending on ties.
    pub timeline: Vec<SimulationTimelineEvent>,
    /// Sorted by generation timestamp descending, id ascending on ties.
    pub results: Vec<TrainingResult>,
}

impl SimulationEngine {
    /// Registers a subscriber. The receiver gets a snapshot after every
    /// mutating operation; dropping it unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineSnapshot> {
        self.inner.snapshots.subscribe()
    }

    /// Builds a snapshot of the current state on demand.
    pub fn snapshot(&self) -> EngineSnapshot {
        build_snapshot(&self.inner.state.lock())
    }

    /// Rebuilds and broadcasts the snapshot. Called after every mutation,
    /// with the state lock already released.
    pub(crate) fn publish(&self) {
        let snapshot = self.snapshot();
        // No receivers is not an error.
        let _ = self.inner.snapshots.send(snapshot);
    }
}

pub(crate) fn build_snapshot(state: &EngineState) -> EngineSnapshot {
    let mut scenarios: Vec<TrainingScenario> = state.scenarios.values().cloned().collect();
    scenarios.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));

    let mut sessions: Vec<SimulationSession> = state.sessions.values().cloned().collect();
    sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(a.id.cmp(&b.id)));

    let mut timeline = state.timeline.clone();
    timeline.sort_by(|a, b| a.emitted_at.cmp(&b.emitted_at).then(a.id.cmp(&b.id)));

    let mut results = state.results.clone();
    results.sort_by(|a, b| b.generated_at.cmp(&a.generated_at).then(a.id.cmp(&b.id)));

    EngineSnapshot {
        scenarios,
        sessions,
        timeline,
        results,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::sleep;

    use ovning_config::EngineConfig;
    use ovning_core::model::{ScenarioInput, TriggerInput};

    use crate::SimulationEngine;

    fn input(title: &str) -> ScenarioInput {
        ScenarioInput {
            title: Some(title.into()),
            description: Some("desc".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn every_mutation_broadcasts_a_snapshot() {
        let engine = SimulationEngine::new(EngineConfig::default());
        let mut rx = engine.subscribe();

        let scenario = engine.create_scenario(input("First drill")).unwrap();
        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot.scenarios.len(), 1);
        assert_eq!(snapshot.scenarios[0].id, scenario.id);

        engine.start_session(&scenario.id, None, "leader").unwrap();
        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot.sessions.len(), 1);
    }

    #[tokio::test]
    async fn scenarios_sort_by_update_recency() {
        let engine = SimulationEngine::new(EngineConfig::default());
        let first = engine.create_scenario(input("First")).unwrap();
        let second = engine.create_scenario(input("Second")).unwrap();

        // Touching the first scenario moves it back to the front.
        engine
            .upsert_scenario(Some(&first.id), ScenarioInput::default())
            .unwrap();
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.scenarios[0].id, first.id);
        assert_eq!(snapshot.scenarios[1].id, second.id);
    }

    #[tokio::test(start_paused = true)]
    async fn timeline_sorts_ascending_by_emission() {
        let engine = SimulationEngine::new(EngineConfig::default());
        let scenario = engine
            .create_scenario(ScenarioInput {
                triggers: Some(
                    [3u64, 1, 2]
                        .iter()
                        .map(|&offset| TriggerInput {
                            offset_seconds: offset as i64,
                            event_type: "radio".into(),
                            title: format!("t{offset}"),
                            message: "m".into(),
                            ..Default::default()
                        })
                        .collect(),
                ),
                ..input("Ordered")
            })
            .unwrap();
        engine.start_session(&scenario.id, None, "leader").unwrap();
        sleep(Duration::from_secs(4)).await;

        let snapshot = engine.snapshot();
        let offsets: Vec<u64> = snapshot
            .timeline
            .iter()
            .map(|e| e.time_offset_seconds)
            .collect();
        assert_eq!(offsets, vec![1, 2, 3]);
    }
}

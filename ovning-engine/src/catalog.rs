//! Scenario authoring: create, upsert, and read access.
//!
//! Upsert merge semantics: tag/prerequisite/tested-id lists are unioned
//! preserving first-seen order; objectives and triggers are replaced
//! wholesale and re-normalized.

use chrono::Utc;
use tracing::{debug, instrument};

use ovning_core::model::{ScenarioInput, TrainingScenario};
use ovning_core::normalize::{normalize_objectives, normalize_triggers, union_preserving_order};
use ovning_core::{EngineError, EngineResult};

use crate::SimulationEngine;

impl SimulationEngine {
    /// Creates a scenario. Title and description are mandatory and
    /// non-empty; objectives and triggers are normalized on the way in.
    #[instrument(skip_all)]
    pub fn create_scenario(&self, input: ScenarioInput) -> EngineResult<TrainingScenario> {
        let title = input.title.as_deref().map(str::trim).unwrap_or_default();
        let description = input.description.as_deref().map(str::trim).unwrap_or_default();
        if title.is_empty() || description.is_empty() {
            return Err(EngineError::Validation(
                "scenario title and description are required".into(),
            ));
        }

        let now = Utc::now();
        let scenario = TrainingScenario {
            id: self.inner.ids.next("scn"),
            title: title.to_string(),
            description: description.to_string(),
            narrative_context: input.narrative_context,
            difficulty: input.difficulty.unwrap_or_default(),
            tags: input.tags,
            prerequisite_ids: input.prerequisite_ids,
            tested_procedure_ids: input.tested_procedure_ids,
            objectives: normalize_objectives(input.objectives.unwrap_or_default()),
            triggers: normalize_triggers(input.triggers.unwrap_or_default()),
            author_id: input.author_id.unwrap_or_else(|| "unknown".into()),
            created_at: now,
            updated_at: now,
        };
        debug!(scenario_id = %scenario.id, triggers = scenario.triggers.len(), "Scenario created");

        self.inner
            .state
            .lock()
            .scenarios
            .insert(scenario.id.clone(), scenario.clone());
        self.publish();
        Ok(scenario)
    }

    /// Creates or updates. An absent or unknown id behaves as `create`;
    /// otherwise supplied fields merge over the existing record and the
    /// updated timestamp is stamped.
    #[instrument(skip_all, fields(id = id.unwrap_or("<new>")))]
    pub fn upsert_scenario(
        &self,
        id: Option<&str>,
        input: ScenarioInput,
    ) -> EngineResult<TrainingScenario> {
        // The whole read-merge-insert runs under one lock acquisition so
        // two upserts of the same id cannot lose each other's merge.
        let mut state = self.inner.state.lock();
        let existing = id.and_then(|id| state.scenarios.get(id).cloned());
        let Some(mut scenario) = existing else {
            drop(state);
            return self.create_scenario(input);
        };

        if let Some(title) = input.title.filter(|t| !t.trim().is_empty()) {
            scenario.title = title.trim().to_string();
        }
        if let Some(description) = input.description.filter(|d| !d.trim().is_empty()) {
            scenario.description = description.trim().to_string();
        }
        if input.narrative_context.is_some() {
            scenario.narrative_context = input.narrative_context;
        }
        if let Some(difficulty) = input.difficulty {
            scenario.difficulty = difficulty;
        }
        if let Some(author_id) = input.author_id {
            scenario.author_id = author_id;
        }
        scenario.tags = union_preserving_order(scenario.tags, input.tags);
        scenario.prerequisite_ids =
            union_preserving_order(scenario.prerequisite_ids, input.prerequisite_ids);
        scenario.tested_procedure_ids = union_preserving_order(
            scenario.tested_procedure_ids,
            input.tested_procedure_ids,
        );
        if let Some(objectives) = input.objectives {
            scenario.objectives = normalize_objectives(objectives);
        }
        if let Some(triggers) = input.triggers {
            scenario.triggers = normalize_triggers(triggers);
        }
        scenario.updated_at = Utc::now();

        state.scenarios.insert(scenario.id.clone(), scenario.clone());
        drop(state);
        self.publish();
        Ok(scenario)
    }

    /// All scenarios, in snapshot order (updated descending, id ascending).
    pub fn list_scenarios(&self) -> Vec<TrainingScenario> {
        self.snapshot().scenarios
    }

    pub fn scenario(&self, id: &str) -> EngineResult<TrainingScenario> {
        self.inner
            .state
            .lock()
            .scenarios
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::ScenarioNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use ovning_config::EngineConfig;
    use ovning_core::model::{ObjectiveInput, ScenarioInput, Severity, TriggerInput};
    use ovning_core::EngineError;

    use crate::SimulationEngine;

    fn engine() -> SimulationEngine {
        SimulationEngine::new(EngineConfig::default())
    }

    fn basic_input() -> ScenarioInput {
        ScenarioInput {
            title: Some("Night search".into()),
            description: Some("Locate a missing hiker after dark".into()),
            tags: vec!["night".into()],
            objectives: Some(vec![ObjectiveInput {
                title: "Establish comms".into(),
                ..Default::default()
            }]),
            triggers: Some(vec![
                TriggerInput {
                    offset_seconds: 30,
                    event_type: "radio".into(),
                    title: "Garbled report".into(),
                    message: "Partial position fix received".into(),
                    ..Default::default()
                },
                TriggerInput {
                    offset_seconds: 10,
                    event_type: "weather".into(),
                    title: "Fog bank".into(),
                    message: "Visibility dropping".into(),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        }
    }

    #[test]
    fn create_requires_title_and_description() {
        let err = engine()
            .create_scenario(ScenarioInput {
                title: Some("  ".into()),
                description: Some("x".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn create_normalizes_objectives_and_triggers() {
        let scenario = engine().create_scenario(basic_input()).unwrap();
        assert_eq!(scenario.objectives[0].id, "obj_1");
        assert!(scenario.objectives[0].required);
        // Sorted ascending by offset after normalization.
        assert_eq!(scenario.triggers[0].offset_seconds, 10);
        assert_eq!(scenario.triggers[1].offset_seconds, 30);
        assert_eq!(scenario.triggers[0].severity, Severity::Medium);
    }

    #[test]
    fn upsert_unknown_id_behaves_as_create() {
        let scenario = engine()
            .upsert_scenario(Some("scn_missing"), basic_input())
            .unwrap();
        assert_ne!(scenario.id, "scn_missing");
    }

    #[test]
    fn upsert_unions_lists_and_replaces_triggers() {
        let eng = engine();
        let created = eng.create_scenario(basic_input()).unwrap();
        let updated = eng
            .upsert_scenario(
                Some(&created.id),
                ScenarioInput {
                    tags: vec!["night".into(), "winter".into()],
                    triggers: Some(vec![TriggerInput {
                        offset_seconds: 5,
                        event_type: "medical".into(),
                        title: "Casualty found".into(),
                        message: "Hypothermia suspected".into(),
                        ..Default::default()
                    }]),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.tags, vec!["night".to_string(), "winter".to_string()]);
        assert_eq!(updated.triggers.len(), 1);
        assert_eq!(updated.triggers[0].event_type, "medical");
        assert!(updated.updated_at >= created.updated_at);
        // Untouched fields survive the merge.
        assert_eq!(updated.title, created.title);
    }

    #[test]
    fn racing_upserts_of_one_scenario_lose_no_tags() {
        let eng = engine();
        let created = eng.create_scenario(basic_input()).unwrap();

        let mut handles = Vec::new();
        for prefix in ["alpha", "bravo"] {
            let eng = eng.clone();
            let id = created.id.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..50 {
                    eng.upsert_scenario(
                        Some(&id),
                        ScenarioInput {
                            tags: vec![format!("{prefix}_{i}")],
                            ..Default::default()
                        },
                    )
                    .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // Every union-merged tag must survive both writers.
        let stored = eng.scenario(&created.id).unwrap();
        for prefix in ["alpha", "bravo"] {
            for i in 0..50 {
                let tag = format!("{prefix}_{i}");
                assert!(stored.tags.contains(&tag), "tag {tag} was lost");
            }
        }
    }

    #[test]
    fn get_by_unknown_id_is_not_found() {
        assert!(matches!(
            engine().scenario("scn_404"),
            Err(EngineError::ScenarioNotFound(_))
        ));
    }
}

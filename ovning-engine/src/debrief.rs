//! Deterministic scored debrief of a terminated session.
//!
//! Pure function of (scenario, session, that session's timeline events).
//! Scoring: required objectives drive a 0-70 base score; rescue-weighted
//! objectives drive a 0-100 rescue score (falling back to the base score
//! when the scenario has none); the final score blends them 70/30.

use chrono::Utc;

use ovning_core::model::{
    ObjectiveSummary, Outcome, Severity, SimulationSession, SimulationTimelineEvent,
    TimelineSummary, TrainingResult, TrainingScenario,
};

/// Outcome band for a blended score.
pub fn outcome_for(score: u8) -> Outcome {
    if score >= 80 {
        Outcome::Pass
    } else if score >= 55 {
        Outcome::Partial
    } else {
        Outcome::Fail
    }
}

/// Generates the one-time debrief for a terminated session. `events` must be
/// the session's own timeline slice, in emission order.
pub fn generate_debrief(
    scenario: &TrainingScenario,
    session: &SimulationSession,
    events: &[SimulationTimelineEvent],
    result_id: String,
) -> TrainingResult {
    let is_completed = |objective_id: &str| {
        session
            .objective_state
            .get(objective_id)
            .map(|p| p.completed)
            .unwrap_or(false)
    };

    let required: Vec<_> = scenario.objectives.iter().filter(|o| o.required).collect();
    let completed_required = required.iter().filter(|o| is_completed(&o.id)).count();
    // Minimum 1 keeps the ratio defined for objective-free scenarios.
    let total_required = required.len().max(1);
    let base_score = (completed_required as f64 / total_required as f64 * 70.0).round();

    let rescue: Vec<_> = scenario
        .objectives
        .iter()
        .filter(|o| o.rescue_weighted)
        .collect();
    let rescue_score = if rescue.is_empty() {
        base_score
    } else {
        let completed_rescue = rescue.iter().filter(|o| is_completed(&o.id)).count();
        (completed_rescue as f64 / rescue.len() as f64 * 100.0).round()
    };

    let score = (base_score * 0.7 + rescue_score * 0.3).round() as u8;
    let rescue_score = rescue_score as u8;
    let outcome = outcome_for(score);

    let mut recommendations = Vec::new();
    if required.iter().any(|o| !is_completed(&o.id)) {
        recommendations
            .push("Revisit the required objectives left incomplete during the drill.".to_string());
    }
    if rescue_score < 70 {
        recommendations.push(
            "Prioritize casualty handling; the rescue outcome fell below standard.".to_string(),
        );
    }
    if events.iter().any(|e| e.severity == Severity::Critical) {
        recommendations
            .push("Review the response to critical events on the timeline.".to_string());
    }
    if recommendations.is_empty() {
        recommendations
            .push("Maintain current standard; no corrective actions identified.".to_string());
    }

    let rescue_sentence = if rescue_score >= 70 {
        "Casualty handling met the rescue standard."
    } else {
        "Casualty handling fell short of the rescue standard."
    };
    let outcome_word = match outcome {
        Outcome::Pass => "PASS",
        Outcome::Partial => "PARTIAL",
        Outcome::Fail => "FAIL",
    };
    let narrative = format!(
        "Drill '{}' scored {}/100. {} {} of {} required objectives were completed. \
         Overall outcome: {}.",
        scenario.title,
        score,
        rescue_sentence,
        completed_required,
        required.len(),
        outcome_word
    );

    TrainingResult {
        id: result_id,
        session_id: session.id.clone(),
        scenario_id: scenario.id.clone(),
        operation_id: session.operation_id.clone(),
        participant_ids: vec![session.starter_id.clone()],
        generated_at: Utc::now(),
        outcome,
        score,
        rescue_score,
        objective_summaries: scenario
            .objectives
            .iter()
            .map(|o| {
                let progress = session.objective_state.get(&o.id);
                ObjectiveSummary {
                    objective_id: o.id.clone(),
                    title: o.title.clone(),
                    completed: progress.map(|p| p.completed).unwrap_or(false),
                    required: o.required,
                    rescue_weighted: o.rescue_weighted,
                    completed_at: progress.and_then(|p| p.completed_at),
                }
            })
            .collect(),
        timeline_summaries: events
            .iter()
            .map(|e| TimelineSummary {
                event_type: e.event_type.clone(),
                time_offset_seconds: e.time_offset_seconds,
                severity: e.severity,
                title: e.title.clone(),
            })
            .collect(),
        recommendations,
        narrative,
        source: "simulation".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use ovning_core::model::{
        Difficulty, ObjectiveProgress, Outcome, SessionStatus, SimulationSession,
        TrainingObjective, TrainingScenario,
    };

    use super::*;

    fn objective(id: &str, required: bool, rescue_weighted: bool) -> TrainingObjective {
        TrainingObjective {
            id: id.into(),
            title: format!("Objective {id}"),
            description: None,
            required,
            rescue_weighted,
            target_seconds: None,
        }
    }

    fn scenario(objectives: Vec<TrainingObjective>) -> TrainingScenario {
        let now = Utc::now();
        TrainingScenario {
            id: "scn_1".into(),
            title: "Ridge rescue".into(),
            description: "Two climbers overdue".into(),
            narrative_context: None,
            difficulty: Difficulty::Standard,
            tags: vec![],
            prerequisite_ids: vec![],
            tested_procedure_ids: vec![],
            objectives,
            triggers: vec![],
            author_id: "author".into(),
            created_at: now,
            updated_at: now,
        }
    }

    fn session_with(completed: &[&str], all: &[&str]) -> SimulationSession {
        let mut objective_state = BTreeMap::new();
        for id in all {
            objective_state.insert(
                id.to_string(),
                ObjectiveProgress {
                    completed: completed.contains(id),
                    completed_at: completed.contains(id).then(Utc::now),
                    note: None,
                },
            );
        }
        SimulationSession {
            id: "ses_1".into(),
            scenario_id: "scn_1".into(),
            operation_id: None,
            starter_id: "leader".into(),
            started_at: Utc::now(),
            status: SessionStatus::Stopped,
            elapsed_seconds: 600,
            objective_state,
            dispatched_trigger_ids: vec![],
            paused_at: None,
            resumed_at: None,
            stopped_at: Some(Utc::now()),
        }
    }

    #[test]
    fn outcome_band_boundaries() {
        assert_eq!(outcome_for(80), Outcome::Pass);
        assert_eq!(outcome_for(79), Outcome::Partial);
        assert_eq!(outcome_for(55), Outcome::Partial);
        assert_eq!(outcome_for(54), Outcome::Fail);
    }

    #[test]
    fn two_required_one_rescue_all_completed_scores_79_partial() {
        let scenario = scenario(vec![
            objective("obj_1", true, false),
            objective("obj_2", true, true),
        ]);
        let session = session_with(&["obj_1", "obj_2"], &["obj_1", "obj_2"]);
        let result = generate_debrief(&scenario, &session, &[], "res_1".into());
        // base 70, rescue 100 -> round(70*0.7 + 100*0.3) = 79
        assert_eq!(result.score, 79);
        assert_eq!(result.rescue_score, 100);
        assert_eq!(result.outcome, Outcome::Partial);
    }

    #[test]
    fn no_rescue_objectives_fall_back_to_base_score() {
        let scenario = scenario(vec![objective("obj_1", true, false)]);
        let session = session_with(&["obj_1"], &["obj_1"]);
        let result = generate_debrief(&scenario, &session, &[], "res_1".into());
        assert_eq!(result.rescue_score, 70);
        assert_eq!(result.score, 70);
    }

    #[test]
    fn nothing_completed_fails_with_recommendations() {
        let scenario = scenario(vec![
            objective("obj_1", true, false),
            objective("obj_2", false, true),
        ]);
        let session = session_with(&[], &["obj_1", "obj_2"]);
        let result = generate_debrief(&scenario, &session, &[], "res_1".into());
        assert_eq!(result.score, 0);
        assert_eq!(result.outcome, Outcome::Fail);
        assert_eq!(result.recommendations.len(), 2);
    }

    #[test]
    fn clean_run_gets_the_maintain_standard_line() {
        let scenario = scenario(vec![objective("obj_1", true, true)]);
        let session = session_with(&["obj_1"], &["obj_1"]);
        let result = generate_debrief(&scenario, &session, &[], "res_1".into());
        assert_eq!(result.recommendations.len(), 1);
        assert!(result.recommendations[0].contains("Maintain current standard"));
    }

    #[test]
    fn narrative_carries_title_score_and_band() {
        let scenario = scenario(vec![objective("obj_1", true, false)]);
        let session = session_with(&["obj_1"], &["obj_1"]);
        let result = generate_debrief(&scenario, &session, &[], "res_1".into());
        assert!(result.narrative.contains("Ridge rescue"));
        assert!(result.narrative.contains("70/100"));
        assert!(result.narrative.contains("PARTIAL"));
        assert!(result.narrative.contains("1 of 1 required objectives"));
    }
}

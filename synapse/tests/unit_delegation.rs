//! Unit tests for the delegation pipeline.
//!
//! Tests cover:
//! - Complexity scoring determinism and range
//! - Requirement thresholds
//! - Capability filtering against the threshold
//! - Ranking determinism and tie stability

mod common;

use proptest::prelude::*;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use common::agent_with;
use synapse::delegation::{
    CandidateRanker, CapabilityMatcher, ComplexityScorer, PerformancePrediction,
    RequirementExtractor,
};
use synapse::delegation::AgentCandidate;
use synapse::history::PerformanceHistory;
use synapse_core::{
    Agent, AgentKind, AgentSnapshot, ComplexityCategory, Task, TaskPriority,
};

// ============================================================================
// Complexity Scoring
// ============================================================================

#[test]
fn test_assembly_scenario_precision_factor() {
    // A tight assembly tolerance maxes the precision factor, and with the
    // other factors non-trivial the task lands at least in the complex band.
    let task = Task::builder("assembly")
        .priority(TaskPriority::Normal)
        .parameter("precision_tolerance", json!(0.05))
        .parameter("requires_coordination", json!(true))
        .parameter("coordinating_agents", json!(3))
        .parameter("hazards", json!(["moving_parts", "pinch_points"]))
        .parameter("resources", json!(["fixture", "driver"]))
        .deadline_secs(240)
        .build();

    let score = ComplexityScorer::new().score(&task);
    assert_eq!(score.factors.precision, 1.0);
    assert!(score.category >= ComplexityCategory::Complex);
}

#[test]
fn test_scoring_twice_is_identical() {
    let task = Task::builder("maintenance")
        .parameter("precision_tolerance", json!(2.5))
        .parameter("hazards", json!(["heat"]))
        .deadline_secs(3600)
        .build();

    let scorer = ComplexityScorer::new();
    assert_eq!(scorer.score(&task), scorer.score(&task));
}

proptest! {
    #[test]
    fn prop_overall_always_in_unit_interval(
        tolerance in proptest::option::of(0.0f64..100.0),
        deadline in proptest::option::of(0u64..100_000),
        hazard_count in 0usize..6,
        resource_count in 0usize..6,
        coordination in any::<bool>(),
        safety in any::<bool>(),
    ) {
        let mut builder = Task::builder("assembly").safety_critical(safety);
        if let Some(t) = tolerance {
            builder = builder.parameter("precision_tolerance", json!(t));
        }
        if let Some(d) = deadline {
            builder = builder.deadline_secs(d);
        }
        let hazards: Vec<String> = (0..hazard_count).map(|i| format!("h{i}")).collect();
        let resources: Vec<String> = (0..resource_count).map(|i| format!("r{i}")).collect();
        let task = builder
            .parameter("hazards", json!(hazards))
            .parameter("resources", json!(resources))
            .parameter("requires_coordination", json!(coordination))
            .build();

        let score = ComplexityScorer::new().score(&task);
        prop_assert!(score.overall >= 0.0);
        prop_assert!(score.overall <= 1.0);
    }
}

// ============================================================================
// Requirements
// ============================================================================

#[test]
fn test_threshold_is_monotone_in_priority() {
    let extractor = RequirementExtractor::new();
    let scorer = ComplexityScorer::new();

    let threshold_for = |priority: TaskPriority| {
        let task = Task::new("inspection", priority);
        let complexity = scorer.score(&task);
        extractor.extract(&task, &complexity).minimum_capability_threshold
    };

    assert!(threshold_for(TaskPriority::Normal) <= threshold_for(TaskPriority::High));
    assert!(threshold_for(TaskPriority::High) <= threshold_for(TaskPriority::Critical));
    assert!(threshold_for(TaskPriority::Critical) <= threshold_for(TaskPriority::SafetyCritical));
    assert_eq!(threshold_for(TaskPriority::SafetyCritical), 0.9);
}

// ============================================================================
// Capability Filtering
// ============================================================================

proptest! {
    #[test]
    fn prop_filter_never_returns_below_threshold(
        proficiencies in proptest::collection::vec(0.0f64..1.0, 1..12),
        threshold in 0.0f64..1.0,
    ) {
        let history = Arc::new(PerformanceHistory::new(100));
        let matcher = CapabilityMatcher::new(history);

        let pool: Vec<AgentSnapshot> = proficiencies
            .iter()
            .enumerate()
            .map(|(i, p)| AgentSnapshot {
                agent: agent_with(&format!("a{i}"), &[("welding", *p)], *p),
                load: 0.0,
            })
            .collect();

        let requirements = synapse_core::TaskRequirements {
            required_skills: ["welding".to_string()].into_iter().collect(),
            minimum_capability_threshold: threshold,
            safety_requirements: Default::default(),
        };

        for (_, score) in matcher.filter("assembly", &requirements, pool) {
            prop_assert!(score >= threshold);
        }
    }
}

// ============================================================================
// Ranking
// ============================================================================

fn uniform_candidate(name: &str, score: f64) -> AgentCandidate {
    let mut agent = Agent::new(name, AgentKind::Robot, HashMap::new());
    agent.reliability = score;
    AgentCandidate {
        snapshot: AgentSnapshot {
            agent,
            load: 1.0 - score,
        },
        match_score: score,
        prediction: PerformancePrediction {
            capability_score: score,
            predicted_score: score,
            confidence: 0.8,
        },
        rank_score: 0.0,
    }
}

#[test]
fn test_tied_candidates_keep_input_order() {
    // Scores [0.9, 0.9, 0.5]: the tied pair stays in input order, the 0.5
    // candidate comes last.
    let ranker = CandidateRanker::default();
    let ranked = ranker.rank(
        vec![
            uniform_candidate("tied_first", 0.9),
            uniform_candidate("tied_second", 0.9),
            uniform_candidate("trailing", 0.5),
        ],
        TaskPriority::Normal,
    );

    let names: Vec<&str> = ranked.iter().map(|c| c.snapshot.agent.name.as_str()).collect();
    assert_eq!(names, vec!["tied_first", "tied_second", "trailing"]);
}

proptest! {
    #[test]
    fn prop_ranking_is_deterministic(
        scores in proptest::collection::vec(0.0f64..1.0, 1..10),
        critical in any::<bool>(),
    ) {
        let priority = if critical { TaskPriority::Critical } else { TaskPriority::Normal };
        let build = || -> Vec<AgentCandidate> {
            scores
                .iter()
                .enumerate()
                .map(|(i, s)| uniform_candidate(&format!("a{i}"), *s))
                .collect()
        };

        let ranker = CandidateRanker::default();
        let first: Vec<String> = ranker
            .rank(build(), priority)
            .into_iter()
            .map(|c| c.snapshot.agent.name)
            .collect();
        let second: Vec<String> = ranker
            .rank(build(), priority)
            .into_iter()
            .map(|c| c.snapshot.agent.name)
            .collect();
        prop_assert_eq!(first, second);
    }
}

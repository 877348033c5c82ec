//! Unit tests for the real-time routing path.
//!
//! Tests cover:
//! - Cache-first behavior and the 60-second validity window
//! - Tier strategies, including load-blind safety-critical selection
//! - Degraded fallback on an empty pool

mod common;

use common::{Harness, agent_with};
use synapse_core::{RouteRequest, RouteStrategy, TaskPriority};

#[test]
fn test_same_request_within_window_is_cache_hit() {
    let harness = Harness::new();
    harness.registry.register(agent_with("r1", &[("navigation", 0.9)], 0.9));

    let mut request = RouteRequest::new("transport", TaskPriority::Normal);
    request.required_skills.insert("navigation".to_string());

    let first = harness.router.route(&request);
    let second = harness.router.route(&request);

    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    assert_eq!(second.strategy, first.strategy);
    assert_eq!(second.agent_id, first.agent_id);

    let stats = harness.router.cache_statistics();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.inserts, 1);
}

#[test]
fn test_safety_critical_picks_highest_safety_capability_despite_load() {
    let harness = Harness::new();

    let guardian = agent_with("guardian", &[("safety_protocols", 0.95), ("welding", 0.5)], 0.9);
    let guardian_id = guardian.id.clone();
    let idle = agent_with("idle", &[("safety_protocols", 0.4), ("welding", 0.9)], 0.9);

    harness.registry.register(guardian);
    harness.registry.register(idle);

    // The higher-safety agent carries more load; the tier must ignore it.
    harness.registry.begin_assignment(&guardian_id).unwrap();
    harness.registry.begin_assignment(&guardian_id).unwrap();

    let decision = harness
        .router
        .route(&RouteRequest::new("emergency", TaskPriority::SafetyCritical));

    assert_eq!(decision.agent_id, Some(guardian_id));
    assert_eq!(decision.strategy, RouteStrategy::SafetyCapability);
}

#[test]
fn test_empty_pool_degrades_to_fallback() {
    let harness = Harness::new();

    let decision = harness
        .router
        .route(&RouteRequest::new("transport", TaskPriority::Critical));

    assert_eq!(decision.strategy, RouteStrategy::Fallback);
    assert_eq!(decision.agent_id, None);
    assert!(decision.confidence <= 0.1);
    assert_eq!(harness.router.statistics().fallbacks, 1);
}

#[test]
fn test_fallback_decisions_are_not_cached() {
    let harness = Harness::new();

    harness.router.route(&RouteRequest::new("transport", TaskPriority::Normal));
    let second = harness.router.route(&RouteRequest::new("transport", TaskPriority::Normal));

    // Degraded answers are recomputed every time
    assert!(!second.cache_hit);
    assert_eq!(harness.router.cache_statistics().inserts, 0);
}

#[test]
fn test_priority_tiers_use_distinct_cache_entries() {
    let harness = Harness::new();
    harness.registry.register(agent_with("r1", &[("navigation", 0.9)], 0.9));

    let normal = RouteRequest::new("transport", TaskPriority::Normal);
    let high = RouteRequest::new("transport", TaskPriority::High);

    harness.router.route(&normal);
    let decision = harness.router.route(&high);

    assert!(!decision.cache_hit);
}

#[test]
fn test_every_tier_returns_a_decision() {
    let harness = Harness::new();
    harness.registry.register(agent_with(
        "r1",
        &[("safety_protocols", 0.8), ("navigation", 0.8)],
        0.9,
    ));

    for priority in [
        TaskPriority::Low,
        TaskPriority::Normal,
        TaskPriority::High,
        TaskPriority::Critical,
        TaskPriority::SafetyCritical,
    ] {
        let decision = harness.router.route(&RouteRequest::new("transport", priority));
        assert!(decision.agent_id.is_some(), "tier {priority:?} returned no agent");
    }
}

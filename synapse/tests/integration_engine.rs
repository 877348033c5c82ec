//! End-to-end delegation flow over the shared registry.
//!
//! Tests cover:
//! - Delegate -> events -> complete -> re-delegate
//! - The at-most-one-active-delegation invariant under concurrency
//! - History feedback into later match scores

mod common;

use std::sync::Arc;

use common::{Harness, assembly_agent};
use synapse::delegation::DelegationError;
use synapse::events::LifecycleEvent;
use synapse_core::{DelegationOutcome, Task, TaskPriority};

#[tokio::test]
async fn test_full_delegation_lifecycle() {
    let harness = Harness::new();
    let agent_id = harness.registry.register(assembly_agent("r1"));
    let mut events = harness.events.subscribe();

    let task = Task::new("assembly", TaskPriority::Normal);
    let delegation = harness.coordinator.delegate(&task).unwrap();
    assert_eq!(delegation.agent_id, agent_id);
    assert!(delegation.confidence > 0.0 && delegation.confidence <= 1.0);
    assert!(harness.registry.load(&agent_id).unwrap() > 0.0);

    // The DELEGATED event is observable on the bus
    let event = events.recv().await.unwrap();
    assert!(matches!(event, LifecycleEvent::Delegated { .. }));

    harness.coordinator.mark_started(&delegation.id).unwrap();
    assert!(matches!(events.recv().await.unwrap(), LifecycleEvent::TaskStarted { .. }));

    harness
        .coordinator
        .complete(
            &delegation.id,
            DelegationOutcome::Completed {
                duration_secs: 25.0,
                quality: 0.95,
            },
        )
        .unwrap();
    assert!(matches!(events.recv().await.unwrap(), LifecycleEvent::TaskCompleted { .. }));

    // Slot released, history recorded, task can be delegated again
    assert_eq!(harness.registry.load(&agent_id), Some(0.0));
    assert_eq!(harness.history.sample_count(&agent_id, "assembly"), 1);
    assert!(harness.coordinator.delegate(&task).is_ok());
}

#[test]
fn test_rapid_double_delegation_one_winner() {
    let harness = Harness::new();
    harness.registry.register(assembly_agent("r1"));
    harness.registry.register(assembly_agent("r2"));
    harness.registry.register(assembly_agent("r3"));

    let coordinator = harness.coordinator.clone();
    let task = Task::new("assembly", TaskPriority::Normal);

    let results: Vec<_> = {
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let coordinator = Arc::clone(&coordinator);
                let task = task.clone();
                std::thread::spawn(move || coordinator.delegate(&task))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    };

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(DelegationError::AlreadyDelegated { .. })))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(duplicates, 15);
    assert_eq!(harness.registry.statistics().total_active_tasks, 1);
}

#[test]
fn test_empty_pool_leaves_no_trace() {
    let harness = Harness::new();

    let task = Task::new("assembly", TaskPriority::Normal);
    let result = harness.coordinator.delegate(&task);

    assert!(matches!(result, Err(DelegationError::NoSuitableAgent { .. })));
    assert_eq!(harness.coordinator.active_count(), 0);
    assert_eq!(harness.registry.statistics().total_active_tasks, 0);
}

#[test]
fn test_failures_lower_future_match_scores() {
    use synapse::history::OutcomeSample;

    let harness = Harness::new();
    let unlucky = harness.registry.register(assembly_agent("unlucky"));
    let steady = harness.registry.register(assembly_agent("steady"));

    // Diverge the two records for this task type
    for _ in 0..10 {
        harness
            .history
            .record_outcome(&unlucky, "assembly", OutcomeSample::failure(5.0));
        harness
            .history
            .record_outcome(&steady, "assembly", OutcomeSample::success(20.0, 0.9));
    }

    // With histories diverged, the steady agent wins the next delegation
    let task = Task::new("assembly", TaskPriority::Normal);
    let delegation = harness.coordinator.delegate(&task).unwrap();
    assert_eq!(delegation.agent_id, steady);
}

#[test]
fn test_backups_come_from_the_ranking() {
    let harness = Harness::new();
    harness.registry.register(assembly_agent("r1"));
    harness.registry.register(assembly_agent("r2"));
    harness.registry.register(assembly_agent("r3"));
    harness.registry.register(assembly_agent("r4"));

    let task = Task::new("assembly", TaskPriority::High);
    let delegation = harness.coordinator.delegate(&task).unwrap();

    assert_eq!(delegation.backup_agents.len(), 2);
    assert!(!delegation.backup_agents.contains(&delegation.agent_id));
}

//! Delegation coordination.
//!
//! Runs the full pipeline for one task and owns the active-delegation set.
//! The at-most-one-active-delegation invariant is enforced with an
//! entry-based check-and-insert: concurrent `delegate` calls for the same
//! task id serialize on the entry, exactly one succeeds, the rest get
//! `AlreadyDelegated`.

use chrono::{Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    AgentCandidate, CandidateRanker, CapabilityMatcher, ComplexityScorer, DelegationError,
    HeuristicEstimator, PerformanceEstimator, PerformancePrediction, RequirementExtractor, Result,
};
use crate::delegation::estimator::EstimationContext;
use crate::events::{EventBus, LifecycleEvent};
use crate::history::{OutcomeSample, PerformanceHistory};
use crate::registry::AgentRegistry;
use synapse_core::config::DelegationConfig;
use synapse_core::{
    AgentId, ComplexityCategory, Delegation, DelegationId, DelegationOutcome, Task, TaskId,
};

/// An active delegation plus the task context completion needs.
#[derive(Debug, Clone)]
struct ActiveDelegation {
    delegation: Delegation,
    task_type: String,
}

/// Orchestrates task delegation over a shared agent registry.
pub struct DelegationCoordinator {
    registry: Arc<AgentRegistry>,
    history: Arc<PerformanceHistory>,
    events: Arc<EventBus>,
    estimator: Arc<dyn PerformanceEstimator>,
    scorer: ComplexityScorer,
    extractor: RequirementExtractor,
    matcher: CapabilityMatcher,
    ranker: CandidateRanker,
    config: DelegationConfig,

    /// Active delegations keyed by task id; the no-double-assignment guard
    active: DashMap<TaskId, ActiveDelegation>,

    /// Reverse index from delegation id to task id
    index: DashMap<DelegationId, TaskId>,
}

impl DelegationCoordinator {
    /// Create a coordinator with the default heuristic estimator.
    pub fn new(
        registry: Arc<AgentRegistry>,
        history: Arc<PerformanceHistory>,
        events: Arc<EventBus>,
        config: DelegationConfig,
    ) -> Self {
        Self::with_estimator(registry, history, events, config, Arc::new(HeuristicEstimator::new()))
    }

    /// Create a coordinator with a custom performance estimator.
    pub fn with_estimator(
        registry: Arc<AgentRegistry>,
        history: Arc<PerformanceHistory>,
        events: Arc<EventBus>,
        config: DelegationConfig,
        estimator: Arc<dyn PerformanceEstimator>,
    ) -> Self {
        let matcher = CapabilityMatcher::new(history.clone());
        let ranker = CandidateRanker::new(config.max_candidates);
        Self {
            registry,
            history,
            events,
            estimator,
            scorer: ComplexityScorer::new(),
            extractor: RequirementExtractor::new(),
            matcher,
            ranker,
            config,
            active: DashMap::new(),
            index: DashMap::new(),
        }
    }

    // ========================================================================
    // Delegation
    // ========================================================================

    /// Delegate a task to the best-fit agent.
    ///
    /// Returns `NoSuitableAgent` when filtering leaves no candidates and
    /// `AlreadyDelegated` when the task already has an active delegation.
    /// Neither mutates any agent load.
    pub fn delegate(&self, task: &Task) -> Result<Delegation> {
        if self.active.contains_key(&task.id) {
            return Err(DelegationError::AlreadyDelegated {
                task_id: task.id.clone(),
            });
        }

        let complexity = self.scorer.score(task);
        let requirements = self.extractor.extract(task, &complexity);
        debug!(
            task = %task.id,
            task_type = %task.task_type,
            complexity = complexity.overall,
            category = ?complexity.category,
            threshold = requirements.minimum_capability_threshold,
            "Analyzed task"
        );

        let pool = self.registry.snapshot_available();
        let matched = self.matcher.filter(&task.task_type, &requirements, pool);

        let candidates: Vec<AgentCandidate> = matched
            .into_iter()
            .map(|(snapshot, match_score)| {
                let context = EstimationContext {
                    capability_score: match_score,
                    complexity: complexity.overall,
                    sample_count: self
                        .history
                        .sample_count(&snapshot.agent.id, &task.task_type),
                };
                let prediction = match self.estimator.predict(&snapshot, &requirements, &context) {
                    Ok(prediction) => prediction,
                    Err(e) => {
                        warn!(agent = %snapshot.agent.id, error = %e, "Estimator failed, using neutral prediction");
                        PerformancePrediction::neutral()
                    }
                };
                AgentCandidate {
                    snapshot,
                    match_score,
                    prediction,
                    rank_score: 0.0,
                }
            })
            .collect();

        let ranked = self.ranker.rank(candidates, task.priority);
        if ranked.is_empty() {
            return Err(DelegationError::NoSuitableAgent {
                task_id: task.id.clone(),
            });
        }

        match self.active.entry(task.id.clone()) {
            Entry::Occupied(_) => Err(DelegationError::AlreadyDelegated {
                task_id: task.id.clone(),
            }),
            Entry::Vacant(slot) => {
                // The top candidate may have saturated since the snapshot;
                // fall through the ranking until a reservation sticks.
                let mut primary_index = None;
                for (index, candidate) in ranked.iter().enumerate() {
                    match self.registry.begin_assignment(&candidate.snapshot.agent.id) {
                        Ok(()) => {
                            primary_index = Some(index);
                            break;
                        }
                        Err(e) => {
                            debug!(agent = %candidate.snapshot.agent.id, error = %e, "Candidate rejected at reservation");
                        }
                    }
                }

                let Some(primary_index) = primary_index else {
                    return Err(DelegationError::NoSuitableAgent {
                        task_id: task.id.clone(),
                    });
                };
                let primary = &ranked[primary_index];

                let backup_agents: Vec<AgentId> = ranked
                    .iter()
                    .enumerate()
                    .filter(|(index, _)| *index != primary_index)
                    .map(|(_, candidate)| candidate.snapshot.agent.id.clone())
                    .take(self.config.max_backups)
                    .collect();

                let now = Utc::now();
                let delegation = Delegation {
                    id: DelegationId::new(),
                    task_id: task.id.clone(),
                    agent_id: primary.snapshot.agent.id.clone(),
                    backup_agents,
                    created_at: now,
                    estimated_completion: now
                        + ChronoDuration::seconds(estimated_duration_secs(complexity.category)),
                    confidence: primary.prediction.confidence,
                };

                self.index
                    .insert(delegation.id.clone(), task.id.clone());
                slot.insert(ActiveDelegation {
                    delegation: delegation.clone(),
                    task_type: task.task_type.clone(),
                });

                info!(
                    task = %task.id,
                    delegation = %delegation.id,
                    agent = %delegation.agent_id,
                    backups = delegation.backup_agents.len(),
                    confidence = delegation.confidence,
                    "Task delegated"
                );
                self.events.emit(LifecycleEvent::Delegated {
                    delegation_id: delegation.id.clone(),
                    task_id: task.id.clone(),
                    agent_id: delegation.agent_id.clone(),
                    confidence: delegation.confidence,
                });

                Ok(delegation)
            }
        }
    }

    // ========================================================================
    // Lifecycle reporting
    // ========================================================================

    /// Signal that the assigned agent started executing.
    pub fn mark_started(&self, delegation_id: &DelegationId) -> Result<()> {
        let task_id = self
            .index
            .get(delegation_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DelegationError::DelegationNotFound {
                delegation_id: delegation_id.clone(),
            })?;
        let active = self
            .active
            .get(&task_id)
            .ok_or_else(|| DelegationError::DelegationNotFound {
                delegation_id: delegation_id.clone(),
            })?;

        self.events.emit(LifecycleEvent::TaskStarted {
            delegation_id: delegation_id.clone(),
            agent_id: active.delegation.agent_id.clone(),
        });
        Ok(())
    }

    /// Terminate a delegation with the reported outcome.
    ///
    /// Releases the agent's slot, records the outcome in the bounded
    /// history (cancellations are not held against the agent), and emits
    /// the matching lifecycle event.
    pub fn complete(&self, delegation_id: &DelegationId, outcome: DelegationOutcome) -> Result<()> {
        let (_, task_id) = self.index.remove(delegation_id).ok_or_else(|| {
            DelegationError::DelegationNotFound {
                delegation_id: delegation_id.clone(),
            }
        })?;
        let (_, active) = self.active.remove(&task_id).ok_or_else(|| {
            DelegationError::DelegationNotFound {
                delegation_id: delegation_id.clone(),
            }
        })?;

        let delegation = active.delegation;
        if let Err(e) = self.registry.finish_assignment(&delegation.agent_id) {
            warn!(agent = %delegation.agent_id, error = %e, "Could not release agent slot");
        }

        match &outcome {
            DelegationOutcome::Completed { duration_secs, quality } => {
                self.history.record_outcome(
                    &delegation.agent_id,
                    &active.task_type,
                    OutcomeSample::success(*duration_secs, *quality),
                );
                self.events.emit(LifecycleEvent::TaskCompleted {
                    delegation_id: delegation.id.clone(),
                    agent_id: delegation.agent_id.clone(),
                    duration_secs: *duration_secs,
                });
            }
            DelegationOutcome::Failed { reason } => {
                let elapsed = (Utc::now() - delegation.created_at)
                    .num_milliseconds()
                    .max(0) as f64
                    / 1000.0;
                self.history.record_outcome(
                    &delegation.agent_id,
                    &active.task_type,
                    OutcomeSample::failure(elapsed),
                );
                self.events.emit(LifecycleEvent::TaskFailed {
                    delegation_id: delegation.id.clone(),
                    agent_id: delegation.agent_id.clone(),
                    reason: reason.clone(),
                });
            }
            DelegationOutcome::Cancelled => {
                self.events.emit(LifecycleEvent::TaskFailed {
                    delegation_id: delegation.id.clone(),
                    agent_id: delegation.agent_id.clone(),
                    reason: "cancelled".to_string(),
                });
            }
        }

        info!(delegation = %delegation.id, agent = %delegation.agent_id, ?outcome, "Delegation terminated");
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Whether a task currently has an active delegation
    pub fn is_active(&self, task_id: &TaskId) -> bool {
        self.active.contains_key(task_id)
    }

    /// Number of active delegations
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Snapshot of all active delegations
    pub fn active_delegations(&self) -> Vec<Delegation> {
        self.active
            .iter()
            .map(|entry| entry.delegation.clone())
            .collect()
    }
}

/// Rough execution estimate per complexity category, in seconds.
fn estimated_duration_secs(category: ComplexityCategory) -> i64 {
    match category {
        ComplexityCategory::Simple => 300,
        ComplexityCategory::Moderate => 900,
        ComplexityCategory::Complex => 1800,
        ComplexityCategory::Expert => 3600,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use synapse_core::config::RegistryConfig;
    use synapse_core::{Agent, AgentKind, TaskPriority};

    fn coordinator() -> (DelegationCoordinator, Arc<AgentRegistry>) {
        let registry = Arc::new(AgentRegistry::new(RegistryConfig::default()));
        let history = Arc::new(PerformanceHistory::new(100));
        let events = Arc::new(EventBus::new());
        let coordinator = DelegationCoordinator::new(
            registry.clone(),
            history,
            events,
            DelegationConfig::default(),
        );
        (coordinator, registry)
    }

    fn capable_agent(name: &str) -> Agent {
        let skills = [
            "precision_control",
            "mechanical_assembly",
            "quality_inspection",
            "visual_inspection",
            "defect_detection",
            "reporting",
            "general_operations",
        ];
        let caps: HashMap<String, f64> = skills.iter().map(|s| (s.to_string(), 0.95)).collect();
        let mut agent = Agent::new(name, AgentKind::Robot, caps);
        agent.reliability = 0.95;
        agent
    }

    #[test]
    fn test_delegate_assigns_and_increments_load() {
        let (coordinator, registry) = coordinator();
        let id = registry.register(capable_agent("r1"));

        let task = Task::new("assembly", TaskPriority::Normal);
        let delegation = coordinator.delegate(&task).unwrap();

        assert_eq!(delegation.agent_id, id);
        assert!(registry.load(&id).unwrap() > 0.0);
        assert!(coordinator.is_active(&task.id));
    }

    #[test]
    fn test_empty_pool_is_no_suitable_agent() {
        let (coordinator, registry) = coordinator();

        let task = Task::new("assembly", TaskPriority::Normal);
        let result = coordinator.delegate(&task);

        assert!(matches!(result, Err(DelegationError::NoSuitableAgent { .. })));
        assert_eq!(registry.statistics().total_active_tasks, 0);
    }

    #[test]
    fn test_double_delegation_rejected() {
        let (coordinator, registry) = coordinator();
        registry.register(capable_agent("r1"));

        let task = Task::new("assembly", TaskPriority::Normal);
        coordinator.delegate(&task).unwrap();

        let second = coordinator.delegate(&task);
        assert!(matches!(second, Err(DelegationError::AlreadyDelegated { .. })));
        // Exactly one slot reserved
        assert_eq!(registry.statistics().total_active_tasks, 1);
    }

    #[test]
    fn test_backups_are_distinct_and_bounded() {
        let (coordinator, registry) = coordinator();
        registry.register(capable_agent("r1"));
        registry.register(capable_agent("r2"));
        registry.register(capable_agent("r3"));
        registry.register(capable_agent("r4"));

        let task = Task::new("assembly", TaskPriority::Normal);
        let delegation = coordinator.delegate(&task).unwrap();

        assert_eq!(delegation.backup_agents.len(), 2);
        assert!(!delegation.backup_agents.contains(&delegation.agent_id));
        assert_ne!(delegation.backup_agents[0], delegation.backup_agents[1]);
    }

    #[test]
    fn test_complete_releases_and_records() {
        let (coordinator, registry) = coordinator();
        let id = registry.register(capable_agent("r1"));

        let task = Task::new("assembly", TaskPriority::Normal);
        let delegation = coordinator.delegate(&task).unwrap();
        assert!(registry.load(&id).unwrap() > 0.0);

        coordinator
            .complete(
                &delegation.id,
                DelegationOutcome::Completed {
                    duration_secs: 42.0,
                    quality: 0.9,
                },
            )
            .unwrap();

        assert_eq!(registry.load(&id), Some(0.0));
        assert!(!coordinator.is_active(&task.id));
        // Task can be delegated again after completion
        assert!(coordinator.delegate(&task).is_ok());
    }

    #[test]
    fn test_complete_unknown_delegation_errors() {
        let (coordinator, _registry) = coordinator();
        let result = coordinator.complete(
            &DelegationId::from_string("missing"),
            DelegationOutcome::Cancelled,
        );
        assert!(matches!(result, Err(DelegationError::DelegationNotFound { .. })));
    }

    #[test]
    fn test_concurrent_delegation_single_winner() {
        let (coordinator, registry) = coordinator();
        registry.register(capable_agent("r1"));
        registry.register(capable_agent("r2"));

        let coordinator = Arc::new(coordinator);
        let task = Task::new("assembly", TaskPriority::Normal);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let coordinator = coordinator.clone();
                let task = task.clone();
                std::thread::spawn(move || coordinator.delegate(&task).is_ok())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|&ok| ok)
            .count();
        assert_eq!(successes, 1);
        assert_eq!(registry.statistics().total_active_tasks, 1);
    }
}

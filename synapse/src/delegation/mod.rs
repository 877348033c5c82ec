//! Delegation Pipeline
//!
//! Turns an incoming task into a delegation record: complexity scoring,
//! requirement extraction, capability filtering, performance estimation,
//! multi-criteria ranking, and assignment with backup selection.
//!
//! # Pipeline
//!
//! ```text
//! Task -> ComplexityScorer -> RequirementExtractor
//!      -> CapabilityMatcher -> PerformanceEstimator -> CandidateRanker
//!      -> DelegationCoordinator (assign + backups + events)
//! ```

use serde::{Deserialize, Serialize};

use synapse_core::{AgentSnapshot, DelegationId, TaskId};

pub mod complexity;
pub mod coordinator;
pub mod estimator;
pub mod matcher;
pub mod ranker;
pub mod requirements;

pub use complexity::ComplexityScorer;
pub use coordinator::DelegationCoordinator;
pub use estimator::{
    EstimationContext, EstimatorError, HeuristicEstimator, PerformanceEstimator,
    PerformancePrediction,
};
pub use matcher::CapabilityMatcher;
pub use ranker::CandidateRanker;
pub use requirements::RequirementExtractor;

/// Result type for delegation operations.
pub type Result<T> = std::result::Result<T, DelegationError>;

/// Delegation errors.
///
/// `NoSuitableAgent` and `AlreadyDelegated` are expected business outcomes
/// surfaced to the caller, not system faults.
#[derive(Debug, thiserror::Error)]
pub enum DelegationError {
    /// The candidate set is empty after filtering
    #[error("No suitable agent for task {task_id}")]
    NoSuitableAgent {
        /// The task that could not be delegated
        task_id: TaskId,
    },

    /// The task already has an active delegation
    #[error("Task {task_id} is already delegated")]
    AlreadyDelegated {
        /// The task with an active delegation
        task_id: TaskId,
    },

    /// The delegation record does not exist or is no longer active
    #[error("Delegation not found: {delegation_id}")]
    DelegationNotFound {
        /// The unknown delegation id
        delegation_id: DelegationId,
    },

    /// Registry-level failures
    #[error(transparent)]
    Registry(#[from] crate::registry::RegistryError),

    /// Unexpected internal failures
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A transient pairing of an agent with its scores for one decision.
///
/// Candidates live only for the duration of a single delegation decision and
/// are never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCandidate {
    /// The agent and its load at decision time
    pub snapshot: AgentSnapshot,

    /// Capability match score against the task requirements
    pub match_score: f64,

    /// Predicted performance for this task
    pub prediction: PerformancePrediction,

    /// Final weighted ranking score, filled by the ranker
    pub rank_score: f64,
}

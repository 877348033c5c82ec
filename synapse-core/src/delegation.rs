//! Delegation records binding one task to one primary agent and backups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{AgentId, DelegationId, TaskId};

/// The record created when a task is assigned to an agent.
///
/// At most one active delegation exists per task identifier at a time; the
/// coordinator enforces this invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delegation {
    /// Unique delegation identifier
    pub id: DelegationId,

    /// The delegated task
    pub task_id: TaskId,

    /// Primary assigned agent
    pub agent_id: AgentId,

    /// Up to two distinct next-best agents, in rank order
    pub backup_agents: Vec<AgentId>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Estimated completion time
    pub estimated_completion: DateTime<Utc>,

    /// Assignment confidence in [0, 1]
    pub confidence: f64,
}

/// Terminal outcome of a delegation, reported by the external executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DelegationOutcome {
    /// The task finished successfully
    Completed {
        /// Observed execution duration in seconds
        duration_secs: f64,

        /// Quality of the result in [0, 1]
        quality: f64,
    },

    /// The task failed
    Failed {
        /// Failure description
        reason: String,
    },

    /// The task was cancelled before completion
    Cancelled,
}

impl DelegationOutcome {
    /// Whether this outcome counts as a success for history purposes
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

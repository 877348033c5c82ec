//! Agent records, kinds, statuses, and capability maps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::id::AgentId;

/// Classification of agent executors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// A human operator
    Human,

    /// A physical robot
    Robot,

    /// A software system
    Software,
}

/// Current availability of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Agent can accept work
    Available,

    /// Agent is at capacity
    Busy,

    /// Agent is unreachable
    Offline,
}

impl Default for AgentStatus {
    fn default() -> Self {
        Self::Available
    }
}

/// An executor capable of performing tasks.
///
/// Capabilities map skill names to proficiency in `[0, 1]`. Load is derived
/// from active task count against `max_concurrent`, capped at 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Unique agent identifier
    pub id: AgentId,

    /// Human-readable name
    pub name: String,

    /// Executor kind
    pub kind: AgentKind,

    /// Skill name -> proficiency in [0, 1]
    pub capabilities: HashMap<String, f64>,

    /// Reliability score in [0, 1]
    pub reliability: f64,

    /// Current status
    pub status: AgentStatus,

    /// Maximum concurrent task slots
    pub max_concurrent: u32,

    /// Registration timestamp
    pub registered_at: DateTime<Utc>,
}

impl Agent {
    /// Create an agent with the given capabilities
    pub fn new(
        name: impl Into<String>,
        kind: AgentKind,
        capabilities: HashMap<String, f64>,
    ) -> Self {
        Self {
            id: AgentId::new(),
            name: name.into(),
            kind,
            capabilities,
            reliability: 1.0,
            status: AgentStatus::Available,
            max_concurrent: 3,
            registered_at: Utc::now(),
        }
    }

    /// Proficiency for a skill; 0.0 when the skill is missing
    pub fn proficiency(&self, skill: &str) -> f64 {
        self.capabilities.get(skill).copied().unwrap_or(0.0)
    }

    /// Mean proficiency across all capabilities; 0.0 for an empty map
    pub fn mean_proficiency(&self) -> f64 {
        if self.capabilities.is_empty() {
            return 0.0;
        }
        self.capabilities.values().sum::<f64>() / self.capabilities.len() as f64
    }
}

/// A point-in-time view of an agent with its derived load.
///
/// Snapshots are what the delegation pipeline and router read; the registry
/// remains the single source of truth for mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// The agent record at snapshot time
    pub agent: Agent,

    /// Fraction of concurrency slots in use, capped at 1.0
    pub load: f64,
}

impl AgentSnapshot {
    /// Remaining availability: `1 - load`
    pub fn availability(&self) -> f64 {
        (1.0 - self.load).max(0.0)
    }
}

//! Real-time routing requests and decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::id::AgentId;
use crate::task::TaskPriority;

/// A latency-sensitive routing request.
///
/// Carries only what the router needs to decide: the task shape, not the
/// full task record. Maps and sets are ordered so the request fingerprints
/// deterministically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    /// Task-type tag
    pub task_type: String,

    /// Priority tier, which selects the latency target and strategy
    pub priority: TaskPriority,

    /// Declared task data relevant to routing
    pub task_data: BTreeMap<String, Value>,

    /// Declared required skills, used by the rule-table strategy
    pub required_skills: BTreeSet<String>,
}

impl RouteRequest {
    /// Create a request with empty task data
    pub fn new(task_type: impl Into<String>, priority: TaskPriority) -> Self {
        Self {
            task_type: task_type.into(),
            priority,
            task_data: BTreeMap::new(),
            required_skills: BTreeSet::new(),
        }
    }
}

/// The strategy that produced a routing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStrategy {
    /// Highest value on the designated safety capability, load ignored
    SafetyCapability,

    /// Weighted blend of capability and load-derived availability
    CapabilityLoadBlend,

    /// Fixed rule table keyed by declared requirements
    RuleTable,

    /// Lowest-load agent
    CheapestAvailable,

    /// Degraded best-effort answer after an error or empty pool
    Fallback,
}

impl fmt::Display for RouteStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::SafetyCapability => "safety_capability",
            Self::CapabilityLoadBlend => "capability_load_blend",
            Self::RuleTable => "rule_table",
            Self::CheapestAvailable => "cheapest_available",
            Self::Fallback => "fallback",
        };
        write!(f, "{tag}")
    }
}

/// The output of the real-time router.
///
/// `decided_at` drives cache-entry validity; `cache_hit` marks decisions
/// served from the decision cache without recomputation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Assigned agent, absent only for fallback decisions over an empty pool
    pub agent_id: Option<AgentId>,

    /// Strategy that computed the decision
    pub strategy: RouteStrategy,

    /// Decision confidence in [0, 1]
    pub confidence: f64,

    /// When the decision was computed
    pub decided_at: DateTime<Utc>,

    /// Whether this decision was served from the cache
    pub cache_hit: bool,
}

impl RoutingDecision {
    /// A degraded decision returned when no better answer exists.
    pub fn fallback(agent_id: Option<AgentId>) -> Self {
        Self {
            agent_id,
            strategy: RouteStrategy::Fallback,
            confidence: 0.1,
            decided_at: Utc::now(),
            cache_hit: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_display() {
        assert_eq!(RouteStrategy::Fallback.to_string(), "fallback");
        assert_eq!(RouteStrategy::SafetyCapability.to_string(), "safety_capability");
    }

    #[test]
    fn test_fallback_decision() {
        let decision = RoutingDecision::fallback(None);
        assert_eq!(decision.strategy, RouteStrategy::Fallback);
        assert!(decision.confidence <= 0.1);
        assert!(!decision.cache_hit);
    }
}

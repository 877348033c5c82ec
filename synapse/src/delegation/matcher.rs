//! Capability matching.
//!
//! Scores how well an agent matches a requirement set and filters the pool
//! down to capable candidates. Filtering keeps every agent at or above the
//! threshold, ties included; limiting happens later at ranking.

use std::sync::Arc;
use tracing::debug;

use crate::history::PerformanceHistory;
use synapse_core::{Agent, AgentSnapshot, TaskRequirements};

/// Match score weights; they sum to 1.0.
const WEIGHT_TECHNICAL: f64 = 0.4;
const WEIGHT_HISTORY: f64 = 0.3;
const WEIGHT_RELIABILITY: f64 = 0.2;
const WEIGHT_AVAILABILITY_PATTERN: f64 = 0.1;

/// Historical term used when an agent has no history on a task type.
const NEUTRAL_HISTORY: f64 = 0.5;

/// Availability-pattern term until a richer schedule model exists.
const DEFAULT_AVAILABILITY_PATTERN: f64 = 0.7;

/// Filters agents by capability against task requirements.
pub struct CapabilityMatcher {
    history: Arc<PerformanceHistory>,
}

impl CapabilityMatcher {
    /// Create a matcher backed by the given performance history
    pub fn new(history: Arc<PerformanceHistory>) -> Self {
        Self { history }
    }

    /// Score an agent against a requirement set, in [0, 1].
    ///
    /// Combines the technical-skill average over required skills (a missing
    /// skill counts as proficiency 0), historical success on the same task
    /// type, reliability, and a constant availability-pattern term.
    pub fn match_score(
        &self,
        agent: &Agent,
        task_type: &str,
        requirements: &TaskRequirements,
    ) -> f64 {
        let technical = technical_average(agent, requirements);
        let historical = self
            .history
            .success_rate(&agent.id, task_type)
            .unwrap_or(NEUTRAL_HISTORY);

        technical * WEIGHT_TECHNICAL
            + historical * WEIGHT_HISTORY
            + agent.reliability * WEIGHT_RELIABILITY
            + DEFAULT_AVAILABILITY_PATTERN * WEIGHT_AVAILABILITY_PATTERN
    }

    /// Filter a pool down to capable candidates with their match scores.
    ///
    /// An agent qualifies iff its match score reaches the requirement
    /// threshold. Input order is preserved.
    pub fn filter(
        &self,
        task_type: &str,
        requirements: &TaskRequirements,
        pool: Vec<AgentSnapshot>,
    ) -> Vec<(AgentSnapshot, f64)> {
        let threshold = requirements.minimum_capability_threshold;
        let matched: Vec<(AgentSnapshot, f64)> = pool
            .into_iter()
            .filter_map(|snapshot| {
                let score = self.match_score(&snapshot.agent, task_type, requirements);
                (score >= threshold).then_some((snapshot, score))
            })
            .collect();

        debug!(
            task_type,
            threshold,
            candidates = matched.len(),
            "Capability filtering complete"
        );
        matched
    }
}

/// Mean proficiency over the required skills; falls back to the agent's
/// overall mean when no skills are required.
fn technical_average(agent: &Agent, requirements: &TaskRequirements) -> f64 {
    if requirements.required_skills.is_empty() {
        return agent.mean_proficiency();
    }
    let sum: f64 = requirements
        .required_skills
        .iter()
        .map(|skill| agent.proficiency(skill))
        .sum();
    sum / requirements.required_skills.len() as f64
}

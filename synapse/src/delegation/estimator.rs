//! Performance estimation.
//!
//! Predicts an agent's expected outcome for a task from its capability
//! match, historical record, and current load. The estimator is a pluggable
//! seam: ranking recovers from a failing estimator with a neutral
//! prediction instead of aborting the decision.

use serde::{Deserialize, Serialize};

use synapse_core::{AgentSnapshot, TaskRequirements};

/// Complexity drag on the predicted score.
const COMPLEXITY_PENALTY: f64 = 0.3;

/// Load drag on the predicted score.
const LOAD_PENALTY: f64 = 0.2;

/// Confidence base before history and skill bonuses.
const BASE_CONFIDENCE: f64 = 0.6;

/// History samples at which the history bonus saturates.
const HISTORY_SATURATION: usize = 20;

/// Maximum confidence added by historical samples.
const HISTORY_BONUS_CAP: f64 = 0.3;

/// Confidence added per strongly-held required skill (proficiency > 0.8).
const STRONG_SKILL_BONUS: f64 = 0.05;

/// Maximum confidence added by strong skills.
const STRONG_SKILL_BONUS_CAP: f64 = 0.2;

/// Result type for estimation.
pub type Result<T> = std::result::Result<T, EstimatorError>;

/// Estimation errors; always recovered by the caller.
#[derive(Debug, thiserror::Error)]
pub enum EstimatorError {
    /// The estimator cannot produce a prediction
    #[error("Estimator unavailable: {0}")]
    Unavailable(String),
}

/// Inputs the estimator needs beyond the agent itself.
#[derive(Debug, Clone, Copy)]
pub struct EstimationContext {
    /// Capability match score from the matcher
    pub capability_score: f64,

    /// Overall task complexity in [0, 1]
    pub complexity: f64,

    /// Historical samples available for this (agent, task type)
    pub sample_count: usize,
}

/// Predicted outcome for one agent on one task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformancePrediction {
    /// Capability match score carried through from the matcher
    pub capability_score: f64,

    /// Predicted success score in [0, 1]
    pub predicted_score: f64,

    /// Confidence in the prediction, in [0, 1]
    pub confidence: f64,
}

impl PerformancePrediction {
    /// Neutral prediction used when the estimator is unavailable.
    pub fn neutral() -> Self {
        Self {
            capability_score: 0.5,
            predicted_score: 0.5,
            confidence: 0.3,
        }
    }
}

/// A pluggable performance predictor.
///
/// Implementations must be side-effect-free and total: an agent with no
/// history gets documented defaults, not an error.
pub trait PerformanceEstimator: Send + Sync {
    /// Predict the agent's expected outcome for a task.
    fn predict(
        &self,
        agent: &AgentSnapshot,
        requirements: &TaskRequirements,
        context: &EstimationContext,
    ) -> Result<PerformancePrediction>;
}

/// Default closed-form estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicEstimator;

impl HeuristicEstimator {
    /// Create an estimator
    pub fn new() -> Self {
        Self
    }
}

impl PerformanceEstimator for HeuristicEstimator {
    fn predict(
        &self,
        agent: &AgentSnapshot,
        requirements: &TaskRequirements,
        context: &EstimationContext,
    ) -> Result<PerformancePrediction> {
        let capability = context.capability_score.clamp(0.0, 1.0);

        let predicted = capability
            * (1.0 - context.complexity * COMPLEXITY_PENALTY)
            * (1.0 - agent.load * LOAD_PENALTY);

        let history_bonus = HISTORY_BONUS_CAP
            * (context.sample_count.min(HISTORY_SATURATION) as f64 / HISTORY_SATURATION as f64);

        let strong_skills = requirements
            .required_skills
            .iter()
            .filter(|skill| agent.agent.proficiency(skill) > 0.8)
            .count();
        let skill_bonus = (strong_skills as f64 * STRONG_SKILL_BONUS).min(STRONG_SKILL_BONUS_CAP);

        Ok(PerformancePrediction {
            capability_score: capability,
            predicted_score: predicted.clamp(0.0, 1.0),
            confidence: (BASE_CONFIDENCE + history_bonus + skill_bonus).clamp(0.0, 1.0),
        })
    }
}

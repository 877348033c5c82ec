//! Multi-factor complexity scoring.
//!
//! Scoring is a pure function of the task's declared parameters: fixed
//! breakpoints, fixed weights, no randomness, no clock reads. Missing
//! parameters fall back to the low end of each factor, so scoring is total
//! over all tasks.

use synapse_core::{ComplexityFactors, ComplexityScore, Task, TaskPriority};

/// Factor weights; they sum to 1.0.
const WEIGHT_PRECISION: f64 = 0.20;
const WEIGHT_COORDINATION: f64 = 0.15;
const WEIGHT_ENVIRONMENT: f64 = 0.15;
const WEIGHT_TIME_PRESSURE: f64 = 0.20;
const WEIGHT_SAFETY: f64 = 0.20;
const WEIGHT_RESOURCES: f64 = 0.10;

/// Derives a normalized complexity score from task parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexityScorer;

impl ComplexityScorer {
    /// Create a scorer
    pub fn new() -> Self {
        Self
    }

    /// Score a task.
    ///
    /// Deterministic and idempotent: two calls on the same task always
    /// return the identical score.
    pub fn score(&self, task: &Task) -> ComplexityScore {
        let factors = ComplexityFactors {
            precision: precision_factor(task),
            coordination: coordination_factor(task),
            environment: environment_factor(task),
            time_pressure: time_pressure_factor(task),
            safety: safety_factor(task),
            resource_dependency: resource_factor(task),
        };

        let weighted_sum = factors.precision * WEIGHT_PRECISION
            + factors.coordination * WEIGHT_COORDINATION
            + factors.environment * WEIGHT_ENVIRONMENT
            + factors.time_pressure * WEIGHT_TIME_PRESSURE
            + factors.safety * WEIGHT_SAFETY
            + factors.resource_dependency * WEIGHT_RESOURCES;

        ComplexityScore::from_factors(factors, weighted_sum)
    }
}

/// Tighter tolerances demand more precision; missing tolerance reads as
/// coarse work.
fn precision_factor(task: &Task) -> f64 {
    match task.precision_tolerance() {
        Some(tolerance) if tolerance <= 0.1 => 1.0,
        Some(tolerance) if tolerance <= 1.0 => 0.8,
        Some(tolerance) if tolerance <= 10.0 => 0.4,
        _ => 0.1,
    }
}

fn coordination_factor(task: &Task) -> f64 {
    if !task.requires_coordination() {
        return 0.1;
    }
    match task.coordinating_agents() {
        n if n >= 3 => 1.0,
        2 => 0.7,
        _ => 0.5,
    }
}

fn environment_factor(task: &Task) -> f64 {
    match task.hazards().len() {
        n if n >= 3 => 1.0,
        2 => 0.7,
        1 => 0.4,
        _ => 0.1,
    }
}

/// Absent deadline reads as low pressure.
fn time_pressure_factor(task: &Task) -> f64 {
    match task.deadline_secs {
        Some(secs) if secs <= 60 => 1.0,
        Some(secs) if secs <= 300 => 0.8,
        Some(secs) if secs <= 1800 => 0.6,
        Some(secs) if secs <= 7200 => 0.3,
        _ => 0.1,
    }
}

fn safety_factor(task: &Task) -> f64 {
    if task.safety_critical || task.priority == TaskPriority::SafetyCritical {
        1.0
    } else if task.priority == TaskPriority::Critical {
        0.7
    } else if !task.hazards().is_empty() {
        0.5
    } else {
        0.1
    }
}

fn resource_factor(task: &Task) -> f64 {
    match task.resources().len() {
        n if n >= 4 => 1.0,
        n if n >= 2 => 0.6,
        1 => 0.3,
        _ => 0.1,
    }
}

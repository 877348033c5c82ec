//! Multi-factor task complexity scores.

use serde::{Deserialize, Serialize};

/// Per-factor complexity scores, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexityFactors {
    /// Precision demands from declared tolerance
    pub precision: f64,

    /// Multi-agent coordination demands
    pub coordination: f64,

    /// Environmental hazards
    pub environment: f64,

    /// Deadline pressure
    pub time_pressure: f64,

    /// Safety criticality
    pub safety: f64,

    /// External resource dependencies
    pub resource_dependency: f64,
}

/// Category derived from the overall score by fixed thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityCategory {
    /// Overall below 0.4
    Simple,

    /// Overall in [0.4, 0.6)
    Moderate,

    /// Overall in [0.6, 0.8)
    Complex,

    /// Overall at or above 0.8
    Expert,
}

impl ComplexityCategory {
    /// Derive the category from an overall score
    pub fn from_overall(overall: f64) -> Self {
        if overall >= 0.8 {
            Self::Expert
        } else if overall >= 0.6 {
            Self::Complex
        } else if overall >= 0.4 {
            Self::Moderate
        } else {
            Self::Simple
        }
    }
}

/// Normalized multi-factor complexity estimate for a task.
///
/// Computed once per task and cached alongside it; `overall` is the weighted
/// sum of the factors, always clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexityScore {
    /// Individual factor scores
    pub factors: ComplexityFactors,

    /// Weighted sum of the factors, in [0, 1]
    pub overall: f64,

    /// Category derived from `overall`
    pub category: ComplexityCategory,
}

impl ComplexityScore {
    /// Build a score from factors and a computed weighted sum.
    ///
    /// The sum is clamped so factor arithmetic that rounds slightly outside
    /// `[0, 1]` cannot leak out.
    pub fn from_factors(factors: ComplexityFactors, weighted_sum: f64) -> Self {
        let overall = weighted_sum.clamp(0.0, 1.0);
        Self {
            factors,
            overall,
            category: ComplexityCategory::from_overall(overall),
        }
    }
}

//! Derived task requirements: skills, capability threshold, safety tags.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Requirements derived from a task and its type.
///
/// Skill sets use set semantics (duplicates collapse); the minimum
/// capability threshold is monotonically non-decreasing with both priority
/// and complexity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequirements {
    /// Required skill names, deduplicated and ordered
    pub required_skills: BTreeSet<String>,

    /// Minimum capability match score an agent must reach, in [0, 1]
    pub minimum_capability_threshold: f64,

    /// Safety requirement tags
    pub safety_requirements: BTreeSet<String>,
}

impl TaskRequirements {
    /// Whether any safety requirements are present
    pub fn has_safety_requirements(&self) -> bool {
        !self.safety_requirements.is_empty()
    }
}

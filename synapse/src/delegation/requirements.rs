//! Requirement extraction.
//!
//! Derives the skill set, minimum capability threshold, and safety tags for
//! a task. Base skills come from a closed per-task-type table; explicitly
//! declared skills are unioned in with set semantics.

use std::collections::BTreeSet;

use synapse_core::{ComplexityScore, Task, TaskPriority, TaskRequirements};

/// Safety tags attached to safety-relevant tasks.
const SAFETY_PROTOCOLS: &str = "safety_protocols";
const EMERGENCY_STOP: &str = "emergency_stop";
const HAZARD_AWARENESS: &str = "hazard_awareness";

/// Base skills for each known task type.
///
/// A closed table rather than a runtime-registered lookup: unknown types get
/// a general-operations baseline instead of an error.
fn base_skills(task_type: &str) -> &'static [&'static str] {
    match task_type {
        "assembly" => &["precision_control", "mechanical_assembly", "quality_inspection"],
        "inspection" => &["visual_inspection", "defect_detection", "reporting"],
        "transport" => &["navigation", "load_handling"],
        "maintenance" => &["diagnostics", "repair", "safety_procedures"],
        "analysis" => &["data_analysis", "pattern_recognition"],
        "monitoring" => &["telemetry", "anomaly_detection"],
        _ => &["general_operations"],
    }
}

/// Derives task requirements from a task and its complexity score.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequirementExtractor;

impl RequirementExtractor {
    /// Create an extractor
    pub fn new() -> Self {
        Self
    }

    /// Extract requirements.
    ///
    /// The minimum threshold is the max of the priority-implied and
    /// complexity-implied thresholds, so raising either can only raise the
    /// bar. Safety tags double as required skills so filtering cannot
    /// select an agent without them.
    pub fn extract(&self, task: &Task, complexity: &ComplexityScore) -> TaskRequirements {
        let mut required_skills: BTreeSet<String> = base_skills(&task.task_type)
            .iter()
            .map(|s| s.to_string())
            .collect();
        required_skills.extend(task.declared_skills());

        let mut safety_requirements = BTreeSet::new();
        if task.safety_critical || task.priority == TaskPriority::SafetyCritical {
            safety_requirements.insert(SAFETY_PROTOCOLS.to_string());
            safety_requirements.insert(EMERGENCY_STOP.to_string());
        }
        if !task.hazards().is_empty() {
            safety_requirements.insert(HAZARD_AWARENESS.to_string());
        }
        required_skills.extend(safety_requirements.iter().cloned());

        let threshold = priority_threshold(task.priority).max(complexity_threshold(complexity.overall));

        TaskRequirements {
            required_skills,
            minimum_capability_threshold: threshold,
            safety_requirements,
        }
    }
}

fn priority_threshold(priority: TaskPriority) -> f64 {
    match priority {
        TaskPriority::SafetyCritical => 0.9,
        TaskPriority::Critical => 0.8,
        TaskPriority::High => 0.7,
        TaskPriority::Normal | TaskPriority::Low => 0.0,
    }
}

fn complexity_threshold(overall: f64) -> f64 {
    if overall >= 0.8 {
        0.8
    } else if overall >= 0.6 {
        0.7
    } else {
        0.6
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegation::ComplexityScorer;
    use serde_json::json;

    fn requirements_for(task: &Task) -> TaskRequirements {
        let complexity = ComplexityScorer::new().score(task);
        RequirementExtractor::new().extract(task, &complexity)
    }

    #[test]
    fn test_base_skills_by_type() {
        let task = Task::new("assembly", TaskPriority::Normal);
        let requirements = requirements_for(&task);
        assert!(requirements.required_skills.contains("precision_control"));

        let unknown = Task::new("something_else", TaskPriority::Normal);
        let requirements = requirements_for(&unknown);
        assert!(requirements.required_skills.contains("general_operations"));
    }

    #[test]
    fn test_declared_skills_union_deduplicates() {
        let task = Task::builder("assembly")
            .parameter("required_skills", json!(["welding", "precision_control"]))
            .build();
        let requirements = requirements_for(&task);

        assert!(requirements.required_skills.contains("welding"));
        // "precision_control" is both declared and in the base set; sets collapse it
        let count = requirements
            .required_skills
            .iter()
            .filter(|s| s.as_str() == "precision_control")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_threshold_takes_max_of_priority_and_complexity() {
        // Simple task, safety-critical priority: priority wins
        let task = Task::new("inspection", TaskPriority::SafetyCritical);
        assert_eq!(requirements_for(&task).minimum_capability_threshold, 0.9);

        // Simple task, normal priority: complexity floor applies
        let task = Task::new("inspection", TaskPriority::Normal);
        assert_eq!(requirements_for(&task).minimum_capability_threshold, 0.6);

        // High priority beats the 0.6 complexity floor
        let task = Task::new("inspection", TaskPriority::High);
        assert_eq!(requirements_for(&task).minimum_capability_threshold, 0.7);
    }

    #[test]
    fn test_safety_requirements_never_dropped() {
        let task = Task::builder("maintenance")
            .priority(TaskPriority::SafetyCritical)
            .parameter("hazards", json!(["high_voltage"]))
            .build();
        let requirements = requirements_for(&task);

        assert!(requirements.safety_requirements.contains("safety_protocols"));
        assert!(requirements.safety_requirements.contains("emergency_stop"));
        assert!(requirements.safety_requirements.contains("hazard_awareness"));
        // Safety tags are also required skills
        assert!(requirements.required_skills.contains("safety_protocols"));
    }
}

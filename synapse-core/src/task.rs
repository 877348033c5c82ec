//! Task records and parameter access.
//!
//! A task is immutable once analyzed: the engine reads its declared
//! parameters but never mutates them. Status transitions are tracked by the
//! submitting system, not here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::id::TaskId;

/// Priority tier of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Background work, no urgency
    Low,

    /// Default tier
    Normal,

    /// Elevated urgency
    High,

    /// Operationally critical
    Critical,

    /// Failure endangers people or equipment
    SafetyCritical,
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::Normal
    }
}

impl TaskPriority {
    /// Whether this tier demands the strictest handling
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Critical | Self::SafetyCritical)
    }
}

/// An incoming work item to be delegated to an agent.
///
/// The parameter map is free-form; typed accessors below read the keys the
/// engine understands and fall back to documented defaults when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier
    pub id: TaskId,

    /// Task-type tag, e.g. `"assembly"` or `"inspection"`
    pub task_type: String,

    /// Priority tier
    pub priority: TaskPriority,

    /// Free-form declared parameters
    ///
    /// Ordered map so serialized forms and fingerprints are deterministic.
    pub parameters: BTreeMap<String, Value>,

    /// Declared deadline: seconds allowed from submission, if any
    pub deadline_secs: Option<u64>,

    /// Declared safety-critical flag
    pub safety_critical: bool,

    /// Submission timestamp
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a task with empty parameters
    pub fn new(task_type: impl Into<String>, priority: TaskPriority) -> Self {
        Self {
            id: TaskId::new(),
            task_type: task_type.into(),
            priority,
            parameters: BTreeMap::new(),
            deadline_secs: None,
            safety_critical: false,
            created_at: Utc::now(),
        }
    }

    /// Start building a task
    pub fn builder(task_type: impl Into<String>) -> TaskBuilder {
        TaskBuilder::new(task_type)
    }

    /// Declared precision tolerance in work units, if any
    pub fn precision_tolerance(&self) -> Option<f64> {
        self.parameters.get("precision_tolerance").and_then(Value::as_f64)
    }

    /// Whether the task declares multi-agent coordination
    pub fn requires_coordination(&self) -> bool {
        self.parameters
            .get("requires_coordination")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Declared number of coordinating agents (0 when absent)
    pub fn coordinating_agents(&self) -> u64 {
        self.parameters
            .get("coordinating_agents")
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    /// Declared environment hazards (empty when absent)
    pub fn hazards(&self) -> Vec<String> {
        self.string_list("hazards")
    }

    /// Declared resource dependencies (empty when absent)
    pub fn resources(&self) -> Vec<String> {
        self.string_list("resources")
    }

    /// Explicitly declared required skills (empty when absent)
    pub fn declared_skills(&self) -> Vec<String> {
        self.string_list("required_skills")
    }

    fn string_list(&self, key: &str) -> Vec<String> {
        self.parameters
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_owned))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Builder for tasks
pub struct TaskBuilder {
    task_type: String,
    priority: TaskPriority,
    parameters: BTreeMap<String, Value>,
    deadline_secs: Option<u64>,
    safety_critical: bool,
}

impl TaskBuilder {
    /// Start a builder for the given task type
    pub fn new(task_type: impl Into<String>) -> Self {
        Self {
            task_type: task_type.into(),
            priority: TaskPriority::Normal,
            parameters: BTreeMap::new(),
            deadline_secs: None,
            safety_critical: false,
        }
    }

    /// Set the priority tier
    pub fn priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set a declared parameter
    pub fn parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Set the declared deadline in seconds from submission
    pub fn deadline_secs(mut self, secs: u64) -> Self {
        self.deadline_secs = Some(secs);
        self
    }

    /// Mark the task safety-critical
    pub fn safety_critical(mut self, flag: bool) -> Self {
        self.safety_critical = flag;
        self
    }

    /// Build the task
    pub fn build(self) -> Task {
        Task {
            id: TaskId::new(),
            task_type: self.task_type,
            priority: self.priority,
            parameters: self.parameters,
            deadline_secs: self.deadline_secs,
            safety_critical: self.safety_critical,
            created_at: Utc::now(),
        }
    }
}

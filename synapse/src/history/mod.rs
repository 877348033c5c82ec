//! Historical Performance Store
//!
//! Bounded per-(agent, task-type) record of delegation outcomes. The store
//! keeps the most recent samples only; the oldest sample is evicted once the
//! window is full. Persistence beyond the process is external by contract.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

use synapse_core::AgentId;

/// One recorded delegation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSample {
    /// Whether the delegation completed successfully
    pub success: bool,

    /// Observed duration in seconds
    pub duration_secs: f64,

    /// Result quality in [0, 1]
    pub quality: f64,

    /// When the outcome was recorded
    pub recorded_at: DateTime<Utc>,
}

impl OutcomeSample {
    /// A successful outcome sample
    pub fn success(duration_secs: f64, quality: f64) -> Self {
        Self {
            success: true,
            duration_secs,
            quality,
            recorded_at: Utc::now(),
        }
    }

    /// A failed outcome sample
    pub fn failure(duration_secs: f64) -> Self {
        Self {
            success: false,
            duration_secs,
            quality: 0.0,
            recorded_at: Utc::now(),
        }
    }
}

/// Bounded outcome history keyed by (agent, task type).
pub struct PerformanceHistory {
    samples: DashMap<(AgentId, String), VecDeque<OutcomeSample>>,
    window: usize,
}

impl PerformanceHistory {
    /// Create a store retaining `window` samples per key
    pub fn new(window: usize) -> Self {
        Self {
            samples: DashMap::new(),
            window: window.max(1),
        }
    }

    /// Append an outcome, evicting the oldest sample once the window is full.
    pub fn record_outcome(&self, agent_id: &AgentId, task_type: &str, sample: OutcomeSample) {
        let mut entry = self
            .samples
            .entry((agent_id.clone(), task_type.to_string()))
            .or_default();

        if entry.len() >= self.window {
            entry.pop_front();
        }
        entry.push_back(sample);

        debug!(agent = %agent_id, task_type, samples = entry.len(), "Recorded outcome");
    }

    /// All retained samples for an agent on a task type, oldest first.
    pub fn history(&self, agent_id: &AgentId, task_type: &str) -> Vec<OutcomeSample> {
        self.samples
            .get(&(agent_id.clone(), task_type.to_string()))
            .map(|entry| entry.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of retained samples for an agent on a task type.
    pub fn sample_count(&self, agent_id: &AgentId, task_type: &str) -> usize {
        self.samples
            .get(&(agent_id.clone(), task_type.to_string()))
            .map(|entry| entry.len())
            .unwrap_or(0)
    }

    /// Success fraction over retained samples; `None` with zero history.
    pub fn success_rate(&self, agent_id: &AgentId, task_type: &str) -> Option<f64> {
        self.samples
            .get(&(agent_id.clone(), task_type.to_string()))
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let successes = entry.iter().filter(|s| s.success).count();
                successes as f64 / entry.len() as f64
            })
    }

    /// Mean duration over retained samples; `None` with zero history.
    pub fn average_duration(&self, agent_id: &AgentId, task_type: &str) -> Option<f64> {
        self.samples
            .get(&(agent_id.clone(), task_type.to_string()))
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                entry.iter().map(|s| s.duration_secs).sum::<f64>() / entry.len() as f64
            })
    }
}

//! Agent Registry - Pool of Available Executors
//!
//! The registry is the single source of truth for agent load and
//! availability. Reads for advisory filtering go through cheap snapshots;
//! every load mutation goes through a synchronized per-agent accessor so
//! concurrent assignment cannot lose updates.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use synapse_core::config::RegistryConfig;
use synapse_core::{Agent, AgentId, AgentSnapshot, AgentStatus};

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Registry errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The agent is not registered
    #[error("Agent not found: {0}")]
    AgentNotFound(AgentId),

    /// The agent cannot accept more work
    #[error("Agent unavailable: {0}")]
    AgentUnavailable(AgentId),
}

/// Heartbeat payload reported by an agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeartbeatMetrics {
    /// Updated status, if the agent reports one
    pub status: Option<AgentStatus>,

    /// Updated reliability score, if the agent reports one
    pub reliability: Option<f64>,
}

/// Internal per-agent record.
#[derive(Debug, Clone)]
struct AgentRecord {
    agent: Agent,
    active_tasks: u32,
    last_heartbeat: DateTime<Utc>,
}

impl AgentRecord {
    fn load(&self) -> f64 {
        let slots = self.agent.max_concurrent.max(1) as f64;
        (self.active_tasks as f64 / slots).min(1.0)
    }

    fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            agent: self.agent.clone(),
            load: self.load(),
        }
    }
}

/// Aggregate registry statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryStatistics {
    /// Registered agents
    pub total_agents: usize,

    /// Agents with status `Available`
    pub available_agents: usize,

    /// Agents with status `Busy`
    pub busy_agents: usize,

    /// Agents with status `Offline`
    pub offline_agents: usize,

    /// Sum of active task slots in use
    pub total_active_tasks: u64,

    /// Mean reliability across registered agents
    pub average_reliability: f64,
}

/// Registry of available agents.
pub struct AgentRegistry {
    agents: DashMap<AgentId, AgentRecord>,
    config: RegistryConfig,
}

impl AgentRegistry {
    /// Create a registry
    pub fn new(config: RegistryConfig) -> Self {
        info!("Initializing agent registry");
        Self {
            agents: DashMap::new(),
            config,
        }
    }

    // ========================================================================
    // Registration & heartbeat
    // ========================================================================

    /// Register an agent in the pool.
    ///
    /// An agent declaring zero concurrency slots gets the configured default.
    pub fn register(&self, mut agent: Agent) -> AgentId {
        if agent.max_concurrent == 0 {
            agent.max_concurrent = self.config.default_max_concurrent;
        }

        let id = agent.id.clone();
        debug!(agent = %id, kind = ?agent.kind, capabilities = agent.capabilities.len(), "Registering agent");

        self.agents.insert(
            id.clone(),
            AgentRecord {
                agent,
                active_tasks: 0,
                last_heartbeat: Utc::now(),
            },
        );

        id
    }

    /// Remove an agent from the pool
    pub fn deregister(&self, agent_id: &AgentId) -> Result<()> {
        self.agents
            .remove(agent_id)
            .map(|_| info!(agent = %agent_id, "Agent deregistered"))
            .ok_or_else(|| RegistryError::AgentNotFound(agent_id.clone()))
    }

    /// Record a heartbeat, optionally updating status and reliability.
    pub fn heartbeat(&self, agent_id: &AgentId, metrics: HeartbeatMetrics) -> Result<()> {
        let mut record = self
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| RegistryError::AgentNotFound(agent_id.clone()))?;

        record.last_heartbeat = Utc::now();
        if let Some(status) = metrics.status {
            record.agent.status = status;
        }
        if let Some(reliability) = metrics.reliability {
            record.agent.reliability = reliability.clamp(0.0, 1.0);
        }

        Ok(())
    }

    /// Mark agents without a recent heartbeat as offline.
    ///
    /// Returns the agents newly marked offline.
    pub fn mark_stale_offline(&self, timeout: Duration) -> Vec<AgentId> {
        let cutoff = ChronoDuration::from_std(timeout)
            .unwrap_or_else(|_| ChronoDuration::seconds(self.config.heartbeat_timeout_secs as i64));
        let now = Utc::now();
        let mut stale = Vec::new();

        for mut entry in self.agents.iter_mut() {
            if entry.agent.status != AgentStatus::Offline && now - entry.last_heartbeat > cutoff {
                warn!(agent = %entry.agent.id, "Agent heartbeat timeout, marking offline");
                entry.agent.status = AgentStatus::Offline;
                stale.push(entry.agent.id.clone());
            }
        }

        stale
    }

    // ========================================================================
    // Load mutation (synchronized per agent)
    // ========================================================================

    /// Reserve one concurrency slot on an agent.
    ///
    /// The mutation happens under the entry's shard lock, so two concurrent
    /// assignments cannot both observe the same free slot.
    pub fn begin_assignment(&self, agent_id: &AgentId) -> Result<()> {
        let mut record = self
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| RegistryError::AgentNotFound(agent_id.clone()))?;

        if record.agent.status == AgentStatus::Offline {
            return Err(RegistryError::AgentUnavailable(agent_id.clone()));
        }
        if record.active_tasks >= record.agent.max_concurrent.max(1) {
            return Err(RegistryError::AgentUnavailable(agent_id.clone()));
        }

        record.active_tasks += 1;
        if record.active_tasks >= record.agent.max_concurrent.max(1) {
            record.agent.status = AgentStatus::Busy;
        }

        debug!(agent = %agent_id, load = record.load(), "Assignment began");
        Ok(())
    }

    /// Release one concurrency slot on an agent.
    pub fn finish_assignment(&self, agent_id: &AgentId) -> Result<()> {
        let mut record = self
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| RegistryError::AgentNotFound(agent_id.clone()))?;

        record.active_tasks = record.active_tasks.saturating_sub(1);
        if record.agent.status == AgentStatus::Busy
            && record.active_tasks < record.agent.max_concurrent.max(1)
        {
            record.agent.status = AgentStatus::Available;
        }

        debug!(agent = %agent_id, load = record.load(), "Assignment finished");
        Ok(())
    }

    // ========================================================================
    // Snapshots (advisory reads)
    // ========================================================================

    /// Snapshot every registered agent with its current load
    pub fn snapshot(&self) -> Vec<AgentSnapshot> {
        self.agents.iter().map(|entry| entry.snapshot()).collect()
    }

    /// Snapshot agents that can currently accept work
    pub fn snapshot_available(&self) -> Vec<AgentSnapshot> {
        self.agents
            .iter()
            .filter(|entry| entry.agent.status == AgentStatus::Available && entry.load() < 1.0)
            .map(|entry| entry.snapshot())
            .collect()
    }

    /// Current load fraction for an agent
    pub fn load(&self, agent_id: &AgentId) -> Option<f64> {
        self.agents.get(agent_id).map(|record| record.load())
    }

    /// Number of registered agents
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the pool is empty
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Aggregate statistics over the pool
    pub fn statistics(&self) -> RegistryStatistics {
        let mut stats = RegistryStatistics {
            total_agents: 0,
            available_agents: 0,
            busy_agents: 0,
            offline_agents: 0,
            total_active_tasks: 0,
            average_reliability: 0.0,
        };

        let mut reliability_sum = 0.0;
        for entry in self.agents.iter() {
            stats.total_agents += 1;
            stats.total_active_tasks += entry.active_tasks as u64;
            reliability_sum += entry.agent.reliability;
            match entry.agent.status {
                AgentStatus::Available => stats.available_agents += 1,
                AgentStatus::Busy => stats.busy_agents += 1,
                AgentStatus::Offline => stats.offline_agents += 1,
            }
        }

        if stats.total_agents > 0 {
            stats.average_reliability = reliability_sum / stats.total_agents as f64;
        }

        stats
    }
}

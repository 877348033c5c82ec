//! Engine configuration.
//!
//! All sections have defaults matching the engine's documented constants, so
//! an absent or partial config file is always usable. The config path can be
//! overridden with the `SYNAPSE_CONFIG_PATH` environment variable.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{CoreError, Result};
use crate::task::TaskPriority;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "SYNAPSE_CONFIG_PATH";

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynapseConfig {
    /// Agent registry settings
    pub registry: RegistryConfig,

    /// Delegation pipeline settings
    pub delegation: DelegationConfig,

    /// Real-time router settings
    pub router: RouterConfig,

    /// Autonomy manager settings
    pub autonomy: AutonomyConfig,
}

impl SynapseConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&raw)?)
    }

    /// Load from `SYNAPSE_CONFIG_PATH` if set, otherwise defaults.
    pub fn load_default() -> Result<Self> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load(path),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Persist configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let raw = toml::to_string_pretty(self)
            .map_err(|e| CoreError::Config(format!("serialize config: {e}")))?;
        std::fs::write(path.as_ref(), raw)?;
        Ok(())
    }
}

/// Agent registry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Seconds without a heartbeat before an agent is marked offline
    pub heartbeat_timeout_secs: u64,

    /// Concurrency slots assumed for agents that do not declare one
    pub default_max_concurrent: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            heartbeat_timeout_secs: 60,
            default_max_concurrent: 3,
        }
    }
}

/// Delegation pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegationConfig {
    /// Maximum backup agents recorded per delegation
    pub max_backups: usize,

    /// Ranked candidates retained per decision
    pub max_candidates: usize,

    /// Outcome samples kept per (agent, task type)
    pub history_window: usize,
}

impl Default for DelegationConfig {
    fn default() -> Self {
        Self {
            max_backups: 2,
            max_candidates: 5,
            history_window: 100,
        }
    }
}

/// Real-time router settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Seconds a cached decision stays valid
    pub cache_ttl_secs: u64,

    /// Maximum cached decisions before oldest-first eviction
    pub cache_capacity: usize,

    /// Latency target for safety-critical decisions, in milliseconds
    pub safety_critical_target_ms: u64,

    /// Latency target for critical decisions, in milliseconds
    pub critical_target_ms: u64,

    /// Latency target for high-priority decisions, in milliseconds
    pub high_target_ms: u64,

    /// Latency target for normal and low decisions, in milliseconds
    pub normal_target_ms: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 60,
            cache_capacity: 10_000,
            safety_critical_target_ms: 1,
            critical_target_ms: 10,
            high_target_ms: 100,
            normal_target_ms: 500,
        }
    }
}

impl RouterConfig {
    /// Latency target for a priority tier.
    pub fn target_for(&self, priority: TaskPriority) -> Duration {
        let ms = match priority {
            TaskPriority::SafetyCritical => self.safety_critical_target_ms,
            TaskPriority::Critical => self.critical_target_ms,
            TaskPriority::High => self.high_target_ms,
            TaskPriority::Normal | TaskPriority::Low => self.normal_target_ms,
        };
        Duration::from_millis(ms)
    }
}

/// Autonomy manager settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutonomyConfig {
    /// Milliseconds between connectivity probes
    pub probe_interval_ms: u64,

    /// Consecutive probe failures before entering autonomous mode
    pub failure_threshold: u32,

    /// Maximum decisions held in the pending-sync queue
    pub pending_queue_limit: usize,

    /// Confidence ceiling for autonomous decisions
    pub confidence_ceiling: f64,

    /// Factor applied to the ceiling for cache hits in autonomous mode
    pub cache_hit_factor: f64,
}

impl Default for AutonomyConfig {
    fn default() -> Self {
        Self {
            probe_interval_ms: 5_000,
            failure_threshold: 3,
            pending_queue_limit: 1_000,
            confidence_ceiling: 0.7,
            cache_hit_factor: 0.9,
        }
    }
}

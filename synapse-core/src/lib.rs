//! Synapse Core - Shared Data Model
//!
//! Core types for the Synapse task delegation and real-time routing engine.
//!
//! # Architecture
//!
//! - `id` - Typed identifiers for tasks, agents, and delegations
//! - `task` - Task records, priorities, and parameter access
//! - `agent` - Agent records, kinds, statuses, and capability maps
//! - `complexity` - Multi-factor task complexity scores
//! - `requirements` - Derived task requirements (skills, thresholds, safety)
//! - `delegation` - Delegation records binding tasks to agents
//! - `routing` - Real-time routing requests and decisions
//! - `config` - Engine configuration with TOML loading
//! - `error` - Core error type

#![warn(missing_docs)]

pub mod agent;
pub mod complexity;
pub mod config;
pub mod delegation;
pub mod error;
pub mod id;
pub mod requirements;
pub mod routing;
pub mod task;

pub use agent::{Agent, AgentKind, AgentSnapshot, AgentStatus};
pub use complexity::{ComplexityCategory, ComplexityFactors, ComplexityScore};
pub use config::SynapseConfig;
pub use delegation::{Delegation, DelegationOutcome};
pub use error::{CoreError, Result};
pub use id::{AgentId, DelegationId, TaskId};
pub use requirements::TaskRequirements;
pub use routing::{RouteRequest, RouteStrategy, RoutingDecision};
pub use task::{Task, TaskPriority};

/// Synapse core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

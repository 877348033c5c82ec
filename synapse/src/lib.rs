//! Synapse - Task Delegation and Real-Time Routing Engine
//!
//! Synapse assigns incoming tasks to the best-fit executor out of a
//! heterogeneous, dynamically available agent pool, and serves
//! latency-sensitive routing decisions through a cache-first,
//! degrade-gracefully pipeline with a local autonomous fallback when the
//! central decision authority is unreachable.
//!
//! # Architecture
//!
//! - `registry` - Shared agent pool: the source of truth for load and availability
//! - `delegation` - Task analysis, capability matching, ranking, and assignment
//! - `routing` - Bounded-latency router with a time-bounded decision cache
//! - `autonomy` - Connectivity supervision and the local decision path
//! - `history` - Bounded per-agent outcome records feeding the scorers
//! - `events` - Fire-and-forget lifecycle event bus
//!
//! All shared state is owned by injected service objects with internal
//! synchronization; nothing in this crate is a package-level singleton.

#![warn(missing_docs)]

pub mod autonomy;
pub mod delegation;
pub mod events;
pub mod history;
pub mod registry;
pub mod routing;

pub use autonomy::{AuthorityLink, AutonomyManager, AutonomyState};
pub use delegation::{DelegationCoordinator, DelegationError};
pub use events::{EventBus, LifecycleEvent};
pub use history::PerformanceHistory;
pub use registry::AgentRegistry;
pub use routing::RealtimeRouter;

/// Synapse version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

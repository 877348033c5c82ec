//! Real-Time Routing
//!
//! Bounded-latency routing decisions over the shared agent registry:
//! cache-first lookup, tier-appropriate strategy computation, and a
//! degraded fallback that always answers within the deadline tier.

pub mod cache;
pub mod router;

pub use cache::{CacheStatistics, DecisionCache};
pub use router::{RealtimeRouter, RouterStatistics};

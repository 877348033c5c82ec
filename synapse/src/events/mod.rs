//! Lifecycle Event Bus
//!
//! Fire-and-forget publication of delegation lifecycle events to any number
//! of subscribers. Emission never blocks and never fails the hot path: a bus
//! with no subscribers silently drops events.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use synapse_core::{AgentId, DelegationId, TaskId};

/// Default buffered capacity per subscriber.
const DEFAULT_CAPACITY: usize = 1024;

/// Structured lifecycle events emitted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum LifecycleEvent {
    /// A task was delegated to an agent
    Delegated {
        /// Delegation record id
        delegation_id: DelegationId,
        /// Delegated task
        task_id: TaskId,
        /// Assigned agent
        agent_id: AgentId,
        /// Assignment confidence
        confidence: f64,
    },

    /// An agent started executing a task
    TaskStarted {
        /// Delegation record id
        delegation_id: DelegationId,
        /// Executing agent
        agent_id: AgentId,
    },

    /// A task completed successfully
    TaskCompleted {
        /// Delegation record id
        delegation_id: DelegationId,
        /// Executing agent
        agent_id: AgentId,
        /// Observed duration in seconds
        duration_secs: f64,
    },

    /// A task failed or was cancelled
    TaskFailed {
        /// Delegation record id
        delegation_id: DelegationId,
        /// Executing agent
        agent_id: AgentId,
        /// Failure description
        reason: String,
    },

    /// An engine component changed state (e.g. connectivity)
    StateChanged {
        /// Component name
        component: String,
        /// Previous state
        from: String,
        /// New state
        to: String,
    },
}

/// Broadcast bus for lifecycle events.
pub struct EventBus {
    tx: broadcast::Sender<LifecycleEvent>,
}

impl EventBus {
    /// Create a bus with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a bus with an explicit per-subscriber capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event.
    ///
    /// Delivery is best-effort; an error only means there are currently no
    /// subscribers, which is not a failure of the emitting path.
    pub fn emit(&self, event: LifecycleEvent) {
        debug!(?event, "Emitting lifecycle event");
        let _ = self.tx.send(event);
    }

    /// Subscribe to the event stream
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

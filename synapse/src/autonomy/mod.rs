//! Autonomy Manager
//!
//! Supervises connectivity to the authoritative decision service. While the
//! authority is reachable, routing flows through the normal path. After
//! enough consecutive probe failures the manager enters autonomous mode:
//! decisions are made locally with a reduced confidence ceiling and queued
//! for reconciliation, and a reconnect probe keeps running in the
//! background. On reconnect the pending queue is drained and forwarded,
//! then the manager returns to the connected state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::events::{EventBus, LifecycleEvent};
use crate::routing::RealtimeRouter;
use synapse_core::config::AutonomyConfig;
use synapse_core::{RouteRequest, RoutingDecision};

/// Connectivity state of the decision-authority link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutonomyState {
    /// The decision authority is reachable
    Connected,

    /// Operating on local logic only
    Autonomous,
}

impl AutonomyState {
    fn label(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Autonomous => "autonomous",
        }
    }
}

/// Categories of decisions made locally in autonomous mode.
///
/// A closed set: each kind has a fixed local handler, checked exhaustively
/// at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    /// Task-to-agent routing
    TaskRouting,

    /// Safety responses to hazard signals
    SafetyResponse,

    /// Resource grant/deny decisions
    ResourceAllocation,
}

/// Safety action chosen by the local safety handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyAction {
    /// Continue operating
    Proceed,

    /// Halt and hold position until cleared
    Pause,
}

/// Resource allocation verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationDecision {
    /// The requested units are granted
    Grant,

    /// The request exceeds what is available
    Deny,
}

/// A decision made while autonomous, awaiting reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingDecision {
    /// Which local handler produced it
    pub kind: DecisionKind,

    /// The decision payload
    pub payload: serde_json::Value,

    /// Confidence at decision time
    pub confidence: f64,

    /// When it was decided
    pub decided_at: DateTime<Utc>,
}

/// Link to the authoritative decision service.
///
/// Failures here are expected and handled; they are never fatal.
#[async_trait]
pub trait AuthorityLink: Send + Sync {
    /// Connectivity check
    async fn probe(&self) -> bool;

    /// Best-effort forwarding of a locally made decision
    async fn forward(&self, decision: &PendingDecision) -> anyhow::Result<()>;
}

/// Supervises connectivity and the local decision path.
pub struct AutonomyManager {
    link: Arc<dyn AuthorityLink>,
    router: Arc<RealtimeRouter>,
    events: Arc<EventBus>,
    config: AutonomyConfig,

    state: RwLock<AutonomyState>,
    consecutive_failures: AtomicU32,
    pending: Mutex<VecDeque<PendingDecision>>,
    dropped_decisions: AtomicU64,
    shutdown_tx: watch::Sender<bool>,
}

impl AutonomyManager {
    /// Create a manager; starts connected.
    pub fn new(
        link: Arc<dyn AuthorityLink>,
        router: Arc<RealtimeRouter>,
        events: Arc<EventBus>,
        config: AutonomyConfig,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            link,
            router,
            events,
            config,
            state: RwLock::new(AutonomyState::Connected),
            consecutive_failures: AtomicU32::new(0),
            pending: Mutex::new(VecDeque::new()),
            dropped_decisions: AtomicU64::new(0),
            shutdown_tx,
        }
    }

    /// Current connectivity state
    pub fn state(&self) -> AutonomyState {
        *self.state.read()
    }

    /// Whether the manager is in autonomous mode
    pub fn is_autonomous(&self) -> bool {
        self.state() == AutonomyState::Autonomous
    }

    /// Number of decisions awaiting reconciliation
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Decisions dropped because the pending queue was full
    pub fn dropped_decisions(&self) -> u64 {
        self.dropped_decisions.load(Ordering::Relaxed)
    }

    // ========================================================================
    // Probe loop
    // ========================================================================

    /// Start the background probe loop.
    ///
    /// The loop runs until [`AutonomyManager::shutdown`] is called; it
    /// doubles as the reconnect probe while autonomous.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        let mut stop = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_millis(manager.config.probe_interval_ms.max(1)));
            info!("Autonomy probe loop started");
            loop {
                tokio::select! {
                    _ = ticker.tick() => manager.probe_once().await,
                    _ = stop.changed() => {
                        info!("Autonomy probe loop stopping");
                        break;
                    }
                }
            }
        })
    }

    /// Stop the probe loop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Run one connectivity probe and apply state transitions.
    ///
    /// Exposed so tests and callers can drive probing deterministically.
    pub async fn probe_once(&self) {
        if self.link.probe().await {
            self.on_probe_success().await;
        } else {
            self.on_probe_failure();
        }
    }

    fn on_probe_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(failures, "Authority probe failed");

        if failures >= self.config.failure_threshold
            && self.state() == AutonomyState::Connected
        {
            self.transition(AutonomyState::Autonomous);
        }
    }

    async fn on_probe_success(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);

        if self.state() == AutonomyState::Autonomous {
            self.drain_pending().await;
            self.transition(AutonomyState::Connected);
        }
    }

    fn transition(&self, to: AutonomyState) {
        let from = {
            let mut state = self.state.write();
            let from = *state;
            *state = to;
            from
        };
        if from == to {
            return;
        }

        match to {
            AutonomyState::Autonomous => {
                warn!("Decision authority unreachable, entering autonomous mode")
            }
            AutonomyState::Connected => info!("Decision authority reachable, reconnected"),
        }
        self.events.emit(LifecycleEvent::StateChanged {
            component: "autonomy".to_string(),
            from: from.label().to_string(),
            to: to.label().to_string(),
        });
    }

    /// Forward everything in the pending queue, then clear it.
    async fn drain_pending(&self) {
        let drained: Vec<PendingDecision> = {
            let mut pending = self.pending.lock();
            pending.drain(..).collect()
        };
        if drained.is_empty() {
            return;
        }

        info!(count = drained.len(), "Forwarding pending autonomous decisions");
        for decision in &drained {
            if let Err(e) = self.link.forward(decision).await {
                warn!(error = %e, "Failed to forward pending decision");
            }
        }
    }

    // ========================================================================
    // Decision paths
    // ========================================================================

    /// Route a request through the current mode.
    ///
    /// Connected mode defers to the router unchanged. Autonomous mode
    /// applies the reduced confidence ceiling (cache hits are discounted
    /// further) and queues the decision for reconciliation.
    pub fn route(&self, request: &RouteRequest) -> RoutingDecision {
        let mut decision = self.router.route(request);
        if !self.is_autonomous() {
            return decision;
        }

        let ceiling = self.config.confidence_ceiling;
        decision.confidence = if decision.cache_hit {
            ceiling * self.config.cache_hit_factor
        } else {
            decision.confidence.min(ceiling)
        };

        self.enqueue(DecisionKind::TaskRouting, &decision, decision.confidence);
        decision
    }

    /// Local safety handler.
    ///
    /// A confirmed all-clear proceeds; a confirmed hazard pauses; an
    /// ambiguous signal always takes the conservative action.
    pub fn decide_safety(&self, hazard_confirmed: Option<bool>) -> SafetyAction {
        let action = match hazard_confirmed {
            Some(false) => SafetyAction::Proceed,
            Some(true) | None => SafetyAction::Pause,
        };

        if self.is_autonomous() {
            self.enqueue(
                DecisionKind::SafetyResponse,
                &action,
                self.config.confidence_ceiling,
            );
        }
        action
    }

    /// Local resource-allocation handler: grant iff the request fits.
    pub fn decide_allocation(&self, requested: u64, available: u64) -> AllocationDecision {
        let decision = if requested <= available {
            AllocationDecision::Grant
        } else {
            AllocationDecision::Deny
        };

        if self.is_autonomous() {
            self.enqueue(
                DecisionKind::ResourceAllocation,
                &decision,
                self.config.confidence_ceiling,
            );
        }
        decision
    }

    fn enqueue<T: Serialize>(&self, kind: DecisionKind, payload: &T, confidence: f64) {
        let payload = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Could not serialize pending decision");
                return;
            }
        };

        let mut pending = self.pending.lock();
        if pending.len() >= self.config.pending_queue_limit {
            pending.pop_front();
            self.dropped_decisions.fetch_add(1, Ordering::Relaxed);
            warn!("Pending-sync queue full, dropped oldest decision");
        }
        pending.push_back(PendingDecision {
            kind,
            payload,
            confidence,
            decided_at: Utc::now(),
        });
    }
}

//! Bounded-latency routing.
//!
//! Every call returns a decision: cache hit, tier-appropriate computation,
//! or a degraded fallback. Missing the tier's latency target is logged as
//! an observability event, never surfaced as an error, and no internal
//! fault propagates to the caller.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::cache::DecisionCache;
use crate::registry::AgentRegistry;
use chrono::Utc;
use synapse_core::config::RouterConfig;
use synapse_core::{
    AgentSnapshot, AgentStatus, RouteRequest, RouteStrategy, RoutingDecision, TaskPriority,
};

/// Capability key consulted by the safety-critical strategy.
const SAFETY_CAPABILITY: &str = "safety_protocols";

/// Capability weight in the critical-tier blend.
const CRITICAL_CAPABILITY_WEIGHT: f64 = 0.7;

/// Availability weight in the critical-tier blend.
const CRITICAL_AVAILABILITY_WEIGHT: f64 = 0.3;

/// Rule table for the normal tier: when a request declares the skill, route
/// to the strongest holder of that skill. First matching rule wins.
const RULE_TABLE: &[&str] = &[
    "precision_control",
    "navigation",
    "diagnostics",
    "data_analysis",
];

/// Confidence per computed strategy.
fn strategy_confidence(strategy: RouteStrategy) -> f64 {
    match strategy {
        RouteStrategy::SafetyCapability => 0.9,
        RouteStrategy::CapabilityLoadBlend => 0.85,
        RouteStrategy::RuleTable => 0.75,
        RouteStrategy::CheapestAvailable => 0.6,
        RouteStrategy::Fallback => 0.1,
    }
}

/// Internal computation faults; always converted into fallback decisions.
#[derive(Debug, thiserror::Error)]
enum ComputeError {
    #[error("no agents available")]
    EmptyPool,
}

/// Router counter snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterStatistics {
    /// Total routing decisions served
    pub decisions: u64,

    /// Decisions that missed their tier's latency target
    pub target_overruns: u64,

    /// Decisions answered with the degraded fallback strategy
    pub fallbacks: u64,
}

/// Latency-tier-aware router over the shared agent registry.
pub struct RealtimeRouter {
    registry: Arc<AgentRegistry>,
    cache: DecisionCache,
    config: RouterConfig,
    decisions: AtomicU64,
    target_overruns: AtomicU64,
    fallbacks: AtomicU64,
}

impl RealtimeRouter {
    /// Create a router
    pub fn new(registry: Arc<AgentRegistry>, config: RouterConfig) -> Self {
        let cache = DecisionCache::new(
            Duration::from_secs(config.cache_ttl_secs),
            config.cache_capacity,
        );
        Self {
            registry,
            cache,
            config,
            decisions: AtomicU64::new(0),
            target_overruns: AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
        }
    }

    /// Route a request within its priority tier's latency target.
    ///
    /// Always returns a decision; the worst outcome is a low-confidence
    /// fallback.
    pub fn route(&self, request: &RouteRequest) -> RoutingDecision {
        let started = Instant::now();
        let target = self.config.target_for(request.priority);
        self.decisions.fetch_add(1, Ordering::Relaxed);

        // Advisory snapshot; offline agents never receive routed work.
        let pool: Vec<AgentSnapshot> = self
            .registry
            .snapshot()
            .into_iter()
            .filter(|snapshot| snapshot.agent.status != AgentStatus::Offline)
            .collect();

        let agent_ids: Vec<_> = pool.iter().map(|s| s.agent.id.clone()).collect();
        let key = DecisionCache::fingerprint(request, &agent_ids);

        if let Some(hit) = self.cache.get(&key) {
            debug!(task_type = %request.task_type, "Decision served from cache");
            self.observe_latency(request, started, target);
            return hit;
        }

        // The cache check consumed the whole budget: degrade immediately
        // rather than start a computation that cannot land in time.
        if started.elapsed() >= target {
            self.observe_latency(request, started, target);
            return self.fallback(&pool);
        }

        let decision = match self.compute(request, &pool) {
            Ok(decision) => {
                self.cache.insert(key, decision.clone());
                decision
            }
            Err(e) => {
                warn!(task_type = %request.task_type, error = %e, "Routing computation failed, degrading");
                self.fallback(&pool)
            }
        };

        self.observe_latency(request, started, target);
        decision
    }

    /// Cache counter snapshot
    pub fn cache_statistics(&self) -> super::cache::CacheStatistics {
        self.cache.statistics()
    }

    /// Router counter snapshot
    pub fn statistics(&self) -> RouterStatistics {
        RouterStatistics {
            decisions: self.decisions.load(Ordering::Relaxed),
            target_overruns: self.target_overruns.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
        }
    }

    // ========================================================================
    // Strategies
    // ========================================================================

    fn compute(
        &self,
        request: &RouteRequest,
        pool: &[AgentSnapshot],
    ) -> Result<RoutingDecision, ComputeError> {
        if pool.is_empty() {
            return Err(ComputeError::EmptyPool);
        }

        let (snapshot, strategy) = match request.priority {
            // Correctness over efficiency: the strongest safety capability
            // wins regardless of load.
            TaskPriority::SafetyCritical => {
                let best = argmax(pool, |s| s.agent.proficiency(SAFETY_CAPABILITY))
                    .ok_or(ComputeError::EmptyPool)?;
                (best, RouteStrategy::SafetyCapability)
            }

            TaskPriority::Critical => {
                let best = argmax(pool, |s| {
                    requested_capability(s, request) * CRITICAL_CAPABILITY_WEIGHT
                        + s.availability() * CRITICAL_AVAILABILITY_WEIGHT
                })
                .ok_or(ComputeError::EmptyPool)?;
                (best, RouteStrategy::CapabilityLoadBlend)
            }

            TaskPriority::High | TaskPriority::Normal | TaskPriority::Low => {
                match self.rule_table_pick(request, pool) {
                    Some(best) => (best, RouteStrategy::RuleTable),
                    None => {
                        let best = argmax(pool, |s| s.availability())
                            .ok_or(ComputeError::EmptyPool)?;
                        (best, RouteStrategy::CheapestAvailable)
                    }
                }
            }
        };

        Ok(RoutingDecision {
            agent_id: Some(snapshot.agent.id.clone()),
            strategy,
            confidence: strategy_confidence(strategy),
            decided_at: Utc::now(),
            cache_hit: false,
        })
    }

    /// First matching rule wins; a rule only applies when some agent
    /// actually holds the skill.
    fn rule_table_pick<'a>(
        &self,
        request: &RouteRequest,
        pool: &'a [AgentSnapshot],
    ) -> Option<&'a AgentSnapshot> {
        for rule_skill in RULE_TABLE {
            if !request.required_skills.contains(*rule_skill) {
                continue;
            }
            let holders: Vec<&AgentSnapshot> = pool
                .iter()
                .filter(|s| s.agent.proficiency(rule_skill) > 0.0)
                .collect();
            if let Some(best) = argmax_ref(&holders, |s| s.agent.proficiency(rule_skill)) {
                return Some(best);
            }
        }
        None
    }

    fn fallback(&self, pool: &[AgentSnapshot]) -> RoutingDecision {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
        let agent_id = argmax(pool, |s| s.availability()).map(|s| s.agent.id.clone());
        RoutingDecision::fallback(agent_id)
    }

    fn observe_latency(&self, request: &RouteRequest, started: Instant, target: Duration) {
        let elapsed = started.elapsed();
        if elapsed > target {
            self.target_overruns.fetch_add(1, Ordering::Relaxed);
            warn!(
                task_type = %request.task_type,
                priority = ?request.priority,
                elapsed_us = elapsed.as_micros() as u64,
                target_us = target.as_micros() as u64,
                "Routing decision exceeded latency target"
            );
        }
    }
}

/// First-seen argmax, so equal scores cannot flip the decision between runs.
fn argmax<F>(pool: &[AgentSnapshot], score: F) -> Option<&AgentSnapshot>
where
    F: Fn(&AgentSnapshot) -> f64,
{
    let mut best: Option<(&AgentSnapshot, f64)> = None;
    for snapshot in pool {
        let value = score(snapshot);
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((snapshot, value)),
        }
    }
    best.map(|(snapshot, _)| snapshot)
}

fn argmax_ref<'a, F>(pool: &[&'a AgentSnapshot], score: F) -> Option<&'a AgentSnapshot>
where
    F: Fn(&AgentSnapshot) -> f64,
{
    let mut best: Option<(&'a AgentSnapshot, f64)> = None;
    for snapshot in pool {
        let value = score(snapshot);
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((snapshot, value)),
        }
    }
    best.map(|(snapshot, _)| snapshot)
}

/// Mean proficiency over the request's declared skills; overall mean when
/// the request declares none.
fn requested_capability(snapshot: &AgentSnapshot, request: &RouteRequest) -> f64 {
    if request.required_skills.is_empty() {
        return snapshot.agent.mean_proficiency();
    }
    let sum: f64 = request
        .required_skills
        .iter()
        .map(|skill| snapshot.agent.proficiency(skill))
        .sum();
    sum / request.required_skills.len() as f64
}

//! Decision caching with TTL and oldest-first eviction.
//!
//! Entries are keyed by a deterministic fingerprint of the request shape
//! and the available agent set, so an identical situation within the TTL is
//! served without recomputation. Once capacity is reached the oldest entry
//! is evicted first; with a fixed TTL, insertion order is timestamp order.

use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

use synapse_core::{AgentId, RouteRequest, RoutingDecision};

/// A cached decision with its insertion time.
struct CacheEntry {
    decision: RoutingDecision,
    inserted_at: Instant,
}

/// Cache hit/miss/eviction counters.
#[derive(Debug, Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    inserts: AtomicU64,
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStatistics {
    /// Lookups served from cache
    pub hits: u64,

    /// Lookups that missed or had expired
    pub misses: u64,

    /// Entries evicted by capacity or expiry
    pub evictions: u64,

    /// Entries stored
    pub inserts: u64,
}

/// Time-bounded store of routing decisions.
pub struct DecisionCache {
    entries: DashMap<String, CacheEntry>,
    insertion_order: RwLock<VecDeque<String>>,
    ttl: Duration,
    capacity: usize,
    counters: CacheCounters,
}

impl DecisionCache {
    /// Create a cache with the given TTL and capacity
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            insertion_order: RwLock::new(VecDeque::new()),
            ttl,
            capacity: capacity.max(1),
            counters: CacheCounters::default(),
        }
    }

    /// Deterministic fingerprint of (task type, priority, task data,
    /// required skills, available agent set).
    ///
    /// Request maps and sets are ordered; agent ids are sorted here, so the
    /// same situation always hashes identically.
    pub fn fingerprint(request: &RouteRequest, agent_ids: &[AgentId]) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(request.task_type.as_bytes());
        hasher.update(format!("{:?}", request.priority).as_bytes());
        for (key, value) in &request.task_data {
            hasher.update(key.as_bytes());
            hasher.update(value.to_string().as_bytes());
        }
        for skill in &request.required_skills {
            hasher.update(skill.as_bytes());
        }

        let mut sorted: Vec<&AgentId> = agent_ids.iter().collect();
        sorted.sort();
        for id in sorted {
            hasher.update(id.as_str().as_bytes());
        }

        hasher.finalize().to_hex().to_string()
    }

    /// Look up a still-valid decision.
    ///
    /// Expired entries are removed and count as misses. Returned decisions
    /// are marked as cache hits.
    pub fn get(&self, key: &str) -> Option<RoutingDecision> {
        if let Some(entry) = self.entries.get(key) {
            if entry.inserted_at.elapsed() <= self.ttl {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                let mut decision = entry.decision.clone();
                decision.cache_hit = true;
                return Some(decision);
            }
            drop(entry);
            self.remove(key);
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store a decision, evicting oldest entries at capacity.
    pub fn insert(&self, key: String, decision: RoutingDecision) {
        while self.entries.len() >= self.capacity {
            let oldest = self.insertion_order.write().pop_front();
            match oldest {
                Some(old_key) => {
                    if self.entries.remove(&old_key).is_some() {
                        self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                        debug!(key = %old_key, "Evicted oldest cache entry");
                    }
                }
                None => break,
            }
        }

        self.insertion_order.write().push_back(key.clone());
        self.entries.insert(
            key,
            CacheEntry {
                decision,
                inserted_at: Instant::now(),
            },
        );
        self.counters.inserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Remove an entry.
    pub fn remove(&self, key: &str) {
        if self.entries.remove(key).is_some() {
            let mut order = self.insertion_order.write();
            if let Some(position) = order.iter().position(|k| k == key) {
                order.remove(position);
            }
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Clear all entries.
    pub fn clear(&self) {
        let count = self.entries.len() as u64;
        self.entries.clear();
        self.insertion_order.write().clear();
        self.counters.evictions.fetch_add(count, Ordering::Relaxed);
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Counter snapshot
    pub fn statistics(&self) -> CacheStatistics {
        CacheStatistics {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            inserts: self.counters.inserts.load(Ordering::Relaxed),
        }
    }
}

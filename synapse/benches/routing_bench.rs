//! Benchmarks for the real-time routing hot path.
//!
//! This benchmark suite measures:
//! - Cache-hit decisions (the latency-tier fast path)
//! - Cache-miss decisions per strategy tier
//! - Request fingerprinting over growing agent pools

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::json;
use std::collections::HashMap;
use std::hint::black_box;
use std::sync::Arc;

use synapse::registry::AgentRegistry;
use synapse::routing::{DecisionCache, RealtimeRouter};
use synapse_core::config::{RegistryConfig, RouterConfig};
use synapse_core::{Agent, AgentKind, RouteRequest, TaskPriority};

fn seeded_registry(agents: usize) -> Arc<AgentRegistry> {
    let registry = Arc::new(AgentRegistry::new(RegistryConfig::default()));
    for index in 0..agents {
        let mut caps = HashMap::new();
        caps.insert("navigation".to_string(), 0.5 + (index % 5) as f64 * 0.1);
        caps.insert("safety_protocols".to_string(), 0.4 + (index % 6) as f64 * 0.1);
        caps.insert("precision_control".to_string(), 0.6 + (index % 4) as f64 * 0.1);
        registry.register(Agent::new(format!("agent-{index}"), AgentKind::Robot, caps));
    }
    registry
}

fn bench_cache_hit(c: &mut Criterion) {
    let router = RealtimeRouter::new(seeded_registry(50), RouterConfig::default());
    let mut request = RouteRequest::new("transport", TaskPriority::Normal);
    request.required_skills.insert("navigation".to_string());

    // Warm the cache once; every measured call is a hit
    router.route(&request);

    c.bench_function("route_cache_hit", |b| {
        b.iter(|| black_box(router.route(black_box(&request))))
    });
}

fn bench_cache_miss_by_tier(c: &mut Criterion) {
    let mut group = c.benchmark_group("route_cache_miss");
    for (label, priority) in [
        ("safety_critical", TaskPriority::SafetyCritical),
        ("critical", TaskPriority::Critical),
        ("normal", TaskPriority::Normal),
    ] {
        let router = RealtimeRouter::new(seeded_registry(50), RouterConfig::default());
        let mut counter = 0u64;

        group.bench_function(BenchmarkId::from_parameter(label), |b| {
            b.iter(|| {
                // A unique payload per iteration defeats the cache
                counter += 1;
                let mut request = RouteRequest::new("transport", priority);
                request.task_data.insert("seq".to_string(), json!(counter));
                request.required_skills.insert("precision_control".to_string());
                black_box(router.route(black_box(&request)))
            })
        });
    }
    group.finish();
}

fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");
    for pool_size in [10usize, 100, 1000] {
        let registry = seeded_registry(pool_size);
        let ids: Vec<_> = registry
            .snapshot()
            .into_iter()
            .map(|s| s.agent.id)
            .collect();
        let mut request = RouteRequest::new("transport", TaskPriority::Normal);
        request.task_data.insert("zone".to_string(), json!("b4"));

        group.bench_with_input(BenchmarkId::from_parameter(pool_size), &ids, |b, ids| {
            b.iter(|| black_box(DecisionCache::fingerprint(black_box(&request), black_box(ids))))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_cache_hit, bench_cache_miss_by_tier, bench_fingerprint);
criterion_main!(benches);

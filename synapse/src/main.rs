//! Synapse demo binary.
//!
//! Seeds an agent pool, delegates a batch of synthetic tasks, routes a few
//! latency-sensitive requests, and prints the resulting statistics.

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use synapse::autonomy::{AuthorityLink, AutonomyManager, PendingDecision};
use synapse::delegation::{DelegationCoordinator, DelegationError};
use synapse::events::EventBus;
use synapse::history::PerformanceHistory;
use synapse::registry::AgentRegistry;
use synapse::routing::RealtimeRouter;
use synapse_core::{
    Agent, AgentKind, DelegationOutcome, RouteRequest, SynapseConfig, Task, TaskPriority,
};

#[derive(Parser, Debug)]
#[command(name = "synapse", version, about = "Task delegation and real-time routing engine")]
struct Cli {
    /// Number of agents to seed
    #[arg(long, default_value_t = 6)]
    agents: usize,

    /// Number of synthetic tasks to delegate
    #[arg(long, default_value_t = 10)]
    tasks: usize,

    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

/// In-process authority stand-in: always reachable, forwarding is a log line.
struct LoopbackAuthority;

#[async_trait]
impl AuthorityLink for LoopbackAuthority {
    async fn probe(&self) -> bool {
        true
    }

    async fn forward(&self, decision: &PendingDecision) -> Result<()> {
        info!(kind = ?decision.kind, "Forwarded reconciled decision");
        Ok(())
    }
}

fn seed_agents(registry: &AgentRegistry, count: usize) {
    let profiles: [(&str, AgentKind, &[(&str, f64)]); 3] = [
        (
            "assembler",
            AgentKind::Robot,
            &[
                ("precision_control", 0.95),
                ("mechanical_assembly", 0.9),
                ("quality_inspection", 0.85),
                ("safety_protocols", 0.8),
                ("emergency_stop", 0.9),
                ("hazard_awareness", 0.85),
            ],
        ),
        (
            "inspector",
            AgentKind::Software,
            &[
                ("visual_inspection", 0.9),
                ("defect_detection", 0.95),
                ("reporting", 0.9),
                ("data_analysis", 0.8),
                ("hazard_awareness", 0.8),
                ("general_operations", 0.7),
            ],
        ),
        (
            "operator",
            AgentKind::Human,
            &[
                ("navigation", 0.85),
                ("load_handling", 0.8),
                ("diagnostics", 0.75),
                ("repair", 0.8),
                ("safety_procedures", 0.9),
                ("general_operations", 0.85),
                ("safety_protocols", 0.9),
                ("emergency_stop", 0.95),
                ("hazard_awareness", 0.9),
            ],
        ),
    ];

    for index in 0..count {
        let (name, kind, skills) = &profiles[index % profiles.len()];
        let caps: HashMap<String, f64> = skills.iter().map(|(s, p)| (s.to_string(), *p)).collect();
        let mut agent = Agent::new(format!("{name}-{index}"), *kind, caps);
        agent.reliability = 0.8 + 0.03 * (index % 5) as f64;
        registry.register(agent);
    }
}

fn synthetic_task(index: usize) -> Task {
    match index % 3 {
        0 => Task::builder("assembly")
            .priority(TaskPriority::Normal)
            .parameter("precision_tolerance", json!(0.05))
            .parameter("requires_coordination", json!(true))
            .parameter("coordinating_agents", json!(2))
            .deadline_secs(600)
            .build(),
        1 => Task::builder("inspection")
            .priority(TaskPriority::High)
            .parameter("hazards", json!(["dust"]))
            .build(),
        _ => Task::builder("maintenance")
            .priority(TaskPriority::Critical)
            .parameter("hazards", json!(["high_voltage", "moving_parts"]))
            .parameter("resources", json!(["lift", "toolkit"]))
            .deadline_secs(1200)
            .build(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SynapseConfig::load(path)?,
        None => SynapseConfig::load_default()?,
    };

    info!(version = synapse::VERSION, agents = cli.agents, tasks = cli.tasks, "Starting synapse demo");

    let registry = Arc::new(AgentRegistry::new(config.registry.clone()));
    let history = Arc::new(PerformanceHistory::new(config.delegation.history_window));
    let events = Arc::new(EventBus::new());
    let coordinator = Arc::new(DelegationCoordinator::new(
        registry.clone(),
        history.clone(),
        events.clone(),
        config.delegation.clone(),
    ));
    let router = Arc::new(RealtimeRouter::new(registry.clone(), config.router.clone()));
    let autonomy = Arc::new(AutonomyManager::new(
        Arc::new(LoopbackAuthority),
        router.clone(),
        events.clone(),
        config.autonomy.clone(),
    ));

    // Log the lifecycle stream while the demo runs
    let mut event_rx = events.subscribe();
    let event_task = tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            info!(?event, "lifecycle");
        }
    });

    let probe_task = autonomy.start();

    // Periodic heartbeat sweep with an explicit stop signal
    let (sweep_stop, mut sweep_stop_rx) = tokio::sync::watch::channel(false);
    let sweep_registry = registry.clone();
    let heartbeat_timeout = std::time::Duration::from_secs(config.registry.heartbeat_timeout_secs);
    let sweep_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(heartbeat_timeout / 2);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let stale = sweep_registry.mark_stale_offline(heartbeat_timeout);
                    if !stale.is_empty() {
                        warn!(count = stale.len(), "Marked stale agents offline");
                    }
                }
                _ = sweep_stop_rx.changed() => break,
            }
        }
    });

    seed_agents(&registry, cli.agents);

    // Delegate a batch of synthetic tasks and immediately complete them
    let mut delegated = 0usize;
    for index in 0..cli.tasks {
        let task = synthetic_task(index);
        match coordinator.delegate(&task) {
            Ok(delegation) => {
                delegated += 1;
                coordinator.complete(
                    &delegation.id,
                    DelegationOutcome::Completed {
                        duration_secs: 30.0 + index as f64,
                        quality: 0.9,
                    },
                )?;
            }
            Err(DelegationError::NoSuitableAgent { task_id }) => {
                warn!(%task_id, "No suitable agent");
            }
            Err(e) => return Err(e.into()),
        }
    }

    // Exercise the realtime path across tiers, twice to show cache hits
    let mut requests = Vec::new();
    for priority in [
        TaskPriority::SafetyCritical,
        TaskPriority::Critical,
        TaskPriority::Normal,
    ] {
        let mut request = RouteRequest::new("assembly", priority);
        request.required_skills.insert("precision_control".to_string());
        requests.push(request);
    }
    for request in &requests {
        for _ in 0..2 {
            let decision = autonomy.route(request);
            info!(
                priority = ?request.priority,
                agent = ?decision.agent_id,
                strategy = %decision.strategy,
                cache_hit = decision.cache_hit,
                confidence = decision.confidence,
                "Routed"
            );
        }
    }

    let registry_stats = registry.statistics();
    let router_stats = router.statistics();
    let cache_stats = router.cache_statistics();
    info!(
        delegated,
        agents = registry_stats.total_agents,
        available = registry_stats.available_agents,
        decisions = router_stats.decisions,
        cache_hits = cache_stats.hits,
        overruns = router_stats.target_overruns,
        "Demo complete"
    );

    autonomy.shutdown();
    probe_task.await?;
    let _ = sweep_stop.send(true);
    sweep_task.await?;
    event_task.abort();

    Ok(())
}

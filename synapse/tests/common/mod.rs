//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use synapse::delegation::DelegationCoordinator;
use synapse::events::EventBus;
use synapse::history::PerformanceHistory;
use synapse::registry::AgentRegistry;
use synapse::routing::RealtimeRouter;
use synapse_core::config::SynapseConfig;
use synapse_core::{Agent, AgentKind};

/// Everything a test scenario needs, wired the way the binary wires it.
pub struct Harness {
    pub registry: Arc<AgentRegistry>,
    pub history: Arc<PerformanceHistory>,
    pub events: Arc<EventBus>,
    pub coordinator: Arc<DelegationCoordinator>,
    pub router: Arc<RealtimeRouter>,
    pub config: SynapseConfig,
}

impl Harness {
    pub fn new() -> Self {
        let config = SynapseConfig::default();
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

        Self {
            registry,
            history,
            events,
            coordinator,
            router,
            config,
        }
    }
}

/// An agent proficient in the named skills.
pub fn agent_with(name: &str, skills: &[(&str, f64)], reliability: f64) -> Agent {
    let caps: HashMap<String, f64> = skills.iter().map(|(s, p)| (s.to_string(), *p)).collect();
    let mut agent = Agent::new(name, AgentKind::Robot, caps);
    agent.reliability = reliability;
    agent
}

/// An agent strong at every assembly-pipeline skill.
pub fn assembly_agent(name: &str) -> Agent {
    agent_with(
        name,
        &[
            ("precision_control", 0.95),
            ("mechanical_assembly", 0.9),
            ("quality_inspection", 0.9),
            ("safety_protocols", 0.85),
            ("emergency_stop", 0.9),
            ("hazard_awareness", 0.85),
            ("general_operations", 0.8),
        ],
        0.9,
    )
}

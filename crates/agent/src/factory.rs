//! Agent factory: string-keyed construction of the built-in agents.

use std::sync::Arc;

use aulabot_config::AppConfig;
use aulabot_core::error::Error;
use aulabot_tools::AulaClient;
use tracing::debug;

use crate::agent::{Agent, AgentInfo};
use crate::agents::{AulaAgent, ResearchAgent};

/// Holds one instance of every agent, built once from the config.
pub struct AgentFactory {
    agents: Vec<Arc<dyn Agent>>,
}

impl AgentFactory {
    pub fn from_config(config: &AppConfig) -> Self {
        let aula = Arc::new(AulaClient::new(config.aula.clone()));
        Self::with_agents(vec![
            Arc::new(ResearchAgent::new(config)),
            Arc::new(AulaAgent::new(aula)),
        ])
    }

    /// Build from an explicit agent list. Later entries shadow earlier ones
    /// with the same type.
    pub fn with_agents(agents: Vec<Arc<dyn Agent>>) -> Self {
        let mut factory = Self { agents: Vec::new() };
        for agent in agents {
            factory.register(agent);
        }
        factory
    }

    pub fn register(&mut self, agent: Arc<dyn Agent>) {
        self.agents.retain(|a| a.agent_type() != agent.agent_type());
        debug!(agent = agent.agent_type(), "Registered agent");
        self.agents.push(agent);
    }

    pub fn create(&self, agent_type: &str) -> Result<Arc<dyn Agent>, Error> {
        self.agents
            .iter()
            .find(|a| a.agent_type() == agent_type)
            .cloned()
            .ok_or_else(|| Error::UnknownAgent(agent_type.to_string()))
    }

    pub fn available_agents(&self) -> Vec<AgentInfo> {
        self.agents.iter().map(|a| AgentInfo::of(a.as_ref())).collect()
    }
}

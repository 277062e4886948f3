//! `aulabot agents`

use std::path::Path;

use aulabot_agent::AgentFactory;

use super::load_config;

pub fn run(config_path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let agents = AgentFactory::from_config(&config).available_agents();

    if json {
        println!("{}", serde_json::to_string_pretty(&agents)?);
        return Ok(());
    }

    for agent in &agents {
        println!("  {:<16} {}", agent.agent_type, agent.name);
        println!("  {:<16} {}", "", agent.description);
        println!();
    }
    Ok(())
}

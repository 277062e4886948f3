//! `aulabot models`: models served by configured providers.

use std::path::Path;

use super::load_config;

pub fn run(config_path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let router = aulabot_providers::build_from_config(&config);
    let models = router.available_models();

    if json {
        println!("{}", serde_json::to_string_pretty(&models)?);
        return Ok(());
    }

    if models.is_empty() {
        println!("  No providers configured. Set OPENAI_API_KEY or ANTHROPIC_API_KEY.");
        return Ok(());
    }

    for model in &models {
        let marker = if model.model == config.default_model {
            "*"
        } else {
            " "
        };
        println!("  {marker} {:<32} {}", model.model, model.display_name);
    }

    for name in ["openai", "anthropic"] {
        let configured = router.get(name).is_some_and(|p| p.is_configured());
        if let Some(default) = router.default_model(name).filter(|_| configured) {
            println!("  {name} -> {default}");
        }
    }
    Ok(())
}

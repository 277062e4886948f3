//! `aulabot doctor`: diagnose configuration and credentials.

use std::path::Path;

use aulabot_config::AppConfig;
use aulabot_tools::AulaClient;

use super::config_path;

pub async fn run(explicit: Option<&Path>) -> anyhow::Result<()> {
    println!("aulabot doctor");
    println!("==============\n");

    let mut issues = 0;

    let path = config_path(explicit);
    if path.exists() {
        println!("  [ok]   Config file {}", path.display());
    } else {
        println!("  [info] No config file at {}, using defaults", path.display());
    }

    let config = match AppConfig::load_with_env(&path) {
        Ok(config) => {
            println!("  [ok]   Configuration valid");
            config
        }
        Err(e) => {
            println!("  [fail] Configuration invalid: {e}");
            println!("\n  1 issue found.");
            return Ok(());
        }
    };

    for (name, provider) in [
        ("openai", &config.providers.openai),
        ("anthropic", &config.providers.anthropic),
    ] {
        if provider.is_configured() {
            println!(
                "  [ok]   Provider {name} configured ({}, default {})",
                provider.api_url, provider.default_model
            );
        } else {
            println!("  [warn] Provider {name} has no API key");
        }
    }
    if !config.has_api_key() {
        issues += 1;
    }

    let router = aulabot_providers::build_from_config(&config);
    match router.client_for(&config.default_model) {
        Ok(client) => println!(
            "  [ok]   Default model {} via {}",
            client.model(),
            client.provider_name()
        ),
        Err(e) => {
            println!("  [fail] Default model {}: {e}", config.default_model);
            issues += 1;
        }
    }

    if config.google.is_configured() {
        println!("  [ok]   Google Search configured");
    } else {
        println!("  [warn] Google Search not configured (research agent cannot search)");
    }

    let aula = AulaClient::new(config.aula.clone());
    if aula.is_configured() {
        match aula.session().await {
            Ok(session) => println!(
                "  [ok]   Aula login succeeded ({} children)",
                session.children().len()
            ),
            Err(e) => {
                println!("  [fail] Aula login failed: {e}");
                issues += 1;
            }
        }
    } else {
        println!("  [warn] Aula credentials not set (aula_agent unavailable)");
    }

    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

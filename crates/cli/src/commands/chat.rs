//! `aulabot chat`: single-message or interactive mode.

use std::io::Write;
use std::path::Path;

use aulabot_agent::{ChatService, QueryRequest};
use aulabot_core::message::ConversationId;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{build_service, load_config};

pub async fn run(
    config_path: Option<&Path>,
    agent: Option<String>,
    model: Option<String>,
    message: Option<String>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    OPENAI_API_KEY     = 'sk-...'");
        eprintln!("    ANTHROPIC_API_KEY  = 'sk-ant-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", super::config_path(config_path).display());
        eprintln!();
        anyhow::bail!("No API key found. See above for setup instructions.");
    }

    let service = build_service(&config);
    let agent = agent.unwrap_or_else(|| config.default_agent.clone());
    let model = model.unwrap_or_else(|| config.default_model.clone());

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let request = QueryRequest::new(msg).with_agent(&agent).with_model(&model);
        let reply = service.chat(request).await;
        eprint!("\r              \r");
        println!("{}", reply?.response);
        return Ok(());
    }

    println!();
    println!("  aulabot, interactive mode");
    println!();
    println!("  Agent:     {agent}");
    println!("  Model:     {model}");
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    interactive(&service, &agent, &model).await?;

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

async fn interactive(service: &ChatService, agent: &str, model: &str) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut conversation: Option<ConversationId> = None;

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        let mut request = QueryRequest::new(line).with_agent(agent).with_model(model);
        if let Some(id) = &conversation {
            request = request.in_conversation(id.clone());
        }

        eprint!("  ...");
        match service.chat(request).await {
            Ok(reply) => {
                eprint!("\r     \r");
                println!();
                for line in reply.response.lines() {
                    println!("  Assistant > {line}");
                }
                println!();
                conversation = Some(reply.conversation_id);
            }
            Err(e) => {
                eprint!("\r     \r");
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }
    Ok(())
}

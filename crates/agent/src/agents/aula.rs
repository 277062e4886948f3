//! Aula agent: answers questions about the user's children via the portal.

use std::sync::Arc;

use aulabot_core::error::Error;
use aulabot_core::tool::ToolRegistry;
use aulabot_tools::AulaClient;
use chrono::{DateTime, Utc};

use crate::agent::{Agent, current_time_header};
use crate::parser::{PatternParser, ToolCallParser};

pub const AULA_AGENT: &str = "aula_agent";

const PROMPT: &str = "You're a helpful research assistant. You're an expert in navigating the Danish school communication system, Aula.
Only use the tools if the user is talking about the school, institution or about their kids.
Make sure to set the active child before using any of the tools (except for fetch_basic_data).

Available tools:
- set_active_child: Set which child profile we're operating on. Expects a single string argument: the child's name.
- fetch_basic_data: Return some basic info on all children's {name: institution}.
- fetch_daily_overview: Return today's presence overview for the active child. Requires active child to be set.
- fetch_messages: Fetch the latest unread message for the active child. Requires active child to be set.
- fetch_calendar: Fetch upcoming calendar events for the next N days. Expects an integer argument. Requires active child to be set.";

pub struct AulaAgent {
    client: Arc<AulaClient>,
    tools: Arc<ToolRegistry>,
    parser: Arc<PatternParser>,
}

impl AulaAgent {
    pub fn new(client: Arc<AulaClient>) -> Self {
        Self {
            tools: Arc::new(aulabot_tools::aula_tools(client.clone())),
            client,
            parser: Arc::new(PatternParser::aula()),
        }
    }

    pub fn client(&self) -> &Arc<AulaClient> {
        &self.client
    }
}

impl Agent for AulaAgent {
    fn agent_type(&self) -> &str {
        AULA_AGENT
    }

    fn name(&self) -> &str {
        "Aula Agent"
    }

    fn description(&self) -> &str {
        "Integrates with the Danish Aula school system to fetch profiles, messages, calendar events, etc."
    }

    fn system_prompt(&self, now: DateTime<Utc>) -> String {
        format!("{}\n{PROMPT}", current_time_header(now))
    }

    fn tools(&self) -> Arc<ToolRegistry> {
        self.tools.clone()
    }

    fn parser(&self) -> Arc<dyn ToolCallParser> {
        self.parser.clone()
    }

    fn ensure_ready(&self) -> Result<(), Error> {
        if self.client.is_configured() {
            Ok(())
        } else {
            Err(Error::config(
                "Aula integration is not configured. Please check your Aula credentials in the settings.",
            ))
        }
    }
}

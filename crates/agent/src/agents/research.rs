//! Research agent: keyword searches plus page fetches.

use std::sync::Arc;

use aulabot_config::AppConfig;
use aulabot_core::tool::ToolRegistry;
use chrono::{DateTime, Utc};

use crate::agent::{Agent, current_time_header};
use crate::parser::{PatternParser, ToolCallParser};

pub const RESEARCH_AGENT: &str = "research_agent";

const PROMPT: &str = "You're a helpful research assistant, you are an expert in research.
If you are given a question you write strong keywords to do 3-5 searches in total
(each with a query_number) and then combine the results. If some of the results seem relevant,
use the fetch_url tool to get the full content of the page.

Available tools:
- google_search: Look up 3-5 results on Google
- fetch_url: Fetch and return the plain-text of any URL";

pub struct ResearchAgent {
    tools: Arc<ToolRegistry>,
    parser: Arc<PatternParser>,
}

impl ResearchAgent {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_tools(aulabot_tools::research_tools(config))
    }

    /// Use a custom registry, e.g. stub tools.
    pub fn with_tools(tools: ToolRegistry) -> Self {
        Self {
            tools: Arc::new(tools),
            parser: Arc::new(PatternParser::research()),
        }
    }
}

impl Agent for ResearchAgent {
    fn agent_type(&self) -> &str {
        RESEARCH_AGENT
    }

    fn name(&self) -> &str {
        "Research Agent"
    }

    fn description(&self) -> &str {
        "Performs multi-step Google searches and fetches page content for research queries"
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
}

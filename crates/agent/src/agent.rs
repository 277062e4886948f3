//! Agent trait: a system prompt paired with a tool set and a parser.

use std::sync::Arc;

use aulabot_core::error::Error;
use aulabot_core::tool::ToolRegistry;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::parser::ToolCallParser;

/// A policy object used to process one user query.
pub trait Agent: Send + Sync {
    /// Stable identifier, e.g. `"research_agent"`.
    fn agent_type(&self) -> &str;

    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// The system prompt, stamped with `now`.
    fn system_prompt(&self, now: DateTime<Utc>) -> String;

    fn tools(&self) -> Arc<ToolRegistry>;

    fn parser(&self) -> Arc<dyn ToolCallParser>;

    /// Checked before the loop starts. Fails when a capability the agent
    /// depends on is not configured.
    fn ensure_ready(&self) -> Result<(), Error> {
        Ok(())
    }
}

/// Listing entry for an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentInfo {
    #[serde(rename = "type")]
    pub agent_type: String,
    pub name: String,
    pub description: String,
}

impl AgentInfo {
    pub fn of(agent: &dyn Agent) -> Self {
        Self {
            agent_type: agent.agent_type().to_string(),
            name: agent.name().to_string(),
            description: agent.description().to_string(),
        }
    }
}

/// `current_time: <ISO-8601>` prompt header, millisecond precision, UTC.
pub(crate) fn current_time_header(now: DateTime<Utc>) -> String {
    format!(
        "current_time: {}",
        now.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn header_uses_zulu_millis() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 7, 30, 0).unwrap();
        assert_eq!(
            current_time_header(now),
            "current_time: 2025-03-14T07:30:00.000Z"
        );
    }
}

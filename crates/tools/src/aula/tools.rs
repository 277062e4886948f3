//! Portal tools exposed to the Aula agent.
//!
//! The active child lives in the session's [`ToolContext`]; the shared
//! [`AulaClient`] never knows which child a conversation is about.

use std::sync::Arc;

use async_trait::async_trait;
use aulabot_core::error::ToolError;
use aulabot_core::tool::{Tool, ToolContext};
use serde::Serialize;
use serde_json::{Map, Value};

use super::client::AulaClient;

/// Days fetched when no count is given.
pub const DEFAULT_CALENDAR_DAYS: u64 = 14;

fn active_child(ctx: &ToolContext) -> Result<&str, ToolError> {
    ctx.active_entity().ok_or_else(|| {
        ToolError::InvalidState("No active child set. Use set_active_child first.".into())
    })
}

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

pub struct SetActiveChildTool {
    client: Arc<AulaClient>,
}

impl SetActiveChildTool {
    pub fn new(client: Arc<AulaClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for SetActiveChildTool {
    fn name(&self) -> &str {
        "set_active_child"
    }

    fn description(&self) -> &str {
        "Set which child profile we're operating on"
    }

    async fn execute(
        &self,
        parameters: &Map<String, Value>,
        ctx: &mut ToolContext,
    ) -> Result<String, ToolError> {
        let name = parameters
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'name' argument".into()))?;
        self.client.resolve_child(name).await?;
        ctx.set_active_entity(name);
        Ok(format!("Active child set to: {name}"))
    }
}

pub struct FetchBasicDataTool {
    client: Arc<AulaClient>,
}

impl FetchBasicDataTool {
    pub fn new(client: Arc<AulaClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for FetchBasicDataTool {
    fn name(&self) -> &str {
        "fetch_basic_data"
    }

    fn description(&self) -> &str {
        "Return basic info on all children"
    }

    async fn execute(
        &self,
        _parameters: &Map<String, Value>,
        _ctx: &mut ToolContext,
    ) -> Result<String, ToolError> {
        let children = self.client.fetch_basic_data().await?;
        Ok(format!("Children data: {}", pretty(&children)))
    }
}

pub struct FetchDailyOverviewTool {
    client: Arc<AulaClient>,
}

impl FetchDailyOverviewTool {
    pub fn new(client: Arc<AulaClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for FetchDailyOverviewTool {
    fn name(&self) -> &str {
        "fetch_daily_overview"
    }

    fn description(&self) -> &str {
        "Return today's presence overview for the active child"
    }

    async fn execute(
        &self,
        _parameters: &Map<String, Value>,
        ctx: &mut ToolContext,
    ) -> Result<String, ToolError> {
        let child = active_child(ctx)?;
        let overview = self.client.fetch_daily_overview(child).await?;
        Ok(format!("Daily overview: {}", pretty(&overview)))
    }
}

pub struct FetchMessagesTool {
    client: Arc<AulaClient>,
}

impl FetchMessagesTool {
    pub fn new(client: Arc<AulaClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for FetchMessagesTool {
    fn name(&self) -> &str {
        "fetch_messages"
    }

    fn description(&self) -> &str {
        "Fetch the latest messages for the active child"
    }

    async fn execute(
        &self,
        _parameters: &Map<String, Value>,
        _ctx: &mut ToolContext,
    ) -> Result<String, ToolError> {
        let threads = self.client.fetch_messages().await?;
        Ok(format!("Messages: {}", pretty(&threads)))
    }
}

pub struct FetchCalendarTool {
    client: Arc<AulaClient>,
}

impl FetchCalendarTool {
    pub fn new(client: Arc<AulaClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for FetchCalendarTool {
    fn name(&self) -> &str {
        "fetch_calendar"
    }

    fn description(&self) -> &str {
        "Fetch upcoming calendar events for the next N days"
    }

    async fn execute(
        &self,
        parameters: &Map<String, Value>,
        ctx: &mut ToolContext,
    ) -> Result<String, ToolError> {
        let days = match parameters.get("days") {
            None => DEFAULT_CALENDAR_DAYS,
            Some(v) => v.as_u64().ok_or_else(|| {
                ToolError::InvalidArguments("'days' must be a non-negative integer".into())
            })?,
        };
        let child = active_child(ctx)?;
        let events = self.client.fetch_calendar(child, days).await?;
        Ok(format!(
            "Calendar events for next {days} days: {}",
            pretty(&events)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aula::test_portal::{MockPortal, portal_config};
    use aulabot_core::tool::{ToolRegistry, ToolRequest};

    async fn registry() -> (MockPortal, ToolRegistry) {
        let portal = MockPortal::start().await;
        let client = Arc::new(AulaClient::new(portal_config(&portal.base_url)));
        (portal, crate::aula_tools(client))
    }

    #[tokio::test]
    async fn tools_needing_a_child_fail_soft_without_one() {
        let (_portal, registry) = registry().await;
        let mut ctx = ToolContext::new();

        let out = registry
            .execute(&ToolRequest::new("fetch_daily_overview", ""), &mut ctx)
            .await;
        assert_eq!(
            out,
            "Error executing tool: No active child set. Use set_active_child first."
        );
    }

    #[tokio::test]
    async fn unknown_child_is_rejected() {
        let (_portal, registry) = registry().await;
        let mut ctx = ToolContext::new();

        let request = ToolRequest::new("set_active_child", "").with_param("name", "Ida");
        let out = registry.execute(&request, &mut ctx).await;
        assert_eq!(out, "Error executing tool: Child 'Ida' not found");
        assert_eq!(ctx.active_entity(), None);
    }

    #[tokio::test]
    async fn select_child_then_fetch() {
        let (_portal, registry) = registry().await;
        let mut ctx = ToolContext::new();

        let select = ToolRequest::new("set_active_child", "").with_param("name", "Emma");
        assert_eq!(
            registry.execute(&select, &mut ctx).await,
            "Active child set to: Emma"
        );
        assert_eq!(ctx.active_entity(), Some("Emma"));

        let overview = registry
            .execute(&ToolRequest::new("fetch_daily_overview", ""), &mut ctx)
            .await;
        assert!(overview.starts_with("Daily overview: {"));
        assert!(overview.contains("\"childId\": \"101\""));

        let calendar = registry
            .execute(&ToolRequest::new("fetch_calendar", ""), &mut ctx)
            .await;
        assert!(calendar.starts_with("Calendar events for next 14 days: {"));
        assert!(calendar.contains("Svømning"));
        assert!(!calendar.contains("Fodbold"));
    }

    #[tokio::test]
    async fn basic_data_and_messages() {
        let (_portal, registry) = registry().await;
        let mut ctx = ToolContext::new();

        let basic = registry
            .execute(&ToolRequest::new("fetch_basic_data", ""), &mut ctx)
            .await;
        assert!(basic.starts_with("Children data: ["));
        assert!(basic.contains("\"institution\": \"Solsikken\""));

        let messages = registry
            .execute(&ToolRequest::new("fetch_messages", ""), &mut ctx)
            .await;
        assert!(messages.starts_with("Messages: ["));
        assert!(messages.contains("Husk madpakke"));
        assert!(messages.contains("2024-05-02 08:15"));
    }

    #[tokio::test]
    async fn explicit_day_count_is_used() {
        let (_portal, registry) = registry().await;
        let mut ctx = ToolContext::new();
        ctx.set_active_entity("Oscar");

        let request = ToolRequest::new("fetch_calendar", "").with_param("days", 30);
        let out = registry.execute(&request, &mut ctx).await;
        assert!(out.starts_with("Calendar events for next 30 days: {"));
        assert!(out.contains("Fodbold"));
    }
}

//! Tool trait: the abstraction over agent capabilities.
//!
//! Tools are named external capabilities (web search, page fetch, school
//! portal calls) with a text-in/text-out contract. The registry maps a
//! [`ToolRequest`] to its tool and always produces text: failures become
//! a descriptive result the model can react to.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::ToolError;

/// A request to execute a tool, as extracted from model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Name of the tool to execute
    pub name: String,

    /// Typed parameters
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,

    /// Human-readable trace of why it was invoked
    pub description: String,
}

impl ToolRequest {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: serde_json::Map::new(),
            description: description.into(),
        }
    }

    /// Add a parameter (builder style).
    pub fn with_param(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    pub fn str_param(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(|v| v.as_str())
    }

    pub fn int_param(&self, key: &str) -> Option<i64> {
        self.parameters.get(key).and_then(|v| v.as_i64())
    }
}

/// Mutable state scoped to one agent session.
///
/// Created fresh for every query and threaded into each tool call, so
/// concurrent sessions never share it.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    active_entity: Option<String>,
}

impl ToolContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently selected context entity (e.g. the active child).
    pub fn active_entity(&self) -> Option<&str> {
        self.active_entity.as_deref()
    }

    pub fn set_active_entity(&mut self, entity: impl Into<String>) {
        self.active_entity = Some(entity.into());
    }
}

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "google_search").
    fn name(&self) -> &str;

    /// A description of what this tool does (listed in the agent prompt).
    fn description(&self) -> &str;

    /// Execute the tool with the given parameters.
    async fn execute(
        &self,
        parameters: &serde_json::Map<String, serde_json::Value>,
        ctx: &mut ToolContext,
    ) -> Result<String, ToolError>;
}

/// A registry of available tools.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Run a request, propagating failures.
    pub async fn try_execute(
        &self,
        request: &ToolRequest,
        ctx: &mut ToolContext,
    ) -> Result<String, ToolError> {
        let tool = self
            .tools
            .get(&request.name)
            .ok_or_else(|| ToolError::NotFound(request.name.clone()))?;
        tool.execute(&request.parameters, ctx).await
    }

    /// Run a request and always return text.
    ///
    /// Unknown tools yield `"Unknown tool: <name>"`, every other failure
    /// `"Error executing tool: <reason>"`.
    pub async fn execute(&self, request: &ToolRequest, ctx: &mut ToolContext) -> String {
        debug!(tool = %request.name, description = %request.description, "Executing tool");
        match self.try_execute(request, ctx).await {
            Ok(output) => output,
            Err(ToolError::NotFound(name)) => {
                error!(tool = %name, "Unknown tool requested");
                format!("Unknown tool: {name}")
            }
            Err(e) => {
                error!(tool = %request.name, error = %e, "Tool execution error");
                format!("Error executing tool: {e}")
            }
        }
    }

    /// `(name, description)` pairs sorted by name.
    pub fn descriptions(&self) -> Vec<(&str, &str)> {
        let mut out: Vec<(&str, &str)> = self
            .tools
            .values()
            .map(|t| (t.name(), t.description()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(b.0));
        out
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! The agent tool-calling loop.
//!
//! One run owns one [`Transcript`] and one [`ToolContext`]. Each iteration
//! makes exactly one model call; when the parser finds tool requests they
//! are all executed before the next call. After `max_iterations` batches a
//! final model call is made unconditionally and its text returned as-is.

use std::sync::Arc;

use aulabot_core::error::Error;
use aulabot_core::message::Transcript;
use aulabot_core::provider::ModelClient;
use aulabot_core::tool::{ToolContext, ToolRegistry};
use tracing::{debug, info, warn};

use crate::parser::ToolCallParser;

/// Default iteration budget.
pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

/// What a finished run looked like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    /// The final answer, also appended to the transcript.
    pub answer: String,
    pub model_calls: u32,
    pub tool_batches: u32,
    /// The budget ran out and the answer came from the forced final call.
    pub exhausted: bool,
}

/// The core agent loop that orchestrates model calls and tool execution.
pub struct AgentLoop {
    client: ModelClient,
    tools: Arc<ToolRegistry>,
    parser: Arc<dyn ToolCallParser>,
    max_iterations: u32,
}

impl AgentLoop {
    pub fn new(
        client: ModelClient,
        tools: Arc<ToolRegistry>,
        parser: Arc<dyn ToolCallParser>,
    ) -> Self {
        Self {
            client,
            tools,
            parser,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Set the maximum number of tool batches before the forced answer.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Drive the transcript to a final answer.
    ///
    /// Model failures end the run with an error. Tool failures never do:
    /// they arrive as result text and the loop carries on.
    pub async fn run(
        &self,
        transcript: &mut Transcript,
        ctx: &mut ToolContext,
    ) -> Result<LoopOutcome, Error> {
        info!(
            model = self.client.model(),
            provider = self.client.provider_name(),
            messages = transcript.len(),
            "Starting agent loop"
        );

        let mut model_calls = 0;
        let mut tool_batches = 0;

        while tool_batches < self.max_iterations {
            debug!(iteration = tool_batches + 1, "Agent loop iteration");

            let response = self.client.chat(transcript.messages()).await?;
            model_calls += 1;

            let requests = self.parser.parse(&response);
            if requests.is_empty() {
                transcript.push_assistant(response.as_str());
                return Ok(LoopOutcome {
                    answer: response,
                    model_calls,
                    tool_batches,
                    exhausted: false,
                });
            }

            debug!(count = requests.len(), "Executing tool requests");
            for request in &requests {
                let result = self.tools.execute(request, ctx).await;
                transcript.push_assistant(format!(
                    "I'll use the {} tool: {}",
                    request.name, request.description
                ));
                transcript.push_user(format!("Tool result: {result}"));
            }
            tool_batches += 1;
        }

        warn!(
            batches = tool_batches,
            "Max tool iterations reached, forcing final answer"
        );

        let answer = self.client.chat(transcript.messages()).await?;
        model_calls += 1;
        transcript.push_assistant(answer.as_str());

        Ok(LoopOutcome {
            answer,
            model_calls,
            tool_batches,
            exhausted: true,
        })
    }
}


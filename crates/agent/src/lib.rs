//! The agent loop and everything around it.
//!
//! An agent pairs a system prompt with a tool set. For each query the
//! [`ChatService`] builds a transcript (system prompt, recent history, the
//! query) and hands it to the [`AgentLoop`]:
//!
//! 1. send the transcript to the model
//! 2. parse the reply for tool requests
//! 3. if there are none, the reply is the answer
//! 4. otherwise run every request, append intent + result, go to 1
//!
//! After `max_iterations` tool batches one last model call is made and its
//! reply returned unparsed.

pub mod agent;
pub mod agents;
pub mod factory;
pub mod loop_runner;
pub mod parser;
pub mod service;

pub use agent::{Agent, AgentInfo};
pub use agents::{AulaAgent, ResearchAgent};
pub use factory::AgentFactory;
pub use loop_runner::{AgentLoop, DEFAULT_MAX_ITERATIONS, LoopOutcome};
pub use parser::{DEFAULT_CALENDAR_DAYS, PatternParser, ToolCallParser};
pub use service::{ChatResponse, ChatService, MAX_QUERY_CHARS, QueryRequest};

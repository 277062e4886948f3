//! # aulabot core
//!
//! Domain types, traits, and error definitions for the aulabot chat backend.
//! This crate has no HTTP or runtime dependencies. It defines the model
//! that all other crates implement against.
//!
//! Every collaborator of the agent loop is a trait here (`Provider`, `Tool`,
//! `ConversationStore`); implementations live in their own crates.

pub mod error;
pub mod history;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, HistoryError, ProviderError, Result, ToolError};
pub use history::{ConversationMeta, ConversationStore, StoredMessage};
pub use message::{ConversationId, Message, Role, Transcript};
pub use provider::{ChatOptions, CompletionRequest, ModelClient, Provider};
pub use tool::{Tool, ToolContext, ToolRegistry, ToolRequest};

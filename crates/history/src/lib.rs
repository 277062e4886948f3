//! Conversation history stores for aulabot.

pub mod in_memory;

pub use in_memory::InMemoryStore;

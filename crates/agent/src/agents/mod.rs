//! Built-in agents.

pub mod aula;
pub mod research;

pub use aula::AulaAgent;
pub use research::ResearchAgent;

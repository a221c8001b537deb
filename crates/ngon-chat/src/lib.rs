//! Conversation layer: routes each query, answers template-answerable ones
//! from retrieval alone, and escalates the rest to the generative backend
//! with retrieved grounding context.

/// Application configuration.
pub mod config;
/// End-to-end request handling.
pub mod orchestrator;
/// Zero-cost template answers.
pub mod simple;

pub use config::AppConfig;
pub use orchestrator::{ChatOrchestrator, ChatReply, ChatRequest, Suggestion};
pub use simple::{SimpleIntent, SimpleReply, SimpleResolver};

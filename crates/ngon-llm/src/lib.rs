//! Client for the external generative service: tiered model selection,
//! prompt assembly, blocking and streaming calls.
//!
//! The engine only depends on the [`GenerativeBackend`] trait; the shipped
//! implementation speaks the Gemini REST/SSE protocol.

/// Backend trait.
pub mod backend;
/// Client configuration and tier → model mapping.
pub mod config;
/// Gemini REST/SSE backend.
pub mod gemini;
/// System prompt and grounding-context assembly.
pub mod prompt;
/// Streaming events.
pub mod stream;

pub use backend::GenerativeBackend;
pub use config::GenAiConfig;
pub use gemini::GeminiBackend;
pub use prompt::PromptBuilder;
pub use stream::StreamEvent;

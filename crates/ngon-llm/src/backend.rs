use crate::stream::StreamEvent;
use async_trait::async_trait;
use ngon_core::{ChatTurn, NgonResult};
use ngon_router::Tier;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Seam to the external generative service.
///
/// Both tiers expose an identical interface shape; only cost/latency/quality
/// differ. `generate_stream` returns the receiving half of a bounded channel
/// plus a handle resolving to the full aggregated text — dropping the
/// receiver cancels the producer.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Blocking-style call: wait for the complete response text.
    async fn generate(
        &self,
        tier: Tier,
        system_prompt: &str,
        history: &[ChatTurn],
        message: &str,
        max_tokens: u32,
    ) -> NgonResult<String>;

    /// Streaming call: chunks arrive on the channel in generation order,
    /// terminated by [`StreamEvent::Done`].
    async fn generate_stream(
        &self,
        tier: Tier,
        system_prompt: &str,
        history: &[ChatTurn],
        message: &str,
        max_tokens: u32,
    ) -> NgonResult<(mpsc::Receiver<StreamEvent>, JoinHandle<NgonResult<String>>)>;
}

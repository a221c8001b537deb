use crate::backend::GenerativeBackend;
use crate::config::GenAiConfig;
use crate::stream::StreamEvent;
use async_trait::async_trait;
use futures_util::StreamExt;
use ngon_core::{trim_history, ChatTurn, NgonError, NgonResult, Role};
use ngon_router::Tier;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// Capacity of the producer → consumer hand-off channel. Bounded so a slow
/// consumer applies backpressure instead of growing memory.
const STREAM_CHANNEL_CAPACITY: usize = 64;

/// Gemini-style REST backend (JSON request, SSE streaming response).
pub struct GeminiBackend {
    config: GenAiConfig,
    http: reqwest::Client,
}

impl GeminiBackend {
    /// Build a backend; the HTTP client carries the configured per-request
    /// timeout. A client that cannot be constructed is a startup failure,
    /// never a silently timeout-less fallback.
    pub fn new(config: GenAiConfig) -> NgonResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| NgonError::Startup(format!("cannot build http client: {e}")))?;
        Ok(Self { config, http })
    }

    fn build_body(
        &self,
        system_prompt: &str,
        history: &[ChatTurn],
        message: &str,
        max_tokens: u32,
        tier: Tier,
    ) -> serde_json::Value {
        let mut contents: Vec<serde_json::Value> = trim_history(history)
            .iter()
            .filter(|turn| !turn.text.is_empty())
            .map(|turn| {
                serde_json::json!({
                    "role": match turn.role {
                        Role::User => "user",
                        Role::Model => "model",
                    },
                    "parts": [{"text": turn.text}],
                })
            })
            .collect();
        contents.push(serde_json::json!({
            "role": "user",
            "parts": [{"text": message}],
        }));

        serde_json::json!({
            "system_instruction": {"parts": [{"text": system_prompt}]},
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": self.config.clamp_tokens(tier, max_tokens),
            },
        })
    }

    fn url(&self, tier: Tier, streaming: bool) -> String {
        let verb = if streaming {
            "streamGenerateContent?alt=sse"
        } else {
            "generateContent"
        };
        format!(
            "{}/v1beta/models/{}:{verb}",
            self.config.base_url(),
            self.config.model_for(tier)
        )
    }

    fn map_send_error(e: reqwest::Error) -> NgonError {
        if e.is_timeout() {
            NgonError::UpstreamTimeout(format!("generative call timed out: {e}"))
        } else {
            NgonError::Http(e.to_string())
        }
    }
}

/// Concatenated text of the first candidate in a Gemini response payload.
fn extract_text(value: &serde_json::Value) -> Option<String> {
    let parts = value["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p["text"].as_str())
        .collect::<Vec<_>>()
        .join("");
    Some(text)
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    async fn generate(
        &self,
        tier: Tier,
        system_prompt: &str,
        history: &[ChatTurn],
        message: &str,
        max_tokens: u32,
    ) -> NgonResult<String> {
        let body = self.build_body(system_prompt, history, message, max_tokens, tier);

        let resp = self
            .http
            .post(self.url(tier, false))
            .header("x-goog-api-key", &self.config.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = resp.status();
        let resp_body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| NgonError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(NgonError::Http(format!(
                "generative API error {status}: {resp_body}"
            )));
        }

        extract_text(&resp_body)
            .ok_or_else(|| NgonError::Http(format!("no candidates in response: {resp_body}")))
    }

    async fn generate_stream(
        &self,
        tier: Tier,
        system_prompt: &str,
        history: &[ChatTurn],
        message: &str,
        max_tokens: u32,
    ) -> NgonResult<(mpsc::Receiver<StreamEvent>, JoinHandle<NgonResult<String>>)> {
        let body = self.build_body(system_prompt, history, message, max_tokens, tier);

        let resp = self
            .http
            .post(self.url(tier, true))
            .header("x-goog-api-key", &self.config.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = resp.status();
        if !status.is_success() {
            let error_body = resp
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(NgonError::Http(format!(
                "generative API error {status}: {error_body}"
            )));
        }

        let (tx, rx) = mpsc::channel::<StreamEvent>(STREAM_CHANNEL_CAPACITY);
        let mut byte_stream = resp.bytes_stream();

        let handle = tokio::spawn(async move {
            let mut buffer = String::new();
            let mut full_text = String::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        error!(error = %e, "stream read error");
                        let _ = tx
                            .send(StreamEvent::Error {
                                message: format!("stream read error: {e}"),
                            })
                            .await;
                        return Err(NgonError::Http(format!("stream read error: {e}")));
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim().to_string();
                    buffer = buffer[line_end + 1..].to_string();

                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }
                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    if data == "[DONE]" {
                        continue;
                    }

                    let event: serde_json::Value = match serde_json::from_str(data) {
                        Ok(v) => v,
                        Err(_) => continue,
                    };
                    if let Some(text) = extract_text(&event) {
                        if text.is_empty() {
                            continue;
                        }
                        full_text.push_str(&text);
                        if tx.send(StreamEvent::TextDelta { text }).await.is_err() {
                            // Consumer went away; stop pulling from upstream.
                            warn!("stream consumer dropped, cancelling generation pull");
                            return Ok(full_text);
                        }
                    }
                }
            }

            let _ = tx.send(StreamEvent::Done).await;
            Ok(full_text)
        });

        Ok((rx, handle))
    }
}

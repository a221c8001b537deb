//! Integration tests for the Gemini backend against a mocked HTTP service:
//! blocking calls, SSE streaming, error mapping, and stream/blocking content
//! equivalence.

use ngon_core::ChatTurn;
use ngon_llm::{GenAiConfig, GeminiBackend, GenerativeBackend, StreamEvent};
use ngon_router::Tier;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> GenAiConfig {
    let mut config = GenAiConfig::new("test-key");
    config.base_url = Some(server.uri());
    config.request_timeout_secs = 5;
    config
}

fn candidate_json(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{"content": {"parts": [{"text": text}]}}]
    })
}

#[tokio::test]
async fn test_generate_returns_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate_json("Phở Thìn là lựa chọn tốt.")))
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(config_for(&server)).unwrap();
    let reply = backend
        .generate(Tier::Flash, "system", &[], "ăn gì?", 256)
        .await
        .unwrap();
    assert_eq!(reply, "Phở Thìn là lựa chọn tốt.");
}

#[tokio::test]
async fn test_generate_sends_clamped_token_budget() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-pro:generateContent"))
        .and(body_partial_json(serde_json::json!({
            "generationConfig": {"maxOutputTokens": 1500}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate_json("ok")))
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(config_for(&server)).unwrap();
    // 4000 requested, but the pro budget is 1500.
    let reply = backend
        .generate(Tier::Pro, "system", &[], "câu hỏi", 4000)
        .await
        .unwrap();
    assert_eq!(reply, "ok");
}

#[tokio::test]
async fn test_generate_passes_history_turns() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "contents": [
                {"role": "user", "parts": [{"text": "trước đó"}]},
                {"role": "model", "parts": [{"text": "đã trả lời"}]},
                {"role": "user", "parts": [{"text": "bây giờ"}]}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate_json("ok")))
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(config_for(&server)).unwrap();
    let history = vec![ChatTurn::user("trước đó"), ChatTurn::model("đã trả lời")];
    let reply = backend
        .generate(Tier::Flash, "system", &history, "bây giờ", 100)
        .await
        .unwrap();
    assert_eq!(reply, "ok");
}

#[tokio::test]
async fn test_generate_api_error_maps_to_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({"error": "boom"})))
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(config_for(&server)).unwrap();
    let err = backend
        .generate(Tier::Flash, "system", &[], "q", 100)
        .await
        .unwrap_err();
    assert!(matches!(err, ngon_core::NgonError::Http(_)));
}

#[tokio::test]
async fn test_stream_delivers_chunks_in_order_then_done() {
    let server = MockServer::start().await;
    let sse_body = format!(
        "data: {}\n\ndata: {}\n\ndata: {}\n\n",
        candidate_json("Phở "),
        candidate_json("Thìn "),
        candidate_json("ngon.")
    );
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:streamGenerateContent"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse_body),
        )
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(config_for(&server)).unwrap();
    let (mut rx, handle) = backend
        .generate_stream(Tier::Flash, "system", &[], "ăn gì?", 256)
        .await
        .unwrap();

    let mut chunks = Vec::new();
    let mut saw_done = false;
    while let Some(event) = rx.recv().await {
        match event {
            StreamEvent::TextDelta { text } => chunks.push(text),
            StreamEvent::Done => {
                saw_done = true;
                break;
            }
            StreamEvent::Error { message } => panic!("unexpected stream error: {message}"),
        }
    }

    assert!(saw_done, "stream must terminate with Done");
    assert_eq!(chunks, vec!["Phở ", "Thìn ", "ngon."]);

    // Concatenation of chunks equals the aggregated text the handle returns,
    // which is what a blocking call with identical inputs would produce.
    let full = handle.await.unwrap().unwrap();
    assert_eq!(full, chunks.concat());
}

#[tokio::test]
async fn test_stream_cancellation_stops_producer() {
    let server = MockServer::start().await;
    let sse_body = format!(
        "data: {}\n\ndata: {}\n\n",
        candidate_json("một"),
        candidate_json("hai")
    );
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse_body),
        )
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(config_for(&server)).unwrap();
    let (rx, handle) = backend
        .generate_stream(Tier::Flash, "system", &[], "q", 256)
        .await
        .unwrap();

    // Caller disconnects immediately.
    drop(rx);

    // The producer must finish on its own instead of hanging on a full
    // channel, and must not report an error.
    let result = handle.await.unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_stream_api_error_surfaces_before_channel() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(config_for(&server)).unwrap();
    let err = backend
        .generate_stream(Tier::Flash, "system", &[], "q", 256)
        .await
        .unwrap_err();
    assert!(matches!(err, ngon_core::NgonError::Http(_)));
}

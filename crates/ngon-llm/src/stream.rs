use serde::{Deserialize, Serialize};

/// Events emitted while a generative response streams in.
///
/// Consumers (the transport layer) receive these through a bounded channel;
/// `Done` is the distinguished end-of-stream marker and is never carried as
/// chunk payload. Chunks arrive in generation order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A chunk of generated text.
    TextDelta {
        /// The chunk payload.
        text: String,
    },

    /// The stream finished successfully.
    Done,

    /// The stream failed; no further chunks will arrive.
    Error {
        /// Human-readable failure description.
        message: String,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_shape() {
        let event = StreamEvent::TextDelta {
            text: "phở".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"text_delta","text":"phở"}"#);

        let done = serde_json::to_string(&StreamEvent::Done).unwrap();
        assert_eq!(done, r#"{"type":"done"}"#);
    }
}

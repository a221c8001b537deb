use serde::{Deserialize, Serialize};

/// Maximum number of conversation turns kept when talking to the
/// generative service. Older turns are dropped, not summarized.
pub const MAX_HISTORY_TURNS: usize = 6;

/// The author of a [`ChatTurn`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A human end-user.
    User,
    /// The generative model.
    Model,
}

/// A single turn in a conversation. The core never stores these; callers
/// own the history and pass it in per request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    /// Who authored this turn.
    pub role: Role,
    /// The turn's text.
    pub text: String,
}

impl ChatTurn {
    /// A user-authored turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// A model-authored turn.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Keep only the most recent [`MAX_HISTORY_TURNS`] turns (sliding window).
pub fn trim_history(history: &[ChatTurn]) -> &[ChatTurn] {
    let start = history.len().saturating_sub(MAX_HISTORY_TURNS);
    &history[start..]
}

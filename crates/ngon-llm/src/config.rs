use ngon_router::Tier;
use serde::{Deserialize, Serialize};

/// Configuration for the generative-service client. Both tiers share one
/// API; only the model id and token budget differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenAiConfig {
    /// API key sent with every request.
    pub api_key: String,
    /// Override for the service base URL (tests point this at a mock).
    #[serde(default)]
    pub base_url: Option<String>,
    /// Model id for the cheap tier.
    #[serde(default = "default_flash_model")]
    pub flash_model: String,
    /// Model id for the expensive tier.
    #[serde(default = "default_pro_model")]
    pub pro_model: String,
    /// Bounded wait for any single generative call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_flash_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_pro_model() -> String {
    "gemini-2.0-pro".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl GenAiConfig {
    /// Config with defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            flash_model: default_flash_model(),
            pro_model: default_pro_model(),
            request_timeout_secs: default_timeout_secs(),
        }
    }

    /// Service base URL.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or("https://generativelanguage.googleapis.com")
    }

    /// Model id for `tier`.
    pub fn model_for(&self, tier: Tier) -> &str {
        match tier {
            Tier::Flash => &self.flash_model,
            Tier::Pro => &self.pro_model,
        }
    }

    /// Clamp a requested token count to the tier's budget.
    pub fn clamp_tokens(&self, tier: Tier, requested: u32) -> u32 {
        requested.min(tier.max_output_tokens())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GenAiConfig::new("key");
        assert_eq!(config.base_url(), "https://generativelanguage.googleapis.com");
        assert_eq!(config.model_for(Tier::Flash), "gemini-2.0-flash");
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_clamp_tokens_to_tier_budget() {
        let config = GenAiConfig::new("key");
        assert_eq!(config.clamp_tokens(Tier::Flash, 4000), 800);
        assert_eq!(config.clamp_tokens(Tier::Pro, 4000), 1500);
        assert_eq!(config.clamp_tokens(Tier::Flash, 256), 256);
    }

    #[test]
    fn test_toml_deserialization_with_defaults() {
        let config: GenAiConfig = serde_json::from_str(r#"{"api_key":"k"}"#).unwrap();
        assert_eq!(config.pro_model, "gemini-2.0-pro");
    }
}

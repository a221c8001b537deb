use ngon_core::{NgonError, NgonResult};
use ngon_llm::GenAiConfig;
use ngon_router::RouterConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level application configuration, usually loaded from `ngon.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding one subdirectory per city with `food.db` and
    /// `index.json`.
    pub data_dir: PathBuf,
    /// Generative-service client settings.
    pub genai: GenAiConfig,
    /// Routing thresholds.
    #[serde(default)]
    pub router: RouterConfig,
}

impl AppConfig {
    /// Load and parse a TOML config file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> NgonResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&raw)
            .map_err(|e| NgonError::Startup(format!("bad config {}: {e}", path.as_ref().display())))
    }
}

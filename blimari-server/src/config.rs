//! Configuration resolution for blimari-server
//!
//! All configuration arrives through environment variables. `DATABASE_URL`
//! is required at boot; every external-API key is optional, and a missing
//! key disables the corresponding content source rather than failing startup.

use blimari_common::{Error, Result};
use tracing::info;

/// Resolved server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// sqlx connection string (required)
    pub database_url: String,
    /// Listen address, default 127.0.0.1:5780
    pub bind_addr: String,
    /// Generative AI key; required for the question/insight/filter/organize steps
    pub gemini_api_key: Option<String>,
    pub youtube_api_key: Option<String>,
    pub github_token: Option<String>,
    pub google_search_api_key: Option<String>,
    pub google_search_cx: Option<String>,
    pub qloo_api_key: Option<String>,
    pub qloo_base_url: Option<String>,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        let database_url = opt_var("DATABASE_URL").ok_or_else(|| {
            Error::Config(
                "DATABASE_URL is not set. Example: DATABASE_URL=sqlite://blimari.db?mode=rwc"
                    .to_string(),
            )
        })?;

        let config = Self {
            database_url,
            bind_addr: opt_var("BLIMARI_BIND").unwrap_or_else(|| "127.0.0.1:5780".to_string()),
            gemini_api_key: opt_var("GEMINI_API_KEY"),
            youtube_api_key: opt_var("YOUTUBE_API_KEY"),
            github_token: opt_var("GITHUB_TOKEN"),
            google_search_api_key: opt_var("GOOGLE_CUSTOM_SEARCH_API_KEY"),
            google_search_cx: opt_var("GOOGLE_CUSTOM_SEARCH_CX"),
            qloo_api_key: opt_var("QLOO_API_KEY"),
            qloo_base_url: opt_var("QLOO_BASE_URL"),
        };

        config.log_source_availability();
        Ok(config)
    }

    /// Log which content sources are enabled by the present keys
    fn log_source_availability(&self) {
        for (name, enabled) in [
            ("gemini", self.gemini_api_key.is_some()),
            ("youtube", self.youtube_api_key.is_some()),
            ("github", self.github_token.is_some()),
            (
                "web",
                self.google_search_api_key.is_some() && self.google_search_cx.is_some(),
            ),
            (
                "qloo",
                self.qloo_api_key.is_some() && self.qloo_base_url.is_some(),
            ),
        ] {
            if enabled {
                info!(service = name, "External service configured");
            } else {
                info!(service = name, "External service not configured, disabled");
            }
        }
    }
}

/// Read an environment variable, treating empty/whitespace values as unset
fn opt_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
}

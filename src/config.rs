//! Runtime configuration.
//!
//! Non-secret knobs live in [`Settings`], read from an optional YAML file in
//! which every key has a default. API keys and tokens live in
//! [`Credentials`] and only ever come from the command line or environment.

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Pipeline settings.
///
/// # Example
///
/// ```yaml
/// keyword: football
/// max_items: 3
/// cycle_interval_secs: 600
/// fallback_image_url: https://example.com/placeholder.jpg
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Trend RSS endpoint, queried with `?geo=`.
    pub feed_url: String,
    pub geo: String,
    /// Case-insensitive substring a topic title must contain.
    pub keyword: String,
    /// Topics processed per cycle.
    pub max_items: usize,
    /// Characters of article text sent to the rewriter.
    pub max_article_chars: usize,
    pub user_agent: String,

    pub openai_base_url: String,
    pub model: String,
    /// Ask the provider to store the completion.
    pub store: bool,
    /// Prepended to the article text. Empty sends the raw text.
    pub rewrite_instruction: String,

    pub sharpness: f32,
    pub jpeg_quality: u8,
    /// Used when the article page has no usable image.
    pub fallback_image_url: Option<String>,

    pub imgbb_upload_url: String,
    pub blogger_api_base: String,
    pub labels: Vec<String>,

    pub cycle_interval_secs: u64,
    /// Per-request timeout. Unset means requests may wait indefinitely.
    pub http_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            feed_url: "https://trends.google.com/trending/rss".to_string(),
            geo: "US".to_string(),
            keyword: "sport".to_string(),
            max_items: 5,
            max_article_chars: 2000,
            user_agent: "Mozilla/5.0".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            store: true,
            rewrite_instruction: "Rewrite the following news article as an original, engaging \
                blog post. Keep every fact accurate and do not add information that is not in \
                the article."
                .to_string(),
            sharpness: 2.0,
            jpeg_quality: 75,
            fallback_image_url: None,
            imgbb_upload_url: "https://api.imgbb.com/1/upload".to_string(),
            blogger_api_base: "https://www.googleapis.com/blogger/v3".to_string(),
            labels: vec!["Trending".to_string(), "Sports".to_string()],
            cycle_interval_secs: 1800,
            http_timeout_secs: None,
        }
    }
}

impl Settings {
    /// Parse settings from a YAML document. An empty document yields defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load settings from `path`, or return defaults when no path is given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            info!("No settings file given; using defaults");
            return Ok(Self::default());
        };
        let yaml = fs::read_to_string(Path::new(path))
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_string(),
                source,
            })?;
        let settings = Self::from_yaml(&yaml)?;
        info!(path, "Loaded settings file");
        Ok(settings)
    }
}

/// Secrets for the three remote services.
#[derive(Clone)]
pub struct Credentials {
    pub openai_api_key: String,
    pub imgbb_api_key: String,
    pub blogger_blog_id: String,
    pub blogger_access_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &"<redacted>")
            .field("imgbb_api_key", &"<redacted>")
            .field("blogger_blog_id", &self.blogger_blog_id)
            .field("blogger_access_token", &"<redacted>")
            .finish()
    }
}

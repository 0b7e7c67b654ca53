//! YAML configuration.
//!
//! Every field is optional; a missing file means all defaults. CLI flags are
//! applied on top by the caller.
//!
//! ```yaml
//! content_base_url: https://digest.example.com/content/
//! proxy_prefix: https://r.jina.ai/
//! data_dir: /var/lib/weekly_digest
//! admin_key: s3cret
//! extractor: pattern        # or: html
//! show_published_at: true
//! show_captions: true
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::error::ConfigError;
use crate::scrapers::ExtractorKind;
use crate::scrapers::article::DEFAULT_PROXY_PREFIX;

pub const DEFAULT_CONTENT_BASE_URL: &str = "http://localhost:8080/content/";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory URL holding `index.json` and `<issue-id>.json`.
    pub content_base_url: String,
    pub proxy_prefix: String,
    pub data_dir: PathBuf,
    pub admin_key: Option<String>,
    pub extractor: ExtractorKind,
    pub show_published_at: bool,
    pub show_captions: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            content_base_url: DEFAULT_CONTENT_BASE_URL.to_string(),
            proxy_prefix: DEFAULT_PROXY_PREFIX.to_string(),
            data_dir: PathBuf::from(".weekly_digest"),
            admin_key: None,
            extractor: ExtractorKind::default(),
            show_published_at: true,
            show_captions: true,
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str, path: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Load `path`, or defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            debug!("No config file given; using defaults");
            return Ok(Self::default());
        };
        let shown = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: shown.clone(),
            source,
        })?;
        let config = Self::from_yaml(&text, &shown)?;
        info!(path = %shown, "Loaded configuration");
        Ok(config)
    }
}

//! Configuration file parser for feeds.toml.
//!
//! The config holds the two output directories and the static feed table.
//! Unlike most of this tool's inputs, a broken config does not degrade to a
//! default: running an archiver against zero feeds silently would be worse
//! than stopping, so load errors surface and the binary exits.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level configuration: output directories plus the feed table.
///
/// The feed list is fixed at load time and passed into the pipeline as a
/// plain slice; nothing discovers feeds at runtime.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory for the per-feed archive XML files.
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,

    /// Directory for the per-feed seen-id JSON files.
    #[serde(default = "default_seen_dir")]
    pub seen_dir: PathBuf,

    /// The feeds to process, in order.
    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
}

/// One configured feed.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Short identifier, used in log lines, `--feed` selection, and the
    /// default filenames. Filesystem-safe by validation.
    pub key: String,

    /// The fetch endpoint.
    pub url: String,

    /// Display title for the archive's channel; defaults to the key.
    #[serde(default)]
    title: Option<String>,

    /// Archive filename inside `archive_dir`; defaults to
    /// `{key}_rss_feed.xml`.
    #[serde(default)]
    archive_file: Option<String>,

    /// Seen-id filename inside `seen_dir`; defaults to
    /// `seen_ids_{key}.json`.
    #[serde(default)]
    seen_file: Option<String>,
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from("feeds")
}

fn default_seen_dir() -> PathBuf {
    PathBuf::from("seen_ids")
}

impl FeedConfig {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.key)
    }

    pub fn archive_file(&self) -> String {
        self.archive_file
            .clone()
            .unwrap_or_else(|| format!("{}_rss_feed.xml", self.key))
    }

    pub fn seen_file(&self) -> String {
        self.seen_file
            .clone()
            .unwrap_or_else(|| format!("seen_ids_{}.json", self.key))
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load and validate configuration from a TOML file.
    ///
    /// - Missing file → `Err(ConfigError::NotFound)`; main turns this into
    ///   a how-to-get-started message
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Empty feed list, duplicate or unsafe keys, non-http(s) URLs →
    ///   `Err(ConfigError::Invalid)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check size before reading so a runaway file never gets pulled
        // into memory
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;

        tracing::info!(
            path = %path.display(),
            feeds = config.feeds.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.feeds.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one [[feeds]] entry is required".to_string(),
            ));
        }

        let mut keys = std::collections::HashSet::new();
        for feed in &self.feeds {
            if feed.key.is_empty() {
                return Err(ConfigError::Invalid("feed key must not be empty".to_string()));
            }
            if !feed
                .key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return Err(ConfigError::Invalid(format!(
                    "feed key '{}' contains characters outside [A-Za-z0-9_-]",
                    feed.key
                )));
            }
            if !keys.insert(feed.key.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate feed key '{}'",
                    feed.key
                )));
            }

            let parsed = url::Url::parse(&feed.url).map_err(|e| {
                ConfigError::Invalid(format!("feed '{}' has an invalid URL: {}", feed.key, e))
            })?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(ConfigError::Invalid(format!(
                    "feed '{}' URL must be http or https, got '{}'",
                    feed.key,
                    parsed.scheme()
                )));
            }
        }

        Ok(())
    }

    /// Full path of one feed's archive file.
    pub fn archive_path(&self, feed: &FeedConfig) -> PathBuf {
        self.archive_dir.join(feed.archive_file())
    }

    /// Full path of one feed's seen-id file.
    pub fn seen_path(&self, feed: &FeedConfig) -> PathBuf {
        self.seen_dir.join(feed.seen_file())
    }
}

// ============================================================================
// Tests
// ============================================================================

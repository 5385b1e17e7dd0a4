//! Configuration file parser for ~/.config/feedstash/config.toml.
//!
//! The config file is optional — a missing file yields `Config::default()`,
//! which has no feeds. Unknown keys are accepted but logged as a warning.
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::storage::NEW_DIRECTORY;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// Parsed fine but describes an unusable setup.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// One feed subscription.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedConfig {
    /// Unique key; also the name of the feed's storage directory.
    pub name: String,
    pub url: String,
}

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage root. Each feed gets a subdirectory, plus the shared `new` directory.
    pub feed_directory: PathBuf,

    /// Feeds to update, in configuration order.
    pub feeds: Vec<FeedConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_directory: PathBuf::from("feeds"),
            feeds: Vec::new(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load and validate configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    /// - Bad feed entries → `Err(ConfigError::Invalid)`, see [`Config::validate`]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::from_toml(&content).inspect(|config| {
            tracing::info!(
                path = %path.display(),
                feeds = config.feeds.len(),
                feed_directory = %config.feed_directory.display(),
                "Loaded configuration"
            );
        })
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!("Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = ["feed_directory", "feeds"];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every feed can be stored and fetched.
    ///
    /// Feed names become directory names under `feed_directory`, so they must
    /// be non-empty, unique, free of `/`, not `.` or `..`, and not the
    /// reserved `new`. URLs must be absolute `http` or `https` URLs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();

        for feed in &self.feeds {
            let name = feed.name.as_str();
            if name.is_empty() {
                return Err(ConfigError::Invalid("feed name must not be empty".into()));
            }
            if name.contains('/') || name == "." || name == ".." {
                return Err(ConfigError::Invalid(format!(
                    "feed name '{name}' is not a valid directory name"
                )));
            }
            if name == NEW_DIRECTORY {
                return Err(ConfigError::Invalid(format!(
                    "feed name '{name}' is reserved"
                )));
            }
            if !seen.insert(name) {
                return Err(ConfigError::Invalid(format!("duplicate feed name '{name}'")));
            }

            let url = Url::parse(&feed.url).map_err(|e| {
                ConfigError::Invalid(format!("feed '{name}' has invalid URL '{}': {e}", feed.url))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::Invalid(format!(
                    "feed '{name}' uses unsupported scheme '{}' (only http/https allowed)",
                    url.scheme()
                )));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.feed_directory, PathBuf::from("feeds"));
        assert!(config.feeds.is_empty());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/feedstash_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert!(config.feeds.is_empty());
    }

    #[test]
    fn test_empty_file_returns_default() {
        let dir = std::env::temp_dir().join("feedstash_config_test_empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "   \n  ").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.feed_directory, PathBuf::from("feeds"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let dir = std::env::temp_dir().join("feedstash_config_test_full");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = r#"
feed_directory = "/srv/feeds"

[[feeds]]
name = "tech"
url = "https://example.com/tech.xml"

[[feeds]]
name = "news"
url = "http://example.org/rss"
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.feed_directory, PathBuf::from("/srv/feeds"));
        assert_eq!(config.feeds.len(), 2);
        assert_eq!(config.feeds[0].name, "tech");
        assert_eq!(config.feeds[1].url, "http://example.org/rss");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let config = Config::from_toml("[[feeds]]\nname = \"a\"\nurl = \"https://a.example\"\n")
            .unwrap();
        assert_eq!(config.feed_directory, PathBuf::from("feeds"));
        assert_eq!(config.feeds.len(), 1);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let err = Config::from_toml("this is not [valid toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let config = Config::from_toml("feed_directory = \"x\"\ntotally_fake_key = 1\n").unwrap();
        assert_eq!(config.feed_directory, PathBuf::from("x"));
    }

    #[test]
    fn test_feed_missing_url_is_parse_error() {
        let err = Config::from_toml("[[feeds]]\nname = \"a\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_duplicate_feed_names_rejected() {
        let content = r#"
[[feeds]]
name = "a"
url = "https://one.example"

[[feeds]]
name = "a"
url = "https://two.example"
"#;
        let err = Config::from_toml(content).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_reserved_and_unsafe_names_rejected() {
        for name in ["new", "", ".", "..", "a/b"] {
            let content = format!("[[feeds]]\nname = \"{name}\"\nurl = \"https://x.example\"\n");
            let err = Config::from_toml(&content).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "name {name:?}");
        }
    }

    #[test]
    fn test_bad_urls_rejected() {
        for url in ["not a url", "ftp://example.com/feed", "file:///etc/passwd"] {
            let content = format!("[[feeds]]\nname = \"a\"\nurl = \"{url}\"\n");
            let err = Config::from_toml(&content).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "url {url:?}");
        }
    }

    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("feedstash_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = "a".repeat(1_048_577);
        std::fs::write(&path, content).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));

        std::fs::remove_dir_all(&dir).ok();
    }
}

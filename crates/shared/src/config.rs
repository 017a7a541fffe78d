//! Configuration management for the MangaDex tools.
//!
//! This module handles loading and parsing configuration from TOML files,
//! with sensible defaults for all settings.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// MangaDex API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Authentication settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Export file settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// MangaDex API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API base URL
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum number of ids sent in one batch request
    pub chunk_size: usize,

    /// Page size used when walking a chapter feed
    pub feed_page_size: usize,

    /// Chapter languages requested from the feed
    pub translated_languages: Vec<String>,

    /// Content ratings included in metadata and feed lookups
    pub content_ratings: Vec<String>,

    /// User agent sent with every request
    pub user_agent: String,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// File holding the persisted refresh token
    pub token_file: String,

    /// Environment variable holding the account username
    pub username_env: String,

    /// Environment variable holding the account password
    pub password_env: String,

    /// Lifetime of a session token in minutes
    pub session_ttl_minutes: i64,
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Export file path
    pub path: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log directory path
    pub log_dir: String,

    /// Default log level (trace, debug, info, warn, error)
    pub default_level: String,

    /// Enable console output (stderr)
    pub console: bool,

    /// Enable file output
    pub file: bool,

    /// Enable JSON formatting for file logs
    pub json_format: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.mangadex.org/".to_string(),
            timeout_secs: 5,
            chunk_size: 100,
            feed_page_size: 100,
            translated_languages: vec!["en".to_string()],
            content_ratings: vec![
                "safe".to_string(),
                "suggestive".to_string(),
                "erotica".to_string(),
                "pornographic".to_string(),
            ],
            user_agent: concat!("md-tools/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_file: "refresh_token".to_string(),
            username_env: "MD_USER".to_string(),
            password_env: "MD_PWD".to_string(),
            session_ttl_minutes: 15,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            path: "md_export.json".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            default_level: "info".to_string(),
            console: true,
            file: false,
            json_format: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            auth: AuthConfig::default(),
            export: ExportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// If the file doesn't exist, returns the default configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration saved successfully"
        );

        Ok(())
    }

    /// Reject settings the tools cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.api.chunk_size == 0 {
            bail!("api.chunk_size must be greater than zero");
        }
        if self.api.feed_page_size == 0 {
            bail!("api.feed_page_size must be greater than zero");
        }
        if self.api.timeout_secs == 0 {
            bail!("api.timeout_secs must be greater than zero");
        }
        if self.auth.session_ttl_minutes <= 0 {
            bail!("auth.session_ttl_minutes must be greater than zero");
        }
        Ok(())
    }

    /// Path of the persisted refresh token
    pub fn token_file(&self) -> PathBuf {
        PathBuf::from(&self.auth.token_file)
    }

    /// Path of the export file
    pub fn export_path(&self) -> PathBuf {
        PathBuf::from(&self.export.path)
    }
}

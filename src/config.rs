//! Configuration file handling.
//!
//! This module provides loading and saving of llmscan configuration
//! from a TOML file.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/llmscan/config.toml`
//! - macOS: `~/Library/Application Support/llmscan/config.toml`
//! - Windows: `%APPDATA%\llmscan\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! api_provider = "openrouter"
//! default_format = "table"
//! max_workers = 10
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::analyzer::ApiProvider;
use crate::scanner::DEFAULT_MAX_WORKERS;

/// Application configuration.
///
/// This struct represents all configurable options for llmscan.
/// It can be loaded from a TOML file or created with default values.
///
/// # Example
///
/// ```no_run
/// use llmscan::Config;
///
/// // Load from file (or use defaults if file doesn't exist)
/// let config = Config::load().unwrap();
///
/// println!("Max workers: {}", config.max_workers);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API key for the verification service.
    ///
    /// The `--api-key` flag and the provider's environment variable both
    /// take precedence over this value.
    ///
    /// Default: none (verification disabled unless supplied elsewhere)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Which verification API to use.
    ///
    /// Valid values: "openrouter", "gemini", "openai"
    /// Default: "openrouter"
    pub api_provider: ApiProvider,

    /// Default output format when no `--format` flag is provided.
    ///
    /// Valid values: "table", "json", "markdown"
    /// Default: "table"
    pub default_format: String,

    /// How many files to scan concurrently.
    ///
    /// Default: 10
    pub max_workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_provider: ApiProvider::OpenRouter,
            default_format: "table".to_string(),
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("llmscan")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    ///
    /// This is useful for showing users what the default config looks like.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }

    /// Resolves the API key for verification.
    ///
    /// Precedence: `--api-key` flag, then the provider's environment
    /// variable(s), then the config file. Returns `None` when nothing is
    /// configured, in which case verification is skipped.
    pub fn resolve_api_key(&self, cli_key: Option<&str>, provider: ApiProvider) -> Option<String> {
        if let Some(key) = cli_key {
            return Some(key.to_string());
        }

        let env_vars: &[&str] = match provider {
            ApiProvider::OpenRouter => &["OPENROUTER_API_KEY"],
            ApiProvider::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
            ApiProvider::OpenAi => &["OPENAI_API_KEY"],
        };
        for var in env_vars {
            if let Ok(key) = std::env::var(var) {
                if !key.is_empty() {
                    return Some(key);
                }
            }
        }

        self.api_key.clone()
    }
}

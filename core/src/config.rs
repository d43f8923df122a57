//! Configuration
//!
//! Centralized configuration loading for the chat client, supporting a
//! TOML configuration file at `~/.config/eddy/config.toml`.
//!
//! # Configuration Priority
//!
//! Values are loaded with the following priority (highest first):
//! 1. CLI arguments (applied by the binary via [`ChatConfig::apply_overrides`])
//! 2. Environment variables (`EDDY_MODEL`, `OLLAMA_HOST`, `OLLAMA_PORT`)
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! model = "llama3.2:3b"
//! host = "localhost"
//! port = 11434
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default model identifier
pub const DEFAULT_MODEL: &str = "deepseek-r1:32b";
/// Default server host
pub const DEFAULT_HOST: &str = "localhost";
/// Default server port
pub const DEFAULT_PORT: u16 = 11434;

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// On-disk configuration file shape; every field optional
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatToml {
    /// Model identifier
    pub model: Option<String>,
    /// Server host
    pub host: Option<String>,
    /// Server port
    pub port: Option<u16>,
}

/// Resolved client configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatConfig {
    /// Model identifier sent with each request
    pub model: String,
    /// Inference server host
    pub host: String,
    /// Inference server port
    pub port: u16,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ChatConfig {
    /// Load configuration from the default locations
    ///
    /// A missing file at the default path falls back to defaults silently;
    /// an explicitly requested path that cannot be read is an error.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit_path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ChatToml = toml::from_str(&raw)?;

        let defaults = Self::default();
        Ok(Self {
            model: file.model.unwrap_or(defaults.model),
            host: file.host.unwrap_or(defaults.host),
            port: file.port.unwrap_or(defaults.port),
        })
    }

    /// Overlay environment variables
    fn apply_env(&mut self) {
        if let Ok(model) = std::env::var("EDDY_MODEL") {
            if !model.is_empty() {
                self.model = model;
            }
        }
        if let Ok(host) = std::env::var("OLLAMA_HOST") {
            if !host.is_empty() {
                self.host = host;
            }
        }
        if let Ok(port) = std::env::var("OLLAMA_PORT") {
            if let Ok(port) = port.parse() {
                self.port = port;
            }
        }
    }

    /// Overlay CLI arguments; highest priority
    pub fn apply_overrides(
        &mut self,
        model: Option<String>,
        host: Option<String>,
        port: Option<u16>,
    ) {
        if let Some(model) = model {
            self.model = model;
        }
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
    }
}

/// Default configuration file path (`$XDG_CONFIG_HOME/eddy/config.toml`)
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("eddy").join("config.toml"))
}

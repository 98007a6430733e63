//! Client Configuration
//!
//! Where the backend lives and how patient the client is with it.
//!
//! Values are layered, later sources winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`$XDG_CONFIG_HOME/narrator/config.toml` or an explicit path)
//! 3. Environment variables (`NARRATOR_*`)
//! 4. Explicit overrides (CLI flags)
//!
//! # Example
//!
//! ```toml
//! [api]
//! url = "http://127.0.0.1:8080"
//! timeout_ms = 300000
//! dev_mode = false
//! dev_proxy_origin = "http://localhost:5173"
//!
//! [stream]
//! connect_timeout_ms = 5000
//! max_attempts = 3
//! retry_interval_ms = 1000
//! max_retry_delay_ms = 10000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::RetryPolicy;

/// Default backend address when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";

/// Default origin of the local development proxy
pub const DEFAULT_DEV_PROXY_ORIGIN: &str = "http://localhost:5173";

/// Path prefix the development proxy forwards to the backend
pub const DEV_PROXY_PATH: &str = "/api";

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: toml::de::Error,
    },
}

/// Where the effective configuration came from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    /// No file found; defaults plus environment
    Defaults,
    /// Loaded from this file
    File(PathBuf),
}

// ============================================================================
// Sections
// ============================================================================

/// One-shot API settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend base URL used outside development mode
    pub url: String,
    /// Timeout for one-shot requests in milliseconds
    pub timeout_ms: u64,
    /// Route requests through the local development proxy
    pub dev_mode: bool,
    /// Origin serving the development proxy
    pub dev_proxy_origin: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_URL.to_string(),
            timeout_ms: 300_000,
            dev_mode: false,
            dev_proxy_origin: DEFAULT_DEV_PROXY_ORIGIN.to_string(),
        }
    }
}

/// Streaming connection settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// How long a connection attempt may take before it counts as failed
    pub connect_timeout_ms: u64,
    /// Connection attempts before giving up
    pub max_attempts: u32,
    /// Base interval multiplied by the attempt number between retries
    pub retry_interval_ms: u64,
    /// Upper bound on a single retry delay
    pub max_retry_delay_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5000,
            max_attempts: 3,
            retry_interval_ms: 1000,
            max_retry_delay_ms: 10_000,
        }
    }
}

// ============================================================================
// Client Configuration
// ============================================================================

/// Complete client configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// One-shot API settings
    pub api: ApiConfig,
    /// Streaming settings
    pub stream: StreamConfig,
}

/// Explicit overrides applied last (typically from CLI flags)
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Backend base URL
    pub api_url: Option<String>,
    /// Force development mode on or off
    pub dev_mode: Option<bool>,
    /// One-shot timeout in milliseconds
    pub timeout_ms: Option<u64>,
    /// Stream connect timeout in milliseconds
    pub connect_timeout_ms: Option<u64>,
    /// Stream connection attempts
    pub max_attempts: Option<u32>,
}

impl ClientConfig {
    /// Effective base URL for all endpoints
    ///
    /// Development mode goes through the local proxy path; otherwise the
    /// configured URL is used. Trailing slashes are stripped.
    #[must_use]
    pub fn base_url(&self) -> String {
        if self.api.dev_mode {
            format!(
                "{}{}",
                self.api.dev_proxy_origin.trim_end_matches('/'),
                DEV_PROXY_PATH
            )
        } else {
            self.api.url.trim_end_matches('/').to_string()
        }
    }

    /// One-shot request timeout
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.api.timeout_ms)
    }

    /// Retry policy for stream connections
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.stream.max_attempts.max(1),
            base_interval: Duration::from_millis(self.stream.retry_interval_ms),
            max_delay: Duration::from_millis(self.stream.max_retry_delay_ms),
            connect_timeout: Duration::from_millis(self.stream.connect_timeout_ms),
        }
    }

    /// Apply `NARRATOR_*` environment variables
    ///
    /// - `NARRATOR_API_URL`: backend base URL
    /// - `NARRATOR_DEV`: "1"/"true" to route through the dev proxy
    /// - `NARRATOR_DEV_PROXY`: dev proxy origin
    /// - `NARRATOR_API_TIMEOUT`: one-shot timeout in ms
    /// - `NARRATOR_CONNECT_TIMEOUT`: stream connect timeout in ms
    /// - `NARRATOR_RECONNECT_ATTEMPTS`: stream connection attempts
    /// - `NARRATOR_RECONNECT_DELAY`: base retry interval in ms
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("NARRATOR_API_URL").filter(|v| !v.is_empty()) {
            self.api.url = url;
        }
        if let Some(dev) = var("NARRATOR_DEV") {
            self.api.dev_mode = dev == "1" || dev.eq_ignore_ascii_case("true");
        }
        if let Some(origin) = var("NARRATOR_DEV_PROXY").filter(|v| !v.is_empty()) {
            self.api.dev_proxy_origin = origin;
        }
        if let Some(ms) = var("NARRATOR_API_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.api.timeout_ms = ms;
        }
        if let Some(ms) = var("NARRATOR_CONNECT_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.stream.connect_timeout_ms = ms;
        }
        if let Some(n) = var("NARRATOR_RECONNECT_ATTEMPTS").and_then(|v| v.parse().ok()) {
            self.stream.max_attempts = n;
        }
        if let Some(ms) = var("NARRATOR_RECONNECT_DELAY").and_then(|v| v.parse().ok()) {
            self.stream.retry_interval_ms = ms;
        }

        if self.api.dev_mode {
            let missing: Vec<&str> = ["NARRATOR_API_URL", "NARRATOR_API_TIMEOUT"]
                .into_iter()
                .filter(|key| var(*key).is_none())
                .collect();
            if !missing.is_empty() {
                tracing::warn!(
                    missing = %missing.join(", "),
                    "Development mode without explicit API settings; using defaults"
                );
            }
        }
    }

    /// Apply explicit overrides
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref url) = overrides.api_url {
            self.api.url.clone_from(url);
        }
        if let Some(dev) = overrides.dev_mode {
            self.api.dev_mode = dev;
        }
        if let Some(ms) = overrides.timeout_ms {
            self.api.timeout_ms = ms;
        }
        if let Some(ms) = overrides.connect_timeout_ms {
            self.stream.connect_timeout_ms = ms;
        }
        if let Some(n) = overrides.max_attempts {
            self.stream.max_attempts = n;
        }
    }
}

/// Default config file location
///
/// `$XDG_CONFIG_HOME/narrator/config.toml`, or `None` when the platform
/// has no config directory.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("narrator").join("config.toml"))
}

/// Parse a config file
pub async fn load_config_from_path(path: &Path) -> Result<ClientConfig, ConfigError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the layered configuration
///
/// An explicit `path` must exist; the default path is optional.
pub async fn load_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<(ClientConfig, ConfigSource), ConfigError> {
    let (mut config, source) = match path {
        Some(path) => (
            load_config_from_path(path).await?,
            ConfigSource::File(path.to_path_buf()),
        ),
        None => match default_config_path() {
            Some(default) if tokio::fs::try_exists(&default).await.unwrap_or(false) => (
                load_config_from_path(&default).await?,
                ConfigSource::File(default),
            ),
            _ => (ClientConfig::default(), ConfigSource::Defaults),
        },
    };

    config.apply_env();
    config.apply_overrides(overrides);

    tracing::debug!(
        base_url = %config.base_url(),
        source = ?source,
        "Client configuration loaded"
    );

    Ok((config, source))
}

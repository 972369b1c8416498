//! Configuration management
//!
//! This module handles loading and parsing configuration for the hotspot portal.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Payment/auth backend the portal talks to
    #[serde(default)]
    pub backend: BackendConfig,
    /// Payment confirmation polling
    #[serde(default)]
    pub payment: PaymentConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Deployment environment, decides how the backend base URL is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Backend served under `/api` of the configured origin (default)
    #[default]
    Production,
    /// Backend dev server on localhost
    Development,
}

/// Base URL used by the development environment
pub const DEVELOPMENT_BASE_URL: &str = "http://localhost:3000/api";

/// Backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub environment: Environment,
    /// Origin the production backend is reachable at
    #[serde(default = "default_origin")]
    pub origin: String,
    /// Explicit base URL, overrides environment resolution
    #[serde(default)]
    pub base_url: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            origin: default_origin(),
            base_url: None,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_origin() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_timeout() -> u64 {
    15
}

impl BackendConfig {
    /// Resolve the API base URL (no trailing slash)
    pub fn resolve_base_url(&self) -> String {
        let url = match (&self.base_url, self.environment) {
            (Some(url), _) => url.clone(),
            (None, Environment::Development) => DEVELOPMENT_BASE_URL.to_string(),
            (None, Environment::Production) => {
                format!("{}/api", self.origin.trim_end_matches('/'))
            }
        };
        url.trim_end_matches('/').to_string()
    }
}

/// Payment confirmation polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// Countdown shown on the pending page
    #[serde(default = "default_countdown")]
    pub countdown_seconds: u32,
    /// Countdown tick length in milliseconds
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
    /// Seconds between status polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Delay between a terminal status and the redirect
    #[serde(default = "default_redirect_delay")]
    pub redirect_delay_millis: u64,
    /// Upper bound on how long a single checkout is polled
    #[serde(default = "default_max_poll")]
    pub max_poll_seconds: u64,
    /// A watch nobody looked at for this long is cancelled
    #[serde(default = "default_watch_idle")]
    pub watch_idle_seconds: u64,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            countdown_seconds: default_countdown(),
            tick_millis: default_tick_millis(),
            poll_interval_seconds: default_poll_interval(),
            redirect_delay_millis: default_redirect_delay(),
            max_poll_seconds: default_max_poll(),
            watch_idle_seconds: default_watch_idle(),
        }
    }
}

fn default_countdown() -> u32 {
    120
}

fn default_tick_millis() -> u64 {
    1000
}

fn default_poll_interval() -> u64 {
    5
}

fn default_redirect_delay() -> u64 {
    1500
}

fn default_max_poll() -> u64 {
    600
}

fn default_watch_idle() -> u64 {
    30
}

impl PaymentConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_millis)
    }

    pub fn max_poll(&self) -> Duration {
        Duration::from_secs(self.max_poll_seconds)
    }

    pub fn watch_idle(&self) -> Duration {
        Duration::from_secs(self.watch_idle_seconds)
    }
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides,
    /// then validate the result
    ///
    /// Environment variables follow the pattern:
    /// - HOTSPOT_SERVER_HOST
    /// - HOTSPOT_SERVER_PORT
    /// - HOTSPOT_BACKEND_ENVIRONMENT
    /// - HOTSPOT_BACKEND_ORIGIN
    /// - HOTSPOT_BACKEND_BASE_URL
    /// - HOTSPOT_BACKEND_TIMEOUT_SECONDS
    /// - HOTSPOT_PAYMENT_POLL_INTERVAL_SECONDS
    /// - HOTSPOT_PAYMENT_MAX_POLL_SECONDS
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("HOTSPOT_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("HOTSPOT_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }

        if let Ok(environment) = std::env::var("HOTSPOT_BACKEND_ENVIRONMENT") {
            match environment.to_lowercase().as_str() {
                "production" => self.backend.environment = Environment::Production,
                "development" => self.backend.environment = Environment::Development,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(origin) = std::env::var("HOTSPOT_BACKEND_ORIGIN") {
            self.backend.origin = origin;
        }
        if let Ok(base_url) = std::env::var("HOTSPOT_BACKEND_BASE_URL") {
            self.backend.base_url = Some(base_url);
        }
        if let Ok(timeout) = std::env::var("HOTSPOT_BACKEND_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.backend.timeout_seconds = timeout;
            }
        }

        if let Ok(interval) = std::env::var("HOTSPOT_PAYMENT_POLL_INTERVAL_SECONDS") {
            if let Ok(interval) = interval.parse::<u64>() {
                self.payment.poll_interval_seconds = interval;
            }
        }
        if let Ok(max_poll) = std::env::var("HOTSPOT_PAYMENT_MAX_POLL_SECONDS") {
            if let Ok(max_poll) = max_poll.parse::<u64>() {
                self.payment.max_poll_seconds = max_poll;
            }
        }
    }

    /// Reject values the timers cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let payment = &self.payment;
        if payment.tick_millis == 0 {
            return Err(ConfigError::ValidationError(
                "payment.tick_millis must be greater than zero".into(),
            ));
        }
        if payment.poll_interval_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "payment.poll_interval_seconds must be greater than zero".into(),
            ));
        }
        if payment.max_poll_seconds < payment.poll_interval_seconds {
            return Err(ConfigError::ValidationError(
                "payment.max_poll_seconds must cover at least one poll interval".into(),
            ));
        }
        if payment.watch_idle_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "payment.watch_idle_seconds must be greater than zero".into(),
            ));
        }
        if self.backend.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "backend.timeout_seconds must be greater than zero".into(),
            ));
        }
        let base_url = self.backend.resolve_base_url();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "backend base URL must be absolute: {}",
                base_url
            )));
        }
        Ok(())
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

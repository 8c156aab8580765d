use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Legacy variable name used by the original web front-end deployment.
pub const LEGACY_BASE_URL_ENV: &str = "NEXT_PUBLIC_API_BASE_URL";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
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
    3000
}

/// Location of the Pelios API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Origin of the Pelios API, e.g. `https://api.pelios.example`.
    /// Handlers that need the upstream fail with "missing configuration" when unset.
    pub base_url: Option<String>,
    /// Token exchange endpoint, called with `userName` and `password` query parameters
    #[serde(default = "default_auth_path")]
    pub auth_path: String,
    /// Endpoint listing the caller's sources
    #[serde(default = "default_sources_path")]
    pub sources_path: String,
    /// Upstream request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            auth_path: default_auth_path(),
            sources_path: default_sources_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_auth_path() -> String {
    "/api/Auth/token".to_string()
}

fn default_sources_path() -> String {
    "/api/Sources".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl ApiConfig {
    /// The configured base URL without a trailing slash, or `None` when unset or blank.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Production mode marks both session cookies `Secure`
    #[serde(default)]
    pub production: bool,
    /// Lifetime of the display-name cookie in days (default: 30)
    #[serde(default = "default_user_cookie_days")]
    pub user_cookie_days: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            production: false,
            user_cookie_days: default_user_cookie_days(),
        }
    }
}

fn default_user_cookie_days() -> i64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Read `path` if it exists, then fill a missing base URL from the legacy variable.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)?
        } else {
            Config::default()
        };

        if config.api.base_url().is_none() {
            if let Ok(url) = std::env::var(LEGACY_BASE_URL_ENV) {
                config.api.base_url = Some(url);
            }
        }

        Ok(config)
    }

    /// Log where the configuration came from
    pub fn describe(&self, path: &Path) {
        if path.exists() {
            tracing::info!("Loaded configuration from {}", path.display());
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
        }

        match self.api.base_url() {
            Some(url) => tracing::info!(base_url = %url, "Using Pelios API"),
            None => tracing::warn!("Pelios API base URL is not set; upstream calls will fail"),
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse configuration file")
    }
}

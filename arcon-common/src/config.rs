//! Configuration loading and resolution
//!
//! Every setting is resolved in this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or unreadable TOML file never stops startup: a warning is
//! logged and the remaining tiers apply.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::{Error, Result};

/// Default listen port of the review service
pub const DEFAULT_PORT: u16 = 5790;

/// Default base URL of the reprocessing backend
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Default timeout for backend requests
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "ARCON_CONFIG";

pub const PORT_ENV_VAR: &str = "ARCON_RV_PORT";
pub const BACKEND_URL_ENV_VAR: &str = "ARCON_BACKEND_URL";
pub const BACKEND_TOKEN_ENV_VAR: &str = "ARCON_BACKEND_TOKEN";
pub const TIMEOUT_ENV_VAR: &str = "ARCON_REQUEST_TIMEOUT_SECS";
pub const PRIORITY_ENV_VAR: &str = "ARCON_DEFAULT_PRIORITY";

/// `[logging]` table of the TOML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub backend_url: Option<String>,
    pub backend_token: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub port: Option<u16>,
    pub default_priority: Option<bool>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Parse a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Load from the resolved config path, falling back to defaults
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        let Some(path) = config_file_path(explicit) else {
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Locate the config file
///
/// Explicit path, then `ARCON_CONFIG`, then the platform config directory
/// (`~/.config/arcon/config.toml` on Linux), then `/etc/arcon/config.toml`
/// on Linux. Only the explicit and environment paths are returned without an
/// existence check, so a typo there surfaces as a warning.
pub fn config_file_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join("arcon").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/arcon/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Resolve one setting across the four tiers
pub fn resolve_setting<T: FromStr>(
    cli_arg: Option<T>,
    env_var_name: &str,
    toml_value: Option<T>,
    default: T,
) -> T {
    if let Some(value) = cli_arg {
        return value;
    }

    if let Ok(raw) = std::env::var(env_var_name) {
        match raw.trim().parse::<T>() {
            Ok(value) => return value,
            Err(_) => warn!("Ignoring unparsable {}={:?}", env_var_name, raw),
        }
    }

    toml_value.unwrap_or(default)
}

/// Fully resolved settings of the review service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub port: u16,
    pub backend_url: String,
    pub backend_token: Option<String>,
    pub request_timeout: Duration,
    pub default_priority: bool,
    pub log_level: String,
}

impl ServiceConfig {
    pub fn resolve(cli_port: Option<u16>, cli_backend_url: Option<String>, toml: &TomlConfig) -> Self {
        let port = resolve_setting(cli_port, PORT_ENV_VAR, toml.port, DEFAULT_PORT);

        let backend_url = resolve_setting(
            cli_backend_url,
            BACKEND_URL_ENV_VAR,
            toml.backend_url.clone(),
            DEFAULT_BACKEND_URL.to_string(),
        )
        .trim_end_matches('/')
        .to_string();

        let backend_token = std::env::var(BACKEND_TOKEN_ENV_VAR)
            .ok()
            .or_else(|| toml.backend_token.clone())
            .filter(|t| !t.trim().is_empty());

        let timeout_secs = resolve_setting(
            None,
            TIMEOUT_ENV_VAR,
            toml.request_timeout_secs,
            DEFAULT_REQUEST_TIMEOUT_SECS,
        );

        let default_priority = resolve_setting(None, PRIORITY_ENV_VAR, toml.default_priority, false);

        Self {
            port,
            backend_url,
            backend_token,
            request_timeout: Duration::from_secs(timeout_secs),
            default_priority,
            log_level: toml.logging.level.clone(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            backend_token: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            default_priority: false,
            log_level: default_log_level(),
        }
    }
}

//! Configuration loading and secret resolution
//!
//! Config file resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. OS-dependent default location (`<config_dir>/mathmentor/config.toml`)
//!
//! A missing config file is not fatal: a warning is logged and compiled
//! defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "MM_CONFIG";

/// Environment variable holding the gateway API key
pub const GATEWAY_API_KEY_ENV: &str = "MM_GATEWAY_API_KEY";

/// Environment variable holding the gateway base URL
pub const GATEWAY_URL_ENV: &str = "MM_GATEWAY_URL";

/// Base URL used when neither ENV nor TOML provides one (local functions host)
pub const DEFAULT_GATEWAY_BASE_URL: &str = "http://127.0.0.1:54321/functions/v1";

/// Default HTTP bind address for the pipeline service
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5730";

/// Complete TOML configuration
///
/// Every section is optional in the file; absent sections take defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub pipeline: PipelineConfig,
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter level when RUST_LOG is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// `[server]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
        }
    }
}

/// `[gateway]` section (external recognition/solving services)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout_secs: 60,
        }
    }
}

/// `[pipeline]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Extractions below this confidence go through human review
    pub hitl_confidence_threshold: f64,
    /// Maximum memory entries kept (None = unbounded)
    pub memory_capacity: Option<usize>,
    /// EventBus channel capacity
    pub event_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            hitl_confidence_threshold: 0.7,
            memory_capacity: None,
            event_capacity: 100,
        }
    }
}

impl TomlConfig {
    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let threshold = self.pipeline.hitl_confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::Config(format!(
                "pipeline.hitl_confidence_threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        if self.pipeline.event_capacity == 0 {
            return Err(Error::Config(
                "pipeline.event_capacity must be greater than zero".to_string(),
            ));
        }
        if self.pipeline.memory_capacity == Some(0) {
            return Err(Error::Config(
                "pipeline.memory_capacity must be greater than zero when set".to_string(),
            ));
        }
        if self.gateway.timeout_secs == 0 {
            return Err(Error::Config(
                "gateway.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolve which config file to read
///
/// Returns `None` only when no explicit path is given and the platform has
/// no config directory.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: OS-dependent default
    default_config_path()
}

/// Default config location for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mathmentor").join("config.toml"))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}

/// Load configuration with graceful degradation
///
/// Missing file → warning + defaults. A file that exists but does not parse
/// or validate is an error.
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = resolve_config_path(cli_arg) else {
        warn!("No config directory available on this platform, using defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let config = load_toml_config(&path)?;
    info!("Configuration loaded from {}", path.display());
    Ok(config)
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve the gateway API key
///
/// **Priority:** ENV → TOML. Returns `None` when neither source holds a valid
/// key (the gateways may be reachable without one, e.g. a local host).
pub fn resolve_gateway_api_key(toml_config: &TomlConfig) -> Option<String> {
    let env_key = std::env::var(GATEWAY_API_KEY_ENV)
        .ok()
        .filter(|k| is_valid_key(k));
    let toml_key = toml_config
        .gateway
        .api_key
        .clone()
        .filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!("Gateway API key found in both environment and TOML. Using environment (highest priority).");
    }

    if let Some(key) = env_key {
        info!("Gateway API key loaded from environment variable");
        return Some(key);
    }

    if let Some(key) = toml_key {
        info!("Gateway API key loaded from TOML config");
        return Some(key);
    }

    warn!(
        "Gateway API key not configured (set {} or gateway.api_key)",
        GATEWAY_API_KEY_ENV
    );
    None
}

/// Resolve the gateway base URL
///
/// **Priority:** ENV → TOML → compiled default. Trailing slashes are removed.
pub fn resolve_gateway_base_url(toml_config: &TomlConfig) -> String {
    let url = std::env::var(GATEWAY_URL_ENV)
        .ok()
        .filter(|u| !u.trim().is_empty())
        .or_else(|| {
            toml_config
                .gateway
                .base_url
                .clone()
                .filter(|u| !u.trim().is_empty())
        })
        .unwrap_or_else(|| DEFAULT_GATEWAY_BASE_URL.to_string());

    url.trim().trim_end_matches('/').to_string()
}

//! Configuration file schema and path resolution
//!
//! The file is TOML. Every section and every key is optional; anything left
//! out falls back to the compiled default in the consuming crate.
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `SIMALYZE_CONFIG` environment variable
//! 3. `<user config dir>/simalyze/config.toml`
//! 4. No file: built-in defaults

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SIMALYZE_CONFIG";

/// Parsed contents of the TOML config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub logging: LoggingConfig,
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub concurrency: ConcurrencyConfig,
    pub display: DisplayConfig,
    pub keyword: KeywordConfig,
}

/// `[logging]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// tracing filter directive, e.g. "info" or "simalyze_scorer=debug"
    pub level: Option<String>,
}

/// `[api]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

/// `[cache]` section, one TTL per cache in seconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub record_ttl_secs: Option<u64>,
    pub creator_ttl_secs: Option<u64>,
    pub asset_ttl_secs: Option<u64>,
    pub revision_ttl_secs: Option<u64>,
    pub screenshot_ttl_secs: Option<u64>,
    pub engagement_ttl_secs: Option<u64>,
    pub descendant_ttl_secs: Option<u64>,
    pub content_ttl_secs: Option<u64>,
    pub analysis_ttl_secs: Option<u64>,
}

/// `[concurrency]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    pub fetch_limit: Option<usize>,
    pub analysis_limit: Option<usize>,
}

/// `[display]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub hide_enabled: Option<bool>,
    pub blur_enabled: Option<bool>,
    pub highlight_enabled: Option<bool>,
    pub highlight_threshold: Option<u8>,
}

/// `[keyword]` section
///
/// An empty `text` disables the keyword penalty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    pub text: Option<String>,
    pub penalty: Option<i32>,
}

/// Where the config file path came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    CommandLine,
    Environment,
    UserConfigDir,
}

impl ConfigOrigin {
    /// Explicitly named files must exist; the default location may not
    pub fn is_explicit(self) -> bool {
        !matches!(self, ConfigOrigin::UserConfigDir)
    }
}

/// Resolve which config file to read, if any
pub fn resolve_config_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
) -> Option<(PathBuf, ConfigOrigin)> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some((path.to_path_buf(), ConfigOrigin::CommandLine));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some((PathBuf::from(path), ConfigOrigin::Environment));
        }
    }

    // Priority 3: Per-user config directory
    default_config_path().map(|path| (path, ConfigOrigin::UserConfigDir))
}

/// `<user config dir>/simalyze/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("simalyze").join("config.toml"))
}

/// Read and parse one config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Resolve and load the config file
///
/// A missing file at the default location yields the default config. A file
/// named on the command line or in the environment must be readable.
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let Some((path, origin)) = resolve_config_path(cli_arg, CONFIG_ENV_VAR) else {
        debug!("No config directory on this platform, using defaults");
        return Ok(TomlConfig::default());
    };

    if !origin.is_explicit() && !path.exists() {
        debug!(path = %path.display(), "No config file, using defaults");
        return Ok(TomlConfig::default());
    }

    let config = load_toml_config(&path)?;
    info!(path = %path.display(), origin = ?origin, "Loaded config file");
    Ok(config)
}

//! Configuration file resolution and TOML loading
//!
//! Config file location follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Per-user config file (`<config_dir>/alstream/config.toml`)
//! 4. Built-in defaults (no file)
//!
//! A missing config file never terminates the program: the caller gets a
//! warning in the log and the built-in defaults.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "ALSTREAM_CONFIG";

/// Directory name used under the platform config directory
const APP_DIR: &str = "alstream";

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
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

/// Resolves which config file (if any) should be loaded
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    env_var_name: String,
    default_path: Option<PathBuf>,
}

impl ConfigResolver {
    /// Resolver using [`CONFIG_ENV_VAR`] and the platform config directory
    pub fn new() -> Self {
        Self {
            env_var_name: CONFIG_ENV_VAR.to_string(),
            default_path: default_config_path(),
        }
    }

    /// Override the environment variable consulted at priority 2
    pub fn with_env_var(mut self, name: &str) -> Self {
        self.env_var_name = name.to_string();
        self
    }

    /// Override the fallback file consulted at priority 3
    pub fn with_default_path(mut self, path: Option<PathBuf>) -> Self {
        self.default_path = path;
        self
    }

    /// Resolve the config file path
    ///
    /// Returns `None` when no file should be read and built-in defaults apply.
    pub fn resolve(&self, cli_arg: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = cli_arg {
            debug!("Using config file from command line: {}", path.display());
            return Some(path.to_path_buf());
        }

        if let Ok(path) = std::env::var(&self.env_var_name) {
            if !path.is_empty() {
                debug!("Using config file from {}: {}", self.env_var_name, path);
                return Some(PathBuf::from(path));
            }
        }

        match &self.default_path {
            Some(path) if path.exists() => {
                debug!("Using default config file: {}", path.display());
                Some(path.clone())
            }
            _ => None,
        }
    }
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Platform default config file path (`~/.config/alstream/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

/// Load a TOML config file, falling back to defaults when there is none
///
/// - `None` → `T::default()`
/// - path does not exist → warning + `T::default()`
/// - unreadable file → [`Error::Io`]
/// - malformed TOML → [`Error::Config`]
pub fn load_toml_or_default<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        debug!("No config file, using built-in defaults");
        return Ok(T::default());
    };

    if !path.exists() {
        warn!(
            "Config file {} not found, using built-in defaults",
            path.display()
        );
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

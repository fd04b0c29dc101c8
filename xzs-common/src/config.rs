//! Configuration loading and resolution
//!
//! Resolution priority for every setting:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is never fatal: a warning is logged and compiled
//! defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the backend base URL
pub const API_URL_ENV: &str = "XZS_API_URL";

/// Environment variable overriding the data folder
pub const DATA_FOLDER_ENV: &str = "XZS_DATA_FOLDER";

/// Backend address used when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

/// Logging section of the TOML config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset (e.g. "info", "debug")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Optional log file path
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Base URL of the topic backend (e.g. "http://127.0.0.1:8000")
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Folder holding durable client state (preferences.json)
    #[serde(default)]
    pub data_folder: Option<PathBuf>,

    /// Optional recipe data file; its dishes override the built-in tutorials
    #[serde(default)]
    pub recipe_data: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Compiled defaults used when no other source provides a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub api_base_url: String,
    pub data_folder: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl CompiledDefaults {
    /// Defaults for the platform this binary was compiled for
    pub fn for_current_platform() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            data_folder: default_data_folder(),
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

/// Get OS-dependent default data folder path
fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("xzstudio"))
        .unwrap_or_else(|| PathBuf::from("./xzstudio_data"))
}

/// Default config file location: `<config_dir>/xzstudio/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("xzstudio").join("config.toml"))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load config from `path`, falling back to defaults on any problem
///
/// Missing file → info + defaults. Unreadable or invalid file → warning + defaults.
pub fn load_or_default(path: Option<&Path>) -> TomlConfig {
    let Some(path) = path else {
        warn!("Could not determine config directory, using compiled defaults");
        return TomlConfig::default();
    };

    if !path.exists() {
        info!("No config file at {}, using compiled defaults", path.display());
        return TomlConfig::default();
    }

    match load_toml_config(path) {
        Ok(config) => config,
        Err(e) => {
            warn!("{}; using compiled defaults", e);
            TomlConfig::default()
        }
    }
}

/// Write config atomically (temp file in the same directory, then rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_base_url: Option<String>,
    pub data_folder: Option<PathBuf>,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub api_base_url: String,
    pub data_folder: PathBuf,
    pub recipe_data: Option<PathBuf>,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

/// Applies the CLI → ENV → TOML → default priority order
pub struct ConfigResolver {
    toml: TomlConfig,
    defaults: CompiledDefaults,
}

impl ConfigResolver {
    pub fn new(toml: TomlConfig) -> Self {
        Self {
            toml,
            defaults: CompiledDefaults::for_current_platform(),
        }
    }

    /// Resolver reading the default config file location
    pub fn from_default_location() -> Self {
        let path = default_config_path();
        Self::new(load_or_default(path.as_deref()))
    }

    pub fn resolve(&self, cli: &CliOverrides) -> ResolvedConfig {
        ResolvedConfig {
            api_base_url: self.resolve_api_base_url(cli.api_base_url.as_deref()),
            data_folder: self.resolve_data_folder(cli.data_folder.as_deref()),
            recipe_data: self.toml.recipe_data.clone(),
            log_level: if self.toml.logging.level.trim().is_empty() {
                self.defaults.log_level.clone()
            } else {
                self.toml.logging.level.clone()
            },
            log_file: self.toml.logging.file.clone().or_else(|| self.defaults.log_file.clone()),
        }
    }

    pub fn resolve_api_base_url(&self, cli_arg: Option<&str>) -> String {
        if let Some(url) = cli_arg.filter(|u| !u.trim().is_empty()) {
            return url.trim_end_matches('/').to_string();
        }

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                return url.trim_end_matches('/').to_string();
            }
        }

        if let Some(url) = self.toml.api_base_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return url.trim_end_matches('/').to_string();
        }

        self.defaults.api_base_url.clone()
    }

    pub fn resolve_data_folder(&self, cli_arg: Option<&Path>) -> PathBuf {
        if let Some(path) = cli_arg {
            return path.to_path_buf();
        }

        if let Ok(path) = std::env::var(DATA_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml.data_folder {
            return path.clone();
        }

        self.defaults.data_folder.clone()
    }
}

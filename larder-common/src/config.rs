//! Configuration loading and root folder resolution
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error; a file that exists but does not parse
//! is. Reading the file and reporting where settings came from are separate
//! steps, so binaries can take the log level from the file before tracing is
//! installed and log the rest afterwards.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "LARDER_ROOT_FOLDER";
/// Environment variable overriding the bind address
pub const BIND_ENV: &str = "LARDER_BIND";
/// Environment variable overriding the listen port
pub const PORT_ENV: &str = "LARDER_PORT";
/// Environment variable holding the Gemini API key
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Environment variable overriding the Gemini model
pub const GEMINI_MODEL_ENV: &str = "LARDER_GEMINI_MODEL";
/// Environment variable naming the external add executable
pub const ADD_EXECUTABLE_ENV: &str = "LARDER_ADD_EXECUTABLE";

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_RECIPE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// `[logging]` table of the TOML file
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub recipe_timeout_secs: Option<u64>,
    pub add_executable: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_file: Option<PathBuf>,
    pub root_folder: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub add_executable: Option<PathBuf>,
}

/// The TOML file as read from disk, not yet reported
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    /// Location looked at, if any
    pub path: Option<PathBuf>,
    /// Named on the command line rather than the default location
    pub explicit: bool,
    /// Whether the file existed
    pub found: bool,
    pub toml: TomlConfig,
}

impl ConfigFile {
    /// Locate and parse the config file without logging; `cli_path` wins over
    /// the default location
    pub fn read(cli_path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match cli_path {
            Some(path) => (path.to_path_buf(), true),
            None => match default_config_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            return Ok(Self {
                path: Some(path),
                explicit,
                found: false,
                toml: TomlConfig::default(),
            });
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        let toml = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
        Ok(Self {
            path: Some(path),
            explicit,
            found: true,
            toml,
        })
    }

    /// `[logging] level`, or the default
    pub fn log_level(&self) -> String {
        resolve_log_level(&self.toml)
    }

    /// Log which file was used; a missing default file is routine
    pub fn report(&self) {
        let Some(path) = &self.path else {
            debug!("No config directory on this platform, using defaults");
            return;
        };
        if self.found {
            info!("Loaded config file {}", path.display());
        } else if self.explicit {
            warn!("Config file {} not found, using defaults", path.display());
        } else {
            debug!("No config file at {}, using defaults", path.display());
        }
    }
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct LarderConfig {
    pub root_folder: PathBuf,
    pub bind_address: String,
    pub port: u16,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub recipe_timeout: Duration,
    pub add_executable: Option<PathBuf>,
    pub log_level: String,
}

impl LarderConfig {
    /// Resolve every setting from CLI, environment, TOML file and defaults
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let file = ConfigFile::read(cli.config_file.as_deref())?;
        file.report();
        Self::from_sources(cli, &file.toml)
    }

    /// Resolve against an already loaded TOML config
    pub fn from_sources(cli: &CliOverrides, toml: &TomlConfig) -> Result<Self> {
        let port = match cli.port {
            Some(port) => port,
            None => match env_value(PORT_ENV) {
                Some(text) => text.parse::<u16>().map_err(|e| {
                    Error::Config(format!("{} is not a valid port ({}): {}", PORT_ENV, text, e))
                })?,
                None => toml.port.unwrap_or(DEFAULT_PORT),
            },
        };

        Ok(Self {
            root_folder: resolve_root_folder(cli.root_folder.as_deref(), toml),
            bind_address: cli
                .bind_address
                .clone()
                .or_else(|| env_value(BIND_ENV))
                .or_else(|| non_blank(toml.bind_address.as_deref()))
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port,
            gemini_api_key: resolve_gemini_api_key(toml),
            gemini_model: env_value(GEMINI_MODEL_ENV)
                .or_else(|| non_blank(toml.gemini_model.as_deref()))
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            recipe_timeout: Duration::from_secs(
                toml.recipe_timeout_secs
                    .unwrap_or(DEFAULT_RECIPE_TIMEOUT_SECS),
            ),
            add_executable: cli
                .add_executable
                .clone()
                .or_else(|| env_value(ADD_EXECUTABLE_ENV).map(PathBuf::from))
                .or_else(|| toml.add_executable.clone()),
            log_level: resolve_log_level(toml),
        })
    }
}

/// Non-blank value of an environment variable
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| is_valid_value(v))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.filter(|v| is_valid_value(v)).map(str::to_string)
}

/// Non-empty and not only whitespace
pub fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}

/// `<config_dir>/larder/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("larder").join("config.toml"))
}

fn resolve_log_level(toml: &TomlConfig) -> String {
    non_blank(toml.logging.level.as_deref()).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

/// Root folder: CLI argument, then `LARDER_ROOT_FOLDER`, then TOML, then the
/// platform data directory
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }
    if let Some(path) = env_value(ROOT_FOLDER_ENV) {
        return PathBuf::from(path);
    }
    if let Some(path) = &toml.root_folder {
        return path.clone();
    }
    default_root_folder()
}

/// Gemini API key from the environment, then TOML
pub fn resolve_gemini_api_key(toml: &TomlConfig) -> Option<String> {
    if let Some(key) = env_value(GEMINI_API_KEY_ENV) {
        info!("Gemini API key loaded from environment variable");
        return Some(key);
    }
    if let Some(key) = non_blank(toml.gemini_api_key.as_deref()) {
        info!("Gemini API key loaded from TOML config");
        return Some(key);
    }
    None
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("larder"))
        .unwrap_or_else(|| PathBuf::from("./larder_data"))
}

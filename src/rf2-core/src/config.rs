use crate::paths::PluginDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

const CONFIG_VERSION: u32 = 1;

/// Adapter settings read from `Plugins/<plugin>/adapter.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    #[serde(default = "default_config_version")]
    pub config_version: u32,
    #[serde(default)]
    pub server_mode: ServerMode,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            server_mode: ServerMode::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// How the adapter decides whether it runs inside the dedicated server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServerMode {
    /// Check the running executable's file name.
    #[default]
    Auto,
    Server,
    Client,
}

/// `[logging]` table of `adapter.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Daily files kept in `logs/`, today's included.
    pub max_log_files: usize,
    /// Mirror log lines to the host console.
    pub stdout: bool,
    /// Defaults to `<plugin>.log`.
    pub file_name: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            max_log_files: 7,
            stdout: false,
            file_name: None,
        }
    }
}

/// Verbosity threshold; `off` skips installing a subscriber at all.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    pub fn is_enabled(&self) -> bool {
        *self != LogLevel::Off
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read adapter config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("adapter config {path} is not valid TOML: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("adapter config rejected: {0}")]
    Validation(ValidationError),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("config_version {found} is not supported (1..={supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("max_log_files must be at least 1")]
    NoLogFiles,
}

impl AdapterConfig {
    /// Missing file yields defaults; nothing is created on disk.
    pub fn load_or_default(dirs: &PluginDirs) -> Result<Self, ConfigError> {
        let path = Self::config_path(dirs);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        Self::parse(&contents).map_err(|err| match err {
            ParseFailure::Toml(source) => ConfigError::Parse { path, source },
            ParseFailure::Invalid(err) => ConfigError::Validation(err),
        })
    }

    fn parse(contents: &str) -> Result<Self, ParseFailure> {
        let config: AdapterConfig = toml::from_str(contents).map_err(ParseFailure::Toml)?;
        config.validate().map_err(ParseFailure::Invalid)?;
        Ok(config)
    }

    pub fn config_path(dirs: &PluginDirs) -> PathBuf {
        dirs.plugin_dir().join("adapter.toml")
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.config_version == 0 || self.config_version > CONFIG_VERSION {
            return Err(ValidationError::UnsupportedVersion {
                found: self.config_version,
                supported: CONFIG_VERSION,
            });
        }
        if self.logging.max_log_files == 0 {
            return Err(ValidationError::NoLogFiles);
        }
        Ok(())
    }
}

fn default_config_version() -> u32 {
    CONFIG_VERSION
}

enum ParseFailure {
    Toml(toml::de::Error),
    Invalid(ValidationError),
}

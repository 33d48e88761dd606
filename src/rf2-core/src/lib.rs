pub mod config;
pub mod logging;
pub mod options;
pub mod paths;
pub mod profile;
pub mod session;
pub mod settings;

pub use config::{AdapterConfig, ConfigError, LogLevel, LoggingConfig, ServerMode, ValidationError};
pub use logging::{init_logging, log_file_name, LoggingError, LoggingGuard};
pub use options::{OptionsError, PluginOptions};
pub use paths::{DirsError, PluginDirs};
pub use profile::ProfileError;
pub use session::SessionType;
pub use settings::{PluginSettings, SettingValue, SettingsError};

/// Executable name of the host's dedicated server.
pub const DEDICATED_SERVER_EXE: &str = "rFactor2 Dedicated.exe";

/// Directory, relative to the game root, that holds per-plugin folders.
pub const PLUGINS_DIR: &str = "Plugins";

use crate::PLUGINS_DIR;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Per-plugin directory layout under the game root.
///
/// The host starts plugins with its installation directory as the working
/// directory, so `discover` resolves `Plugins/<name>` against it.
#[derive(Debug, Clone)]
pub struct PluginDirs {
    plugin_name: String,
    root_dir: PathBuf,
    plugin_dir: PathBuf,
    log_dir: PathBuf,
}

impl PluginDirs {
    pub fn discover(plugin_name: &str) -> Result<Self, DirsError> {
        let root = std::env::current_dir().map_err(DirsError::WorkingDirectory)?;
        Ok(Self::with_root(root, plugin_name))
    }

    pub fn with_root(root: impl Into<PathBuf>, plugin_name: &str) -> Self {
        let root_dir = root.into();
        let plugin_dir = root_dir.join(PLUGINS_DIR).join(plugin_name);
        let log_dir = plugin_dir.join("logs");
        Self {
            plugin_name: plugin_name.to_string(),
            root_dir,
            plugin_dir,
            log_dir,
        }
    }

    pub fn ensure_exists(&self) -> Result<(), DirsError> {
        for dir in [&self.plugin_dir, &self.log_dir] {
            std::fs::create_dir_all(dir).map_err(|source| DirsError::CreateDirectory {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// `Plugins/<plugin>/<name>.ini`
    pub fn ini_file(&self, name: &str) -> PathBuf {
        self.plugin_dir.join(format!("{name}.ini"))
    }
}

#[derive(Debug, Error)]
pub enum DirsError {
    #[error("unable to determine the game root directory: {0}")]
    WorkingDirectory(std::io::Error),
    #[error("failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_keyed_by_plugin_name() {
        let dirs = PluginDirs::with_root("/game", "Example");
        assert_eq!(dirs.plugin_dir(), Path::new("/game/Plugins/Example"));
        assert!(dirs.log_dir().ends_with("logs"));
        assert_eq!(
            dirs.ini_file("section"),
            PathBuf::from("/game/Plugins/Example/section.ini")
        );
    }

    #[test]
    fn ensure_exists_creates_plugin_and_log_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = PluginDirs::with_root(tmp.path(), "Example");
        dirs.ensure_exists().unwrap();
        assert!(dirs.plugin_dir().is_dir());
        assert!(dirs.log_dir().is_dir());
    }
}

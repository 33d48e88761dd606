//! Per-plugin variables from the host's custom plugin options JSON file.
//!
//! The file maps each plugin's DLL file name to an object of variables.
//! The host pads some built-in names with a leading space (`" Enabled"`),
//! so lookups ignore surrounding whitespace.

use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("failed to read plugin options at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse plugin options at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginOptions {
    values: Map<String, Value>,
}

impl PluginOptions {
    /// Returns the entry for `plugin_file`, or `None` when the file or the
    /// entry does not exist.
    pub fn load(path: &Path, plugin_file: &str) -> Result<Option<Self>, OptionsError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(OptionsError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let root: Map<String, Value> =
            serde_json::from_str(&contents).map_err(|source| OptionsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let entry = root
            .into_iter()
            .find(|(name, _)| name.trim().eq_ignore_ascii_case(plugin_file));
        Ok(match entry {
            Some((_, Value::Object(values))) => Some(Self { values }),
            _ => None,
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name.trim() == key)
            .map(|(_, value)| value)
    }

    /// The host's on/off switch for the plugin; absent means enabled.
    pub fn enabled(&self) -> bool {
        match self.get("Enabled") {
            Some(Value::Bool(flag)) => *flag,
            Some(value) => value.as_i64().map_or(true, |n| n != 0),
            None => true,
        }
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|name| name.trim())
    }
}

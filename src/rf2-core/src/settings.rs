//! Typed plugin configuration stored in `Plugins/<plugin>/<name>.ini`.
//!
//! Reads consult the named file first and fall back to the plugin's own
//! `<plugin>.ini`; the first non-empty value wins. Writes always target the
//! named file. Nothing is cached, every call goes to disk.

use crate::paths::PluginDirs;
use crate::profile::{self, ProfileError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error("value {value:?} for [{section}] {key} in {path} is not a valid {kind}")]
    Malformed {
        path: PathBuf,
        section: String,
        key: String,
        value: String,
        kind: &'static str,
    },
}

/// A scalar that can be stored as a profile value.
pub trait SettingValue: Sized {
    /// Human-readable type name used in error messages.
    const KIND: &'static str;

    fn parse_setting(text: &str) -> Option<Self>;

    fn to_setting(&self) -> String;
}

macro_rules! impl_setting_value {
    ($($ty:ty => $kind:literal),* $(,)?) => {
        $(
            impl SettingValue for $ty {
                const KIND: &'static str = $kind;

                fn parse_setting(text: &str) -> Option<Self> {
                    text.parse().ok()
                }

                fn to_setting(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_setting_value! {
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    f32 => "f32",
    f64 => "f64",
}

impl SettingValue for bool {
    const KIND: &'static str = "bool";

    fn parse_setting(text: &str) -> Option<Self> {
        match text {
            "1" => Some(true),
            "0" => Some(false),
            t if t.eq_ignore_ascii_case("true") => Some(true),
            t if t.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    fn to_setting(&self) -> String {
        let text = if *self { "1" } else { "0" };
        text.to_string()
    }
}

/// Stored verbatim; an empty string reads back as absent.
impl SettingValue for String {
    const KIND: &'static str = "string";

    fn parse_setting(text: &str) -> Option<Self> {
        Some(text.to_string())
    }

    fn to_setting(&self) -> String {
        self.clone()
    }
}

#[derive(Debug, Clone)]
pub struct PluginSettings {
    dirs: PluginDirs,
}

impl PluginSettings {
    pub fn new(dirs: PluginDirs) -> Self {
        Self { dirs }
    }

    pub fn file_path(&self, name: &str) -> PathBuf {
        self.dirs.ini_file(name)
    }

    /// Reads from `<plugin>.ini`.
    pub fn read<T: SettingValue>(&self, section: &str, key: &str, default: T) -> T {
        self.read_in(self.dirs.plugin_name(), section, key, default)
    }

    /// Reads from `<name>.ini`, falling back to `<plugin>.ini`.
    ///
    /// Missing and malformed values both yield `default`; a malformed value
    /// or an unreadable file is logged. Use [`PluginSettings::try_read_in`]
    /// to tell the cases apart.
    pub fn read_in<T: SettingValue>(&self, name: &str, section: &str, key: &str, default: T) -> T {
        match self.try_read_in(name, section, key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(err) => {
                tracing::warn!(error = %err, "falling back to default setting");
                default
            }
        }
    }

    pub fn try_read<T: SettingValue>(&self, section: &str, key: &str) -> Result<Option<T>, SettingsError> {
        self.try_read_in(self.dirs.plugin_name(), section, key)
    }

    pub fn try_read_in<T: SettingValue>(
        &self,
        name: &str,
        section: &str,
        key: &str,
    ) -> Result<Option<T>, SettingsError> {
        let mut files = vec![self.file_path(name)];
        let fallback = self.file_path(self.dirs.plugin_name());
        if files[0] != fallback {
            files.push(fallback);
        }

        for path in files {
            let Some(value) = profile::read_string(&path, section, key)? else {
                continue;
            };
            return match T::parse_setting(&value) {
                Some(parsed) => Ok(Some(parsed)),
                None => Err(SettingsError::Malformed {
                    path,
                    section: section.to_string(),
                    key: key.to_string(),
                    value,
                    kind: T::KIND,
                }),
            };
        }
        Ok(None)
    }

    /// Writes to `<plugin>.ini`.
    pub fn write<T: SettingValue>(&self, section: &str, key: &str, value: &T) -> Result<(), SettingsError> {
        self.write_in(self.dirs.plugin_name(), section, key, value)
    }

    pub fn write_in<T: SettingValue>(
        &self,
        name: &str,
        section: &str,
        key: &str,
        value: &T,
    ) -> Result<(), SettingsError> {
        let path = self.file_path(name);
        profile::write_string(&path, section, key, &value.to_setting())?;
        tracing::debug!(file = %path.display(), section, key, "setting written");
        Ok(())
    }
}

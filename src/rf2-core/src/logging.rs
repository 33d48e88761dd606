use crate::{config::LoggingConfig, paths::PluginDirs};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, EnvFilter};

/// Keeps the background log writer alive; pending lines are flushed on drop.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _writer: WorkerGuard,
}

/// Installs a global subscriber writing to `Plugins/<plugin>/logs/<file>`.
///
/// Several plugins share the host process and only the first one to call
/// this gets a subscriber; later callers see [`LoggingError::Install`].
pub fn init_logging(config: &LoggingConfig, dirs: &PluginDirs) -> Result<LoggingGuard, LoggingError> {
    let log_dir = dirs.log_dir();
    fs::create_dir_all(log_dir).map_err(|source| LoggingError::CreateDirectory {
        path: log_dir.to_path_buf(),
        source,
    })?;

    let directive = config.level.as_filter_directive();
    let filter = EnvFilter::try_new(directive).map_err(|source| LoggingError::Filter {
        directive: directive.to_string(),
        source,
    })?;

    let file_name = log_file_name(config, dirs);
    for (path, source) in prune_rotated_logs(log_dir, &file_name, config.max_log_files.max(1)) {
        // Another process may still hold the file open; retry next start.
        eprintln!("could not remove old log {}: {source}", path.display());
    }

    let (file, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, &file_name));
    let writer = if config.stdout {
        BoxMakeWriter::new(std::io::stdout.and(file))
    } else {
        BoxMakeWriter::new(file)
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_thread_names(true)
        .try_init()
        .map_err(LoggingError::Install)?;

    Ok(LoggingGuard { _writer: guard })
}

/// `file_name` from the config, else `<plugin>.log`.
pub fn log_file_name(config: &LoggingConfig, dirs: &PluginDirs) -> String {
    match config.file_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("{}.log", dirs.plugin_name()),
    }
}

/// Deletes all but the `keep` most recent daily files of `file_name`,
/// returning the ones that could not be removed.
fn prune_rotated_logs(dir: &Path, file_name: &str, keep: usize) -> Vec<(PathBuf, std::io::Error)> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut rotated: Vec<(SystemTime, PathBuf)> = entries
        .flatten()
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(file_name))
        .filter_map(|entry| {
            let modified = entry.metadata().and_then(|meta| meta.modified()).ok()?;
            Some((modified, entry.path()))
        })
        .collect();

    // newest first
    rotated.sort_by(|a, b| b.0.cmp(&a.0));

    rotated
        .into_iter()
        .skip(keep)
        .filter_map(|(_, path)| fs::remove_file(&path).err().map(|err| (path, err)))
        .collect()
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid log filter {directive:?}: {source}")]
    Filter {
        directive: String,
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("a tracing subscriber is already installed in this process: {0}")]
    Install(Box<dyn std::error::Error + Send + Sync>),
}

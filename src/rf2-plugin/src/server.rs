//! Dedicated server detection, resolved once at startup.

use rf2_core::{ServerMode, DEDICATED_SERVER_EXE};
use std::path::Path;

/// `true` when the file name of `exe` is the dedicated server's, ignoring
/// ASCII case.
pub fn is_dedicated_server(exe: &Path) -> bool {
    exe.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.eq_ignore_ascii_case(DEDICATED_SERVER_EXE))
}

/// Checks the executable of the current process.
pub fn detect_current_exe() -> bool {
    match std::env::current_exe() {
        Ok(exe) => is_dedicated_server(&exe),
        Err(err) => {
            tracing::warn!(error = %err, "cannot determine host executable, assuming client");
            false
        }
    }
}

/// Applies the configured mode, probing only in `Auto`.
pub fn resolve(mode: ServerMode, detect: impl FnOnce() -> bool) -> bool {
    match mode {
        ServerMode::Server => true,
        ServerMode::Client => false,
        ServerMode::Auto => detect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_server_name_case_insensitively() {
        assert!(is_dedicated_server(Path::new("rFactor2 Dedicated.exe")));
        assert!(is_dedicated_server(Path::new("/games/rf2/Bin64/RFACTOR2 DEDICATED.EXE")));
    }

    #[test]
    fn other_executables_are_clients() {
        assert!(!is_dedicated_server(Path::new("rFactor2.exe")));
        assert!(!is_dedicated_server(Path::new("rFactor2 Dedicated.exe.bak")));
        assert!(!is_dedicated_server(Path::new("/games/rFactor2 Dedicated.exe/rFactor2.exe")));
        assert!(!is_dedicated_server(Path::new("")));
    }

    #[test]
    fn explicit_modes_skip_exe_detection() {
        assert!(resolve(ServerMode::Server, || panic!("detected")));
        assert!(!resolve(ServerMode::Client, || panic!("detected")));
        assert!(resolve(ServerMode::Auto, || true));
    }
}

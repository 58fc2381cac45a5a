//! Utility functions for path resolution, ANSI stripping, and time formatting.
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Default debug-log file name, relative to the working directory.
pub const DEFAULT_DEBUG_LOG: &str = "chanlog.log";

/// Default user-log file name, relative to the working directory.
pub const DEFAULT_USER_LOG: &str = "chanlog-user.log";

/// Strip ANSI escape sequences from a string.
///
/// Handles SGR sequences (ending in `m`) and other CSI sequences (ending
/// in any letter in the `@`..`~` range), so cursor movement, erase, etc.
/// are also stripped without consuming unrelated text.
pub(super) fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            if let Some(next) = chars.next()
                && next == '['
            {
                for inner in chars.by_ref() {
                    if ('@'..='~').contains(&inner) {
                        break;
                    }
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Return the `$XDG_CACHE_HOME/chanlog/` directory, creating it if needed.
pub(crate) fn chanlog_cache_dir() -> Option<PathBuf> {
    let cache_dir = std::env::var("XDG_CACHE_HOME").map_or_else(
        |_| {
            std::env::var("HOME")
                .or_else(|_| std::env::var("USERPROFILE"))
                .map_or_else(|_| PathBuf::from("."), PathBuf::from)
                .join(".cache")
        },
        PathBuf::from,
    );
    let dir = cache_dir.join("chanlog");
    fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

/// Return the default startup log path under `$XDG_CACHE_HOME/chanlog/`.
pub(crate) fn default_startup_log_path() -> Option<PathBuf> {
    Some(chanlog_cache_dir()?.join("startup.log"))
}

/// Format the current local time as `YY-MM-DD HH:MM:SS` for line prefixes.
pub(super) fn format_local_timestamp() -> String {
    chrono::Local::now().format("%y-%m-%d %H:%M:%S").to_string()
}

/// Format a duration as seconds with millisecond precision, e.g. `1.250`.
pub(super) fn format_seconds(elapsed: Duration) -> String {
    format!("{:.3}", elapsed.as_secs_f64())
}

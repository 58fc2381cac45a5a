//! Startup settings for the logger: file, environment, then command line.
pub mod toml_loader;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the initial debug level.
pub const ENV_DEBUG: &str = "CHANLOG_DEBUG";
/// Environment variable naming the debug-log file.
pub const ENV_LOGFILE: &str = "CHANLOG_LOGFILE";
/// Environment variable naming the user-log file.
pub const ENV_USER_LOGFILE: &str = "CHANLOG_USER_LOGFILE";

/// Initial logger configuration.
///
/// Every field has a default, so a settings file only needs the keys it
/// changes.  An empty string for a log file selects the default file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Settings {
    /// Debug channel enabled.
    pub debug_logs: bool,
    /// Info channel enabled.
    pub info_logs: bool,
    /// Action channel enabled.
    pub action_logs: bool,
    /// User channel enabled.
    pub user_logs: bool,
    /// Profile lines (timers, enter/exit) enabled.
    pub profile_logs: bool,
    /// Add the time to every prefix but the user one.
    pub log_time: bool,
    /// Add the time to the user prefix.
    pub user_log_time: bool,
    /// Tag shown on user lines.
    pub user_log_prefix: String,
    /// Initial debug level.
    pub debug_level: i32,
    /// Start in verbose mode.
    pub verbose: bool,
    /// Start with all output suppressed.
    pub quiet: bool,
    /// Echo startup-buffer lines to the console.
    pub console_mirror: bool,
    /// Collect early lines in memory until startup is finished.
    pub startup_buffering: bool,
    /// Debug-log file.
    pub debug_log_file: Option<PathBuf>,
    /// User-log file.
    pub user_log_file: Option<PathBuf>,
    /// Where the startup buffer is saved; defaults to the cache directory.
    pub startup_log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug_logs: false,
            info_logs: true,
            action_logs: true,
            user_logs: true,
            profile_logs: false,
            log_time: false,
            user_log_time: true,
            user_log_prefix: "user".to_string(),
            debug_level: 0,
            verbose: false,
            quiet: false,
            console_mirror: false,
            startup_buffering: false,
            debug_log_file: None,
            user_log_file: None,
            startup_log_file: None,
        }
    }
}

impl Settings {
    /// Load settings from `path` (if any) and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => toml_loader::load_config(path)?,
            None => Self::default(),
        };
        settings.apply_env_with(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Apply `CHANLOG_*` overrides, reading variables through `lookup`.
    ///
    /// A numeric `CHANLOG_DEBUG` sets the level and enables debug output; an
    /// empty one disables debug output.  An empty log file variable selects
    /// the default file name.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup(ENV_DEBUG) {
            let value = value.trim();
            if value.is_empty() {
                self.debug_logs = false;
            } else if let Ok(level) = value.parse::<i32>() {
                self.debug_level = level;
                self.debug_logs = true;
            } else {
                tracing::warn!(var = ENV_DEBUG, value, "ignoring non-numeric debug level");
            }
        }
        if let Some(value) = lookup(ENV_LOGFILE) {
            self.debug_log_file = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup(ENV_USER_LOGFILE) {
            self.user_log_file = Some(PathBuf::from(value));
        }
    }
}

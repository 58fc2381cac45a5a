//! Command-line interface definitions for the `chanlog` tool.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Settings;
use crate::logging::Channel;

/// Top-level CLI entry point for the chanlog logger.
#[derive(Parser, Debug)]
#[command(
    name = "chanlog",
    about = "Multi-channel diagnostic logger with redirection and file fallback",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Options shared by all subcommands.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct GlobalOpts {
    /// Settings file (TOML); a missing file means defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose mode: debug output up to level 3
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output, errors included
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Debug level (enables debug output when above 0)
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub level: Option<i32>,

    /// Add the time to line prefixes
    #[arg(long, global = true)]
    pub time: bool,

    /// Write log lines to a file (default: chanlog.log)
    #[arg(long, global = true, num_args = 0..=1, value_name = "FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Write user lines to a file (default: chanlog-user.log)
    #[arg(long, global = true, num_args = 0..=1, value_name = "FILE")]
    pub user_log_file: Option<Option<PathBuf>>,

    /// Show the logger's own diagnostics on stderr
    #[arg(long, global = true)]
    pub trace: bool,

    /// Redirect every channel into tracing through METHOD (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "METHOD")]
    pub redirect: Option<String>,
}

impl GlobalOpts {
    /// Apply command-line overrides on top of file and environment settings.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(level) = self.level {
            settings.debug_level = level;
            settings.debug_logs = level > 0;
        }
        if self.verbose {
            settings.verbose = true;
        }
        if self.quiet {
            settings.quiet = true;
        }
        if self.time {
            settings.log_time = true;
        }
        if let Some(file) = &self.log_file {
            settings.debug_log_file = Some(file.clone().unwrap_or_default());
        }
        if let Some(file) = &self.user_log_file {
            settings.user_log_file = Some(file.clone().unwrap_or_default());
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Emit one message on a channel
    Emit(EmitOpts),
    /// Emit every line read from stdin
    Pipe(PipeOpts),
    /// Run a program and report how long it took
    Time(TimeOpts),
    /// Print the effective settings as JSON
    Settings,
    /// Print a shell completion script
    Completions(CompletionsOpts),
    /// Print version information
    Version,
}

/// Options for the `emit` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct EmitOpts {
    /// Channel: debug, info, action (or log), error, user
    pub channel: Channel,

    /// Message words, joined with spaces
    #[arg(required = true)]
    pub message: Vec<String>,

    /// Level for debug messages
    #[arg(short = 'n', long = "at", default_value_t = 1, allow_negative_numbers = true)]
    pub at: i32,
}

/// Options for the `pipe` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct PipeOpts {
    /// Channel for each line
    #[arg(short, long, default_value = "user")]
    pub channel: Channel,
}

/// Options for the `time` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct TimeOpts {
    /// Timer label (defaults to the command line)
    #[arg(short, long)]
    pub label: Option<String>,

    /// Capture the program's output and log it on the user and error channels
    #[arg(long)]
    pub capture: bool,

    /// Program and arguments
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

/// Options for the `completions` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CompletionsOpts {
    /// Target shell
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_emit() {
        let cli = Cli::parse_from(["chanlog", "emit", "info", "hello", "world"]);
        assert!(
            matches!(&cli.command, Command::Emit(_)),
            "Expected Emit command"
        );
        if let Command::Emit(opts) = cli.command {
            assert_eq!(opts.channel, Channel::Info);
            assert_eq!(opts.message, vec!["hello", "world"]);
            assert_eq!(opts.at, 1);
        }
    }

    #[test]
    fn parse_emit_log_alias() {
        let cli = Cli::parse_from(["chanlog", "emit", "log", "x"]);
        if let Command::Emit(opts) = cli.command {
            assert_eq!(opts.channel, Channel::Action);
        }
    }

    #[test]
    fn parse_emit_unknown_channel_fails() {
        assert!(Cli::try_parse_from(["chanlog", "emit", "loud", "x"]).is_err());
    }

    #[test]
    fn parse_negative_level() {
        let cli = Cli::parse_from(["chanlog", "--level", "-2", "settings"]);
        assert_eq!(cli.global.level, Some(-2));
    }

    #[test]
    fn parse_log_file_without_value() {
        let cli = Cli::parse_from(["chanlog", "--log-file", "--time", "settings"]);
        assert_eq!(cli.global.log_file, Some(None));
    }

    #[test]
    fn parse_log_file_with_value() {
        let cli = Cli::parse_from(["chanlog", "--log-file=run.log", "settings"]);
        assert_eq!(cli.global.log_file, Some(Some(PathBuf::from("run.log"))));
    }

    #[test]
    fn parse_time_collects_command() {
        let cli = Cli::parse_from(["chanlog", "time", "--label", "build", "--", "make", "-j4"]);
        assert!(
            matches!(&cli.command, Command::Time(_)),
            "Expected Time command"
        );
        if let Command::Time(opts) = cli.command {
            assert_eq!(opts.label.as_deref(), Some("build"));
            assert_eq!(opts.command, vec!["make", "-j4"]);
        }
    }

    #[test]
    fn parse_pipe_default_channel() {
        let cli = Cli::parse_from(["chanlog", "pipe"]);
        if let Command::Pipe(opts) = cli.command {
            assert_eq!(opts.channel, Channel::User);
        }
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["chanlog", "version"]);
        assert!(matches!(cli.command, Command::Version));
    }

    #[test]
    fn global_flags_override_settings() {
        let cli = Cli::parse_from([
            "chanlog",
            "-v",
            "--time",
            "--level",
            "2",
            "--user-log-file",
            "u.log",
            "settings",
        ]);
        let mut settings = Settings::default();
        cli.global.apply(&mut settings);
        assert!(settings.verbose);
        assert!(settings.log_time);
        assert_eq!(settings.debug_level, 2);
        assert!(settings.debug_logs);
        assert_eq!(settings.user_log_file, Some(PathBuf::from("u.log")));
        assert_eq!(settings.debug_log_file, None);
    }

    #[test]
    fn empty_log_file_flag_selects_default() {
        let opts = GlobalOpts {
            log_file: Some(None),
            ..GlobalOpts::default()
        };
        let mut settings = Settings::default();
        opts.apply(&mut settings);
        assert_eq!(settings.debug_log_file, Some(PathBuf::new()));
    }
}

//! Subprocess execution for the `time` command.
use anyhow::{Context, Result};
use std::process::{Command, Output, Stdio};

/// Result of a command execution.
#[derive(Debug)]
pub struct ExecResult {
    /// Captured standard output; empty when output was inherited.
    pub stdout: String,
    /// Captured standard error; empty when output was inherited.
    pub stderr: String,
    /// Whether the process exited successfully.
    pub success: bool,
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Render `program` and `args` as a single command line for messages.
#[must_use]
pub fn command_line(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run a command and capture its output, allowing failure.
///
/// # Errors
///
/// Returns an error only if the program cannot be started.
pub fn run_unchecked(program: &str, args: &[&str]) -> Result<ExecResult> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("failed to execute: {}", command_line(program, args)))?;

    Ok(ExecResult::from(output))
}

/// Run a command with the terminal's stdio, allowing failure.
///
/// # Errors
///
/// Returns an error only if the program cannot be started.
pub fn run_inherited(program: &str, args: &[&str]) -> Result<ExecResult> {
    let status = Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("failed to execute: {}", command_line(program, args)))?;

    Ok(ExecResult {
        stdout: String::new(),
        stderr: String::new(),
        success: status.success(),
        code: status.code(),
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn command_line_joins_words() {
        assert_eq!(command_line("make", &["-j4", "all"]), "make -j4 all");
        assert_eq!(command_line("true", &[]), "true");
    }

    #[cfg(not(windows))]
    #[test]
    fn run_unchecked_captures_stdout() {
        let result = run_unchecked("echo", &["hello"]).unwrap();
        assert!(result.success, "echo command should succeed");
        assert_eq!(result.stdout.trim(), "hello");
        assert_eq!(result.code, Some(0));
    }

    #[cfg(not(windows))]
    #[test]
    fn run_unchecked_failure() {
        let result = run_unchecked("false", &[]).unwrap();
        assert!(!result.success, "non-zero exit should set success=false");
    }

    #[cfg(not(windows))]
    #[test]
    fn run_inherited_reports_status() {
        let result = run_inherited("true", &[]).unwrap();
        assert!(result.success);
        assert!(result.stdout.is_empty());
    }

    #[test]
    fn missing_program_is_an_error() {
        let err = run_unchecked("this-program-does-not-exist-12345", &[]).unwrap_err();
        assert!(format!("{err}").contains("failed to execute"), "got {err}");
    }
}

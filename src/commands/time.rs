//! Command: run a program under a profiling timer.
use anyhow::{Context, Result};

use crate::cli::TimeOpts;
use crate::exec::{self, ExecResult};
use crate::logging::Logger;

/// Exit code reported when the program cannot be started.
const NOT_FOUND: i32 = 127;

/// Run the program, time it, and report the outcome.
///
/// Profile lines are switched on for the duration.  Returns the program's
/// exit code, so the caller can pass it on.
///
/// # Errors
///
/// Returns an error if no program was given.
pub fn run(opts: &TimeOpts, log: &Logger) -> Result<i32> {
    let (program, rest) = opts.command.split_first().context("no program given")?;
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();
    let line = exec::command_line(program, &args);

    log.registry().set_profile_enabled(true);
    let mut timer = log.start_timer(opts.label.as_deref().unwrap_or(&line));
    let outcome = if opts.capture {
        exec::run_unchecked(program, &args)
    } else {
        exec::run_inherited(program, &args)
    };
    let elapsed = timer.end();

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            log.error(&format!("{e:#}"), &[]);
            return Ok(NOT_FOUND);
        }
    };
    if opts.capture {
        replay(log, &result);
    }
    report(log, &line, &result, elapsed);
    Ok(result.code.unwrap_or(1))
}

/// Log captured output: stdout on the user channel, stderr on the error channel.
fn replay(log: &Logger, result: &ExecResult) {
    for line in result.stdout.lines() {
        log.user(line, &[]);
    }
    for line in result.stderr.lines() {
        log.error(line, &[]);
    }
}

fn report(log: &Logger, line: &str, result: &ExecResult, elapsed: i64) {
    if result.success {
        log.info("{} finished in {} ms", &[&line, &elapsed]);
    } else {
        let code = result
            .code
            .map_or_else(|| "signal".to_string(), |c| c.to_string());
        log.error("{} failed (exit {}) after {} ms", &[&line, &code, &elapsed]);
    }
}

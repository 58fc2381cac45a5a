//! Command: emit stdin line by line.
use anyhow::{Context, Result};
use std::io::{self, BufRead};
use std::sync::Arc;

use super::emit_on;
use crate::cli::PipeOpts;
use crate::logging::{Channel, Logger};

/// Exit code used after Ctrl-C.
const INTERRUPTED: i32 = 130;

/// Forward stdin to the chosen channel until end of input.
///
/// Ctrl-C flushes and closes the log files before exiting.
///
/// # Errors
///
/// Returns an error if the handler cannot be installed or stdin fails.
pub fn run(opts: &PipeOpts, log: &Arc<Logger>) -> Result<()> {
    let interrupted = Arc::clone(log);
    ctrlc::set_handler(move || {
        interrupted.shutdown();
        std::process::exit(INTERRUPTED);
    })
    .context("installing Ctrl-C handler")?;

    let count = forward(log, opts.channel, io::stdin().lock())?;
    log.debug(2, "pipe: {} lines", &[&count]);
    log.flush().context("flushing log files")
}

/// Emit each line of `input` on `channel`; returns the number of lines.
///
/// # Errors
///
/// Returns an error if reading `input` fails.
pub fn forward(log: &Logger, channel: Channel, input: impl BufRead) -> Result<usize> {
    let mut count = 0;
    for line in input.lines() {
        let line = line.context("reading input")?;
        emit_on(log, channel, 1, &line);
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::captured_logger;

    #[test]
    fn forward_emits_each_line() {
        let (log, console) = captured_logger();
        let count = forward(&log, Channel::Action, "one\ntwo\n".as_bytes()).unwrap();
        assert_eq!(count, 2);
        assert_eq!(console.lines(), vec!["[log] one", "[log] two"]);
    }

    #[test]
    fn forward_empty_input() {
        let (log, console) = captured_logger();
        assert_eq!(forward(&log, Channel::User, "".as_bytes()).unwrap(), 0);
        assert!(console.lines().is_empty());
    }
}

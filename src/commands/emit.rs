//! Command: emit one message.
use anyhow::{Context, Result};

use super::emit_on;
use crate::cli::EmitOpts;
use crate::logging::Logger;

/// Emit the joined message words on the chosen channel.
///
/// # Errors
///
/// Returns an error if the log files cannot be flushed.
pub fn run(opts: &EmitOpts, log: &Logger) -> Result<()> {
    emit_on(log, opts.channel, opts.at, &opts.message.join(" "));
    log.flush().context("flushing log files")
}

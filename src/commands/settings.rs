//! Command: print the effective settings.
use anyhow::{Context, Result};
use std::io::Write;

use crate::config::Settings;

/// Write `settings` to `out` as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if `out` cannot be written.
pub fn run(settings: &Settings, out: &mut impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, settings).context("serializing settings")?;
    writeln!(out).context("writing settings")
}

//! In-memory log kept while the host is still starting up.
//!
//! Lines written before any file sink exists are collected here instead of
//! going to the console.  When startup ends the collected text is saved once
//! to a well-known file and stays readable afterwards.
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::error::SinkError;

use super::utils::format_seconds;

/// Lifecycle of the startup buffer.
///
/// Each phase has exactly one successor: `Buffering -> Flushing -> SinkActive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupPhase {
    /// Lines are collected in memory.
    Buffering,
    /// The collected text is being saved.
    Flushing,
    /// Startup is over; lines go to the regular sinks.
    SinkActive,
}

/// The startup buffer and where it ends up.
#[derive(Debug)]
pub struct StartupLog {
    phase: StartupPhase,
    started: Instant,
    buffer: String,
    /// Where the buffer is saved when startup ends.
    target: Option<PathBuf>,
    /// Where it was actually saved; `None` until a successful save.
    saved: Option<PathBuf>,
}

impl StartupLog {
    /// Start collecting; the text will be saved to `target` when startup ends.
    #[must_use]
    pub fn buffering(target: Option<PathBuf>) -> Self {
        Self {
            phase: StartupPhase::Buffering,
            started: Instant::now(),
            buffer: String::new(),
            target,
            saved: None,
        }
    }

    /// A startup log that is already finished and holds nothing.
    #[must_use]
    pub fn inactive() -> Self {
        Self {
            phase: StartupPhase::SinkActive,
            started: Instant::now(),
            buffer: String::new(),
            target: None,
            saved: None,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> StartupPhase {
        self.phase
    }

    /// Whether lines are being collected.
    #[must_use]
    pub fn is_buffering(&self) -> bool {
        self.phase == StartupPhase::Buffering
    }

    /// Append a line and return it as stored.
    ///
    /// Lines with a prefix are tagged with the seconds elapsed since
    /// buffering began, e.g. `[LOG 0.042] [info] ready`.
    pub fn push(&mut self, prefix: &str, message: &str) -> String {
        let line = if prefix.is_empty() {
            message.to_string()
        } else {
            format!(
                "[LOG {}] {prefix}{message}",
                format_seconds(self.started.elapsed())
            )
        };
        self.buffer.push_str(&line);
        self.buffer.push('\n');
        line
    }

    /// End startup and save the collected text.
    ///
    /// Only the first call does any work.  An empty buffer is not saved.
    /// On failure the partial file is removed and the text stays available
    /// through [`content`](Self::content).
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Persist`] if the file cannot be written.
    pub fn finish(&mut self) -> Result<(), SinkError> {
        if self.phase != StartupPhase::Buffering {
            return Ok(());
        }
        self.phase = StartupPhase::Flushing;
        let result = match self.target.as_deref() {
            Some(path) if !self.buffer.is_empty() => match fs::write(path, &self.buffer) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "startup log saved");
                    self.saved =
                        Some(dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()));
                    Ok(())
                }
                Err(source) => {
                    fs::remove_file(path).ok();
                    Err(SinkError::Persist {
                        path: path.to_path_buf(),
                        source,
                    })
                }
            },
            _ => Ok(()),
        };
        self.phase = StartupPhase::SinkActive;
        result
    }

    /// Everything collected during startup.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.buffer
    }

    /// Where the text was saved, if it was.
    #[must_use]
    pub fn saved_path(&self) -> Option<&Path> {
        self.saved.as_deref()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn push_tags_prefixed_lines_with_elapsed_time() {
        let mut log = StartupLog::buffering(None);
        let line = log.push("[info] ", "ready");
        assert!(line.starts_with("[LOG "), "got {line}");
        assert!(line.ends_with("] [info] ready"), "got {line}");
    }

    #[test]
    fn push_leaves_unprefixed_lines_alone() {
        let mut log = StartupLog::buffering(None);
        assert_eq!(log.push("", "raw"), "raw");
        assert_eq!(log.content(), "raw\n");
    }

    #[test]
    fn finish_saves_buffer_once() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let target = tmp.path().join("startup.log");
        let mut log = StartupLog::buffering(Some(target.clone()));
        log.push("", "first");
        log.finish().unwrap();
        assert_eq!(log.phase(), StartupPhase::SinkActive);
        assert_eq!(fs::read_to_string(&target).unwrap(), "first\n");
        assert!(log.saved_path().is_some());

        fs::write(&target, "changed").unwrap();
        log.finish().unwrap();
        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            "changed",
            "second finish must not rewrite the file"
        );
        assert_eq!(log.content(), "first\n");
    }

    #[test]
    fn finish_with_empty_buffer_saves_nothing() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let target = tmp.path().join("startup.log");
        let mut log = StartupLog::buffering(Some(target.clone()));
        log.finish().unwrap();
        assert!(!target.exists());
        assert!(log.saved_path().is_none());
    }

    #[test]
    fn failed_save_keeps_content() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let target = tmp.path().join("missing-dir").join("startup.log");
        let mut log = StartupLog::buffering(Some(target));
        log.push("", "kept");
        assert!(matches!(log.finish(), Err(SinkError::Persist { .. })));
        assert!(log.saved_path().is_none());
        assert_eq!(log.content(), "kept\n");
        assert!(!log.is_buffering());
    }

    #[test]
    fn inactive_log_is_not_buffering() {
        let mut log = StartupLog::inactive();
        assert!(!log.is_buffering());
        log.finish().unwrap();
        assert_eq!(log.content(), "");
    }
}

//! Fallback destinations: the debug-log and user-log files, the console, and
//! the startup buffer.
use std::fmt;
use std::fs::{self, File};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::SinkError;

use super::channel::SinkGroup;
use super::startup::StartupLog;
use super::utils::{DEFAULT_DEBUG_LOG, DEFAULT_USER_LOG, strip_ansi};

/// An open log file.
#[derive(Debug)]
struct FileSink {
    path: PathBuf,
    stream: LineWriter<File>,
}

impl FileSink {
    fn close(mut self) {
        self.stream.flush().ok();
    }
}

/// Owns every local destination a line can fall back to.
///
/// Not synchronized on its own: the [`Logger`](super::Logger) keeps it
/// behind the emit lock, so a stream is never written by two threads at once.
pub struct SinkManager {
    debug_file: Option<FileSink>,
    user_file: Option<FileSink>,
    console: Box<dyn Write + Send>,
    /// Echo startup-buffer lines to the console.
    console_mirror: bool,
    startup: StartupLog,
}

impl fmt::Debug for SinkManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkManager")
            .field("debug_file", &self.debug_file.as_ref().map(|s| &s.path))
            .field("user_file", &self.user_file.as_ref().map(|s| &s.path))
            .field("console_mirror", &self.console_mirror)
            .field("startup", &self.startup)
            .finish_non_exhaustive()
    }
}

impl SinkManager {
    /// Create a manager writing to `console` until a file sink is set.
    #[must_use]
    pub fn new(console: Box<dyn Write + Send>, startup: StartupLog) -> Self {
        Self {
            debug_file: None,
            user_file: None,
            console,
            console_mirror: false,
            startup,
        }
    }

    /// Echo startup-buffer lines to the console as well.
    pub const fn set_console_mirror(&mut self, on: bool) {
        self.console_mirror = on;
    }

    /// Point `group` at a fresh file.
    ///
    /// `None` or a blank path selects the group's default file name.  An
    /// existing file at the path is deleted first.  If the new file cannot be
    /// opened, an error line goes straight to the console and the previous
    /// sink (if any) stays in place.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Open`] if the file cannot be created.
    pub fn set_file_sink(
        &mut self,
        group: SinkGroup,
        path: Option<&Path>,
    ) -> Result<PathBuf, SinkError> {
        let path = match path {
            Some(p) if !p.as_os_str().to_string_lossy().trim().is_empty() => p.to_path_buf(),
            _ => PathBuf::from(match group {
                SinkGroup::Debug => DEFAULT_DEBUG_LOG,
                SinkGroup::User => DEFAULT_USER_LOG,
            }),
        };
        if let Some(current) = self.slot(group).as_mut() {
            current.stream.flush().ok();
        }
        if path.exists() {
            fs::remove_file(&path).ok();
        }
        let file = match File::create(&path) {
            Ok(file) => file,
            Err(source) => {
                let err = SinkError::Open { path, source };
                writeln!(self.console, "[error] {err}").ok();
                return Err(err);
            }
        };
        let path = dunce::canonicalize(&path).unwrap_or(path);
        let previous = self.slot(group).replace(FileSink {
            path: path.clone(),
            stream: LineWriter::new(file),
        });
        if let Some(old) = previous {
            tracing::debug!(old = %old.path.display(), new = %path.display(), "log file replaced");
            old.close();
        } else {
            tracing::debug!(path = %path.display(), "log file opened");
        }
        Ok(path)
    }

    /// Path of the file currently open for `group`.
    #[must_use]
    pub fn file_path(&self, group: SinkGroup) -> Option<&Path> {
        match group {
            SinkGroup::Debug => self.debug_file.as_ref(),
            SinkGroup::User => self.user_file.as_ref(),
        }
        .map(|s| s.path.as_path())
    }

    /// Write one line for `group`.
    ///
    /// User lines prefer the user file and fall back to the debug file.  With
    /// no file open the line is buffered during startup and printed to the
    /// console otherwise.
    pub fn write(&mut self, group: SinkGroup, prefix: &str, message: &str) {
        let file = match group {
            SinkGroup::User => self.user_file.as_mut().or(self.debug_file.as_mut()),
            SinkGroup::Debug => self.debug_file.as_mut(),
        };
        if let Some(sink) = file {
            match writeln!(sink.stream, "{}", strip_ansi(&format!("{prefix}{message}"))) {
                Ok(()) => return,
                Err(e) => {
                    tracing::warn!(path = %sink.path.display(), error = %e, "log file write failed");
                }
            }
        }
        if self.startup.is_buffering() {
            let line = self.startup.push(prefix, message);
            if self.console_mirror {
                writeln!(self.console, "{line}").ok();
            }
            return;
        }
        writeln!(self.console, "{prefix}{message}").ok();
    }

    /// The startup buffer.
    #[must_use]
    pub const fn startup(&self) -> &StartupLog {
        &self.startup
    }

    /// End the startup phase and save the buffer.
    ///
    /// # Errors
    ///
    /// See [`StartupLog::finish`].
    pub fn finish_startup(&mut self) -> Result<(), SinkError> {
        self.startup.finish()
    }

    /// Flush all open streams and the console.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error encountered.
    pub fn flush(&mut self) -> io::Result<()> {
        for sink in [self.debug_file.as_mut(), self.user_file.as_mut()]
            .into_iter()
            .flatten()
        {
            sink.stream.flush()?;
        }
        self.console.flush()
    }

    /// Flush and close both file streams; later lines go to the console.
    pub fn close_files(&mut self) {
        for sink in [self.debug_file.take(), self.user_file.take()]
            .into_iter()
            .flatten()
        {
            sink.close();
        }
        self.console.flush().ok();
    }

    const fn slot(&mut self, group: SinkGroup) -> &mut Option<FileSink> {
        match group {
            SinkGroup::Debug => &mut self.debug_file,
            SinkGroup::User => &mut self.user_file,
        }
    }
}

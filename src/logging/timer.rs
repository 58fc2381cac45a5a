//! Start/lap/end profiling timer reporting on the profile path.
use std::time::Instant;

use super::logger::Logger;
use super::utils::format_seconds;

/// Elapsed value returned when the timer is not running.
pub const NOT_STARTED: i64 = -1;

/// A wall-clock timer whose lines go through [`Logger::profile`].
///
/// The timer is an independent value; several can run at once.  Lines are
/// only visible when profile logs are enabled, but elapsed times are
/// returned either way.
#[derive(Debug)]
pub struct ProfilingTimer<'a> {
    log: &'a Logger,
    begin: Option<Instant>,
    /// Start label with any tab replaced by a space.
    message: String,
    /// Text before the first tab, reported on lap and end.
    title: Option<String>,
}

impl<'a> ProfilingTimer<'a> {
    /// Create a timer on `log` and start it with `label`.
    #[must_use]
    pub fn start(log: &'a Logger, label: &str) -> Self {
        let mut timer = Self {
            log,
            begin: None,
            message: String::new(),
            title: None,
        };
        timer.restart(label);
        timer
    }

    /// Start (again) with a new label, discarding any running measurement.
    pub fn restart(&mut self, label: &str) {
        match label.split_once('\t') {
            Some((title, _)) => {
                self.title = Some(title.to_string());
                self.message = label.replace('\t', " ");
            }
            None => {
                self.title = None;
                self.message = label.to_string();
            }
        }
        if !self.message.is_empty() {
            self.log.profile(&format!("TStart: {}", self.message), &[]);
        }
        self.begin = Some(Instant::now());
    }

    /// Whether a measurement is in progress.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.begin.is_some()
    }

    /// Report the time since start without stopping; returns milliseconds.
    ///
    /// Returns [`NOT_STARTED`] if the timer has been ended.
    pub fn lap(&mut self, label: &str) -> i64 {
        let text = format!("({label}) {}", self.subject());
        self.measure(&text, true)
    }

    /// Report the time since start and stop; returns milliseconds.
    ///
    /// Returns [`NOT_STARTED`] if the timer has already been ended.
    pub fn end(&mut self) -> i64 {
        let text = self.subject().to_string();
        self.measure(&text, false)
    }

    fn subject(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.message)
    }

    fn measure(&mut self, text: &str, lap: bool) -> i64 {
        let Some(begin) = self.begin else {
            self.log
                .profile(&format!("TError: timer not started ({text})"), &[]);
            return NOT_STARTED;
        };
        let elapsed = begin.elapsed();
        if !lap {
            self.begin = None;
        }
        if !text.is_empty() {
            let seconds = format_seconds(elapsed);
            let line = if lap {
                format!("TLap: ({seconds} sec): {text}")
            } else {
                format!("TEnd ({seconds} sec): {text}")
            };
            self.log.profile(&line, &[]);
        }
        i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::{CapturedConsole, StartupLog};

    fn profiling_logger() -> (Logger, CapturedConsole) {
        let console = CapturedConsole::default();
        let log = Logger::with_console(Box::new(console.clone()), StartupLog::inactive());
        log.registry().set_profile_enabled(true);
        (log, console)
    }

    #[test]
    fn start_then_end_reports_elapsed() {
        let (log, console) = profiling_logger();
        let mut timer = log.start_timer("load");
        assert!(timer.end() >= 0);
        let lines = console.lines();
        assert_eq!(lines[0], "[profile] TStart: load");
        assert!(lines[1].starts_with("[profile] TEnd ("), "got {}", lines[1]);
        assert!(lines[1].ends_with(" sec): load"), "got {}", lines[1]);
    }

    #[test]
    fn second_end_returns_sentinel() {
        let (log, console) = profiling_logger();
        let mut timer = log.start_timer("x");
        timer.end();
        assert_eq!(timer.end(), NOT_STARTED);
        assert_eq!(
            console.lines().last().unwrap(),
            "[profile] TError: timer not started (x)"
        );
        assert!(!timer.is_running());
    }

    #[test]
    fn lap_keeps_running() {
        let (log, console) = profiling_logger();
        let mut timer = log.start_timer("scan");
        assert!(timer.lap("one") >= 0);
        assert!(timer.is_running());
        assert!(timer.lap("two") >= 0);
        assert!(timer.end() >= 0);
        let lines = console.lines();
        assert!(lines[1].starts_with("[profile] TLap: ("));
        assert!(lines[1].ends_with(" sec): (one) scan"), "got {}", lines[1]);
        assert!(lines[2].ends_with(" sec): (two) scan"), "got {}", lines[2]);
    }

    #[test]
    fn tab_splits_title_from_message() {
        let (log, console) = profiling_logger();
        let mut timer = log.start_timer("find\tin region 3");
        timer.end();
        let lines = console.lines();
        assert_eq!(lines[0], "[profile] TStart: find in region 3");
        assert!(lines[1].ends_with(" sec): find"), "got {}", lines[1]);
    }

    #[test]
    fn empty_label_is_silent() {
        let (log, console) = profiling_logger();
        let mut timer = log.start_timer("");
        assert!(timer.end() >= 0);
        assert!(console.lines().is_empty());
    }

    #[test]
    fn restart_after_end_runs_again() {
        let (log, _console) = profiling_logger();
        let mut timer = log.start_timer("a");
        timer.end();
        timer.restart("b");
        assert!(timer.end() >= 0);
    }

    #[test]
    fn timer_works_with_profile_logs_off() {
        let console = CapturedConsole::default();
        let log = Logger::with_console(Box::new(console.clone()), StartupLog::inactive());
        let mut timer = log.start_timer("quiet");
        assert!(timer.end() >= 0);
        assert_eq!(timer.end(), NOT_STARTED);
        assert!(console.lines().is_empty());
    }
}

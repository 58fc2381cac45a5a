//! Multi-channel logging: gates, redirection, fallback sinks and timers.

mod channel;
mod format;
mod gate;
mod logger;
mod redirect;
mod sink;
mod startup;
mod subscriber;
mod timer;
mod utils;

pub use channel::{Channel, ChannelRegistry, SinkGroup};
pub use format::{Arg, expand};
pub use gate::{ALWAYS, LevelGate, VERBOSE_LEVEL};
pub use logger::Logger;
pub use redirect::{
    Delivery, FnSink, Handler, MessageSink, RedirectionBinder, SinkHost, TracingSink,
};
pub use sink::SinkManager;
pub use startup::{StartupLog, StartupPhase};
pub use subscriber::init_subscriber;
pub use timer::{NOT_STARTED, ProfilingTimer};
pub use utils::{DEFAULT_DEBUG_LOG, DEFAULT_USER_LOG};

/// In-memory console shared between a logger and the test inspecting it.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct CapturedConsole(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

#[cfg(test)]
impl std::io::Write for CapturedConsole {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
impl CapturedConsole {
    /// Everything written so far.
    pub(crate) fn text(&self) -> String {
        let bytes = self
            .0
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Everything written so far, split into lines.
    pub(crate) fn lines(&self) -> Vec<String> {
        self.text().lines().map(String::from).collect()
    }
}

/// Create a logger writing to a [`CapturedConsole`], with user timestamps off.
#[cfg(test)]
pub(crate) fn captured_logger() -> (Logger, CapturedConsole) {
    let console = CapturedConsole::default();
    let log = Logger::with_console(Box::new(console.clone()), StartupLog::inactive());
    log.registry().set_user_log_time(false);
    (log, console)
}

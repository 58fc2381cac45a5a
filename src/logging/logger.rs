//! The logger: channel entry points, the emit path, and runtime configuration.
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use crate::config::Settings;
use crate::error::{RedirectError, SinkError};

use super::channel::{Channel, ChannelRegistry, SinkGroup};
use super::format::{Arg, expand};
use super::gate::{ALWAYS, LevelGate, VERBOSE_LEVEL};
use super::redirect::{Delivery, MessageSink, RedirectionBinder};
use super::sink::SinkManager;
use super::startup::StartupLog;
use super::timer::ProfilingTimer;
use super::utils::{default_startup_log_path, format_local_timestamp};

/// How a line is matched against the level gate.
#[derive(Debug, Clone, Copy)]
enum Gate {
    /// Compared against the threshold.
    At(i32),
    /// Ignores the threshold; only quiet mode stops it.
    Unleveled,
}

/// Routing for one emitted line.
#[derive(Debug)]
struct Line {
    channel: Channel,
    gate: Gate,
    /// Written as `[tag] `; empty for unprefixed lines.
    tag: String,
    /// Re-emit as a debug line at high verbosity when not redirected.
    retag: bool,
}

/// Multi-channel logger with late-bound redirection and local fallback sinks.
///
/// Every call goes through the same sequence: the [`LevelGate`] decides
/// whether the line is wanted, the template is expanded, the line is offered
/// to the channel's redirection target, and anything not taken there is
/// written to the channel's file, the startup buffer or the console.
///
/// The tail of that sequence runs under a single lock shared by all
/// channels, so lines never interleave.  Gate and registry lookups are
/// lock-free.  A line logged by a redirection handler on its own thread
/// skips redirection and goes straight to the local sinks.
#[derive(Debug)]
pub struct Logger {
    gate: LevelGate,
    registry: ChannelRegistry,
    /// The emit lock; taken before `sinks` when both are needed.
    binder: Mutex<RedirectionBinder>,
    sinks: Mutex<SinkManager>,
    /// Thread currently running a redirection handler.
    delivering: Mutex<Option<ThreadId>>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Create a logger with default settings that prints to stdout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_console(Box::new(io::stdout()), StartupLog::inactive())
    }

    /// Create a logger with default settings writing to `console`.
    #[must_use]
    pub fn with_console(console: Box<dyn Write + Send>, startup: StartupLog) -> Self {
        Self {
            gate: LevelGate::new(0),
            registry: ChannelRegistry::new(),
            binder: Mutex::new(RedirectionBinder::new()),
            sinks: Mutex::new(SinkManager::new(console, startup)),
            delivering: Mutex::new(None),
        }
    }

    /// Create a logger from `settings`, printing to stdout.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::from_settings_with_console(settings, Box::new(io::stdout()))
    }

    /// Create a logger from `settings`, writing console output to `console`.
    ///
    /// Log files named in the settings are opened immediately; a file that
    /// cannot be opened is reported and the console stays in use.
    #[must_use]
    pub fn from_settings_with_console(
        settings: &Settings,
        console: Box<dyn Write + Send>,
    ) -> Self {
        let startup = if settings.startup_buffering {
            StartupLog::buffering(
                settings
                    .startup_log_file
                    .clone()
                    .or_else(default_startup_log_path),
            )
        } else {
            StartupLog::inactive()
        };
        let log = Self::with_console(console, startup);
        log.sinks().set_console_mirror(settings.console_mirror);

        let reg = &log.registry;
        reg.set_enabled(Channel::Info, settings.info_logs);
        reg.set_enabled(Channel::Action, settings.action_logs);
        reg.set_enabled(Channel::User, settings.user_logs);
        reg.set_profile_enabled(settings.profile_logs);
        reg.set_log_time(settings.log_time);
        reg.set_user_log_time(settings.user_log_time);
        reg.set_user_tag(&settings.user_log_prefix);

        log.set_level(settings.debug_level);
        // An explicit flag wins over the level-derived default.
        reg.set_enabled(Channel::Debug, settings.debug_logs || settings.debug_level > 0);
        if settings.verbose {
            log.set_verbose();
        }
        log.set_quiet(settings.quiet);

        if let Some(path) = &settings.debug_log_file {
            log.set_debug_log_file(Some(path)).ok();
        }
        if let Some(path) = &settings.user_log_file {
            log.set_user_log_file(Some(path)).ok();
        }
        log
    }

    fn sinks(&self) -> MutexGuard<'_, SinkManager> {
        lock(&self.sinks)
    }

    /// Take the emit lock, unless this thread is inside one of our handlers.
    fn binder(&self) -> Result<MutexGuard<'_, RedirectionBinder>, RedirectError> {
        if self.in_handler() {
            return Err(RedirectError::InsideHandler);
        }
        Ok(lock(&self.binder))
    }

    fn in_handler(&self) -> bool {
        *lock(&self.delivering) == Some(thread::current().id())
    }

    // -----------------------------------------------------------------------
    // Channel entry points
    // -----------------------------------------------------------------------

    /// Log a debug message at `level`.
    ///
    /// Emitted when the debug channel is enabled (or verbose mode is on) and
    /// `level` does not exceed the threshold.
    pub fn debug(&self, level: i32, template: &str, args: &[Arg<'_>]) {
        if !(self.registry.is_enabled(Channel::Debug) || self.gate.is_verbose()) {
            return;
        }
        self.emit(
            &Line {
                channel: Channel::Debug,
                gate: Gate::At(level),
                tag: Channel::Debug.default_tag().to_string(),
                retag: false,
            },
            template,
            args,
        );
    }

    /// Log an informative message.
    pub fn info(&self, template: &str, args: &[Arg<'_>]) {
        if !self.registry.is_enabled(Channel::Info) {
            return;
        }
        self.emit(&self.channel_line(Channel::Info, true), template, args);
    }

    /// Log an action performed by the host.
    pub fn action(&self, template: &str, args: &[Arg<'_>]) {
        if !self.registry.is_enabled(Channel::Action) {
            return;
        }
        self.emit(&self.channel_line(Channel::Action, true), template, args);
    }

    /// Log an error.  Always enabled; only quiet mode suppresses it.
    pub fn error(&self, template: &str, args: &[Arg<'_>]) {
        let line = Line {
            gate: Gate::Unleveled,
            ..self.channel_line(Channel::Error, false)
        };
        self.emit(&line, template, args);
    }

    /// Log a message on behalf of the user.
    ///
    /// Ignores the level.  The prefix is the configured user tag, followed
    /// by the time when user timestamps are on.
    pub fn user(&self, template: &str, args: &[Arg<'_>]) {
        if !self.registry.is_enabled(Channel::User) {
            return;
        }
        let tag = self.registry.tag(Channel::User);
        let tag = if self.registry.user_log_time() {
            format!("{tag} ({})", format_local_timestamp())
        } else {
            tag
        };
        self.emit(
            &Line {
                channel: Channel::User,
                gate: Gate::Unleveled,
                tag,
                retag: false,
            },
            template,
            args,
        );
    }

    /// Log a profiling message; only emitted when profile logs are on.
    pub fn profile(&self, template: &str, args: &[Arg<'_>]) {
        if !self.registry.profile_enabled() {
            return;
        }
        self.emit(
            &Line {
                channel: Channel::Debug,
                gate: Gate::At(ALWAYS),
                tag: "profile".to_string(),
                retag: false,
            },
            template,
            args,
        );
    }

    /// Profile convenience: entering `what`.
    pub fn enter(&self, what: &str, args: &[Arg<'_>]) {
        self.profile(&format!("entering: {what}"), args);
    }

    /// Profile convenience: leaving `what`.
    pub fn exit(&self, what: &str, args: &[Arg<'_>]) {
        self.profile(&format!("exiting: {what}"), args);
    }

    /// Emit an unprefixed line and return its text.
    #[allow(clippy::must_use_candidate)]
    pub fn print(&self, template: &str, args: &[Arg<'_>]) -> String {
        let message = self.render(template, args);
        let line = Line {
            channel: Channel::Debug,
            gate: Gate::At(ALWAYS),
            tag: String::new(),
            retag: false,
        };
        if self.admits(line.gate) {
            self.emit_rendered(&line, &message);
        }
        message
    }

    /// Start a profiling timer labelled `label`.
    ///
    /// A tab in the label separates a short title, reported on lap and end,
    /// from the rest of the message.
    #[must_use]
    pub fn start_timer(&self, label: &str) -> ProfilingTimer<'_> {
        ProfilingTimer::start(self, label)
    }

    // -----------------------------------------------------------------------
    // Emit path
    // -----------------------------------------------------------------------

    fn channel_line(&self, channel: Channel, retag: bool) -> Line {
        Line {
            channel,
            gate: Gate::At(ALWAYS),
            tag: self.registry.tag(channel),
            retag,
        }
    }

    fn admits(&self, gate: Gate) -> bool {
        match gate {
            Gate::At(level) => self.gate.should_emit(level),
            Gate::Unleveled => self.gate.should_emit_unleveled(),
        }
    }

    fn emit(&self, line: &Line, template: &str, args: &[Arg<'_>]) {
        if !self.admits(line.gate) {
            return;
        }
        let message = self.render(template, args);
        self.emit_rendered(line, &message);
    }

    /// Expand `template`; a bad template is reported once and used verbatim.
    fn render(&self, template: &str, args: &[Arg<'_>]) -> String {
        if args.is_empty() {
            return template.to_string();
        }
        match expand(template, args) {
            Ok(message) => message,
            Err(e) => {
                self.error(&format!("bad message template \"{template}\": {e}"), &[]);
                template.to_string()
            }
        }
    }

    fn emit_rendered(&self, line: &Line, message: &str) {
        let Ok(mut binder) = self.binder() else {
            self.write_local(line, message);
            return;
        };
        self.emit_locked(&mut binder, line, message);
    }

    /// Offer a line to `channel`'s handler, marking this thread as inside it.
    fn deliver(
        &self,
        binder: &mut RedirectionBinder,
        channel: Channel,
        prefix: &str,
        message: &str,
    ) -> Delivery {
        *lock(&self.delivering) = Some(thread::current().id());
        let delivery = binder.deliver(channel, prefix, message);
        *lock(&self.delivering) = None;
        delivery
    }

    /// Write a line to its local sink, bypassing redirection.
    fn write_local(&self, line: &Line, message: &str) {
        match self.retagged(line) {
            Some(debug) => self.write_local(&debug, message),
            None => {
                let prefix = self.site_prefix(line);
                self.sinks().write(line.channel.group(), &prefix, message);
            }
        }
    }

    /// The debug line an info or action line becomes at high verbosity.
    fn retagged(&self, line: &Line) -> Option<Line> {
        (line.retag && self.gate.threshold() >= VERBOSE_LEVEL).then(|| Line {
            channel: Channel::Debug,
            gate: Gate::At(VERBOSE_LEVEL),
            tag: Channel::Debug.default_tag().to_string(),
            retag: false,
        })
    }

    fn site_prefix(&self, line: &Line) -> String {
        if line.tag.is_empty() {
            return String::new();
        }
        if self.registry.log_time() && line.channel != Channel::User {
            format!("[{} ({})] ", line.tag, format_local_timestamp())
        } else {
            format!("[{}] ", line.tag)
        }
    }

    fn emit_locked(&self, binder: &mut RedirectionBinder, line: &Line, message: &str) {
        let prefix = self.site_prefix(line);
        let redirect_prefix = self.registry.redirect_prefix(line.channel, &prefix);
        match self.deliver(binder, line.channel, &redirect_prefix, message) {
            Delivery::Delivered => return,
            Delivery::Unbound => {}
            Delivery::Failed { method, error } => {
                let report = format!(
                    "calling ({}) logger.{method} failed - resetting to default: {error}",
                    line.channel
                );
                tracing::warn!(channel = %line.channel, %method, %error, "redirected delivery failed");
                self.report_locked(binder, &report, line.channel != Channel::Error);
            }
        }
        if let Some(debug) = self.retagged(line) {
            self.emit_locked(binder, &debug, message);
            return;
        }
        self.sinks().write(line.channel.group(), &prefix, message);
    }

    /// Write an error line while the emit lock is held.
    ///
    /// The error channel's own redirection is tried only when `redirect` is
    /// set; if that fails as well, both reports go to the local sink.
    fn report_locked(&self, binder: &mut RedirectionBinder, text: &str, redirect: bool) {
        if !self.gate.should_emit_unleveled() {
            return;
        }
        let line = Line {
            gate: Gate::Unleveled,
            ..self.channel_line(Channel::Error, false)
        };
        let prefix = self.site_prefix(&line);
        if redirect {
            let redirect_prefix = self.registry.redirect_prefix(Channel::Error, &prefix);
            match self.deliver(binder, Channel::Error, &redirect_prefix, text) {
                Delivery::Delivered => return,
                Delivery::Unbound => {}
                Delivery::Failed { method, error } => {
                    let nested = format!(
                        "calling (error) logger.{method} failed - resetting to default: {error}"
                    );
                    self.sinks().write(SinkGroup::Debug, &prefix, &nested);
                }
            }
        }
        self.sinks().write(SinkGroup::Debug, &prefix, text);
    }

    // -----------------------------------------------------------------------
    // Level controls
    // -----------------------------------------------------------------------

    /// Set the debug level.  Debug output is enabled exactly when `level > 0`.
    pub fn set_level(&self, level: i32) {
        self.gate.set_level(level);
        self.registry.set_enabled(Channel::Debug, level > 0);
    }

    /// Current debug level.
    #[must_use]
    pub fn level(&self) -> i32 {
        self.gate.level()
    }

    /// Whether the effective threshold is at least `level`.
    #[must_use]
    pub fn is_level(&self, level: i32) -> bool {
        self.gate.threshold() >= level
    }

    /// Reset the debug level to 0.
    pub fn off(&self) {
        self.set_level(0);
    }

    /// Raise the level to [`VERBOSE_LEVEL`] and show debug output.
    pub fn set_verbose(&self) {
        self.gate.set_verbose();
    }

    /// Whether verbose mode is on.
    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.gate.is_verbose()
    }

    /// Suppress (or restore) all output, errors included.
    pub fn set_quiet(&self, quiet: bool) {
        self.gate.set_quiet(quiet);
    }

    /// Whether all output is suppressed.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.gate.is_quiet()
    }

    /// Channel enable flags, tags and display options.
    #[must_use]
    pub const fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    // -----------------------------------------------------------------------
    // Redirection
    // -----------------------------------------------------------------------

    /// Attach `sink` as the redirection target; redirected lines keep their prefix.
    ///
    /// # Errors
    ///
    /// Returns [`RedirectError::Unsupported`] if the sink cannot bind methods.
    pub fn attach<S>(&self, sink: &Arc<S>) -> Result<(), RedirectError>
    where
        S: MessageSink + 'static,
    {
        self.attach_with(sink, true)
    }

    /// Attach `sink`; redirected lines carry no prefix at all.
    ///
    /// # Errors
    ///
    /// Returns [`RedirectError::Unsupported`] if the sink cannot bind methods.
    pub fn attach_no_prefix<S>(&self, sink: &Arc<S>) -> Result<(), RedirectError>
    where
        S: MessageSink + 'static,
    {
        self.attach_with(sink, false)
    }

    fn attach_with<S>(&self, sink: &Arc<S>, prefix_all: bool) -> Result<(), RedirectError>
    where
        S: MessageSink + 'static,
    {
        let result = self
            .binder()
            .and_then(|mut binder| binder.attach(sink, prefix_all));
        match &result {
            Ok(()) => {
                tracing::debug!(sink = %sink.describe(), prefix_all, "logger sink attached");
                self.debug(3, "attached logger {}", &[&sink.describe()]);
            }
            Err(e) => self.error("setLogger: {}", &[e]),
        }
        result
    }

    /// Detach the redirection target; all channels revert to local sinks.
    ///
    /// Ignored, with an error line, when called from inside a handler.
    pub fn detach(&self) {
        match self.binder() {
            Ok(mut binder) => binder.detach(),
            Err(e) => self.error("setLogger: {}", &[&e]),
        }
    }

    /// Bind `channel` to `method` on the attached sink; an empty name unbinds.
    ///
    /// # Errors
    ///
    /// Returns a [`RedirectError`] if the method cannot be bound.  The
    /// failure is also logged on the error channel.
    pub fn bind(&self, channel: Channel, method: &str) -> Result<(), RedirectError> {
        let result = self
            .binder()
            .and_then(|mut binder| binder.bind(channel, method));
        match &result {
            Ok(()) => tracing::debug!(%channel, method, "channel binding changed"),
            Err(e) => self.error("setLogger: {}", &[e]),
        }
        result
    }

    /// Bind all five channels to `method`.
    ///
    /// Channels that bind successfully stay bound even if others fail.
    ///
    /// # Errors
    ///
    /// Returns [`RedirectError::Partial`] naming the channels left unbound,
    /// or the error that prevented any binding.
    pub fn bind_all(&self, method: &str) -> Result<(), RedirectError> {
        self.debug(3, "setLoggerAll: {}", &[&method]);
        let result = self.binder().and_then(|mut binder| binder.bind_all(method));
        if let Err(e) = &result {
            self.error("setLogger: {}", &[e]);
        }
        result
    }

    /// Whether `channel` is currently redirected.
    ///
    /// Always `false` from inside a handler, where lines are not redirected.
    #[must_use]
    pub fn is_bound(&self, channel: Channel) -> bool {
        self.binder().is_ok_and(|binder| binder.is_bound(channel))
    }

    // -----------------------------------------------------------------------
    // Sinks
    // -----------------------------------------------------------------------

    /// Send debug, info, action, error and profile lines to a fresh file.
    ///
    /// `None` or a blank path means `chanlog.log` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Open`] if the file cannot be created; the
    /// previous destination stays in use.
    pub fn set_debug_log_file(&self, path: Option<&Path>) -> Result<PathBuf, SinkError> {
        self.set_file(SinkGroup::Debug, path)
    }

    /// Send user lines to a fresh file.
    ///
    /// `None` or a blank path means `chanlog-user.log` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Open`] if the file cannot be created; the
    /// previous destination stays in use.
    pub fn set_user_log_file(&self, path: Option<&Path>) -> Result<PathBuf, SinkError> {
        self.set_file(SinkGroup::User, path)
    }

    fn set_file(&self, group: SinkGroup, path: Option<&Path>) -> Result<PathBuf, SinkError> {
        let result = self.sinks().set_file_sink(group, path);
        if let Ok(opened) = &result {
            let what = match group {
                SinkGroup::Debug => "setLogFile",
                SinkGroup::User => "setUserLogFile",
            };
            self.debug(3, "{}: {}", &[&what, &opened.display()]);
        }
        result
    }

    /// Path of the file currently receiving `group`'s lines.
    #[must_use]
    pub fn log_file_path(&self, group: SinkGroup) -> Option<PathBuf> {
        self.sinks().file_path(group).map(Path::to_path_buf)
    }

    /// Echo startup-buffer lines to the console.
    pub fn set_console_mirror(&self, on: bool) {
        self.sinks().set_console_mirror(on);
    }

    /// Whether the startup phase is still active.
    #[must_use]
    pub fn is_starting(&self) -> bool {
        self.sinks().startup().is_buffering()
    }

    /// End the startup phase, save the buffer, and return its content.
    ///
    /// Safe to call repeatedly; only the first call saves anything.
    #[allow(clippy::must_use_candidate)]
    pub fn finish_startup(&self) -> String {
        let (result, content) = {
            let mut sinks = self.sinks();
            let result = sinks.finish_startup();
            (result, sinks.startup().content().to_string())
        };
        if let Err(e) = result {
            self.error("{}", &[&e]);
        }
        content
    }

    /// Text collected during startup.
    #[must_use]
    pub fn startup_log(&self) -> String {
        self.sinks().startup().content().to_string()
    }

    /// Where the startup text was saved, if it was.
    #[must_use]
    pub fn startup_log_path(&self) -> Option<PathBuf> {
        self.sinks()
            .startup()
            .saved_path()
            .map(Path::to_path_buf)
    }

    /// Flush all open streams.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error encountered.
    pub fn flush(&self) -> io::Result<()> {
        self.sinks().flush()
    }

    /// Flush and close the log files.  Later lines go to the console.
    pub fn shutdown(&self) {
        self.sinks().close_files();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

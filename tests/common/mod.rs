// Shared helpers for integration tests.
//
// Provides an in-memory console that a logger can write to and a recording
// sink whose methods can be made to fail, so each integration test can
// observe exactly where a line ended up.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use chanlog::error::DeliveryError;
use chanlog::logging::{Channel, Handler, Logger, MessageSink, SinkHost, StartupLog};

/// Console writer whose output can be inspected after the fact.
#[derive(Clone, Default)]
pub struct Console(Arc<Mutex<Vec<u8>>>);

impl Write for Console {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("console lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Console {
    /// Everything written so far.
    pub fn text(&self) -> String {
        String::from_utf8(self.0.lock().expect("console lock").clone()).expect("utf-8 console")
    }

    /// Everything written so far, one entry per line.
    pub fn lines(&self) -> Vec<String> {
        self.text().lines().map(String::from).collect()
    }
}

/// A logger writing to a fresh [`Console`], with user timestamps off.
pub fn logger() -> (Logger, Console) {
    logger_with(StartupLog::inactive())
}

/// Like [`logger`], starting from the given startup buffer.
pub fn logger_with(startup: StartupLog) -> (Logger, Console) {
    let console = Console::default();
    let log = Logger::with_console(Box::new(console.clone()), startup);
    log.registry().set_user_log_time(false);
    (log, console)
}

/// A sink that records every `(method, line)` it receives.
pub struct RecordingSink {
    methods: Vec<String>,
    failing: Vec<String>,
    host: SinkHost,
    reject: Option<Channel>,
    seen: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingSink {
    /// A native sink exposing `methods`.
    pub fn new(methods: &[&str]) -> Self {
        Self {
            methods: methods.iter().map(|m| (*m).to_string()).collect(),
            failing: Vec::new(),
            host: SinkHost::Native,
            reject: None,
            seen: Arc::default(),
        }
    }

    /// Make `method` fail every time it is called.
    pub fn failing(mut self, method: &str) -> Self {
        self.failing.push(method.to_string());
        self
    }

    /// Report `host` as the lookup strategy.
    pub const fn host(mut self, host: SinkHost) -> Self {
        self.host = host;
        self
    }

    /// Refuse to bind anything for `channel` (scripted hosts only).
    pub const fn rejecting(mut self, channel: Channel) -> Self {
        self.reject = Some(channel);
        self
    }

    /// Lines received so far.
    pub fn lines(&self) -> Vec<String> {
        self.seen
            .lock()
            .expect("sink lock")
            .iter()
            .map(|(_, line)| line.clone())
            .collect()
    }

    /// `(method, line)` pairs received so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.seen.lock().expect("sink lock").clone()
    }

    fn record(
        seen: &Mutex<Vec<(String, String)>>,
        method: &str,
        line: &str,
        fail: bool,
    ) -> Result<(), DeliveryError> {
        seen.lock()
            .expect("sink lock")
            .push((method.to_string(), line.to_string()));
        if fail {
            Err(DeliveryError::Failed(format!("{method} is broken")))
        } else {
            Ok(())
        }
    }
}

impl MessageSink for RecordingSink {
    fn describe(&self) -> String {
        "RecordingSink".to_string()
    }

    fn host(&self) -> SinkHost {
        self.host
    }

    fn resolve(&self, method: &str) -> Option<Handler> {
        if !self.methods.iter().any(|m| m == method) {
            return None;
        }
        let seen = Arc::clone(&self.seen);
        let name = method.to_string();
        let fail = self.failing.contains(&name);
        Some(Arc::new(move |line: &str| {
            Self::record(&seen, &name, line, fail)
        }))
    }

    fn check_method(&self, method: &str, channel: Channel) -> bool {
        self.reject != Some(channel) && self.methods.iter().any(|m| m == method)
    }

    fn invoke(&self, method: &str, message: &str) -> Result<(), DeliveryError> {
        let fail = self.failing.iter().any(|m| m == method);
        Self::record(&self.seen, method, message, fail)
    }
}

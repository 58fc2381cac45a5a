//! Late-bound redirection of channels to handlers on a caller-supplied sink.
//!
//! A caller attaches a [`MessageSink`] and then binds channels to named
//! single-string handlers on it.  Names are resolved once, at bind time, into
//! a [`Handler`].  For sinks whose methods can only be checked by the host at
//! runtime ([`SinkHost::Scripted`]) the name is recorded and resolved on each
//! call instead.  Either way a handler that fails is unbound on the spot: the
//! channel reverts to its local sink and the caller re-sends the message there.
use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use crate::error::{DeliveryError, RedirectError};

use super::channel::{Channel, PerChannel};

/// A resolved single-argument handler.
pub type Handler = Arc<dyn Fn(&str) -> Result<(), DeliveryError> + Send + Sync>;

/// How a sink's methods are looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkHost {
    /// Methods resolve to a [`Handler`] at bind time.
    #[default]
    Native,
    /// Methods are checked by the host when bound and dispatched by name on
    /// every call through [`MessageSink::invoke`].
    Scripted,
    /// The host cannot bind single-argument methods at all.
    Unsupported,
}

/// An external destination for redirected channel messages.
///
/// Implementations expose named handlers that accept one fully formatted line.
/// The logger only keeps a weak reference to the sink: dropping the last
/// `Arc` makes every bound channel fall back to its local sink.
///
/// Handlers run while the logger's emit lock is held.  A handler that logs
/// through the same logger has its lines written to the local sinks, and
/// cannot change redirection until it returns.
pub trait MessageSink: Send + Sync {
    /// Human-readable description used in diagnostics.
    fn describe(&self) -> String;

    /// Lookup strategy for this sink's methods.
    fn host(&self) -> SinkHost {
        SinkHost::Native
    }

    /// Resolve `method` into a handler, or `None` if there is no such method.
    fn resolve(&self, method: &str) -> Option<Handler>;

    /// Runtime check used for [`SinkHost::Scripted`] sinks at bind time.
    fn check_method(&self, method: &str, _channel: Channel) -> bool {
        self.resolve(method).is_some()
    }

    /// Dispatch `message` to `method` by name; used for [`SinkHost::Scripted`] sinks.
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryError`] if the method is missing or fails.
    fn invoke(&self, method: &str, message: &str) -> Result<(), DeliveryError> {
        self.resolve(method).map_or_else(
            || Err(DeliveryError::Failed(format!("no method {method}"))),
            |handler| handler(message),
        )
    }
}

struct Binding {
    method: String,
    /// `None` for scripted sinks, which dispatch by name.
    handler: Option<Handler>,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("method", &self.method)
            .field("resolved", &self.handler.is_some())
            .finish()
    }
}

/// Outcome of [`RedirectionBinder::deliver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The channel is not bound; the caller writes to the local sink.
    Unbound,
    /// The handler accepted the message.
    Delivered,
    /// The handler failed and the channel has been unbound.
    Failed {
        /// Method that failed.
        method: String,
        /// What went wrong.
        error: DeliveryError,
    },
}

/// Tracks the attached sink and each channel's binding.
#[derive(Debug)]
pub struct RedirectionBinder {
    sink: Option<Weak<dyn MessageSink>>,
    host: SinkHost,
    /// Cleared for good once an unsupported sink is attached.
    supported: bool,
    /// When false, redirected messages carry no prefix.
    prefix_all: bool,
    bindings: PerChannel<Option<Binding>>,
}

impl Default for RedirectionBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl RedirectionBinder {
    /// Create a binder with no sink attached.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sink: None,
            host: SinkHost::Native,
            supported: true,
            prefix_all: true,
            bindings: PerChannel::from_fn(|_| None),
        }
    }

    /// Attach `sink` and reset all bindings.
    ///
    /// # Errors
    ///
    /// Returns [`RedirectError::Unsupported`] if the sink's host cannot bind
    /// methods, or if such a sink was attached earlier.
    pub fn attach<S>(&mut self, sink: &Arc<S>, prefix_all: bool) -> Result<(), RedirectError>
    where
        S: MessageSink + 'static,
    {
        if !self.supported {
            return Err(RedirectError::Unsupported {
                sink: sink.describe(),
            });
        }
        let host = sink.host();
        if host == SinkHost::Unsupported {
            self.supported = false;
            self.detach();
            return Err(RedirectError::Unsupported {
                sink: sink.describe(),
            });
        }
        let weak = Arc::downgrade(sink);
        let weak: Weak<dyn MessageSink> = weak;
        self.sink = Some(weak);
        self.host = host;
        self.prefix_all = prefix_all;
        self.clear_all();
        Ok(())
    }

    /// Forget the sink and every binding.
    pub fn detach(&mut self) {
        self.sink = None;
        self.clear_all();
    }

    /// Whether redirection is still possible in this process.
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        self.supported
    }

    /// Whether redirected messages carry their prefix.
    #[must_use]
    pub const fn prefix_all(&self) -> bool {
        self.prefix_all
    }

    /// Whether `channel` is currently bound.
    #[must_use]
    pub const fn is_bound(&self, channel: Channel) -> bool {
        self.bindings.get(channel).is_some()
    }

    /// Name of the method `channel` is bound to.
    #[must_use]
    pub fn bound_method(&self, channel: Channel) -> Option<&str> {
        self.bindings
            .get(channel)
            .as_ref()
            .map(|b| b.method.as_str())
    }

    /// Bind `channel` to `method`; an empty name clears the binding.
    ///
    /// On failure the channel is left unbound.
    ///
    /// # Errors
    ///
    /// Returns a [`RedirectError`] if redirection is unsupported, no sink is
    /// attached, or the sink has no such method.
    pub fn bind(&mut self, channel: Channel, method: &str) -> Result<(), RedirectError> {
        if method.is_empty() {
            *self.bindings.get_mut(channel) = None;
            return Ok(());
        }
        match self.resolve_binding(channel, method) {
            Ok(handler) => {
                *self.bindings.get_mut(channel) = Some(Binding {
                    method: method.to_string(),
                    handler,
                });
                Ok(())
            }
            Err(e) => {
                *self.bindings.get_mut(channel) = None;
                Err(e)
            }
        }
    }

    fn resolve_binding(
        &self,
        channel: Channel,
        method: &str,
    ) -> Result<Option<Handler>, RedirectError> {
        if !self.supported {
            return Err(RedirectError::Unsupported {
                sink: "attached logger".to_string(),
            });
        }
        let sink = self
            .sink
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or(RedirectError::NoSinkAttached)?;
        match self.host {
            SinkHost::Scripted => {
                if sink.check_method(method, channel) {
                    Ok(None)
                } else {
                    Err(RedirectError::Rejected {
                        channel,
                        method: method.to_string(),
                    })
                }
            }
            SinkHost::Native | SinkHost::Unsupported => {
                sink.resolve(method)
                    .map(Some)
                    .ok_or_else(|| RedirectError::MethodNotFound {
                        channel,
                        method: method.to_string(),
                    })
            }
        }
    }

    /// Bind every channel to `method`.
    ///
    /// Each channel's outcome stands on its own: channels that bound stay
    /// bound even if others failed.
    ///
    /// # Errors
    ///
    /// Returns [`RedirectError::Unsupported`] or [`RedirectError::NoSinkAttached`]
    /// before trying any channel, or [`RedirectError::Partial`] naming the
    /// channels that failed.
    pub fn bind_all(&mut self, method: &str) -> Result<(), RedirectError> {
        if !self.supported {
            return Err(RedirectError::Unsupported {
                sink: "attached logger".to_string(),
            });
        }
        if self.sink.as_ref().and_then(Weak::upgrade).is_none() {
            return Err(RedirectError::NoSinkAttached);
        }
        let failed: Vec<Channel> = Channel::ALL
            .into_iter()
            .filter(|&c| self.bind(c, method).is_err())
            .collect();
        if failed.is_empty() {
            Ok(())
        } else {
            Err(RedirectError::Partial { failed })
        }
    }

    /// Send `prefix` + `message` to the handler bound to `channel`.
    ///
    /// The prefix is dropped in no-prefix mode.  A failing or panicking
    /// handler, or a sink that has been dropped, unbinds the channel.
    pub fn deliver(&mut self, channel: Channel, prefix: &str, message: &str) -> Delivery {
        let Some(binding) = self.bindings.get(channel).as_ref() else {
            return Delivery::Unbound;
        };
        let line = if self.prefix_all {
            format!("{prefix}{message}")
        } else {
            message.to_string()
        };
        let outcome = match self.sink.as_ref().and_then(Weak::upgrade) {
            None => Err(DeliveryError::SinkDropped),
            Some(sink) => guarded(|| match &binding.handler {
                Some(handler) => handler(&line),
                None => sink.invoke(&binding.method, &line),
            }),
        };
        match outcome {
            Ok(()) => Delivery::Delivered,
            Err(error) => {
                let method = binding.method.clone();
                *self.bindings.get_mut(channel) = None;
                Delivery::Failed { method, error }
            }
        }
    }

    fn clear_all(&mut self) {
        for channel in Channel::ALL {
            *self.bindings.get_mut(channel) = None;
        }
    }
}

/// Run a handler, turning a panic into a [`DeliveryError::Panicked`].
fn guarded(f: impl FnOnce() -> Result<(), DeliveryError>) -> Result<(), DeliveryError> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let msg = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(DeliveryError::Panicked(msg))
    })
}

/// A [`MessageSink`] assembled from closures.
///
/// ```
/// use chanlog::logging::FnSink;
/// let sink = FnSink::new("console").method("logMsg", |line| {
///     let _ = line;
///     Ok(())
/// });
/// # let _ = sink;
/// ```
pub struct FnSink {
    name: String,
    host: SinkHost,
    methods: HashMap<String, Handler>,
}

impl fmt::Debug for FnSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.methods.keys().collect();
        names.sort();
        f.debug_struct("FnSink")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("methods", &names)
            .finish()
    }
}

impl FnSink {
    /// Create an empty native sink called `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            host: SinkHost::Native,
            methods: HashMap::new(),
        }
    }

    /// Register a handler under `name`.
    #[must_use]
    pub fn method<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&str) -> Result<(), DeliveryError> + Send + Sync + 'static,
    {
        self.methods.insert(name.to_string(), Arc::new(f));
        self
    }

    /// Change the lookup strategy reported by [`MessageSink::host`].
    #[must_use]
    pub const fn with_host(mut self, host: SinkHost) -> Self {
        self.host = host;
        self
    }
}

impl MessageSink for FnSink {
    fn describe(&self) -> String {
        format!("FnSink({})", self.name)
    }

    fn host(&self) -> SinkHost {
        self.host
    }

    fn resolve(&self, method: &str) -> Option<Handler> {
        self.methods.get(method).cloned()
    }
}

/// Forwards redirected lines into [`tracing`] events.
///
/// Methods are named after the levels: `trace`, `debug`, `info`, `warn`
/// and `error`.  Events use the target `chanlog::redirect`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MessageSink for TracingSink {
    fn describe(&self) -> String {
        "TracingSink".to_string()
    }

    fn resolve(&self, method: &str) -> Option<Handler> {
        let handler: Handler = match method {
            "trace" => Arc::new(|line: &str| {
                tracing::trace!(target: "chanlog::redirect", "{line}");
                Ok(())
            }),
            "debug" => Arc::new(|line: &str| {
                tracing::debug!(target: "chanlog::redirect", "{line}");
                Ok(())
            }),
            "info" => Arc::new(|line: &str| {
                tracing::info!(target: "chanlog::redirect", "{line}");
                Ok(())
            }),
            "warn" => Arc::new(|line: &str| {
                tracing::warn!(target: "chanlog::redirect", "{line}");
                Ok(())
            }),
            "error" => Arc::new(|line: &str| {
                tracing::error!(target: "chanlog::redirect", "{line}");
                Ok(())
            }),
            _ => return None,
        };
        Some(handler)
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    mockall::mock! {
        pub Sink {}
        impl MessageSink for Sink {
            fn describe(&self) -> String;
            fn host(&self) -> SinkHost;
            fn resolve(&self, method: &str) -> Option<Handler>;
            fn check_method(&self, method: &str, channel: Channel) -> bool;
            fn invoke(&self, method: &str, message: &str) -> Result<(), DeliveryError>;
        }
    }

    fn recording_sink(method: &str) -> (Arc<FnSink>, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let store = Arc::clone(&seen);
        let sink = FnSink::new("rec").method(method, move |line| {
            store.lock().unwrap().push(line.to_string());
            Ok(())
        });
        (Arc::new(sink), seen)
    }

    #[test]
    fn unbound_channel_is_not_delivered() {
        let mut binder = RedirectionBinder::new();
        assert_eq!(binder.deliver(Channel::Info, "", "x"), Delivery::Unbound);
    }

    #[test]
    fn bind_without_sink_fails() {
        let mut binder = RedirectionBinder::new();
        assert_eq!(
            binder.bind(Channel::Info, "logMsg"),
            Err(RedirectError::NoSinkAttached)
        );
        assert!(!binder.is_bound(Channel::Info));
    }

    #[test]
    fn bound_channel_receives_prefixed_line() {
        let (sink, seen) = recording_sink("logMsg");
        let mut binder = RedirectionBinder::new();
        binder.attach(&sink, true).unwrap();
        binder.bind(Channel::Info, "logMsg").unwrap();
        assert_eq!(
            binder.deliver(Channel::Info, "[info] ", "hello"),
            Delivery::Delivered
        );
        assert_eq!(*seen.lock().unwrap(), vec!["[info] hello".to_string()]);
    }

    #[test]
    fn no_prefix_mode_strips_prefix() {
        let (sink, seen) = recording_sink("logMsg");
        let mut binder = RedirectionBinder::new();
        binder.attach(&sink, false).unwrap();
        binder.bind(Channel::Error, "logMsg").unwrap();
        binder.deliver(Channel::Error, "[error] ", "boom");
        assert_eq!(*seen.lock().unwrap(), vec!["boom".to_string()]);
    }

    #[test]
    fn empty_name_clears_binding() {
        let (sink, _seen) = recording_sink("logMsg");
        let mut binder = RedirectionBinder::new();
        binder.attach(&sink, true).unwrap();
        binder.bind(Channel::Debug, "logMsg").unwrap();
        assert!(binder.is_bound(Channel::Debug));
        binder.bind(Channel::Debug, "").unwrap();
        assert!(!binder.is_bound(Channel::Debug));
    }

    #[test]
    fn missing_method_leaves_channel_unbound() {
        let (sink, _seen) = recording_sink("logMsg");
        let mut binder = RedirectionBinder::new();
        binder.attach(&sink, true).unwrap();
        binder.bind(Channel::Action, "logMsg").unwrap();
        let err = binder.bind(Channel::Action, "nope").unwrap_err();
        assert!(matches!(err, RedirectError::MethodNotFound { .. }));
        assert!(!binder.is_bound(Channel::Action));
    }

    #[test]
    fn attach_resets_bindings() {
        let (sink, _seen) = recording_sink("logMsg");
        let mut binder = RedirectionBinder::new();
        binder.attach(&sink, true).unwrap();
        binder.bind_all("logMsg").unwrap();
        binder.attach(&sink, true).unwrap();
        for channel in Channel::ALL {
            assert!(!binder.is_bound(channel));
        }
    }

    #[test]
    fn failing_handler_unbinds_channel() {
        let sink = Arc::new(
            FnSink::new("bad").method("logMsg", |_| Err(DeliveryError::Failed("io".into()))),
        );
        let mut binder = RedirectionBinder::new();
        binder.attach(&sink, true).unwrap();
        binder.bind(Channel::Info, "logMsg").unwrap();
        let outcome = binder.deliver(Channel::Info, "", "x");
        assert_eq!(
            outcome,
            Delivery::Failed {
                method: "logMsg".to_string(),
                error: DeliveryError::Failed("io".to_string()),
            }
        );
        assert!(!binder.is_bound(Channel::Info));
        assert_eq!(binder.deliver(Channel::Info, "", "x"), Delivery::Unbound);
    }

    #[test]
    fn panicking_handler_is_caught() {
        let sink = Arc::new(FnSink::new("panics").method("logMsg", |_| panic!("kaboom")));
        let mut binder = RedirectionBinder::new();
        binder.attach(&sink, true).unwrap();
        binder.bind(Channel::User, "logMsg").unwrap();
        let outcome = binder.deliver(Channel::User, "", "x");
        assert!(matches!(
            outcome,
            Delivery::Failed { error: DeliveryError::Panicked(ref m), .. } if m == "kaboom"
        ));
        assert!(!binder.is_bound(Channel::User));
    }

    #[test]
    fn dropped_sink_fails_delivery() {
        let (sink, _seen) = recording_sink("logMsg");
        let mut binder = RedirectionBinder::new();
        binder.attach(&sink, true).unwrap();
        binder.bind(Channel::Info, "logMsg").unwrap();
        drop(sink);
        assert!(matches!(
            binder.deliver(Channel::Info, "", "x"),
            Delivery::Failed {
                error: DeliveryError::SinkDropped,
                ..
            }
        ));
    }

    #[test]
    fn unsupported_host_disables_redirection_for_good() {
        let bad = Arc::new(FnSink::new("ruby").with_host(SinkHost::Unsupported));
        let mut binder = RedirectionBinder::new();
        assert!(matches!(
            binder.attach(&bad, true),
            Err(RedirectError::Unsupported { .. })
        ));
        assert!(!binder.is_supported());
        let (good, _seen) = recording_sink("logMsg");
        assert!(binder.attach(&good, true).is_err());
        assert!(matches!(
            binder.bind(Channel::Info, "logMsg"),
            Err(RedirectError::Unsupported { .. })
        ));
        assert!(matches!(
            binder.bind_all("logMsg"),
            Err(RedirectError::Unsupported { .. })
        ));
    }

    #[test]
    fn bind_all_reports_partial_failure() {
        let mut mock = MockSink::new();
        mock.expect_host().return_const(SinkHost::Scripted);
        mock.expect_describe().return_const("mock".to_string());
        mock.expect_check_method()
            .returning(|_, channel| channel != Channel::Debug);
        let sink = Arc::new(mock);
        let mut binder = RedirectionBinder::new();
        binder.attach(&sink, true).unwrap();
        let err = binder.bind_all("logMsg").unwrap_err();
        assert_eq!(
            err,
            RedirectError::Partial {
                failed: vec![Channel::Debug]
            }
        );
        assert!(binder.is_bound(Channel::Info));
        assert!(binder.is_bound(Channel::User));
        assert!(!binder.is_bound(Channel::Debug));
    }

    #[test]
    fn scripted_sink_dispatches_by_name() {
        let mut mock = MockSink::new();
        mock.expect_host().return_const(SinkHost::Scripted);
        mock.expect_check_method().return_const(true);
        mock.expect_invoke()
            .withf(|method, message| {
                method.to_string() == "write" && message.to_string() == "[log] clicked"
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let sink = Arc::new(mock);
        let mut binder = RedirectionBinder::new();
        binder.attach(&sink, true).unwrap();
        binder.bind(Channel::Action, "write").unwrap();
        assert_eq!(binder.bound_method(Channel::Action), Some("write"));
        assert_eq!(
            binder.deliver(Channel::Action, "[log] ", "clicked"),
            Delivery::Delivered
        );
    }

    #[test]
    fn scripted_sink_rejection() {
        let mut mock = MockSink::new();
        mock.expect_host().return_const(SinkHost::Scripted);
        mock.expect_check_method().return_const(false);
        let sink = Arc::new(mock);
        let mut binder = RedirectionBinder::new();
        binder.attach(&sink, true).unwrap();
        assert!(matches!(
            binder.bind(Channel::Info, "write"),
            Err(RedirectError::Rejected { .. })
        ));
    }

    #[test]
    fn tracing_sink_resolves_level_names() {
        let sink = TracingSink;
        for name in ["trace", "debug", "info", "warn", "error"] {
            assert!(sink.resolve(name).is_some(), "{name} should resolve");
        }
        assert!(sink.resolve("fatal").is_none());
    }
}

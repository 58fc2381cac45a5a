//! Tracing subscriber for the crate's own diagnostics.
//!
//! Channel output never goes through here; this only carries events from
//! the `chanlog` internals and from [`TracingSink`](super::TracingSink).
//! Everything is written to stderr so stdout stays free for the console sink.
use std::fmt::Write as _;

/// Collects the `message` field and any other fields of a [`tracing::Event`].
#[derive(Default)]
struct MessageExtractor {
    message: String,
    fields: String,
}

impl MessageExtractor {
    fn push_field(&mut self, name: &str, value: &dyn std::fmt::Display) {
        write!(self.fields, " {name}={value}").ok();
    }
}

impl tracing::field::Visit for MessageExtractor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            let rendered = format!("{value:?}");
            self.push_field(field.name(), &rendered);
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field.name(), &value);
        }
    }
}

/// A [`tracing_subscriber::fmt::FormatEvent`] for terse stderr diagnostics.
struct DiagnosticFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for DiagnosticFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let level = *metadata.level();

        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        let msg = &extractor.message;
        let fields = &extractor.fields;

        // Redirected channel lines are already formatted.
        if metadata.target() == "chanlog::redirect" {
            return writeln!(writer, "{msg}");
        }
        match level {
            tracing::Level::ERROR => writeln!(writer, "\x1b[31mERROR\x1b[0m {msg}{fields}"),
            tracing::Level::WARN => writeln!(writer, "\x1b[33mWARN\x1b[0m  {msg}{fields}"),
            tracing::Level::INFO => writeln!(writer, "INFO  {msg}{fields}"),
            _ => writeln!(writer, "\x1b[2m{level:<5} {msg}{fields}\x1b[0m"),
        }
    }
}

/// Initialise the global [`tracing`] subscriber.
///
/// The filter comes from `RUST_LOG` when set.  Otherwise `trace` selects
/// `debug` for everything under `chanlog`, and the default shows warnings,
/// errors and redirected channel lines.  Calling this more than once is
/// harmless.
pub fn init_subscriber(trace: bool) {
    use tracing_subscriber::{
        EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
    };

    let fallback = if trace {
        "info,chanlog=debug,chanlog::redirect=trace"
    } else {
        "warn,chanlog::redirect=trace"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let layer = fmt::layer()
        .event_format(DiagnosticFormatter)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .ok();
}

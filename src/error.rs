//! Error types for the logging engine.
//!
//! Every fallible engine operation returns one of the typed errors below,
//! built with [`thiserror`].  None of them is ever allowed to stop logging:
//! the engine reports the failure through the error channel, falls back to
//! its local sinks and keeps going.  The binary converts them to
//! [`anyhow::Error`] at the command boundary.
//!
//! # Error hierarchy
//!
//! ```text
//! ChanlogError
//! ├── Redirect(RedirectError)  attaching a sink, binding channels
//! ├── Delivery(DeliveryError)  a bound handler failed while receiving a line
//! ├── Sink(SinkError)          opening log files, persisting the startup log
//! └── Format(FormatError)      malformed message templates
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::logging::Channel;

/// Top-level error type for the logging engine.
#[derive(Error, Debug)]
pub enum ChanlogError {
    /// Redirection setup failed.
    #[error("Redirection error: {0}")]
    Redirect(#[from] RedirectError),

    /// A redirected message could not be delivered.
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// A file sink could not be opened or written.
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// A message template could not be expanded.
    #[error("Format error: {0}")]
    Format(#[from] FormatError),
}

/// Errors raised while attaching a sink or binding a channel to one of its methods.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RedirectError {
    /// The sink belongs to a host that cannot bind single-argument methods.
    ///
    /// Once raised, redirection stays disabled for the lifetime of the logger.
    #[error("logger redirection is not supported for {sink}")]
    Unsupported {
        /// Description of the rejected sink.
        sink: String,
    },

    /// A method was bound before any sink was attached.
    #[error("no logger sink attached yet")]
    NoSinkAttached,

    /// The attached sink has no handler with the requested name.
    #[error("redirecting {channel} to {method} failed: no such method")]
    MethodNotFound {
        /// Channel that was being bound.
        channel: Channel,
        /// Requested method name.
        method: String,
    },

    /// A runtime-checked sink refused the requested method.
    #[error("redirecting {channel} to {method} failed: rejected by the sink")]
    Rejected {
        /// Channel that was being bound.
        channel: Channel,
        /// Requested method name.
        method: String,
    },

    /// Redirection was reconfigured from inside a running handler.
    #[error("logger redirection cannot change while a handler is running")]
    InsideHandler,

    /// Binding all channels succeeded only for some of them.
    #[error("binding failed for {}", join_channels(.failed))]
    Partial {
        /// Channels that remain unbound.
        failed: Vec<Channel>,
    },
}

/// Errors raised by a bound handler while receiving a message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The handler reported a failure.
    #[error("{0}")]
    Failed(String),

    /// The attached sink has been dropped by its owner.
    #[error("logger sink is no longer alive")]
    SinkDropped,

    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

/// Errors raised by the file sinks.
#[derive(Error, Debug)]
pub enum SinkError {
    /// A log file could not be created.
    #[error("Logfile {} not accessible: {source}", .path.display())]
    Open {
        /// Path that could not be opened.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The startup buffer could not be saved.
    #[error("startup log not saved ({}): {source}", .path.display())]
    Persist {
        /// Target path of the startup log.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors raised while expanding a message template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// A `{` was never closed.
    #[error("unclosed '{{' at offset {at}")]
    UnclosedBrace {
        /// Byte offset of the opening brace.
        at: usize,
    },

    /// A `}` appeared without a matching `{`.
    #[error("unmatched '}}' at offset {at}")]
    UnmatchedClose {
        /// Byte offset of the closing brace.
        at: usize,
    },

    /// A placeholder refers to an argument that was not supplied.
    #[error("missing argument {index}")]
    MissingArgument {
        /// Zero-based argument index.
        index: usize,
    },

    /// A placeholder contains something other than an argument index.
    #[error("invalid placeholder '{{{placeholder}}}'")]
    BadIndex {
        /// Text between the braces.
        placeholder: String,
    },
}

fn join_channels(channels: &[Channel]) -> String {
    channels
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;

    // -----------------------------------------------------------------------
    // RedirectError
    // -----------------------------------------------------------------------

    #[test]
    fn redirect_unsupported_display() {
        let e = RedirectError::Unsupported {
            sink: "ruby-bridge".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "logger redirection is not supported for ruby-bridge"
        );
    }

    #[test]
    fn redirect_method_not_found_display() {
        let e = RedirectError::MethodNotFound {
            channel: Channel::Info,
            method: "logMsg".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "redirecting info to logMsg failed: no such method"
        );
    }

    #[test]
    fn redirect_partial_lists_channels() {
        let e = RedirectError::Partial {
            failed: vec![Channel::Debug, Channel::User],
        };
        assert_eq!(e.to_string(), "binding failed for debug, user");
    }

    // -----------------------------------------------------------------------
    // SinkError
    // -----------------------------------------------------------------------

    #[test]
    fn sink_open_display_contains_path() {
        let e = SinkError::Open {
            path: PathBuf::from("/no/such/dir/log.txt"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        let msg = e.to_string();
        assert!(msg.contains("/no/such/dir/log.txt"));
        assert!(msg.contains("not accessible"));
    }

    #[test]
    fn sink_error_has_source() {
        use std::error::Error as _;
        let e = SinkError::Persist {
            path: PathBuf::from("startup.log"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.source().is_some(), "Persist should expose a source");
    }

    // -----------------------------------------------------------------------
    // FormatError
    // -----------------------------------------------------------------------

    #[test]
    fn format_error_display() {
        assert_eq!(
            FormatError::UnclosedBrace { at: 4 }.to_string(),
            "unclosed '{' at offset 4"
        );
        assert_eq!(
            FormatError::BadIndex {
                placeholder: "x".to_string()
            }
            .to_string(),
            "invalid placeholder '{x}'"
        );
    }

    // -----------------------------------------------------------------------
    // ChanlogError conversions
    // -----------------------------------------------------------------------

    #[test]
    fn chanlog_error_from_redirect() {
        let e: ChanlogError = RedirectError::NoSinkAttached.into();
        assert!(matches!(e, ChanlogError::Redirect(_)));
        assert!(e.to_string().starts_with("Redirection error:"));
    }

    #[test]
    fn chanlog_error_from_delivery() {
        let e: ChanlogError = DeliveryError::SinkDropped.into();
        assert!(matches!(e, ChanlogError::Delivery(_)));
    }

    #[test]
    fn chanlog_error_into_anyhow() {
        let e: ChanlogError = FormatError::MissingArgument { index: 2 }.into();
        let any = anyhow::Error::from(e);
        assert!(any.to_string().contains("missing argument 2"));
    }
}

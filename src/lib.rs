//! Multi-channel diagnostic logging engine.
//!
//! Messages are routed through five channels (debug, info, action, error and
//! user), each with its own enable flag and prefix.  A numeric level gates
//! debug output.  Any channel can be redirected to a named handler on a
//! caller-supplied sink; when nothing takes a line it falls back to a log
//! file, an in-memory startup buffer or the console.
//!
//! The public API is organised into these layers:
//!
//! - **[`logging`]**: the engine itself, centred on [`logging::Logger`]
//! - **[`config`]**: initial settings from TOML and the environment
//! - **[`cli`]** and **[`commands`]**: the `chanlog` command-line tool
//!
//! ```
//! use chanlog::logging::{Channel, FnSink, Logger};
//! use std::sync::Arc;
//!
//! let log = Logger::new();
//! let sink = Arc::new(FnSink::new("host").method("show", |line| {
//!     assert!(line.ends_with("ready"));
//!     Ok(())
//! }));
//! log.attach(&sink).unwrap();
//! log.bind(Channel::Info, "show").unwrap();
//! log.info("{} ready", &[&"scanner"]);
//! ```
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;

pub use error::ChanlogError;

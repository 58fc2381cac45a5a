//! Top-level subcommand implementations.
pub mod completions;
pub mod emit;
pub mod pipe;
pub mod settings;
pub mod time;
pub mod version;

use crate::logging::{Channel, Logger};

/// Emit `text` verbatim on `channel`.
///
/// `level` is only used for debug lines; the other channels ignore it.
pub fn emit_on(log: &Logger, channel: Channel, level: i32, text: &str) {
    match channel {
        Channel::Debug => log.debug(level, text, &[]),
        Channel::Info => log.info(text, &[]),
        Channel::Action => log.action(text, &[]),
        Channel::Error => log.error(text, &[]),
        Channel::User => log.user(text, &[]),
    }
}

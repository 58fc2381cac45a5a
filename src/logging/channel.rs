//! Channels, their tags, and the per-channel registry of enable flags and prefixes.
use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// One of the five independently configurable message categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Developer debug traces, gated by the numeric level.
    Debug,
    /// Informative notices.
    Info,
    /// Traces of actions performed by the host.
    Action,
    /// Error reports; always enabled.
    Error,
    /// Messages written on behalf of the end user.
    User,
}

impl Channel {
    /// All channels, in the order [`bind_all`](super::Logger::bind_all) binds them.
    pub const ALL: [Self; 5] = [
        Self::User,
        Self::Info,
        Self::Action,
        Self::Error,
        Self::Debug,
    ];

    /// Lowercase channel name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Action => "action",
            Self::Error => "error",
            Self::User => "user",
        }
    }

    /// Tag written inside the line prefix, e.g. `[log] ` for actions.
    ///
    /// The user channel's tag is configurable and lives in the
    /// [`ChannelRegistry`]; the value returned here is its default.
    #[must_use]
    pub const fn default_tag(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Action => "log",
            Self::Error => "error",
            Self::User => "user",
        }
    }

    /// Which fallback file receives this channel's lines.
    #[must_use]
    pub const fn group(self) -> SinkGroup {
        match self {
            Self::User => SinkGroup::User,
            _ => SinkGroup::Debug,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "action" | "log" => Ok(Self::Action),
            "error" => Ok(Self::Error),
            "user" => Ok(Self::User),
            other => Err(format!(
                "unknown channel '{other}': expected debug, info, action, error or user"
            )),
        }
    }
}

/// Fallback destination group: the debug log or the user log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkGroup {
    /// Debug, info, action, error and profile lines.
    Debug,
    /// User lines.
    User,
}

/// One value per channel.
#[derive(Debug, Default)]
pub(crate) struct PerChannel<T> {
    debug: T,
    info: T,
    action: T,
    error: T,
    user: T,
}

impl<T> PerChannel<T> {
    pub(crate) fn from_fn(mut f: impl FnMut(Channel) -> T) -> Self {
        Self {
            debug: f(Channel::Debug),
            info: f(Channel::Info),
            action: f(Channel::Action),
            error: f(Channel::Error),
            user: f(Channel::User),
        }
    }

    pub(crate) const fn get(&self, channel: Channel) -> &T {
        match channel {
            Channel::Debug => &self.debug,
            Channel::Info => &self.info,
            Channel::Action => &self.action,
            Channel::Error => &self.error,
            Channel::User => &self.user,
        }
    }

    pub(crate) const fn get_mut(&mut self, channel: Channel) -> &mut T {
        match channel {
            Channel::Debug => &mut self.debug,
            Channel::Info => &mut self.info,
            Channel::Action => &mut self.action,
            Channel::Error => &mut self.error,
            Channel::User => &mut self.user,
        }
    }
}

/// Per-channel enable flags, tags and redirect prefixes, plus the display
/// options that shape every line.
///
/// Flags are atomics so that the hot path (`is_enabled`) never takes a lock.
/// Mutation is rare and happens during configuration.
#[derive(Debug)]
pub struct ChannelRegistry {
    enabled: PerChannel<AtomicBool>,
    /// Prefix used for redirected messages; `None` falls back to the prefix
    /// computed at the emitting site.
    redirect_prefix: RwLock<PerChannel<Option<String>>>,
    user_tag: RwLock<String>,
    profile: AtomicBool,
    log_time: AtomicBool,
    user_log_time: AtomicBool,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelRegistry {
    /// Create a registry with every channel except debug enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: PerChannel::from_fn(|c| AtomicBool::new(c != Channel::Debug)),
            redirect_prefix: RwLock::new(PerChannel::from_fn(default_redirect_prefix)),
            user_tag: RwLock::new(Channel::User.default_tag().to_string()),
            profile: AtomicBool::new(false),
            log_time: AtomicBool::new(false),
            user_log_time: AtomicBool::new(true),
        }
    }

    /// Whether `channel` should produce output.  Errors are always on.
    #[must_use]
    pub fn is_enabled(&self, channel: Channel) -> bool {
        channel == Channel::Error || self.enabled.get(channel).load(Ordering::Relaxed)
    }

    /// Set a channel's enable flag.  Has no effect on the error channel.
    pub fn set_enabled(&self, channel: Channel, on: bool) {
        self.enabled.get(channel).store(on, Ordering::Relaxed);
    }

    /// Tag written in the line prefix for `channel`.
    #[must_use]
    pub fn tag(&self, channel: Channel) -> String {
        match channel {
            Channel::User => self
                .user_tag
                .read()
                .map_or_else(|_| Channel::User.default_tag().to_string(), |t| t.clone()),
            other => other.default_tag().to_string(),
        }
    }

    /// Replace the user channel's tag.
    pub fn set_user_tag(&self, tag: &str) {
        if let Ok(mut guard) = self.user_tag.write() {
            *guard = tag.to_string();
        }
    }

    /// Prefix to put in front of a redirected message.
    ///
    /// Info, action and error carry a fixed `[tag] ` prefix by default.
    /// Debug and user have no fixed prefix and reuse `site_prefix`, the
    /// prefix (with timestamp) built by the emitting call.
    #[must_use]
    pub fn redirect_prefix(&self, channel: Channel, site_prefix: &str) -> String {
        self.redirect_prefix
            .read()
            .ok()
            .and_then(|p| p.get(channel).clone())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| site_prefix.to_string())
    }

    /// Override the redirect prefix of one channel; `None` uses the site prefix.
    pub fn set_redirect_prefix(&self, channel: Channel, prefix: Option<String>) {
        if let Ok(mut guard) = self.redirect_prefix.write() {
            *guard.get_mut(channel) = prefix;
        }
    }

    /// Whether profile lines (timers, enter/exit) are emitted.
    #[must_use]
    pub fn profile_enabled(&self) -> bool {
        self.profile.load(Ordering::Relaxed)
    }

    /// Enable or disable profile lines.
    pub fn set_profile_enabled(&self, on: bool) {
        self.profile.store(on, Ordering::Relaxed);
    }

    /// Whether prefixes of non-user lines carry a timestamp.
    #[must_use]
    pub fn log_time(&self) -> bool {
        self.log_time.load(Ordering::Relaxed)
    }

    /// Toggle timestamps in non-user prefixes.
    pub fn set_log_time(&self, on: bool) {
        self.log_time.store(on, Ordering::Relaxed);
    }

    /// Whether the user prefix carries a timestamp.
    #[must_use]
    pub fn user_log_time(&self) -> bool {
        self.user_log_time.load(Ordering::Relaxed)
    }

    /// Toggle the timestamp in the user prefix.
    pub fn set_user_log_time(&self, on: bool) {
        self.user_log_time.store(on, Ordering::Relaxed);
    }
}

fn default_redirect_prefix(channel: Channel) -> Option<String> {
    match channel {
        Channel::Info | Channel::Action | Channel::Error => {
            Some(format!("[{}] ", channel.default_tag()))
        }
        Channel::Debug | Channel::User => None,
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn error_channel_cannot_be_disabled() {
        let reg = ChannelRegistry::new();
        reg.set_enabled(Channel::Error, false);
        assert!(reg.is_enabled(Channel::Error));
    }

    #[test]
    fn debug_disabled_by_default() {
        let reg = ChannelRegistry::new();
        assert!(!reg.is_enabled(Channel::Debug));
        assert!(reg.is_enabled(Channel::Info));
        assert!(reg.is_enabled(Channel::Action));
        assert!(reg.is_enabled(Channel::User));
    }

    #[test]
    fn set_enabled_toggles_channel() {
        let reg = ChannelRegistry::new();
        reg.set_enabled(Channel::Info, false);
        assert!(!reg.is_enabled(Channel::Info));
        reg.set_enabled(Channel::Info, true);
        assert!(reg.is_enabled(Channel::Info));
    }

    #[test]
    fn fixed_prefix_channels_ignore_site_prefix() {
        let reg = ChannelRegistry::new();
        assert_eq!(reg.redirect_prefix(Channel::Info, "[x] "), "[info] ");
        assert_eq!(reg.redirect_prefix(Channel::Action, "[x] "), "[log] ");
        assert_eq!(reg.redirect_prefix(Channel::Error, "[x] "), "[error] ");
    }

    #[test]
    fn debug_and_user_use_site_prefix() {
        let reg = ChannelRegistry::new();
        assert_eq!(
            reg.redirect_prefix(Channel::Debug, "[debug (now)] "),
            "[debug (now)] "
        );
        assert_eq!(reg.redirect_prefix(Channel::User, "[user] "), "[user] ");
    }

    #[test]
    fn redirect_prefix_override() {
        let reg = ChannelRegistry::new();
        reg.set_redirect_prefix(Channel::Debug, Some("DBG: ".to_string()));
        assert_eq!(reg.redirect_prefix(Channel::Debug, "[debug] "), "DBG: ");
        reg.set_redirect_prefix(Channel::Debug, None);
        assert_eq!(reg.redirect_prefix(Channel::Debug, "[debug] "), "[debug] ");
    }

    #[test]
    fn user_tag_is_configurable() {
        let reg = ChannelRegistry::new();
        assert_eq!(reg.tag(Channel::User), "user");
        reg.set_user_tag("me");
        assert_eq!(reg.tag(Channel::User), "me");
        assert_eq!(reg.tag(Channel::Action), "log");
    }

    #[test]
    fn channel_from_str() {
        assert_eq!("INFO".parse::<Channel>(), Ok(Channel::Info));
        assert_eq!("log".parse::<Channel>(), Ok(Channel::Action));
        assert!("trace".parse::<Channel>().is_err());
    }

    #[test]
    fn user_channel_writes_to_user_group() {
        assert_eq!(Channel::User.group(), SinkGroup::User);
        assert_eq!(Channel::Error.group(), SinkGroup::Debug);
    }
}

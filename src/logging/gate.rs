//! Global verbosity threshold with quiet and verbose switches.
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

/// Threshold used while verbose mode is latched.
pub const VERBOSE_LEVEL: i32 = 3;

/// Level used by lines that pass any non-negative threshold (errors, info,
/// actions, profile output).
pub const ALWAYS: i32 = -1;

/// Decides, per emission, whether output proceeds at all.
///
/// The gate only ever compares two integers.  Channel-specific rules
/// (errors always on, user lines ignoring the level) are mapped to a level
/// by the caller before asking.
#[derive(Debug, Default)]
pub struct LevelGate {
    level: AtomicI32,
    verbose: AtomicBool,
    quiet: AtomicBool,
}

impl LevelGate {
    /// Create a gate with the given threshold.
    #[must_use]
    pub const fn new(level: i32) -> Self {
        Self {
            level: AtomicI32::new(level),
            verbose: AtomicBool::new(false),
            quiet: AtomicBool::new(false),
        }
    }

    /// Whether a line at `level` should be emitted.
    #[must_use]
    pub fn should_emit(&self, level: i32) -> bool {
        if self.is_quiet() {
            return false;
        }
        level <= self.threshold()
    }

    /// Whether a line that ignores the level should be emitted.
    #[must_use]
    pub fn should_emit_unleveled(&self) -> bool {
        !self.is_quiet()
    }

    /// Threshold in effect: [`VERBOSE_LEVEL`] while verbose, otherwise the set level.
    #[must_use]
    pub fn threshold(&self) -> i32 {
        if self.is_verbose() {
            VERBOSE_LEVEL
        } else {
            self.level()
        }
    }

    /// The explicitly set level.
    #[must_use]
    pub fn level(&self) -> i32 {
        self.level.load(Ordering::Relaxed)
    }

    /// Set the level and drop out of verbose mode.
    pub fn set_level(&self, level: i32) {
        self.verbose.store(false, Ordering::Relaxed);
        self.level.store(level, Ordering::Relaxed);
    }

    /// Latch verbose mode and raise the level to [`VERBOSE_LEVEL`].
    pub fn set_verbose(&self) {
        self.level.store(VERBOSE_LEVEL, Ordering::Relaxed);
        self.verbose.store(true, Ordering::Relaxed);
    }

    /// Whether verbose mode is latched.
    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.verbose.load(Ordering::Relaxed)
    }

    /// Suppress (or restore) all output.
    pub fn set_quiet(&self, quiet: bool) {
        self.quiet.store(quiet, Ordering::Relaxed);
    }

    /// Whether all output is suppressed.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.quiet.load(Ordering::Relaxed)
    }
}

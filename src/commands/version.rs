//! Command: print version information.
use std::io::{self, Write};

/// Version string embedded at build time, or the package version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("CHANLOG_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Write `chanlog <version>` to `out`.
///
/// # Errors
///
/// Returns an error if `out` cannot be written.
pub fn run(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "chanlog {}", version())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn prints_name_and_version() {
        let mut out = Vec::new();
        run(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("chanlog "));
        assert!(text.ends_with('\n'));
    }
}

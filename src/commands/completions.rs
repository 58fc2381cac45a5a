//! Command: print a shell completion script.
use clap::CommandFactory;
use std::io::Write;

use crate::cli::{Cli, CompletionsOpts};

/// Write the completion script for the requested shell to `out`.
pub fn run(opts: &CompletionsOpts, out: &mut impl Write) {
    clap_complete::generate(opts.shell, &mut Cli::command(), "chanlog", out);
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn bash_script_mentions_subcommands() {
        let mut out = Vec::new();
        run(
            &CompletionsOpts {
                shell: clap_complete::Shell::Bash,
            },
            &mut out,
        );
        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("chanlog"));
        assert!(script.contains("emit"));
    }
}

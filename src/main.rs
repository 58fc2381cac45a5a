//! `chanlog` binary entry point.
use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::sync::Arc;

use chanlog::cli::{Cli, Command};
use chanlog::commands;
use chanlog::config::Settings;
use chanlog::logging::{self, Logger, TracingSink};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    logging::init_subscriber(args.global.trace);

    let mut settings = Settings::load(args.global.config.as_deref())?;
    args.global.apply(&mut settings);
    let log = Arc::new(Logger::from_settings(&settings));

    // The logger only holds a weak reference; keep the sink alive here.
    let sink = Arc::new(TracingSink);
    if let Some(method) = &args.global.redirect {
        log.attach(&sink)?;
        log.bind_all(method)
            .with_context(|| format!("redirecting channels to {method}"))?;
    }

    let code = match args.command {
        Command::Emit(opts) => commands::emit::run(&opts, &log).map(|()| 0),
        Command::Pipe(opts) => commands::pipe::run(&opts, &log).map(|()| 0),
        Command::Time(opts) => commands::time::run(&opts, &log),
        Command::Settings => {
            commands::settings::run(&settings, &mut io::stdout().lock()).map(|()| 0)
        }
        Command::Completions(opts) => {
            commands::completions::run(&opts, &mut io::stdout().lock());
            Ok(0)
        }
        Command::Version => commands::version::run(&mut io::stdout().lock())
            .context("writing version")
            .map(|()| 0),
    };

    log.shutdown();
    let code = code?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

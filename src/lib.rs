//! dupepurge - duplicate file finder with backup-before-delete cleanup
//!
//! Files under a directory are grouped by size, then by content digest. The
//! first file of each duplicate set is always kept; the operator picks which
//! other copies to keep, and everything else is copied into a fresh backup
//! directory before the original is removed.

pub mod actions;
pub mod app;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::Context;

use crate::app::Prompter;
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::error::ExitCode;
use crate::progress::{ConsoleReporter, Reporter};

/// Run the application for already-parsed arguments.
///
/// # Errors
///
/// Returns an error for invalid input, a hashing failure, or a broken
/// terminal. Use [`ExitCode::for_error`] to map it to an exit code.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    if cli.no_color || !std::io::stdout().is_terminal() {
        yansi::disable();
    }

    let config = Config::load();
    let reporter: Arc<dyn Reporter> = Arc::new(ConsoleReporter::new(cli.quiet));
    let mut prompter = Prompter::stdio();

    match cli.command {
        Commands::Scan(ref args) => app::run_scan(args, &config, &mut prompter, reporter),
        Commands::Clean(ref args) => app::run_clean(args, &config, &mut prompter, reporter, || {
            signal::install_handler()
                .map(Some)
                .context("installing Ctrl+C handler")
        }),
    }
}

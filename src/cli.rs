//! Command-line interface definitions for dupepurge.
//!
//! Global options (verbosity, color, error format) apply to every subcommand.
//!
//! # Example
//!
//! ```bash
//! # List duplicate sets, nothing is touched
//! dupepurge scan ~/Downloads
//!
//! # Same, as JSON for scripting
//! dupepurge scan ~/Downloads --algorithm sha256 --output json
//!
//! # Keep candidates 1 and 3, back up and remove the rest without asking
//! dupepurge clean ~/Downloads --keep 1,3 --backup-root /mnt/backup --yes
//!
//! # Fully interactive: prompts for the directory, algorithm and keep list
//! dupepurge clean
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Find duplicate files by content and remove the extras safely.
///
/// Files are grouped by size, then by content digest. Every copy but the
/// first of each set may be removed; each removed file is first copied into
/// a fresh backup directory.
#[derive(Debug, Parser)]
#[command(name = "dupepurge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List duplicate sets under a directory without changing anything
    Scan(ScanArgs),
    /// Find duplicates, choose which to keep, back up and remove the rest
    Clean(CleanArgs),
}

/// Options shared by every subcommand that scans.
#[derive(Debug, Args)]
pub struct ScanOptions {
    /// Directory to scan (prompted for when omitted)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Hash algorithm: blake3, md5, sha1, sha224, sha256, sha384, sha512
    ///
    /// Prompted for when omitted in an interactive session; an empty answer
    /// selects the configured default.
    #[arg(short, long, value_name = "NAME")]
    pub algorithm: Option<String>,
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    #[command(flatten)]
    pub scan: ScanOptions,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the clean subcommand.
#[derive(Debug, Args)]
pub struct CleanArgs {
    #[command(flatten)]
    pub scan: ScanOptions,

    /// Candidates to keep, as comma-separated 1-based numbers (e.g. "1,3")
    ///
    /// Numbers refer to the candidate listing. Unknown numbers and other
    /// text are ignored. Pass an empty string to keep none.
    #[arg(short, long, value_name = "LIST")]
    pub keep: Option<String>,

    /// Directory the backup directory is created in
    #[arg(long, value_name = "DIR")]
    pub backup_root: Option<PathBuf>,

    /// Name prefix of the backup directory
    #[arg(long, value_name = "PREFIX")]
    pub backup_prefix: Option<String>,

    /// Show what would be backed up and removed, then stop
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the final confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing
    Text,
    /// JSON for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

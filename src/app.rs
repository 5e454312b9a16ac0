//! Interactive front end for the `scan` and `clean` subcommands.
//!
//! All terminal input and output goes through a [`Prompter`], so the whole
//! flow can be driven from tests with in-memory buffers. Progress events
//! take a separate route through the [`Reporter`].

use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use bytesize::ByteSize;
use serde::Serialize;
use yansi::Paint;

use crate::actions::{candidates, resolve, KeepSelection, PurgeConfig, PurgeReport, Purger};
use crate::cli::{CleanArgs, OutputFormat, ScanArgs, ScanOptions};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, DuplicateSet, ScanSummary};
use crate::error::ExitCode;
use crate::progress::Reporter;
use crate::scanner::{HashAlgorithm, ScanConfig};
use crate::signal::ShutdownHandler;

/// Characters stripped from both ends of a typed or pasted directory.
const ROOT_TRIM_CHARS: &[char] = &['"', '\''];

/// Line-oriented question and answer channel.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    /// A prompter on the process's stdin and stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Create a prompter over any reader and writer.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `question` and read one line. `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be written or read.
    pub fn ask(&mut self, question: &str) -> Result<Option<String>> {
        write!(self.output, "{question}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Ask a yes/no question. Only an explicit yes counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be written or read.
    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("{question} [y/N] "))?;
        Ok(answer.is_some_and(|a| matches!(a.trim().to_lowercase().as_str(), "y" | "yes")))
    }

    /// The output side, for listings and summaries.
    pub fn out(&mut self) -> &mut W {
        &mut self.output
    }

    /// Take the writer back, e.g. to inspect it in tests.
    pub fn into_output(self) -> W {
        self.output
    }
}

/// Clean up a typed or pasted directory path.
///
/// Surrounding whitespace and quote characters are removed; nothing else
/// is touched, so absolute and home-relative paths survive intact.
#[must_use]
pub fn sanitize_root_input(input: &str) -> PathBuf {
    PathBuf::from(input.trim().trim_matches(ROOT_TRIM_CHARS).trim())
}

/// Use the given root, or ask for one.
fn resolve_root<R: BufRead, W: Write>(
    given: Option<&Path>,
    prompter: &mut Prompter<R, W>,
) -> Result<PathBuf> {
    if let Some(path) = given {
        return Ok(path.to_path_buf());
    }

    let answer = prompter
        .ask("Directory to scan: ")?
        .context("no directory given")?;
    Ok(sanitize_root_input(&answer))
}

/// Use the given algorithm name, or ask for one.
///
/// A bad flag value fails at once. At the prompt, an empty answer (or end of
/// input) picks `default`, and one invalid answer earns a second chance.
///
/// # Errors
///
/// Returns the [`AlgorithmError`](crate::scanner::AlgorithmError) for an
/// unsupported flag value or a second unsupported answer.
pub fn resolve_algorithm<R: BufRead, W: Write>(
    given: Option<&str>,
    default: HashAlgorithm,
    prompter: &mut Prompter<R, W>,
) -> Result<HashAlgorithm> {
    if let Some(name) = given {
        return Ok(name.parse::<HashAlgorithm>()?);
    }

    let question = format!(
        "Hash algorithm ({}) [{}]: ",
        HashAlgorithm::available_names(),
        default
    );

    let mut attempts = 0;
    loop {
        attempts += 1;
        let answer = prompter.ask(&question)?.unwrap_or_default();
        if answer.trim().is_empty() {
            return Ok(default);
        }

        match answer.parse::<HashAlgorithm>() {
            Ok(algorithm) => return Ok(algorithm),
            Err(e) if attempts < 2 => {
                writeln!(prompter.out(), "{}", e.red())?;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Collect the root and algorithm and build a validated scan configuration.
fn scan_config<R: BufRead, W: Write>(
    options: &ScanOptions,
    config: &Config,
    prompter: &mut Prompter<R, W>,
) -> Result<ScanConfig> {
    let root = resolve_root(options.path.as_deref(), prompter)?;
    // Reject a bad root before asking anything else.
    crate::scanner::validate_root(&root)?;
    let algorithm = resolve_algorithm(options.algorithm.as_deref(), config.algorithm, prompter)?;
    Ok(ScanConfig::new(&root, algorithm)?)
}

/// Print the numbered candidate listing, grouped under each canonical file.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_candidate_listing<W: Write>(out: &mut W, sets: &[DuplicateSet]) -> io::Result<()> {
    let mut number = 0;
    for set in sets {
        writeln!(
            out,
            "{} {} ({} each)",
            "kept".green().bold(),
            set.canonical().display(),
            ByteSize::b(set.size)
        )?;
        for path in set.duplicates() {
            number += 1;
            writeln!(out, "  {:>4}. {}", number, path.display())?;
        }
    }
    Ok(())
}

/// Read the keep selection from the flag, or ask for it.
fn resolve_keep<R: BufRead, W: Write>(
    given: Option<&str>,
    candidate_count: usize,
    prompter: &mut Prompter<R, W>,
) -> Result<KeepSelection> {
    let input = match given {
        Some(list) => list.to_string(),
        None => prompter
            .ask("Numbers to keep, comma-separated (empty keeps none): ")?
            .unwrap_or_default(),
    };
    Ok(KeepSelection::parse(&input, candidate_count))
}

#[derive(Serialize)]
struct SetView<'a> {
    digest: &'a str,
    size: u64,
    canonical: &'a Path,
    duplicates: &'a [PathBuf],
}

impl<'a> From<&'a DuplicateSet> for SetView<'a> {
    fn from(set: &'a DuplicateSet) -> Self {
        Self {
            digest: &set.digest,
            size: set.size,
            canonical: set.canonical(),
            duplicates: set.duplicates(),
        }
    }
}

#[derive(Serialize)]
struct ScanReport<'a> {
    root: &'a Path,
    algorithm: HashAlgorithm,
    sets: Vec<SetView<'a>>,
    summary: &'a ScanSummary,
}

fn write_scan_text<W: Write>(out: &mut W, sets: &[DuplicateSet], summary: &ScanSummary) -> io::Result<()> {
    for (index, set) in sets.iter().enumerate() {
        writeln!(
            out,
            "Set {}: {} copies of {} ({})",
            index + 1,
            set.len(),
            ByteSize::b(set.size),
            set.digest
        )?;
        writeln!(out, "  {} {}", "kept".green(), set.canonical().display())?;
        for path in set.duplicates() {
            writeln!(out, "  dup  {}", path.display())?;
        }
    }

    writeln!(
        out,
        "{} files ({}) scanned, {} duplicate sets, {} duplicate files, {} reclaimable",
        summary.total_files,
        summary.total_size_display(),
        summary.duplicate_sets,
        summary.duplicate_files,
        summary.reclaimable_display()
    )?;
    if !summary.skipped_entries.is_empty() {
        writeln!(
            out,
            "{}",
            format!("{} entries could not be read and were skipped", summary.skipped_entries.len())
                .yellow()
        )?;
    }
    Ok(())
}

/// Run `scan`: find duplicates and list them. Never changes the filesystem.
///
/// # Errors
///
/// Returns an error for an invalid root or algorithm, or a hashing failure.
pub fn run_scan<R: BufRead, W: Write>(
    args: &ScanArgs,
    config: &Config,
    prompter: &mut Prompter<R, W>,
    reporter: Arc<dyn Reporter>,
) -> Result<ExitCode> {
    let scan_config = scan_config(&args.scan, config, prompter)?
        .excluding_backups(&config.effective_backup_root(), &config.backup_prefix);
    let finder = DuplicateFinder::new(scan_config).with_reporter(reporter);
    let (sets, summary) = finder.find_duplicates()?;

    let out = prompter.out();
    match args.output {
        OutputFormat::Json => {
            let report = ScanReport {
                root: &finder.config().root,
                algorithm: finder.config().algorithm,
                sets: sets.iter().map(SetView::from).collect(),
                summary: &summary,
            };
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
        OutputFormat::Text => {
            if sets.is_empty() {
                writeln!(out, "No duplicate files found.")?;
            } else {
                write_scan_text(out, &sets, &summary)?;
            }
        }
    }

    Ok(ExitCode::Success)
}

/// Run `clean`: find duplicates, choose what to keep, back up and remove
/// the rest.
///
/// # Errors
///
/// Returns an error for an invalid root or algorithm, a hashing failure, or
/// a broken terminal. Per-file backup and delete failures are not errors;
/// they turn into [`ExitCode::PartialFailure`].
///
/// `arm_interrupt` is called just before the first file is touched and may
/// return the handler whose flag stops the purge between files.
pub fn run_clean<R, W, F>(
    args: &CleanArgs,
    config: &Config,
    prompter: &mut Prompter<R, W>,
    reporter: Arc<dyn Reporter>,
    arm_interrupt: F,
) -> Result<ExitCode>
where
    R: BufRead,
    W: Write,
    F: FnOnce() -> Result<Option<ShutdownHandler>>,
{
    let backup_root = args
        .backup_root
        .clone()
        .unwrap_or_else(|| config.effective_backup_root());
    let prefix = args
        .backup_prefix
        .clone()
        .unwrap_or_else(|| config.backup_prefix.clone());

    let scan_config =
        scan_config(&args.scan, config, prompter)?.excluding_backups(&backup_root, &prefix);
    let (sets, summary) = DuplicateFinder::new(scan_config)
        .with_reporter(Arc::clone(&reporter))
        .find_duplicates()?;

    if sets.is_empty() {
        writeln!(prompter.out(), "No duplicate files found.")?;
        return Ok(ExitCode::Success);
    }

    writeln!(
        prompter.out(),
        "Found {} duplicate sets, {} duplicate files ({} reclaimable):",
        summary.duplicate_sets,
        summary.duplicate_files,
        summary.reclaimable_display()
    )?;
    write_candidate_listing(prompter.out(), &sets)?;

    let keep = resolve_keep(args.keep.as_deref(), candidates(&sets).len(), prompter)?;
    let deletion = resolve(&sets, &keep);
    if deletion.is_empty() {
        writeln!(prompter.out(), "Keeping everything, nothing to do.")?;
        return Ok(ExitCode::Success);
    }

    let doomed: HashSet<&Path> = deletion.iter().map(PathBuf::as_path).collect();
    let freed: u64 = sets
        .iter()
        .flat_map(|set| set.duplicates().iter().map(move |p| (p, set.size)))
        .filter(|(p, _)| doomed.contains(p.as_path()))
        .map(|(_, size)| size)
        .sum();

    writeln!(
        prompter.out(),
        "{} file(s) ({}) will be backed up under {} and removed:",
        deletion.len(),
        ByteSize::b(freed),
        backup_root.display()
    )?;
    for path in &deletion {
        writeln!(prompter.out(), "  {}", path.display())?;
    }

    if args.dry_run {
        writeln!(prompter.out(), "Dry run, nothing changed.")?;
        return Ok(ExitCode::Success);
    }

    if !args.yes && !prompter.confirm("Proceed?")? {
        writeln!(prompter.out(), "Aborted, nothing changed.")?;
        return Ok(ExitCode::Success);
    }

    let mut purge_config = PurgeConfig::new(backup_root).with_prefix(prefix);
    if let Some(handler) = arm_interrupt()? {
        purge_config = purge_config.with_shutdown_flag(handler.get_flag());
    }
    let report = Purger::new(purge_config)
        .with_reporter(reporter)
        .execute(&deletion);

    write_purge_report(prompter.out(), &report)?;
    Ok(exit_code_for(&report))
}

fn write_purge_report<W: Write>(out: &mut W, report: &PurgeReport) -> io::Result<()> {
    for outcome in report.failures() {
        if let Some(ref failure) = outcome.failure {
            writeln!(
                out,
                "{} {} ({} failed: {})",
                "FAILED".red(),
                outcome.path.display(),
                failure.stage,
                failure.message
            )?;
        }
    }
    writeln!(out, "{}", report.summary())
}

/// Map a purge report to the process exit code.
#[must_use]
pub fn exit_code_for(report: &PurgeReport) -> ExitCode {
    if report.was_aborted() {
        ExitCode::Interrupted
    } else if report.all_succeeded() {
        ExitCode::Success
    } else {
        ExitCode::PartialFailure
    }
}

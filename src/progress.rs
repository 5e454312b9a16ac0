//! Run reporting: the event stream and its console renderer.
//!
//! The library never writes to the terminal. Every component that has
//! something to say emits an [`Event`] (a kind plus the path it concerns)
//! through a [`Reporter`]. The binary plugs in [`ConsoleReporter`], tests
//! plug in a collector, and library callers that don't care use
//! [`NullReporter`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use yansi::Paint;

/// What happened to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A regular file was discovered by the walker.
    Walked,
    /// A walk entry could not be read and was left out of the scan.
    SkippedEntry,
    /// A file is about to be hashed.
    Hashing,
    /// A duplicate set was confirmed; the path is its canonical member.
    Grouped,
    /// The backup directory for this run was created.
    BackupCreated,
    /// A file was copied into the backup directory.
    BackedUp,
    /// The original of a backed-up file was removed.
    Deleted,
    /// Backing up or removing a file failed.
    Failed,
    /// A file was left untouched because the run was aborted.
    Skipped,
}

impl EventKind {
    fn label(self) -> &'static str {
        match self {
            Self::Walked => "found",
            Self::SkippedEntry => "unreadable",
            Self::Hashing => "hashing",
            Self::Grouped => "duplicates",
            Self::BackupCreated => "backup dir",
            Self::BackedUp => "backed up",
            Self::Deleted => "deleted",
            Self::Failed => "FAILED",
            Self::Skipped => "skipped",
        }
    }
}

/// A single `{kind, path}` report record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// What happened
    pub kind: EventKind,
    /// The path it happened to
    pub path: PathBuf,
    /// Optional free-form detail (error text, copy count, backup target)
    pub detail: Option<String>,
}

impl Event {
    /// Create an event without detail.
    #[must_use]
    pub fn new(kind: EventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            detail: None,
        }
    }

    /// Attach detail text.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.path.display())?;
        if let Some(ref detail) = self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

/// Pipeline phases, used to bracket bursts of events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Enumerating files under the root
    Walking,
    /// Hashing members of multi-file size groups
    Hashing,
    /// Backing up and removing the deletion list
    Purging,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Walking => write!(f, "walking"),
            Self::Hashing => write!(f, "hashing"),
            Self::Purging => write!(f, "purging"),
        }
    }
}

/// Receiver for run events.
///
/// Implement this trait to observe the pipeline without coupling it to
/// a terminal.
pub trait Reporter: Send + Sync {
    /// Called for every event.
    fn report(&self, event: &Event);

    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - The phase that is starting
    /// * `total` - Number of items the phase will process, 0 if unknown
    fn on_phase_start(&self, _phase: Phase, _total: usize) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, _phase: Phase) {}
}

/// Reporter that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _event: &Event) {}
}

/// Reporter that forwards events to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, event: &Event) {
        match event.kind {
            EventKind::Walked | EventKind::Hashing => log::trace!("{event}"),
            EventKind::SkippedEntry | EventKind::Failed | EventKind::Skipped => {
                log::warn!("{event}");
            }
            _ => log::info!("{event}"),
        }
    }

    fn on_phase_start(&self, phase: Phase, total: usize) {
        log::debug!("Phase {phase} started ({total} items)");
    }

    fn on_phase_end(&self, phase: Phase) {
        log::debug!("Phase {phase} finished");
    }
}

/// Console reporter: a spinner while walking and hashing, one line per
/// backup, deletion, or failure.
pub struct ConsoleReporter {
    spinner: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl ConsoleReporter {
    /// Create a console reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, only failures are printed.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            spinner: Mutex::new(None),
            quiet,
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {prefix} [{elapsed_precise}] {pos} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn spinner(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.spinner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Print a line without tearing an active spinner.
    fn println(&self, line: String) {
        match *self.spinner() {
            Some(ref pb) => pb.println(line),
            None => println!("{line}"),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, event: &Event) {
        match event.kind {
            EventKind::Walked | EventKind::Hashing => {
                if self.quiet {
                    return;
                }
                if let Some(ref pb) = *self.spinner() {
                    pb.inc(1);
                    pb.set_message(truncate_path(&event.path, 40));
                }
            }
            EventKind::Failed | EventKind::SkippedEntry => {
                let line = format!("{}", event.red());
                match *self.spinner() {
                    Some(ref pb) => pb.println(line),
                    None => eprintln!("{line}"),
                }
            }
            EventKind::Skipped => {
                if !self.quiet {
                    self.println(format!("{}", event.yellow()));
                }
            }
            EventKind::Deleted => {
                if !self.quiet {
                    self.println(format!("{}", event.green()));
                }
            }
            _ => {
                if !self.quiet {
                    self.println(event.to_string());
                }
            }
        }
    }

    fn on_phase_start(&self, phase: Phase, _total: usize) {
        if self.quiet || phase == Phase::Purging {
            return;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_prefix(phase.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        *self.spinner() = Some(pb);
    }

    fn on_phase_end(&self, _phase: Phase) {
        if let Some(pb) = self.spinner().take() {
            pb.finish_and_clear();
        }
    }
}

/// Truncate a path for display in the spinner.
fn truncate_path(path: &Path, max_len: usize) -> String {
    let full = path.display().to_string();
    if full.chars().count() <= max_len {
        return full;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let count = file_name.chars().count();

    if count + 4 > max_len {
        let tail: String = file_name.chars().skip(count + 3 - max_len).collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}

//! Backup-then-delete execution.
//!
//! # Overview
//!
//! Every file on the deletion list is copied into a per-run backup
//! directory before its original is removed:
//!
//! 1. The backup directory `<backup_root>/<prefix>_<token>` is created the
//!    first time a file needs it. An empty deletion list creates nothing.
//! 2. The file is copied to `<backup_dir>/<file name>`.
//! 3. Only after the copy succeeds is the original removed.
//!
//! A failure on one file is recorded in the [`PurgeReport`] and the
//! remaining files are still processed. A file whose copy failed is never
//! removed.
//!
//! # Limitations
//!
//! The backup directory is flat. Two deleted files with the same base name
//! land on the same backup path and the later copy overwrites the earlier
//! one. Both were duplicates, so their canonical copies are still in place.
//!
//! # Example
//!
//! ```no_run
//! use dupepurge::actions::{PurgeConfig, Purger};
//! use std::path::PathBuf;
//!
//! let config = PurgeConfig::new("/var/backups");
//! let report = Purger::new(config).execute(&[PathBuf::from("/data/copy.txt")]);
//! println!("{}", report.summary());
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytesize::ByteSize;
use serde::Serialize;
use thiserror::Error;

use crate::progress::{Event, EventKind, NullReporter, Phase, Reporter};

/// Default backup directory name prefix.
pub const DEFAULT_BACKUP_PREFIX: &str = "dedupe_backup";

/// How many fresh tokens to try when a backup directory name is taken.
const MAX_NAME_ATTEMPTS: usize = 16;

/// Error type for backup and removal of a single file.
#[derive(Debug, Error)]
pub enum PurgeError {
    /// The backup directory could not be created.
    #[error("cannot create backup directory {path}: {source}")]
    BackupLocation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Every generated backup directory name already existed.
    #[error("no free backup directory name under {0}")]
    NameExhausted(PathBuf),

    /// The path has no final component to name the backup copy with.
    #[error("cannot derive a backup name for {0}")]
    NoFileName(PathBuf),

    /// Copying the file into the backup directory failed.
    #[error("backup of {path} to {backup} failed: {source}")]
    Backup {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Removing the original failed after it was backed up.
    #[error("delete of {path} failed: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PurgeError {
    /// The stage of the per-file sequence this error belongs to.
    #[must_use]
    pub fn stage(&self) -> FailureStage {
        match self {
            Self::Delete { .. } => FailureStage::Delete,
            _ => FailureStage::Backup,
        }
    }
}

/// Configuration for a purge run.
#[derive(Debug, Clone)]
pub struct PurgeConfig {
    /// Directory the backup directory is created in
    pub backup_root: PathBuf,
    /// Backup directory name prefix
    pub prefix: String,
    /// Set to request a stop between files
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            backup_root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            prefix: DEFAULT_BACKUP_PREFIX.to_string(),
            shutdown_flag: None,
        }
    }
}

impl PurgeConfig {
    /// Create a config that backs up under `backup_root`.
    #[must_use]
    pub fn new(backup_root: impl Into<PathBuf>) -> Self {
        Self {
            backup_root: backup_root.into(),
            ..Self::default()
        }
    }

    /// Set the backup directory name prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set a shutdown flag that is checked between files.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

/// The per-run backup directory.
#[derive(Debug, Clone)]
pub struct BackupLocation {
    path: PathBuf,
}

impl BackupLocation {
    /// Create a new, uniquely named backup directory under `root`.
    ///
    /// The name is `<prefix>_<token>` with a random token. An existing
    /// directory is never reused: on a name clash a fresh token is tried.
    ///
    /// # Errors
    ///
    /// Returns [`PurgeError::BackupLocation`] if the directory cannot be
    /// created and [`PurgeError::NameExhausted`] if every attempt clashed.
    pub fn create(root: &Path, prefix: &str) -> Result<Self, PurgeError> {
        Self::create_with(root, prefix, || uuid::Uuid::new_v4().simple().to_string())
    }

    fn create_with(
        root: &Path,
        prefix: &str,
        mut token: impl FnMut() -> String,
    ) -> Result<Self, PurgeError> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = root.join(format!("{}_{}", prefix, token()));
            match fs::create_dir(&path) {
                Ok(()) => {
                    log::info!("Created backup directory {}", path.display());
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    log::debug!("Backup directory {} exists, retrying", path.display());
                }
                Err(source) => return Err(PurgeError::BackupLocation { path, source }),
            }
        }
        Err(PurgeError::NameExhausted(root.to_path_buf()))
    }

    /// Path of the backup directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the backup copy of `original` goes.
    ///
    /// # Errors
    ///
    /// Returns [`PurgeError::NoFileName`] if `original` has no base name.
    pub fn target_for(&self, original: &Path) -> Result<PathBuf, PurgeError> {
        original
            .file_name()
            .map(|name| self.path.join(name))
            .ok_or_else(|| PurgeError::NoFileName(original.to_path_buf()))
    }
}

/// Where a file on the deletion list ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    /// Not processed, because the run was aborted.
    Pending,
    /// Copied to the backup directory; the original still exists.
    BackedUp,
    /// Copied and removed.
    Deleted,
    /// The backup failed; the original is untouched.
    Failed,
}

/// Which step of the backup-then-delete sequence failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Creating the backup directory or copying into it
    Backup,
    /// Removing the original after the copy
    Delete,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backup => write!(f, "backup"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Recorded failure for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    /// Step that failed
    pub stage: FailureStage,
    /// Error message
    pub message: String,
}

/// Outcome for one file on the deletion list.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    /// The original path
    pub path: PathBuf,
    /// Final state
    pub state: FileState,
    /// Backup copy, if one was written
    pub backup: Option<PathBuf>,
    /// Size of the file in bytes, if it was copied
    pub size: u64,
    /// What went wrong, if anything
    pub failure: Option<FileFailure>,
}

impl FileOutcome {
    fn pending(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            state: FileState::Pending,
            backup: None,
            size: 0,
            failure: None,
        }
    }

    fn fail(mut self, state: FileState, error: &PurgeError) -> Self {
        self.state = state;
        self.failure = Some(FileFailure {
            stage: error.stage(),
            message: error.to_string(),
        });
        self
    }

    /// Whether this file went through cleanly.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.state == FileState::Deleted && self.failure.is_none()
    }
}

/// Results of a purge run, one outcome per file in deletion-list order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PurgeReport {
    /// The backup directory, if one was created
    pub backup_dir: Option<PathBuf>,
    /// Per-file outcomes
    pub outcomes: Vec<FileOutcome>,
    /// Total bytes removed from their original locations
    pub bytes_freed: u64,
}

impl PurgeReport {
    fn count(&self, state: FileState) -> usize {
        self.outcomes.iter().filter(|o| o.state == state).count()
    }

    /// Number of files backed up and removed.
    #[must_use]
    pub fn deleted_count(&self) -> usize {
        self.count(FileState::Deleted)
    }

    /// Number of files backed up whose original could not be removed.
    #[must_use]
    pub fn backed_up_count(&self) -> usize {
        self.count(FileState::BackedUp)
    }

    /// Number of files whose backup failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(FileState::Failed)
    }

    /// Number of files left unprocessed by an abort.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.count(FileState::Pending)
    }

    /// Outcomes that carry a failure.
    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.failure.is_some())
    }

    /// Whether the run was cut short.
    #[must_use]
    pub fn was_aborted(&self) -> bool {
        self.pending_count() > 0
    }

    /// Check if every file was backed up and removed.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(FileOutcome::succeeded)
    }

    /// Human-readable summary of the run.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Deleted {} file(s), freed {}",
            self.deleted_count(),
            ByteSize::b(self.bytes_freed)
        );

        let failed = self.failed_count() + self.backed_up_count();
        if failed > 0 {
            summary.push_str(&format!(", {failed} failed"));
        }
        if self.pending_count() > 0 {
            summary.push_str(&format!(", {} not processed", self.pending_count()));
        }
        if let Some(ref dir) = self.backup_dir {
            summary.push_str(&format!("; backups in {}", dir.display()));
        }
        summary
    }
}

/// Runs the backup-then-delete sequence over a deletion list.
pub struct Purger {
    config: PurgeConfig,
    reporter: Arc<dyn Reporter>,
}

impl Purger {
    /// Create a purger that reports nothing.
    #[must_use]
    pub fn new(config: PurgeConfig) -> Self {
        Self {
            config,
            reporter: Arc::new(NullReporter),
        }
    }

    /// Set the event reporter.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &PurgeConfig {
        &self.config
    }

    /// Back up and remove every path on `deletion_list`, in order.
    ///
    /// Never fails as a whole: per-file failures are recorded in the
    /// report. If the shutdown flag is raised, files not yet started stay
    /// [`FileState::Pending`] and are reported as skipped.
    pub fn execute(&self, deletion_list: &[PathBuf]) -> PurgeReport {
        let mut report = PurgeReport::default();
        let mut location: Option<BackupLocation> = None;

        self.reporter
            .on_phase_start(Phase::Purging, deletion_list.len());

        for (index, path) in deletion_list.iter().enumerate() {
            if self.config.is_shutdown_requested() {
                log::warn!(
                    "Purge interrupted, {} file(s) not processed",
                    deletion_list.len() - index
                );
                for rest in &deletion_list[index..] {
                    self.reporter.report(&Event::new(EventKind::Skipped, rest));
                    report.outcomes.push(FileOutcome::pending(rest));
                }
                break;
            }

            let outcome = self.purge_one(path, &mut location);
            if outcome.state == FileState::Deleted {
                report.bytes_freed += outcome.size;
            }
            report.outcomes.push(outcome);
        }

        report.backup_dir = location.map(|loc| loc.path);
        self.reporter.on_phase_end(Phase::Purging);

        log::info!("{}", report.summary());
        report
    }

    fn purge_one(&self, path: &Path, location: &mut Option<BackupLocation>) -> FileOutcome {
        let mut outcome = FileOutcome::pending(path);

        let target = match self
            .ensure_location(location)
            .and_then(|loc| loc.target_for(path))
        {
            Ok(target) => target,
            Err(e) => return self.failed(outcome, FileState::Failed, &e),
        };

        match fs::copy(path, &target) {
            Ok(bytes) => {
                outcome.size = bytes;
                outcome.state = FileState::BackedUp;
                outcome.backup = Some(target.clone());
                log::debug!("Backed up {} to {}", path.display(), target.display());
                self.reporter.report(
                    &Event::new(EventKind::BackedUp, path)
                        .with_detail(target.display().to_string()),
                );
            }
            Err(source) => {
                let error = PurgeError::Backup {
                    path: path.to_path_buf(),
                    backup: target,
                    source,
                };
                return self.failed(outcome, FileState::Failed, &error);
            }
        }

        match fs::remove_file(path) {
            Ok(()) => {
                outcome.state = FileState::Deleted;
                log::info!("Deleted {} ({} bytes)", path.display(), outcome.size);
                self.reporter.report(&Event::new(EventKind::Deleted, path));
                outcome
            }
            Err(source) => {
                let error = PurgeError::Delete {
                    path: path.to_path_buf(),
                    source,
                };
                self.failed(outcome, FileState::BackedUp, &error)
            }
        }
    }

    /// Return the backup directory, creating it on first use.
    fn ensure_location<'l>(
        &self,
        slot: &'l mut Option<BackupLocation>,
    ) -> Result<&'l BackupLocation, PurgeError> {
        let location = match slot.take() {
            Some(location) => location,
            None => {
                let location =
                    BackupLocation::create(&self.config.backup_root, &self.config.prefix)?;
                self.reporter
                    .report(&Event::new(EventKind::BackupCreated, location.path()));
                location
            }
        };
        Ok(slot.insert(location))
    }

    fn failed(&self, outcome: FileOutcome, state: FileState, error: &PurgeError) -> FileOutcome {
        log::error!("{}", error);
        self.reporter.report(
            &Event::new(EventKind::Failed, &outcome.path).with_detail(error.to_string()),
        );
        outcome.fail(state, error)
    }
}

/// Back up and remove `deletion_list` without event reporting.
///
/// Convenience wrapper around [`Purger::execute`].
#[must_use]
pub fn purge(deletion_list: &[PathBuf], config: PurgeConfig) -> PurgeReport {
    Purger::new(config).execute(deletion_list)
}

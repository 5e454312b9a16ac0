//! Duplicate detection pipeline.
//!
//! # Overview
//!
//! Detection runs strictly phase by phase:
//!
//! 1. **Walk** - enumerate every regular file under the root
//! 2. **Size** - bucket records by byte size; unique sizes are never hashed
//! 3. **Hash** - stream every member of a multi-file size bucket through the
//!    configured digest and bucket again by digest
//! 4. **Confirm** - every digest bucket with two or more members becomes a
//!    [`DuplicateSet`]; single-member buckets were size collisions with
//!    different content and are dropped
//!
//! Equal size plus equal digest is treated as equal content. There is no
//! byte-by-byte verification pass.
//!
//! A hashing failure aborts classification. Quietly dropping the file would
//! leave a partial set behind, and a later phase could then delete a copy
//! that was never confirmed as a duplicate.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::progress::{Event, EventKind, NullReporter, Phase, Reporter};
use crate::scanner::{FileRecord, HashAlgorithm, HashError, Hasher, ScanConfig, ScanError, Walker};

use super::groups::{group_by_size, DuplicateSet, GroupingStats, HashGroups};

/// Statistics from a classification run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifyStats {
    /// Size grouping statistics (Phase 1)
    pub grouping: GroupingStats,
    /// Number of files passed through the hasher
    pub files_hashed: usize,
    /// Bytes read by the hasher
    pub bytes_hashed: u64,
    /// Hashed files whose digest matched no other file of the same size
    pub unique_digests: usize,
    /// Number of confirmed duplicate sets
    pub duplicate_sets: usize,
    /// Number of non-canonical members across all sets
    pub duplicate_files: usize,
    /// Bytes reclaimable by removing every non-canonical member
    pub reclaimable_space: u64,
}

/// Two-phase duplicate classifier (size, then digest).
pub struct Classifier<'a> {
    hasher: Hasher,
    reporter: &'a dyn Reporter,
}

impl<'a> Classifier<'a> {
    /// Create a classifier that reports progress to `reporter`.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, reporter: &'a dyn Reporter) -> Self {
        Self {
            hasher: Hasher::new(algorithm),
            reporter,
        }
    }

    /// Classify `records` into duplicate sets.
    ///
    /// Sets are returned in digest-discovery order; members within a set
    /// keep walk order, so the canonical member is the first one walked.
    ///
    /// # Errors
    ///
    /// Returns the first [`HashError`] encountered. No partial result is
    /// returned.
    pub fn classify(
        &self,
        records: impl IntoIterator<Item = FileRecord>,
    ) -> Result<(Vec<DuplicateSet>, ClassifyStats), HashError> {
        let mut stats = ClassifyStats::default();

        let (size_groups, grouping) = group_by_size(records);
        log::info!(
            "Size grouping: {} files, {} candidates ({:.1}% eliminated)",
            grouping.total_files,
            grouping.potential_duplicates,
            grouping.elimination_rate()
        );

        self.reporter
            .on_phase_start(Phase::Hashing, grouping.potential_duplicates);

        let mut hash_groups = HashGroups::new();
        for (&size, members) in size_groups.multi_member() {
            for path in members {
                self.reporter.report(&Event::new(EventKind::Hashing, path));
                let digest = match self.hasher.hash_file(path) {
                    Ok(digest) => digest,
                    Err(e) => {
                        log::error!("Aborting classification: {}", e);
                        self.reporter.report(
                            &Event::new(EventKind::Failed, path).with_detail(e.to_string()),
                        );
                        self.reporter.on_phase_end(Phase::Hashing);
                        return Err(e);
                    }
                };
                stats.files_hashed += 1;
                stats.bytes_hashed += size;
                hash_groups.insert((size, digest), path.clone());
            }
        }

        self.reporter.on_phase_end(Phase::Hashing);

        let mut sets = Vec::new();
        for ((size, digest), paths) in hash_groups.into_groups() {
            match DuplicateSet::new(digest, size, paths) {
                Some(set) => {
                    stats.duplicate_files += set.duplicates().len();
                    stats.reclaimable_space += set.wasted_space();
                    self.reporter.report(
                        &Event::new(EventKind::Grouped, set.canonical())
                            .with_detail(format!("{} copies", set.len())),
                    );
                    sets.push(set);
                }
                None => stats.unique_digests += 1,
            }
        }

        stats.duplicate_sets = sets.len();
        stats.grouping = grouping;

        log::info!(
            "Hashing: {} files hashed, {} duplicate sets, {} duplicate files",
            stats.files_hashed,
            stats.duplicate_sets,
            stats.duplicate_files
        );

        Ok((sets, stats))
    }
}

/// Classify `records` with `algorithm`, without progress reporting.
///
/// # Errors
///
/// See [`Classifier::classify`].
pub fn classify(
    records: impl IntoIterator<Item = FileRecord>,
    algorithm: HashAlgorithm,
) -> Result<Vec<DuplicateSet>, HashError> {
    Classifier::new(algorithm, &NullReporter)
        .classify(records)
        .map(|(sets, _)| sets)
}

/// Summary statistics from a complete scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanSummary {
    /// Total files found
    pub total_files: usize,
    /// Total size of all files scanned
    pub total_size: u64,
    /// Files eliminated by unique size
    pub eliminated_by_size: usize,
    /// Files passed through the hasher
    pub files_hashed: usize,
    /// Number of duplicate sets
    pub duplicate_sets: usize,
    /// Number of non-canonical duplicate files
    pub duplicate_files: usize,
    /// Bytes reclaimable by removing duplicates
    pub reclaimable_space: u64,
    /// Walk entries that could not be read and were left out
    pub skipped_entries: Vec<PathBuf>,
    /// Time taken for the scan
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Reclaimable space as a human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        bytesize::ByteSize(self.reclaimable_space).to_string()
    }

    /// Total scanned size as a human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        bytesize::ByteSize(self.total_size).to_string()
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The root was invalid or could not be opened.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A candidate file could not be hashed; the scan was aborted.
    #[error("Hashing failed, scan aborted: {0}")]
    Hash(#[from] HashError),
}

impl FinderError {
    /// Whether the failure happened before anything was read.
    #[must_use]
    pub fn is_invalid_root(&self) -> bool {
        matches!(self, Self::Scan(e) if e.is_invalid_root())
    }
}

/// Duplicate finder that runs walk and classification for one root.
///
/// # Example
///
/// ```no_run
/// use dupepurge::duplicates::DuplicateFinder;
/// use dupepurge::scanner::{HashAlgorithm, ScanConfig};
/// use std::path::Path;
///
/// let config = ScanConfig::new(Path::new("."), HashAlgorithm::Blake3).unwrap();
/// let finder = DuplicateFinder::new(config);
///
/// let (sets, summary) = finder.find_duplicates().unwrap();
/// println!("Found {} duplicate sets", sets.len());
/// println!("Reclaimable space: {}", summary.reclaimable_display());
/// ```
pub struct DuplicateFinder {
    config: ScanConfig,
    reporter: Arc<dyn Reporter>,
}

impl DuplicateFinder {
    /// Create a finder for a validated scan configuration.
    #[must_use]
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            reporter: Arc::new(NullReporter),
        }
    }

    /// Report progress to `reporter`.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// The configuration this finder scans with.
    #[must_use]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Walk the root completely, then classify what was found.
    ///
    /// # Errors
    ///
    /// - [`FinderError::Scan`] if the root is no longer a readable directory
    /// - [`FinderError::Hash`] if any candidate file fails to hash
    pub fn find_duplicates(&self) -> Result<(Vec<DuplicateSet>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let mut summary = ScanSummary::default();

        let walker =
            Walker::new(&self.config.root)?.with_backup_exclusion(self.config.backups.clone());
        log::info!(
            "Scanning {} with {}",
            walker.root().display(),
            self.config.algorithm
        );

        self.reporter.on_phase_start(Phase::Walking, 0);
        let mut records = Vec::new();
        for entry in walker.walk() {
            match entry {
                Ok(record) => {
                    self.reporter
                        .report(&Event::new(EventKind::Walked, &record.path));
                    records.push(record);
                }
                Err(e) => {
                    self.reporter.report(
                        &Event::new(EventKind::SkippedEntry, e.path()).with_detail(e.to_string()),
                    );
                    summary.skipped_entries.push(e.path().to_path_buf());
                }
            }
        }
        self.reporter.on_phase_end(Phase::Walking);

        log::info!("Walk complete: {} files", records.len());

        let classifier = Classifier::new(self.config.algorithm, self.reporter.as_ref());
        let (sets, stats) = classifier.classify(records)?;

        summary.total_files = stats.grouping.total_files;
        summary.total_size = stats.grouping.total_size;
        summary.eliminated_by_size = stats.grouping.eliminated_unique;
        summary.files_hashed = stats.files_hashed;
        summary.duplicate_sets = stats.duplicate_sets;
        summary.duplicate_files = stats.duplicate_files;
        summary.reclaimable_space = stats.reclaimable_space;
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete: {} duplicate sets, {} duplicate files, {} reclaimable",
            summary.duplicate_sets,
            summary.duplicate_files,
            summary.reclaimable_display()
        );

        Ok((sets, summary))
    }
}

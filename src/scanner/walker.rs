//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing a directory
//! tree and yielding one [`FileRecord`] per regular file.
//!
//! # Features
//!
//! - Lazy, single pass: nothing is read until the iterator is polled
//! - Deterministic order: entries are sorted by file name within each directory
//! - Symbolic links are never followed and never reported as files
//! - Devices, sockets, and FIFOs are skipped
//! - Backup directories left by earlier runs can be excluded
//! - Root validation happens once, in [`Walker::new`]
//!
//! # Example
//!
//! ```no_run
//! use dupepurge::scanner::Walker;
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads")).unwrap();
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{validate_root, BackupExclusion, FileRecord, ScanError};

/// Directory walker for file discovery.
#[derive(Debug, Clone)]
pub struct Walker {
    /// Absolute root path to walk
    root: PathBuf,
    /// Backup directories that are never entered
    backups: Option<BackupExclusion>,
}

impl Walker {
    /// Create a new walker for the given root.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotFound`] or [`ScanError::NotADirectory`] if the
    /// root is unusable. No entry is read in that case.
    pub fn new(root: &Path) -> Result<Self, ScanError> {
        Ok(Self {
            root: validate_root(root)?,
            backups: None,
        })
    }

    /// Skip directories matched by `backups`, and everything below them.
    #[must_use]
    pub fn with_backup_exclusion(mut self, backups: Option<BackupExclusion>) -> Self {
        self.backups = backups;
        self
    }

    /// The validated, absolute root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the directory tree, yielding file records.
    ///
    /// Entry-level failures (an unreadable subdirectory, a file removed
    /// between listing and stat) are yielded as [`ScanError`] values rather
    /// than stopping iteration.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dupepurge::scanner::Walker;
    /// use std::path::Path;
    ///
    /// let walker = Walker::new(Path::new(".")).unwrap();
    /// let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
    /// println!("Found {} files", files.len());
    /// ```
    pub fn walk(&self) -> impl Iterator<Item = Result<FileRecord, ScanError>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(false)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| !self.should_skip_dir(entry))
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    let file_type = entry.file_type();

                    if file_type.is_dir() {
                        return None;
                    }

                    if !file_type.is_file() {
                        log::trace!("Skipping non-regular entry: {}", entry.path().display());
                        return None;
                    }

                    match entry.metadata() {
                        Ok(metadata) => {
                            log::trace!("{} ({} bytes)", entry.path().display(), metadata.len());
                            Some(Ok(FileRecord::new(entry.into_path(), metadata.len())))
                        }
                        Err(e) => Some(Err(self.entry_error(e))),
                    }
                }
                Err(e) => Some(Err(self.entry_error(e))),
            })
    }

    /// Check if a directory is an earlier run's backup. The root itself is
    /// never skipped.
    fn should_skip_dir(&self, entry: &walkdir::DirEntry) -> bool {
        let skip = entry.depth() > 0
            && entry.file_type().is_dir()
            && self
                .backups
                .as_ref()
                .is_some_and(|backups| backups.matches(entry.path()));
        if skip {
            log::info!("Skipping backup directory {}", entry.path().display());
        }
        skip
    }

    /// Convert a walkdir error into a [`ScanError`] for the offending path.
    fn entry_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        log::warn!("Cannot read {}: {}", path.display(), error);

        let source = error
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
        ScanError::Io { path, source }
    }
}

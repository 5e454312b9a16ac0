//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Validating the scan root once, up front ([`ScanConfig`])
//! - Lazy, deterministic directory walking ([`Walker`])
//! - Streaming content hashing with selectable digests ([`Hasher`])
//!
//! # Example
//!
//! ```no_run
//! use dupepurge::scanner::{HashAlgorithm, ScanConfig, Walker};
//! use std::path::Path;
//!
//! let config = ScanConfig::new(Path::new("."), HashAlgorithm::Blake3).unwrap();
//! let walker = Walker::new(&config.root).unwrap();
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::io;
use std::path::{Path, PathBuf};

// Re-export main types
pub use hasher::{hash_file, AlgorithmError, HashAlgorithm, Hasher, BUFFER_SIZE};
pub use walker::Walker;

/// A regular file discovered during the walk.
///
/// Created by the [`Walker`], consumed by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileRecord {
    /// Create a new FileRecord.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }
}

/// Validated parameters for one scan.
///
/// Built once at the input boundary; everything downstream assumes the root
/// exists, is a directory, and is absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Absolute path of the directory to scan
    pub root: PathBuf,
    /// Digest used to fingerprint same-size files
    pub algorithm: HashAlgorithm,
    /// Backup directories from earlier runs that the walk must not enter
    pub backups: Option<BackupExclusion>,
}

impl ScanConfig {
    /// Validate `root` and build a scan configuration.
    ///
    /// The root is canonicalized so every [`FileRecord`] path is absolute.
    ///
    /// # Errors
    ///
    /// - [`ScanError::NotFound`] if the path does not exist
    /// - [`ScanError::NotADirectory`] if it exists but is not a directory
    pub fn new(root: &Path, algorithm: HashAlgorithm) -> Result<Self, ScanError> {
        Ok(Self {
            root: validate_root(root)?,
            algorithm,
            backups: None,
        })
    }

    /// Keep `<prefix>_<token>` directories directly under `backup_root` out
    /// of the walk, so copies made by earlier runs never join a set.
    #[must_use]
    pub fn excluding_backups(mut self, backup_root: &Path, prefix: &str) -> Self {
        self.backups = Some(BackupExclusion::new(backup_root, prefix));
        self
    }
}

/// Matches backup directories named `<prefix>_<32 hex digits>` inside one
/// parent directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupExclusion {
    parent: PathBuf,
    prefix: String,
}

impl BackupExclusion {
    /// Match backups created under `backup_root` with `prefix`.
    ///
    /// The root is canonicalized when it exists so it compares equal to
    /// walked paths.
    #[must_use]
    pub fn new(backup_root: &Path, prefix: &str) -> Self {
        let parent =
            std::fs::canonicalize(backup_root).unwrap_or_else(|_| backup_root.to_path_buf());
        Self {
            parent,
            prefix: prefix.to_string(),
        }
    }

    /// Whether `dir` is a backup directory left by an earlier run.
    #[must_use]
    pub fn matches(&self, dir: &Path) -> bool {
        dir.parent() == Some(self.parent.as_path())
            && dir
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| is_backup_dir_name(name, &self.prefix))
    }
}

/// Whether `name` has the shape of a backup directory created with `prefix`.
#[must_use]
pub fn is_backup_dir_name(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .is_some_and(|token| token.len() == 32 && token.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Check that `root` is an existing directory and return its absolute form.
///
/// # Errors
///
/// See [`ScanConfig::new`].
pub fn validate_root(root: &Path) -> Result<PathBuf, ScanError> {
    let metadata = std::fs::metadata(root).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ScanError::NotFound(root.to_path_buf()),
        _ => ScanError::Io {
            path: root.to_path_buf(),
            source: e,
        },
    })?;

    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    std::fs::canonicalize(root).map_err(|e| ScanError::Io {
        path: root.to_path_buf(),
        source: e,
    })
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file or directory.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    /// Whether this error means the scan root itself is unusable.
    #[must_use]
    pub fn is_invalid_root(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::NotADirectory(_))
    }

    /// The path this error concerns.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::NotADirectory(p) | Self::Io { path: p, .. } => p,
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file disappeared before or while it was read.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while hashing `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// The file that could not be hashed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Io { path: p, .. } => p,
        }
    }
}

//! File actions module.
//!
//! This module provides functionality for:
//! - Turning the operator's keep choices into a deletion list
//! - Backing up and removing the files on that list
//!
//! # Retention
//!
//! ```
//! use dupepurge::actions::{candidates, resolve, KeepSelection};
//!
//! let sets = Vec::new();
//! let keep = KeepSelection::parse("1,3", candidates(&sets).len());
//! assert!(resolve(&sets, &keep).is_empty());
//! ```
//!
//! # Purge
//!
//! ```no_run
//! use dupepurge::actions::{purge, PurgeConfig};
//! use std::path::PathBuf;
//!
//! let report = purge(&[PathBuf::from("/data/dup.txt")], PurgeConfig::default());
//! println!("{}", report.summary());
//! ```

pub mod purge;
pub mod retain;

pub use purge::{
    purge, BackupLocation, FailureStage, FileFailure, FileOutcome, FileState, PurgeConfig,
    PurgeError, PurgeReport, Purger, DEFAULT_BACKUP_PREFIX,
};
pub use retain::{candidates, resolve, resolve_paths, KeepSelection};

//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file grouping (Phase 1)
//! - Content digest grouping (Phase 2)
//! - Duplicate set management

pub mod finder;
pub mod groups;

pub use finder::{classify, ClassifyStats, Classifier, DuplicateFinder, FinderError, ScanSummary};
pub use groups::{
    group_by_size, DuplicateSet, GroupingStats, HashGroups, OrderedGroups, SizeGroups,
};

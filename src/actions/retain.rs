//! Retention resolution: which duplicates to keep, which to remove.
//!
//! # Overview
//!
//! The operator sees a numbered list of every non-canonical member across
//! all duplicate sets (see [`candidates`]) and names the ones to keep with
//! 1-based indices. Everything else on that list becomes the deletion list.
//!
//! Canonical members never appear on the list and can never be deleted.
//! Indices are translated to paths once, and the deletion list is computed
//! as a set difference over paths, so no index arithmetic happens after
//! the selection is parsed.
//!
//! # Example
//!
//! ```
//! use dupepurge::actions::{resolve, KeepSelection};
//! use dupepurge::duplicates::DuplicateSet;
//! use std::path::PathBuf;
//!
//! let set = DuplicateSet::new(
//!     "digest".to_string(),
//!     5,
//!     vec![PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")],
//! )
//! .unwrap();
//!
//! // Candidates are /b (1) and /c (2); keep /c.
//! let keep = KeepSelection::parse("2", 2);
//! assert_eq!(resolve(&[set], &keep), vec![PathBuf::from("/b")]);
//! ```

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use crate::duplicates::DuplicateSet;

/// Every non-canonical member of every set, flattened in set order.
///
/// Position `i` in this list is index `i + 1` in a [`KeepSelection`].
#[must_use]
pub fn candidates(sets: &[DuplicateSet]) -> Vec<&Path> {
    sets.iter()
        .flat_map(|set| set.duplicates().iter().map(PathBuf::as_path))
        .collect()
}

/// The operator's keep choices, as validated 1-based candidate indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeepSelection {
    indices: BTreeSet<usize>,
}

impl KeepSelection {
    /// Keep nothing beyond the canonical members.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Keep every candidate.
    #[must_use]
    pub fn all(candidate_count: usize) -> Self {
        Self {
            indices: (1..=candidate_count).collect(),
        }
    }

    /// Parse a comma-separated list of 1-based indices.
    ///
    /// Tokens are trimmed. Empty, non-numeric, zero, and out-of-range tokens
    /// are ignored rather than rejected. Repeats collapse and order does not
    /// matter.
    ///
    /// ```
    /// use dupepurge::actions::KeepSelection;
    ///
    /// let keep = KeepSelection::parse(" 3, 1,x,,1, 99", 4);
    /// assert_eq!(keep.indices().collect::<Vec<_>>(), vec![1, 3]);
    /// ```
    #[must_use]
    pub fn parse(input: &str, candidate_count: usize) -> Self {
        let indices = input
            .split(',')
            .map(str::trim)
            .filter_map(|token| {
                if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
                    if !token.is_empty() {
                        log::debug!("Ignoring non-numeric keep token '{}'", token);
                    }
                    return None;
                }
                token.parse::<usize>().ok()
            })
            .filter(|&index| {
                let in_range = (1..=candidate_count).contains(&index);
                if !in_range {
                    log::debug!(
                        "Ignoring keep index {} (valid range 1..={})",
                        index,
                        candidate_count
                    );
                }
                in_range
            })
            .collect();

        Self { indices }
    }

    /// Build a selection from already-numeric indices, dropping any outside
    /// `1..=candidate_count`.
    #[must_use]
    pub fn from_indices(
        indices: impl IntoIterator<Item = usize>,
        candidate_count: usize,
    ) -> Self {
        Self {
            indices: indices
                .into_iter()
                .filter(|i| (1..=candidate_count).contains(i))
                .collect(),
        }
    }

    /// Whether index `index` (1-based) is kept.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    /// Kept indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    /// Number of kept indices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether nothing is kept beyond the canonical members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Translate the indices into the candidate paths they name.
    #[must_use]
    pub fn to_paths(&self, sets: &[DuplicateSet]) -> HashSet<PathBuf> {
        candidates(sets)
            .into_iter()
            .enumerate()
            .filter(|(i, _)| self.contains(i + 1))
            .map(|(_, path)| path.to_path_buf())
            .collect()
    }
}

/// Compute the deletion list for an index-based keep selection.
///
/// See [`resolve_paths`] for the ordering and safety guarantees.
#[must_use]
pub fn resolve(sets: &[DuplicateSet], keep: &KeepSelection) -> Vec<PathBuf> {
    resolve_paths(sets, &keep.to_paths(sets))
}

/// Compute the deletion list for a path-based keep selection.
///
/// Returns every non-canonical member not present in `keep`, in set order
/// then member order. Paths in `keep` that are not candidates are ignored.
/// The result never contains a canonical member and never lists the same
/// path twice.
#[must_use]
pub fn resolve_paths(sets: &[DuplicateSet], keep: &HashSet<PathBuf>) -> Vec<PathBuf> {
    let protected: HashSet<&Path> = sets.iter().map(DuplicateSet::canonical).collect();
    let mut seen: HashSet<&Path> = HashSet::new();

    let deletion: Vec<PathBuf> = candidates(sets)
        .into_iter()
        .filter(|path| !protected.contains(path))
        .filter(|path| !keep.contains(*path))
        .filter(|path| seen.insert(*path))
        .map(Path::to_path_buf)
        .collect();

    log::info!(
        "Retention: {} kept, {} marked for deletion",
        candidates(sets).len() - deletion.len(),
        deletion.len()
    );

    deletion
}

//! Insertion-ordered grouping structures and confirmed duplicate sets.
//!
//! # Overview
//!
//! Both classification phases bucket paths by a key (byte size, then content
//! digest). Which member of a duplicate set is protected from deletion
//! depends on bucket order, so the buckets are kept in [`OrderedGroups`]:
//! keys iterate in first-seen order and members keep their insertion order.
//! Nothing downstream depends on a hash map's iteration order.
//!
//! ## Size Grouping (Phase 1)
//!
//! Files with different sizes cannot be duplicates. Grouping by size lets
//! the classifier skip hashing every file whose size is unique.
//!
//! # Example
//!
//! ```
//! use dupepurge::scanner::FileRecord;
//! use dupepurge::duplicates::group_by_size;
//!
//! let files = vec![
//!     FileRecord::new("/file1.txt", 1024),
//!     FileRecord::new("/file2.txt", 1024),
//!     FileRecord::new("/file3.txt", 2048),
//! ];
//!
//! let (groups, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(groups.len(), 2);
//! assert_eq!(groups.multi_member().count(), 1);
//! ```

use std::collections::HashMap;
use std::hash::Hash;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::scanner::FileRecord;

/// Multimap that preserves first-seen key order and member insertion order.
#[derive(Debug, Clone)]
pub struct OrderedGroups<K> {
    index: HashMap<K, usize>,
    groups: Vec<(K, Vec<PathBuf>)>,
}

impl<K> Default for OrderedGroups<K> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            groups: Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> OrderedGroups<K> {
    /// Create an empty multimap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` to the group for `key`, creating the group on first use.
    pub fn insert(&mut self, key: K, path: PathBuf) {
        match self.index.get(&key) {
            Some(&slot) => self.groups[slot].1.push(path),
            None => {
                self.index.insert(key.clone(), self.groups.len());
                self.groups.push((key, vec![path]));
            }
        }
    }

    /// Members of the group for `key`, in insertion order.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&[PathBuf]> {
        self.index
            .get(key)
            .map(|&slot| self.groups[slot].1.as_slice())
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no key has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of members across all groups.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.groups.iter().map(|(_, members)| members.len()).sum()
    }

    /// Iterate groups in first-seen key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[PathBuf])> {
        self.groups
            .iter()
            .map(|(key, members)| (key, members.as_slice()))
    }

    /// Iterate only the groups with two or more members.
    pub fn multi_member(&self) -> impl Iterator<Item = (&K, &[PathBuf])> {
        self.iter().filter(|(_, members)| members.len() > 1)
    }

    /// Consume the multimap, yielding groups in first-seen key order.
    pub fn into_groups(self) -> impl Iterator<Item = (K, Vec<PathBuf>)> {
        self.groups.into_iter()
    }
}

/// Paths bucketed by byte size.
pub type SizeGroups = OrderedGroups<u64>;

/// Paths bucketed by content digest, qualified by size so files of
/// different sizes never share a bucket.
pub type HashGroups = OrderedGroups<(u64, String)>;

/// A confirmed set of two or more byte-identical files.
///
/// The first path is the canonical member: the copy found first in walk
/// order. It is always retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateSet {
    /// Hex content digest shared by every member
    pub digest: String,
    /// File size in bytes shared by every member
    pub size: u64,
    /// Members in discovery order; index 0 is canonical
    paths: Vec<PathBuf>,
}

impl DuplicateSet {
    /// Create a duplicate set. Returns `None` for fewer than two paths.
    #[must_use]
    pub fn new(digest: String, size: u64, paths: Vec<PathBuf>) -> Option<Self> {
        if paths.len() < 2 {
            return None;
        }
        Some(Self {
            digest,
            size,
            paths,
        })
    }

    /// The first-discovered member, implicitly protected from deletion.
    #[must_use]
    pub fn canonical(&self) -> &Path {
        &self.paths[0]
    }

    /// Every member except the canonical one, in discovery order.
    #[must_use]
    pub fn duplicates(&self) -> &[PathBuf] {
        &self.paths[1..]
    }

    /// All members, canonical first.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Always false; a set has at least two members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Bytes freed if every non-canonical member were removed.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicates().len() as u64
    }
}

/// Statistics from the size grouping phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of distinct file sizes
    pub unique_sizes: usize,
    /// Number of files that could be duplicates (in groups of 2+)
    pub potential_duplicates: usize,
    /// Number of files eliminated as unique (singleton groups)
    pub eliminated_unique: usize,
    /// Number of size groups with 2+ files
    pub duplicate_groups: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group files by size (Phase 1 of duplicate detection).
///
/// Every record lands in exactly one group. Zero-byte files are grouped like
/// any other size; they all share the empty-input digest and so form a
/// single duplicate set when there are two or more of them.
///
/// # Returns
///
/// A tuple of:
/// - [`SizeGroups`] - all files grouped by size, in discovery order
/// - [`GroupingStats`] - statistics about the grouping operation
///
/// # Example
///
/// ```
/// use dupepurge::scanner::FileRecord;
/// use dupepurge::duplicates::group_by_size;
///
/// let files = vec![
///     FileRecord::new("/a.txt", 100),
///     FileRecord::new("/b.txt", 100),
///     FileRecord::new("/c.txt", 200),
/// ];
///
/// let (groups, stats) = group_by_size(files);
///
/// assert_eq!(groups.get(&100).unwrap().len(), 2);
/// assert_eq!(stats.eliminated_unique, 1);
/// ```
#[must_use]
pub fn group_by_size(files: impl IntoIterator<Item = FileRecord>) -> (SizeGroups, GroupingStats) {
    let mut groups = SizeGroups::new();
    let mut stats = GroupingStats::default();

    for file in files {
        stats.total_files += 1;
        stats.total_size += file.size;
        groups.insert(file.size, file.path);
    }

    stats.unique_sizes = groups.len();

    for (size, members) in groups.iter() {
        if members.len() == 1 {
            stats.eliminated_unique += 1;
            log::trace!("Eliminated unique size {}: {}", size, members[0].display());
        } else {
            stats.potential_duplicates += members.len();
            stats.duplicate_groups += 1;
            log::debug!("Size group {} bytes: {} candidates", size, members.len());
        }
    }

    (groups, stats)
}

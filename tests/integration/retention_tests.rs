use dupepurge::actions::{candidates, resolve, resolve_paths, KeepSelection};
use dupepurge::duplicates::{DuplicateFinder, DuplicateSet};
use dupepurge::scanner::{HashAlgorithm, ScanConfig};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn scanned_sets() -> (tempfile::TempDir, Vec<DuplicateSet>) {
    let dir = tempdir().unwrap();
    for name in ["a1", "a2", "a3"] {
        fs::write(dir.path().join(name), b"group a").unwrap();
    }
    for name in ["b1", "b2"] {
        fs::write(dir.path().join(name), b"group b, longer").unwrap();
    }
    fs::write(dir.path().join("solo"), b"only one").unwrap();

    let config = ScanConfig::new(dir.path(), HashAlgorithm::Blake3).unwrap();
    let (sets, _) = DuplicateFinder::new(config).find_duplicates().unwrap();
    (dir, sets)
}

#[test]
fn test_candidates_cover_every_non_canonical_member() {
    let (_dir, sets) = scanned_sets();
    let listed = candidates(&sets);

    assert_eq!(listed.len(), 3);
    for set in &sets {
        assert!(!listed.contains(&set.canonical()));
        for dup in set.duplicates() {
            assert!(listed.contains(&dup.as_path()));
        }
    }
}

#[test]
fn test_keep_none_deletes_all_candidates() {
    let (_dir, sets) = scanned_sets();
    let deletion = resolve(&sets, &KeepSelection::none());

    let expected: Vec<PathBuf> = candidates(&sets).into_iter().map(PathBuf::from).collect();
    assert_eq!(deletion, expected);
}

#[test]
fn test_keep_selection_spans_sets() {
    let (_dir, sets) = scanned_sets();
    let listed: Vec<PathBuf> = candidates(&sets).into_iter().map(PathBuf::from).collect();

    let deletion = resolve(&sets, &KeepSelection::parse("1,3", listed.len()));
    assert_eq!(deletion, vec![listed[1].clone()]);
}

#[test]
fn test_garbage_selection_keeps_nothing_extra() {
    let (_dir, sets) = scanned_sets();
    let count = candidates(&sets).len();

    let deletion = resolve(&sets, &KeepSelection::parse("zero, 0, 42, -1", count));
    assert_eq!(deletion.len(), count);
}

#[test]
fn test_keep_everything_yields_empty_list() {
    let (_dir, sets) = scanned_sets();
    let count = candidates(&sets).len();
    assert!(resolve(&sets, &KeepSelection::parse("3,2,1", count)).is_empty());
}

#[test]
fn test_path_keep_equivalent_to_index_keep() {
    let (_dir, sets) = scanned_sets();
    let keep = KeepSelection::parse("2", 3);

    let by_index = resolve(&sets, &keep);
    let by_path = resolve_paths(&sets, &keep.to_paths(&sets));
    assert_eq!(by_index, by_path);
}

#[test]
fn test_deletion_list_has_no_repeats() {
    let (_dir, sets) = scanned_sets();
    let deletion = resolve(&sets, &KeepSelection::none());
    let unique: HashSet<_> = deletion.iter().collect();
    assert_eq!(unique.len(), deletion.len());
}

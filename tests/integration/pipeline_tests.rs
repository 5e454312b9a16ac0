use dupepurge::app::{run_clean, Prompter};
use dupepurge::cli::{CleanArgs, ScanOptions};
use dupepurge::config::Config;
use dupepurge::duplicates::{classify, DuplicateFinder};
use dupepurge::error::ExitCode;
use dupepurge::progress::NullReporter;
use dupepurge::scanner::{FileRecord, HashAlgorithm, ScanConfig, Walker};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::tempdir;
use walkdir::WalkDir;

fn write(path: &Path, content: &[u8]) {
    File::create(path).unwrap().write_all(content).unwrap();
}

fn finder(root: &Path, algorithm: HashAlgorithm) -> DuplicateFinder {
    DuplicateFinder::new(ScanConfig::new(root, algorithm).unwrap())
}

/// Non-interactive `clean` that keeps nothing and never asks.
fn clean_everything(root: &Path, backups: &Path) -> anyhow::Result<ExitCode> {
    let args = CleanArgs {
        scan: ScanOptions {
            path: Some(root.to_path_buf()),
            algorithm: Some("blake3".to_string()),
        },
        keep: Some(String::new()),
        backup_root: Some(backups.to_path_buf()),
        backup_prefix: None,
        dry_run: false,
        yes: true,
    };
    let mut prompter = Prompter::new(Cursor::new(Vec::new()), Vec::new());
    run_clean(
        &args,
        &Config::default(),
        &mut prompter,
        Arc::new(NullReporter),
        || Ok(None),
    )
}

/// Every regular file under `root` with its content.
fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let content = fs::read(e.path()).unwrap();
            (e.into_path(), content)
        })
        .collect()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let (sets, summary) = finder(dir.path(), HashAlgorithm::Blake3)
        .find_duplicates()
        .unwrap();

    assert!(sets.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.duplicate_sets, 0);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), b"content a");
    write(&dir.path().join("b.txt"), b"content b");
    write(&dir.path().join("c.txt"), b"content c");

    let (sets, summary) = finder(dir.path(), HashAlgorithm::Sha256)
        .find_duplicates()
        .unwrap();

    assert!(sets.is_empty());
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.files_hashed, 3);
}

#[test]
fn test_scan_nested_directories() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("subdir");
    let deeper = sub.join("deeper");
    fs::create_dir_all(&deeper).unwrap();

    write(&dir.path().join("a.txt"), b"nested duplicate");
    write(&sub.join("b.txt"), b"nested duplicate");
    write(&deeper.join("c.txt"), b"nested duplicate");

    let (sets, summary) = finder(dir.path(), HashAlgorithm::Md5)
        .find_duplicates()
        .unwrap();

    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].len(), 3);
    assert_eq!(summary.duplicate_files, 2);
    assert_eq!(summary.reclaimable_space, 2 * 16);
}

#[test]
fn test_every_algorithm_agrees_on_grouping() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"alpha");
    write(&dir.path().join("b"), b"alpha");
    write(&dir.path().join("c"), b"gamma");
    write(&dir.path().join("d"), b"gamma");
    write(&dir.path().join("e"), b"delta");

    for algorithm in HashAlgorithm::ALL {
        let (sets, _) = finder(dir.path(), algorithm).find_duplicates().unwrap();
        assert_eq!(sets.len(), 2, "{algorithm}");
        for set in &sets {
            assert_eq!(set.digest.len(), algorithm.hex_len(), "{algorithm}");
        }
    }
}

#[test]
fn test_canonical_is_first_in_walk_order() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("b")).unwrap();
    write(&dir.path().join("b").join("copy"), b"payload");
    write(&dir.path().join("a"), b"payload");
    write(&dir.path().join("c"), b"payload");

    let root = ScanConfig::new(dir.path(), HashAlgorithm::Blake3)
        .unwrap()
        .root;
    let walked: Vec<_> = Walker::new(&root)
        .unwrap()
        .walk()
        .map(|r| r.unwrap().path)
        .collect();

    let (sets, _) = finder(dir.path(), HashAlgorithm::Blake3)
        .find_duplicates()
        .unwrap();

    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].paths(), walked.as_slice());
    assert_eq!(sets[0].canonical(), walked[0].as_path());
}

#[test]
fn test_repeated_scans_are_identical() {
    let dir = tempdir().unwrap();
    for i in 0..5 {
        write(&dir.path().join(format!("x{i}")), b"x");
        write(&dir.path().join(format!("y{i}")), b"yy");
    }

    let first = finder(dir.path(), HashAlgorithm::Sha1).find_duplicates().unwrap().0;
    let second = finder(dir.path(), HashAlgorithm::Sha1).find_duplicates().unwrap().0;
    assert_eq!(first, second);
}

#[test]
fn test_set_members_match_byte_for_byte() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("a/b")).unwrap();
    write(&dir.path().join("one.txt"), b"alpha");
    write(&dir.path().join("a/two.txt"), b"alpha");
    write(&dir.path().join("a/b/three.txt"), b"alpha");
    write(&dir.path().join("same_size.txt"), b"omega");
    write(&dir.path().join("a/beta.bin"), b"beta beta");
    write(&dir.path().join("a/b/beta.bin"), b"beta beta");
    write(&dir.path().join("lonely"), b"only one of these");

    let (sets, _) = finder(dir.path(), HashAlgorithm::Md5)
        .find_duplicates()
        .unwrap();

    assert_eq!(sets.len(), 2);
    for set in &sets {
        let canonical = fs::read(set.canonical()).unwrap();
        assert_eq!(canonical.len() as u64, set.size);
        for member in set.duplicates() {
            assert_eq!(fs::read(member).unwrap(), canonical);
        }
    }
    assert!(sets
        .iter()
        .flat_map(|s| s.paths())
        .all(|p| !p.ends_with("same_size.txt") && !p.ends_with("lonely")));
}

#[test]
fn test_clean_without_duplicates_is_idempotent() {
    let dir = tempdir().unwrap();
    let backups = tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    write(&dir.path().join("a.txt"), b"first");
    write(&dir.path().join("b.txt"), b"other");
    write(&dir.path().join("sub/c.txt"), b"third file");
    write(&dir.path().join("sub/empty"), b"");
    let before = snapshot(dir.path());

    for _ in 0..2 {
        let code = clean_everything(dir.path(), backups.path()).unwrap();

        assert_eq!(code, ExitCode::Success);
        assert_eq!(snapshot(dir.path()), before);
        assert_eq!(fs::read_dir(backups.path()).unwrap().count(), 0);
    }
}

#[test]
fn test_zero_byte_files_form_a_set() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("empty1"), b"");
    write(&dir.path().join("empty2"), b"");
    write(&dir.path().join("full"), b"x");

    let (sets, _) = finder(dir.path(), HashAlgorithm::Sha256)
        .find_duplicates()
        .unwrap();

    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].size, 0);
    assert_eq!(
        sets[0].digest,
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn test_same_size_different_content_not_grouped() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"aaaa");
    write(&dir.path().join("b"), b"bbbb");

    let (sets, summary) = finder(dir.path(), HashAlgorithm::Blake3)
        .find_duplicates()
        .unwrap();
    assert!(sets.is_empty());
    assert_eq!(summary.files_hashed, 2);
}

#[test]
fn test_unique_size_files_are_never_read() {
    // Records for files that do not exist: if the classifier tried to open
    // the unique-size one, it would fail.
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"dup");
    write(&dir.path().join("b"), b"dup");

    let records = vec![
        FileRecord::new(dir.path().join("a"), 3),
        FileRecord::new(dir.path().join("b"), 3),
        FileRecord::new(dir.path().join("missing"), 99),
    ];

    let sets = classify(records, HashAlgorithm::Md5).unwrap();
    assert_eq!(sets.len(), 1);
}

#[test]
fn test_invalid_root_is_rejected_before_scanning() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("file.txt");
    write(&file, b"not a dir");

    assert!(ScanConfig::new(&dir.path().join("missing"), HashAlgorithm::Blake3)
        .unwrap_err()
        .is_invalid_root());
    assert!(ScanConfig::new(&file, HashAlgorithm::Blake3)
        .unwrap_err()
        .is_invalid_root());
}

#[cfg(unix)]
#[test]
fn test_unreadable_candidate_aborts_scan() {
    use dupepurge::duplicates::FinderError;
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"same");
    let locked = dir.path().join("b");
    write(&locked, b"same");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read(&locked).is_ok() {
        // Running as root: permission bits are not enforced.
        return;
    }

    let result = finder(dir.path(), HashAlgorithm::Blake3).find_duplicates();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert!(matches!(result, Err(FinderError::Hash(_))));
}

#[cfg(unix)]
#[test]
fn test_unreadable_candidate_aborts_clean_without_deleting() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let backups = tempdir().unwrap();
    write(&dir.path().join("a"), b"same");
    write(&dir.path().join("c"), b"same");
    let locked = dir.path().join("b");
    write(&locked, b"same");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read(&locked).is_ok() {
        // Running as root: permission bits are not enforced.
        return;
    }

    let result = clean_everything(dir.path(), backups.path());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    let err = result.unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    for name in ["a", "b", "c"] {
        assert_eq!(fs::read(dir.path().join(name)).unwrap(), b"same");
    }
    assert_eq!(fs::read_dir(backups.path()).unwrap().count(), 0);
}

#[cfg(unix)]
#[test]
fn test_unreadable_subdirectory_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let hidden = dir.path().join("hidden");
    fs::create_dir(&hidden).unwrap();
    write(&hidden.join("inner"), b"dup");
    write(&dir.path().join("a"), b"dup");
    write(&dir.path().join("b"), b"dup");
    fs::set_permissions(&hidden, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read_dir(&hidden).is_ok() {
        fs::set_permissions(&hidden, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = finder(dir.path(), HashAlgorithm::Blake3).find_duplicates();
    fs::set_permissions(&hidden, fs::Permissions::from_mode(0o755)).unwrap();

    let (sets, summary) = result.unwrap();
    assert_eq!(summary.skipped_entries.len(), 1);
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].len(), 2);
}

use dupepurge::actions::{
    purge, resolve, FileState, KeepSelection, PurgeConfig, Purger, DEFAULT_BACKUP_PREFIX,
};
use dupepurge::duplicates::DuplicateFinder;
use dupepurge::progress::{Event, EventKind, Reporter};
use dupepurge::scanner::{HashAlgorithm, ScanConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::{tempdir, TempDir};
use walkdir::WalkDir;

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Reporter for Recorder {
    fn report(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }
}

fn tree() -> TempDir {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("photos")).unwrap();
    fs::create_dir(dir.path().join("backup_old")).unwrap();
    fs::write(dir.path().join("photos").join("img.jpg"), b"jpeg bytes").unwrap();
    fs::write(dir.path().join("backup_old").join("img.jpg"), b"jpeg bytes").unwrap();
    fs::write(dir.path().join("img copy.jpg"), b"jpeg bytes").unwrap();
    fs::write(dir.path().join("notes.txt"), b"unrelated").unwrap();
    dir
}

fn deletion_for(root: &Path) -> Vec<PathBuf> {
    let config = ScanConfig::new(root, HashAlgorithm::Sha256).unwrap();
    let (sets, _) = DuplicateFinder::new(config).find_duplicates().unwrap();
    resolve(&sets, &KeepSelection::none())
}

#[test]
fn test_full_pipeline_backs_up_and_removes() {
    let data = tree();
    let backups = tempdir().unwrap();
    let deletion = deletion_for(data.path());
    assert_eq!(deletion.len(), 2);

    let report = purge(&deletion, PurgeConfig::new(backups.path()));

    assert!(report.all_succeeded());
    assert_eq!(report.deleted_count(), 2);
    assert_eq!(report.bytes_freed, 20);
    for path in &deletion {
        assert!(!path.exists());
    }

    // The canonical copy and the unrelated file survive.
    let remaining = file_count(data.path());
    assert_eq!(remaining, 2);

    let backup_dir = report.backup_dir.unwrap();
    for outcome in &report.outcomes {
        let backup = outcome.backup.as_ref().unwrap();
        assert_eq!(backup.parent().unwrap(), backup_dir);
        assert_eq!(fs::read(backup).unwrap(), b"jpeg bytes");
    }
}

fn file_count(root: &Path) -> usize {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .count()
}

#[test]
fn test_every_deleted_file_has_a_backup() {
    let data = tree();
    let backups = tempdir().unwrap();
    let deletion = deletion_for(data.path());

    let report = purge(&deletion, PurgeConfig::new(backups.path()));

    for outcome in &report.outcomes {
        if outcome.state == FileState::Deleted {
            assert!(outcome.backup.as_ref().is_some_and(|b| b.exists()));
        }
    }
}

#[test]
fn test_backup_dirs_are_unique_per_run() {
    let backups = tempdir().unwrap();

    let first = tree();
    let report1 = purge(&deletion_for(first.path()), PurgeConfig::new(backups.path()));
    let second = tree();
    let report2 = purge(&deletion_for(second.path()), PurgeConfig::new(backups.path()));

    let dir1 = report1.backup_dir.unwrap();
    let dir2 = report2.backup_dir.unwrap();
    assert_ne!(dir1, dir2);
    assert_eq!(fs::read_dir(backups.path()).unwrap().count(), 2);
}

#[test]
fn test_failure_is_reported_and_run_continues() {
    let data = tree();
    let backups = tempdir().unwrap();
    let mut deletion = deletion_for(data.path());
    deletion.insert(0, data.path().join("vanished.jpg"));

    let recorder = Arc::new(Recorder::default());
    let report = Purger::new(PurgeConfig::new(backups.path()))
        .with_reporter(recorder.clone())
        .execute(&deletion);

    assert!(!report.all_succeeded());
    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.deleted_count(), 2);

    let events = recorder.events.lock().unwrap();
    let failed: Vec<_> = events
        .iter()
        .filter(|e| e.kind == EventKind::Failed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].path, data.path().join("vanished.jpg"));
    assert!(failed[0].detail.is_some());
}

#[test]
fn test_events_name_every_file() {
    let data = tree();
    let backups = tempdir().unwrap();
    let deletion = deletion_for(data.path());

    let recorder = Arc::new(Recorder::default());
    Purger::new(PurgeConfig::new(backups.path()))
        .with_reporter(recorder.clone())
        .execute(&deletion);

    let events = recorder.events.lock().unwrap();
    assert_eq!(events[0].kind, EventKind::BackupCreated);
    for path in &deletion {
        let kinds: Vec<_> = events
            .iter()
            .filter(|e| &e.path == path)
            .map(|e| e.kind)
            .collect();
        assert_eq!(kinds, vec![EventKind::BackedUp, EventKind::Deleted]);
    }
}

#[test]
fn test_custom_prefix() {
    let data = tree();
    let backups = tempdir().unwrap();
    let report = purge(
        &deletion_for(data.path()),
        PurgeConfig::new(backups.path()).with_prefix("nightly"),
    );

    let name = report
        .backup_dir
        .unwrap()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    assert!(name.starts_with("nightly_"));
}

#[test]
fn test_repeated_runs_with_backups_inside_the_tree() {
    let data = tempdir().unwrap();
    let photos = data.path().join("photos");
    fs::create_dir(&photos).unwrap();
    fs::write(photos.join("img.jpg"), b"jpeg bytes").unwrap();
    fs::write(photos.join("img2.jpg"), b"jpeg bytes").unwrap();

    let run = || {
        let config = ScanConfig::new(data.path(), HashAlgorithm::Sha256)
            .unwrap()
            .excluding_backups(data.path(), DEFAULT_BACKUP_PREFIX);
        let (sets, _) = DuplicateFinder::new(config).find_duplicates().unwrap();
        let deletion = resolve(&sets, &KeepSelection::none());
        purge(&deletion, PurgeConfig::new(data.path()))
    };

    let first = run();
    assert_eq!(first.deleted_count(), 1);
    assert!(!photos.join("img2.jpg").exists());

    let second = run();
    assert!(second.outcomes.is_empty());
    assert!(second.backup_dir.is_none());
    assert_eq!(fs::read(photos.join("img.jpg")).unwrap(), b"jpeg bytes");
    assert_eq!(file_count(data.path()), 2);
}

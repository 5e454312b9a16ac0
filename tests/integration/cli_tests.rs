use clap::Parser;
use dupepurge::cli::{Cli, Commands, OutputFormat};
use dupepurge::error::ExitCode;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_scan_json_exit_success_without_duplicates() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("unique.txt"), b"unique").unwrap();

    let cli = Cli::try_parse_from([
        "dupepurge",
        "-q",
        "scan",
        dir.path().to_str().unwrap(),
        "--algorithm",
        "sha1",
        "--output",
        "json",
    ])
    .unwrap();

    assert_eq!(dupepurge::run_app(cli).unwrap(), ExitCode::Success);
}

#[test]
fn test_scan_invalid_root_is_invalid_input() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing");

    let cli = Cli::try_parse_from([
        "dupepurge",
        "-q",
        "scan",
        missing.to_str().unwrap(),
        "-a",
        "md5",
    ])
    .unwrap();

    let err = dupepurge::run_app(cli).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::InvalidInput);
}

#[test]
fn test_scan_unsupported_algorithm_is_invalid_input() {
    let dir = tempdir().unwrap();
    let cli = Cli::try_parse_from([
        "dupepurge",
        "-q",
        "scan",
        dir.path().to_str().unwrap(),
        "-a",
        "crc32",
    ])
    .unwrap();

    let err = dupepurge::run_app(cli).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::InvalidInput);
    assert!(err.to_string().contains("crc32"));
}

#[test]
fn test_clean_non_interactive() {
    let data = tempdir().unwrap();
    let backups = tempdir().unwrap();
    fs::write(data.path().join("a.bin"), b"payload").unwrap();
    fs::write(data.path().join("b.bin"), b"payload").unwrap();

    let cli = Cli::try_parse_from([
        "dupepurge",
        "-q",
        "clean",
        data.path().to_str().unwrap(),
        "--algorithm",
        "blake3",
        "--keep",
        "",
        "--backup-root",
        backups.path().to_str().unwrap(),
        "--yes",
    ])
    .unwrap();

    assert_eq!(dupepurge::run_app(cli).unwrap(), ExitCode::Success);
    assert!(data.path().join("a.bin").exists());
    assert!(!data.path().join("b.bin").exists());
    assert_eq!(fs::read_dir(backups.path()).unwrap().count(), 1);
}

#[test]
fn test_clean_dry_run_changes_nothing() {
    let data = tempdir().unwrap();
    let backups = tempdir().unwrap();
    fs::write(data.path().join("a.bin"), b"payload").unwrap();
    fs::write(data.path().join("b.bin"), b"payload").unwrap();

    let cli = Cli::try_parse_from([
        "dupepurge",
        "-q",
        "clean",
        data.path().to_str().unwrap(),
        "-a",
        "md5",
        "-k",
        "",
        "--backup-root",
        backups.path().to_str().unwrap(),
        "--dry-run",
    ])
    .unwrap();

    assert_eq!(dupepurge::run_app(cli).unwrap(), ExitCode::Success);
    assert!(data.path().join("b.bin").exists());
    assert_eq!(fs::read_dir(backups.path()).unwrap().count(), 0);
}

#[test]
fn test_parse_clean_defaults() {
    let cli = Cli::try_parse_from(["dupepurge", "clean", "/data"]).unwrap();
    match cli.command {
        Commands::Clean(args) => {
            assert!(args.scan.algorithm.is_none());
            assert!(args.backup_root.is_none());
            assert!(args.backup_prefix.is_none());
        }
        _ => panic!("Expected Clean command"),
    }
}

#[test]
fn test_parse_scan_output_default_text() {
    let cli = Cli::try_parse_from(["dupepurge", "scan", "/data"]).unwrap();
    match cli.command {
        Commands::Scan(args) => assert_eq!(args.output, OutputFormat::Text),
        _ => panic!("Expected Scan command"),
    }
}

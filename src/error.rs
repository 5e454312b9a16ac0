//! Structured error handling and exit codes.

use serde::Serialize;

use crate::duplicates::FinderError;
use crate::scanner::{AlgorithmError, ScanError};

/// Exit codes for the dupepurge application.
///
/// - 0: Success (completed normally, with or without duplicates)
/// - 1: General error (unexpected failure, hashing failure)
/// - 2: Invalid input (bad root directory or hash algorithm)
/// - 3: Partial failure (some files could not be backed up or removed)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the run completed.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// Invalid input: the root or the algorithm was rejected.
    InvalidInput = 2,
    /// Partial failure: at least one file failed to back up or delete.
    PartialFailure = 3,
    /// Interrupted: the purge was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DP000",
            Self::GeneralError => "DP001",
            Self::InvalidInput => "DP002",
            Self::PartialFailure => "DP003",
            Self::Interrupted => "DP130",
        }
    }

    /// Pick the exit code for an error that ended the run.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        if err.downcast_ref::<AlgorithmError>().is_some() {
            return Self::InvalidInput;
        }
        let invalid_root = err
            .downcast_ref::<FinderError>()
            .is_some_and(FinderError::is_invalid_root)
            || err
                .downcast_ref::<ScanError>()
                .is_some_and(ScanError::is_invalid_root);
        if invalid_root {
            Self::InvalidInput
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DP001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

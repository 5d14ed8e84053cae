//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success - every tag ranked
//! - `1`: General error - unspecified failure
//! - `2`: Blocking error - the collection's vectors could not be used
//! - `3-125`: Specific recoverable errors
//! - `126-255`: Reserved by shell

use crate::error::RankError;

/// Standard exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// Critical error that should halt automation (code 2)
    BlockingError = 2,

    /// Collection or document not found (code 3)
    NotFound = 3,

    /// Request could not be parsed or validated (code 4)
    InvalidRequest = 4,

    /// File I/O error (code 5)
    IoError = 5,

    /// Configuration error (code 6)
    ConfigError = 6,

    /// Some tags failed while others ranked (code 7)
    PartialFailure = 7,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl ExitCode {
    /// Exit code for a finished batch: `Success` only when no tag failed.
    pub fn from_batch(failed_tags: usize) -> Self {
        if failed_tags == 0 {
            ExitCode::Success
        } else {
            ExitCode::PartialFailure
        }
    }

    /// Convert a `RankError` to the appropriate exit code.
    pub fn from_error(error: &RankError) -> Self {
        match error {
            RankError::UnknownCollection { .. } => ExitCode::NotFound,
            RankError::DataUnavailable { .. } => ExitCode::BlockingError,
            RankError::InvalidRequest { .. } => ExitCode::InvalidRequest,
            RankError::FileRead { .. } => ExitCode::IoError,
            RankError::ConfigError { .. } => ExitCode::ConfigError,
            RankError::NumericalInstability { .. } => ExitCode::GeneralError,
        }
    }

    /// Blocking errors should halt automation pipelines.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, ExitCode::BlockingError)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }

    /// Get a human-readable description of the exit code.
    pub fn description(&self) -> &'static str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::BlockingError => "Blocking error - automation should halt",
            ExitCode::NotFound => "Not found",
            ExitCode::InvalidRequest => "Invalid request",
            ExitCode::IoError => "I/O error",
            ExitCode::ConfigError => "Configuration error",
            ExitCode::PartialFailure => "Some tags failed",
        }
    }
}

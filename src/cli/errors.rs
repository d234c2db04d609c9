//! CLI-specific error types
//!
//! Every failure maps to a process exit code:
//! - 1: general failure
//! - 2: a bucket path did not resolve to a key window
//! - 3: persisted and generated size indexes differ

use std::fmt;
use std::io;

use serde_json::Value;

use crate::bucket::{BucketError, BucketErrorCode};
use crate::config::ConfigError;
use crate::repair::RepairError;
use crate::size_index::{SizeCheckReport, SizeIndexError};

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdout, JSON encoding)
    IoError,
    /// Bucket path does not name a bucket
    RangeResolution,
    /// Bucket could not be read
    BucketError,
    /// Repair failed
    RepairFailed,
    /// Size index could not be read or written
    SizeIndexError,
    /// Persisted size index differs from the bucket files
    SizeMismatch,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "DLS_CLI_CONFIG_ERROR",
            Self::IoError => "DLS_CLI_IO_ERROR",
            Self::RangeResolution => "DLS_CLI_RANGE_RESOLUTION",
            Self::BucketError => "DLS_CLI_BUCKET_ERROR",
            Self::RepairFailed => "DLS_CLI_REPAIR_FAILED",
            Self::SizeIndexError => "DLS_CLI_SIZE_INDEX_ERROR",
            Self::SizeMismatch => "DLS_CLI_SIZE_MISMATCH",
        }
    }

    /// Process exit code
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::RangeResolution => 2,
            Self::SizeMismatch => 3,
            _ => 1,
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
    data: Option<Value>,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Size mismatch, carrying the full comparison
    pub fn size_mismatch(report: &SizeCheckReport) -> Self {
        let mut err = Self::new(
            CliErrorCode::SizeMismatch,
            format!(
                "Size index mismatch: generated {}, persisted {}, difference {}",
                report.generated, report.persisted, report.difference
            ),
        );
        err.data = serde_json::to_value(report).ok();
        err
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Structured detail for the JSON error response
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Process exit code
    pub fn exit_code(&self) -> i32 {
        self.code.exit_code()
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<BucketError> for CliError {
    fn from(e: BucketError) -> Self {
        let code = if e.code() == BucketErrorCode::DlsPathFormat {
            CliErrorCode::RangeResolution
        } else {
            CliErrorCode::BucketError
        };
        Self::new(code, e.to_string())
    }
}

impl From<RepairError> for CliError {
    fn from(e: RepairError) -> Self {
        match e {
            RepairError::Bucket(inner) => inner.into(),
            other => Self::new(CliErrorCode::RepairFailed, other.to_string()),
        }
    }
}

impl From<SizeIndexError> for CliError {
    fn from(e: SizeIndexError) -> Self {
        match e {
            SizeIndexError::Bucket(inner) => inner.into(),
            other => Self::new(CliErrorCode::SizeIndexError, other.to_string()),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::size_index::SizeIndex;
    use std::path::Path;

    #[test]
    fn test_path_format_exits_2() {
        let err: CliError = BucketError::path_format(Path::new("x/y"), "bad").into();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.code_str(), "DLS_CLI_RANGE_RESOLUTION");
    }

    #[test]
    fn test_wrapped_path_format_exits_2() {
        let err: CliError =
            RepairError::Bucket(BucketError::path_format(Path::new("x"), "bad")).into();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_size_mismatch_exits_3() {
        let report = SizeCheckReport::compare(SizeIndex::new(5, 120), SizeIndex::new(4, 100));
        let err = CliError::size_mismatch(&report);
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.data().unwrap()["difference"]["size"], 20);
    }

    #[test]
    fn test_missing_bucket_exits_1() {
        let err: CliError = BucketError::io_error_at_path(
            Path::new("0000000001/000"),
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        )
        .into();
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.code_str(), "DLS_CLI_BUCKET_ERROR");
    }

    #[test]
    fn test_other_errors_exit_1() {
        let err: CliError = io::Error::new(io::ErrorKind::Other, "boom").into();
        assert_eq!(err.exit_code(), 1);
        assert_eq!(CliError::config_error("x").exit_code(), 1);
    }
}

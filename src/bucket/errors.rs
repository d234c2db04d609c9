//! Bucket error types
//!
//! Error codes:
//! - DLS_PATH_FORMAT: bucket path does not follow the `<10 hex>/<3 hex>` layout
//! - DLS_HEADER_UNRECOGNIZED: magic present but the version is not supported
//! - DLS_RECORD_DECODE: short or failed read while decoding a record
//! - DLS_BUCKET_IO: any other filesystem failure
//!
//! Range violations and checksum mismatches are not errors here. They are
//! per-record findings counted by the checker (see `RecordIssue`).

use std::fmt;
use std::io;
use std::path::Path;

/// Stage of the record decode sequence at which a read failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStage {
    /// Bucket header (magic + version)
    Header,
    /// 8-byte record key
    Key,
    /// 8-byte value length
    Length,
    /// 1-byte parity checksum (version 1 only)
    Checksum,
    /// `length` value bytes
    Value,
}

impl DecodeStage {
    /// Returns the stage name used in error details
    pub fn as_str(&self) -> &'static str {
        match self {
            DecodeStage::Header => "header",
            DecodeStage::Key => "key",
            DecodeStage::Length => "length",
            DecodeStage::Checksum => "checksum",
            DecodeStage::Value => "value",
        }
    }
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bucket-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketErrorCode {
    /// Malformed hex path components
    DlsPathFormat,
    /// Magic present, unsupported version
    DlsHeaderUnrecognized,
    /// Short or failed read while decoding a record
    DlsRecordDecode,
    /// Filesystem failure outside record decoding
    DlsBucketIo,
}

impl BucketErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            BucketErrorCode::DlsPathFormat => "DLS_PATH_FORMAT",
            BucketErrorCode::DlsHeaderUnrecognized => "DLS_HEADER_UNRECOGNIZED",
            BucketErrorCode::DlsRecordDecode => "DLS_RECORD_DECODE",
            BucketErrorCode::DlsBucketIo => "DLS_BUCKET_IO",
        }
    }

}

impl fmt::Display for BucketErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Bucket error with context
#[derive(Debug)]
pub struct BucketError {
    code: BucketErrorCode,
    message: String,
    details: Option<String>,
    offset: Option<u64>,
    source: Option<io::Error>,
}

impl BucketError {
    fn new(code: BucketErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            offset: None,
            source: None,
        }
    }

    /// Path components do not name a bucket
    pub fn path_format(path: &Path, reason: impl Into<String>) -> Self {
        let mut err = Self::new(BucketErrorCode::DlsPathFormat, reason);
        err.details = Some(format!("path: {}", path.display()));
        err
    }

    /// Magic matched but the version is not one we can read
    pub fn unrecognized_version(version: u64) -> Self {
        let mut err = Self::new(
            BucketErrorCode::DlsHeaderUnrecognized,
            format!("Unrecognized bucket version {}", version),
        );
        err.offset = Some(0);
        err
    }

    /// Short or failed read at the given stage
    pub fn record_decode(stage: DecodeStage, offset: u64, reason: impl Into<String>) -> Self {
        let mut err = Self::new(BucketErrorCode::DlsRecordDecode, reason);
        err.details = Some(format!("stage: {}, byte_offset: {}", stage, offset));
        err.offset = Some(offset);
        err
    }

    /// Failed read at the given stage with the underlying I/O error attached
    pub fn record_decode_io(stage: DecodeStage, offset: u64, source: io::Error) -> Self {
        let mut err = Self::record_decode(stage, offset, format!("Read failed: {}", source));
        err.source = Some(source);
        err
    }

    /// Filesystem failure
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        let mut err = Self::new(BucketErrorCode::DlsBucketIo, message);
        err.source = Some(source);
        err
    }

    /// Filesystem failure tied to a path
    pub fn io_error_at_path(path: &Path, source: io::Error) -> Self {
        Self::io_error(format!("I/O error at {}", path.display()), source)
    }

    /// Returns the error code
    pub fn code(&self) -> BucketErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the byte offset the error refers to, if any
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }
}

impl fmt::Display for BucketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for BucketError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for bucket operations
pub type BucketResult<T> = Result<T, BucketError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_error_codes() {
        assert_eq!(BucketErrorCode::DlsPathFormat.code(), "DLS_PATH_FORMAT");
        assert_eq!(
            BucketErrorCode::DlsHeaderUnrecognized.code(),
            "DLS_HEADER_UNRECOGNIZED"
        );
        assert_eq!(BucketErrorCode::DlsRecordDecode.code(), "DLS_RECORD_DECODE");
        assert_eq!(BucketErrorCode::DlsBucketIo.code(), "DLS_BUCKET_IO");
    }

    #[test]
    fn test_path_format_names_path() {
        let err = BucketError::path_format(&PathBuf::from("x/y"), "bad");
        assert_eq!(err.code(), BucketErrorCode::DlsPathFormat);
        assert_eq!(err.to_string(), "DLS_PATH_FORMAT: bad (path: x/y)");
        assert_eq!(err.offset(), None);
    }

    #[test]
    fn test_decode_display_contains_stage_and_offset() {
        let err = BucketError::record_decode(DecodeStage::Length, 1024, "short read");
        let display = format!("{}", err);
        assert!(display.contains("DLS_RECORD_DECODE"));
        assert!(display.contains("stage: length"));
        assert!(display.contains("byte_offset: 1024"));
        assert_eq!(err.offset(), Some(1024));
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error;
        let err = BucketError::io_error(
            "open failed",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.source().is_some());
        assert_eq!(err.code(), BucketErrorCode::DlsBucketIo);
    }
}

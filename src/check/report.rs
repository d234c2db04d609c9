//! Per-file and aggregate check results

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::bucket::BucketError;

/// Result of scanning one bucket file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCheck {
    /// Bucket file path
    pub path: PathBuf,
    /// Format version, `None` if the header could not be decoded
    pub version: Option<u64>,
    /// Records whose bytes were fully decoded, findings included
    pub records_read: u64,
    /// Range violations + checksum mismatches + at most one halting error
    pub error_count: u64,
    /// Records with a key outside the bucket's window
    pub range_violations: u64,
    /// Records whose parity checksum did not verify
    pub checksum_mismatches: u64,
    /// Error that stopped the scan, if any
    pub decode_error: Option<String>,
    /// Offset just past the last record decoded with no finding
    pub last_good_offset: u64,
}

impl FileCheck {
    /// An empty result for `path`
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            version: None,
            records_read: 0,
            error_count: 0,
            range_violations: 0,
            checksum_mismatches: 0,
            decode_error: None,
            last_good_offset: 0,
        }
    }

    /// A file whose scan could not start or stopped early
    pub fn halted(path: &Path, err: &BucketError) -> Self {
        let mut check = Self::new(path);
        check.record_halt(err);
        check
    }

    pub(crate) fn record_halt(&mut self, err: &BucketError) {
        self.error_count += 1;
        self.decode_error = Some(err.to_string());
    }

    /// Whether the scan found nothing wrong
    pub fn is_clean(&self) -> bool {
        self.error_count == 0
    }
}

/// Aggregate over a channel check.
///
/// Every field is a sum or a set, so the order files were visited in does not
/// change the report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    /// Bucket files scanned
    pub files_processed: u64,
    /// Files with at least one error
    pub files_with_errors: u64,
    /// Records decoded across all files
    pub total_records: u64,
    /// Errors across all files
    pub total_errors: u64,
    /// `.gz` files skipped
    pub archived_skipped: u64,
    /// Buckets excluded by the filter
    pub filtered_out: u64,
    /// Paths of files with at least one error
    pub corrupt_files: Vec<PathBuf>,
    /// `.broken` / `.repair` files found
    pub repair_leftovers: Vec<PathBuf>,
    /// Directories that could not be listed
    pub unreadable_dirs: Vec<PathBuf>,
    /// Channel subdirectories that are not time buckets
    pub skipped_dirs: Vec<PathBuf>,
}

impl CheckReport {
    /// Folds one file's result into the aggregate
    pub fn add(&mut self, check: &FileCheck) {
        self.files_processed += 1;
        self.total_records += check.records_read;
        self.total_errors += check.error_count;
        if !check.is_clean() {
            self.files_with_errors += 1;
            self.corrupt_files.push(check.path.clone());
        }
    }

    /// Percentage of processed files with errors
    pub fn error_percentage(&self) -> f64 {
        if self.files_processed == 0 {
            return 0.0;
        }
        self.files_with_errors as f64 * 100.0 / self.files_processed as f64
    }

    /// Whether no file had errors
    pub fn is_clean(&self) -> bool {
        self.total_errors == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::DecodeStage;

    fn check(path: &str, records: u64, errors: u64) -> FileCheck {
        let mut c = FileCheck::new(Path::new(path));
        c.records_read = records;
        c.error_count = errors;
        c
    }

    #[test]
    fn test_report_aggregates() {
        let mut report = CheckReport::default();
        report.add(&check("a", 10, 0));
        report.add(&check("b", 5, 2));
        report.add(&check("c", 0, 1));
        report.add(&check("d", 3, 0));

        assert_eq!(report.files_processed, 4);
        assert_eq!(report.files_with_errors, 2);
        assert_eq!(report.total_records, 18);
        assert_eq!(report.total_errors, 3);
        assert_eq!(report.error_percentage(), 50.0);
        assert_eq!(report.corrupt_files, vec![PathBuf::from("b"), PathBuf::from("c")]);
    }

    #[test]
    fn test_empty_report_percentage() {
        assert_eq!(CheckReport::default().error_percentage(), 0.0);
        assert!(CheckReport::default().is_clean());
    }

    #[test]
    fn test_halted_counts_one_error() {
        let err = BucketError::record_decode(DecodeStage::Key, 0, "short");
        let c = FileCheck::halted(Path::new("x"), &err);
        assert_eq!(c.error_count, 1);
        assert!(c.decode_error.unwrap().contains("DLS_RECORD_DECODE"));
    }
}

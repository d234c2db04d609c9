//! Streaming consistency checker
//!
//! Per-file scan states:
//!
//! ```text
//! ReadingKey -> ReadingLength -> [ReadingChecksum] -> ReadingValue -> ReadingKey
//!     |               |                 |                  |
//!     +--> EndOfFile  +----------> Aborted <---------------+
//! ```
//!
//! A decode error aborts the rest of the file and counts as one error. A key
//! outside the bucket's window, or a checksum that does not verify, is counted
//! but the value is still consumed and the scan continues.

use std::fs;
use std::io;
use std::path::Path;

use crate::bucket::{BucketError, BucketReader, BucketResult, KeyRange, RangeResolver, RecordHead};
use crate::config::ToolConfig;
use crate::observability::{Event, Logger};

use super::filter::BucketFilter;
use super::report::{CheckReport, FileCheck};
use super::traversal::ChannelWalker;

/// A per-record finding that does not stop the scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordIssue {
    /// Key outside the bucket's window
    RangeViolation,
    /// Parity fold of key, length and checksum is non-zero
    ChecksumMismatch,
}

/// Findings for one record head, in the order they are counted
pub fn inspect_head(head: &RecordHead, range: &KeyRange) -> Vec<RecordIssue> {
    let mut issues = Vec::new();
    if !range.contains(head.key) {
        issues.push(RecordIssue::RangeViolation);
    }
    if !head.checksum_ok() {
        issues.push(RecordIssue::ChecksumMismatch);
    }
    issues
}

/// Validates bucket files and channel trees.
#[derive(Debug, Clone)]
pub struct ConsistencyChecker {
    logger: Logger,
    filter: Option<BucketFilter>,
    progress_interval: u64,
}

impl ConsistencyChecker {
    /// Create a checker from the tool configuration
    pub fn new(config: &ToolConfig) -> Self {
        Self {
            logger: config.logger(),
            filter: config.bucket_filter,
            progress_interval: config.progress_interval.max(1),
        }
    }

    /// Create an unfiltered checker with the given logger
    pub fn with_logger(logger: Logger) -> Self {
        Self {
            logger,
            filter: None,
            progress_interval: 1000,
        }
    }

    /// Returns the logger this checker writes to
    pub fn logger(&self) -> Logger {
        self.logger
    }

    /// Checks a single bucket file, resolving its key window from its path.
    ///
    /// # Errors
    ///
    /// - `DLS_PATH_FORMAT` if the path does not name a bucket
    /// - `DLS_BUCKET_IO` if the file does not exist or is not a regular file
    ///
    /// Corruption inside the file is reported in the returned `FileCheck`,
    /// never as an error.
    pub fn check_single(&self, path: &Path) -> BucketResult<FileCheck> {
        let range = RangeResolver::resolve(path)?;
        let metadata = fs::metadata(path).map_err(|e| BucketError::io_error_at_path(path, e))?;
        if !metadata.is_file() {
            return Err(BucketError::io_error_at_path(
                path,
                io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }
        self.logger.info(
            Event::CheckBegin,
            &[
                ("path", &path.display().to_string()),
                ("key_min", &format!("{:#x}", range.min)),
                ("key_max", &format!("{:#x}", range.max)),
            ],
        );
        let check = self.check_file(path, range);
        self.log_file(&check);
        Ok(check)
    }

    /// Scans one bucket file against `range`.
    pub fn check_file(&self, path: &Path, range: KeyRange) -> FileCheck {
        let mut reader = match BucketReader::open(path) {
            Ok(reader) => reader,
            Err(e) => {
                self.log_halt(path, &e.to_string());
                return FileCheck::halted(path, &e);
            }
        };

        let mut check = FileCheck::new(path);
        check.version = Some(reader.version());
        check.last_good_offset = reader.current_offset();

        loop {
            let head = match reader.next_head() {
                Ok(Some(head)) => head,
                Ok(None) => break,
                Err(e) => {
                    self.log_halt(path, &e.to_string());
                    check.record_halt(&e);
                    break;
                }
            };

            let issues = inspect_head(&head, &range);
            for issue in &issues {
                check.error_count += 1;
                match issue {
                    RecordIssue::RangeViolation => {
                        check.range_violations += 1;
                        self.logger.trace(
                            Event::RecordRangeViolation,
                            &[
                                ("path", &path.display().to_string()),
                                ("offset", &head.offset.to_string()),
                                ("key", &format!("{:#x}", head.key)),
                            ],
                        );
                    }
                    RecordIssue::ChecksumMismatch => {
                        check.checksum_mismatches += 1;
                        self.logger.trace(
                            Event::RecordChecksumMismatch,
                            &[
                                ("path", &path.display().to_string()),
                                ("offset", &head.offset.to_string()),
                            ],
                        );
                    }
                }
            }

            if let Err(e) = reader.skip_value() {
                self.log_halt(path, &e.to_string());
                check.record_halt(&e);
                break;
            }

            check.records_read += 1;
            if issues.is_empty() {
                check.last_good_offset = reader.current_offset();
            }
        }

        check
    }

    /// Checks every non-archived bucket under a channel directory.
    ///
    /// Per-file problems, including files whose names do not resolve to a key
    /// window, are counted and never abort the walk.
    ///
    /// # Errors
    ///
    /// Only if `channel_dir` itself cannot be listed.
    pub fn check_channel(&self, channel_dir: &Path) -> BucketResult<CheckReport> {
        self.logger.info(
            Event::CheckBegin,
            &[("path", &channel_dir.display().to_string())],
        );

        let mut report = CheckReport::default();
        let walker = ChannelWalker::new(self.filter.as_ref(), self.logger);

        let stats = walker.walk(channel_dir, |file| {
            let check = match RangeResolver::resolve(&file.path) {
                Ok(range) => self.check_file(&file.path, range),
                Err(e) => {
                    self.log_halt(&file.path, &e.to_string());
                    FileCheck::halted(&file.path, &e)
                }
            };
            self.log_file(&check);
            report.add(&check);

            if report.files_processed % self.progress_interval == 0 {
                self.log_aggregate(Event::CheckProgress, &report);
            }
        })?;

        report.archived_skipped = stats.archived;
        report.filtered_out = stats.filtered_out;
        report.repair_leftovers = stats.repair_leftovers;
        report.unreadable_dirs = stats.unreadable_dirs;
        report.skipped_dirs = stats.skipped_dirs;

        self.log_aggregate(Event::CheckComplete, &report);
        Ok(report)
    }

    fn log_halt(&self, path: &Path, reason: &str) {
        self.logger.warn(
            Event::RecordDecodeFailed,
            &[("path", &path.display().to_string()), ("reason", reason)],
        );
    }

    fn log_file(&self, check: &FileCheck) {
        let path = check.path.display().to_string();
        let records = check.records_read.to_string();
        let errors = check.error_count.to_string();
        let fields = [
            ("path", path.as_str()),
            ("records", records.as_str()),
            ("errors", errors.as_str()),
        ];
        if check.is_clean() {
            self.logger.trace(Event::CheckFile, &fields);
        } else {
            self.logger.warn(Event::CheckFile, &fields);
        }
    }

    fn log_aggregate(&self, event: Event, report: &CheckReport) {
        self.logger.info(
            event,
            &[
                ("files", &report.files_processed.to_string()),
                ("files_with_errors", &report.files_with_errors.to_string()),
                ("files_with_errors_pct", &format!("{:.2}", report.error_percentage())),
                ("records", &report.total_records.to_string()),
                ("errors", &report.total_errors.to_string()),
            ],
        );
    }
}

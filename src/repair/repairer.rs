//! Lossy repair of legacy bucket files
//!
//! The repair re-streams a corrupt bucket and keeps every record up to the
//! first one that cannot be decoded. Records with a key outside the bucket's
//! window are dropped individually. Everything from the first unreadable
//! record onward is discarded: the format has no sync markers, so there is no
//! safe place to resume.
//!
//! Only legacy (version 0) buckets are repaired. Checksummed buckets are
//! reported as refused and left untouched.
//!
//! Commit protocol:
//! 1. Write `<bucket>.repair` and fsync it
//! 2. Move `<bucket>` -> `<bucket>.broken`
//! 3. Move `<bucket>.repair` -> `<bucket>`
//! 4. fsync the time-bucket directory
//!
//! If step 3 fails, step 2 is rolled back. A run interrupted between steps 2
//! and 3 is finished by the next run from the leftover files.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::bucket::{
    BucketHeader, BucketReader, BucketWriter, KeyRange, RangeResolver, LEGACY_VERSION,
};
use crate::check::{CheckReport, ConsistencyChecker, FileCheck, BROKEN_SUFFIX, REPAIR_TEMP_SUFFIX};
use crate::config::ToolConfig;
use crate::observability::{Event, Logger};

use super::errors::{RepairError, RepairResult};

/// The three names a bucket can have during a repair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairPaths {
    /// The bucket itself
    pub original: PathBuf,
    /// Backup of the corrupt original after commit
    pub broken: PathBuf,
    /// Replacement being written
    pub temp: PathBuf,
}

impl RepairPaths {
    /// Sibling paths for the bucket at `path`
    pub fn for_bucket(path: &Path) -> RepairResult<Self> {
        let name = path
            .file_name()
            .ok_or_else(|| RepairError::NotFound(path.to_path_buf()))?
            .to_string_lossy()
            .into_owned();
        Ok(Self {
            original: path.to_path_buf(),
            broken: path.with_file_name(format!("{}{}", name, BROKEN_SUFFIX)),
            temp: path.with_file_name(format!("{}{}", name, REPAIR_TEMP_SUFFIX)),
        })
    }
}

/// What a committed repair kept and discarded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    /// Repaired bucket
    pub path: PathBuf,
    /// Where the corrupt original was moved
    pub backup: PathBuf,
    /// Records copied to the replacement
    pub records_kept: u64,
    /// Records dropped for a key outside the window
    pub records_dropped: u64,
    /// Offset of the first unreadable record, if any
    pub truncated_at: Option<u64>,
    /// Bytes from `truncated_at` to the end of the original
    pub bytes_discarded: u64,
}

/// Result of a repair request for one bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RepairOutcome {
    /// The bucket had no errors and was left untouched
    Clean { check: FileCheck },
    /// The bucket's format cannot be repaired; left untouched
    Refused {
        path: PathBuf,
        version: Option<u64>,
        reason: String,
    },
    /// A replacement was committed
    Repaired(RepairReport),
    /// An interrupted commit was finished from leftover files
    Resumed { path: PathBuf, backup: PathBuf },
}

/// A bucket whose repair failed during a channel repair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairFailure {
    /// Bucket path
    pub path: PathBuf,
    /// Error message
    pub error: String,
}

/// Result of repairing a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelRepair {
    /// Check that selected the buckets to repair
    pub check: CheckReport,
    /// One outcome per bucket attempted
    pub outcomes: Vec<RepairOutcome>,
    /// Buckets whose repair failed
    pub failures: Vec<RepairFailure>,
}

/// fsync a directory so renames inside it are durable
pub fn fsync_dir(dir: &Path) -> RepairResult<()> {
    let d = OpenOptions::new()
        .read(true)
        .open(dir)
        .map_err(|e| RepairError::io(format!("open {}", dir.display()), e))?;
    d.sync_all()
        .map_err(|e| RepairError::io(format!("fsync {}", dir.display()), e))
}

fn exists(path: &Path) -> RepairResult<bool> {
    path.try_exists()
        .map_err(|e| RepairError::io(format!("stat {}", path.display()), e))
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn rename(from: &Path, to: &Path) -> RepairResult<()> {
    fs::rename(from, to).map_err(|e| {
        RepairError::io(format!("move {} to {}", from.display(), to.display()), e)
    })
}

/// Repairs corrupt legacy buckets.
#[derive(Debug, Clone)]
pub struct Repairer {
    logger: Logger,
    checker: ConsistencyChecker,
}

impl Repairer {
    /// Create a repairer from the tool configuration
    pub fn new(config: &ToolConfig) -> Self {
        Self {
            logger: config.logger(),
            checker: ConsistencyChecker::new(config),
        }
    }

    /// Create a repairer with the given logger and no bucket filter
    pub fn with_logger(logger: Logger) -> Self {
        Self {
            logger,
            checker: ConsistencyChecker::with_logger(logger),
        }
    }

    /// Repairs the bucket at `path` if the checker finds it corrupt.
    ///
    /// # Errors
    ///
    /// - `DLS_PATH_FORMAT` if the path does not name a bucket
    /// - `BackupExists` if a `.broken` backup from an earlier repair is present
    /// - `NotFound` if neither the bucket nor a backup exists
    /// - `Io` if writing or committing the replacement fails; the original is
    ///   then still present under its own name or its `.broken` name
    pub fn repair(&self, path: &Path) -> RepairResult<RepairOutcome> {
        let range = RangeResolver::resolve(path)?;
        let paths = RepairPaths::for_bucket(path)?;

        if let Some(outcome) = self.recover_interrupted(&paths)? {
            return Ok(outcome);
        }

        let path_str = path.display().to_string();
        self.logger.info(Event::RepairBegin, &[("path", &path_str)]);

        let check = self.checker.check_file(path, range);
        if check.is_clean() {
            self.logger.info(Event::RepairSkipped, &[("path", &path_str)]);
            return Ok(RepairOutcome::Clean { check });
        }

        if check.version != Some(LEGACY_VERSION) {
            let reason = match check.version {
                Some(v) => format!("format version {} cannot be resynchronized", v),
                None => format!(
                    "header unreadable: {}",
                    check.decode_error.as_deref().unwrap_or("unknown")
                ),
            };
            self.logger.warn(
                Event::RepairRefused,
                &[("path", &path_str), ("reason", &reason)],
            );
            return Ok(RepairOutcome::Refused {
                path: path.to_path_buf(),
                version: check.version,
                reason,
            });
        }

        let report = match self.rewrite(&paths, range) {
            Ok(report) => report,
            Err(e) => {
                let _ = fs::remove_file(&paths.temp);
                self.logger.error(
                    Event::RepairFailed,
                    &[("path", &path_str), ("reason", &e.to_string())],
                );
                return Err(e);
            }
        };

        if let Err(e) = self.commit(&paths) {
            self.logger.error(
                Event::RepairFailed,
                &[("path", &path_str), ("reason", &e.to_string())],
            );
            return Err(e);
        }

        self.logger.info(
            Event::RepairComplete,
            &[
                ("path", &path_str),
                ("records_kept", &report.records_kept.to_string()),
                ("records_dropped", &report.records_dropped.to_string()),
                ("bytes_discarded", &report.bytes_discarded.to_string()),
            ],
        );
        Ok(RepairOutcome::Repaired(report))
    }

    /// Checks a channel and repairs every corrupt bucket, finishing any
    /// interrupted repair whose bucket is missing. Per-bucket failures are
    /// collected and do not stop the run.
    pub fn repair_channel(&self, channel_dir: &Path) -> RepairResult<ChannelRepair> {
        let check = self.checker.check_channel(channel_dir)?;

        let mut targets: Vec<PathBuf> = check.corrupt_files.clone();
        for leftover in &check.repair_leftovers {
            let name = leftover
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if let Some(stem) = name.strip_suffix(BROKEN_SUFFIX) {
                let original = leftover.with_file_name(stem);
                if !exists(&original)? && !targets.contains(&original) {
                    targets.push(original);
                }
            }
        }

        let mut outcomes = Vec::new();
        let mut failures = Vec::new();
        for target in targets {
            match self.repair(&target) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => failures.push(RepairFailure {
                    path: target,
                    error: e.to_string(),
                }),
            }
        }

        Ok(ChannelRepair {
            check,
            outcomes,
            failures,
        })
    }

    /// Brings a bucket left mid-commit back to a state a repair can start from.
    ///
    /// | bucket | .broken | .repair | action                               |
    /// |--------|---------|---------|--------------------------------------|
    /// | no     | yes     | yes     | finish the commit (`.repair` -> bucket) |
    /// | no     | yes     | no      | restore `.broken` -> bucket, then repair |
    /// | no     | no      | any     | `NotFound`                           |
    /// | yes    | yes     | any     | `BackupExists`                       |
    /// | yes    | no      | yes     | discard the stale `.repair`          |
    fn recover_interrupted(&self, paths: &RepairPaths) -> RepairResult<Option<RepairOutcome>> {
        let original = exists(&paths.original)?;
        let broken = exists(&paths.broken)?;
        let temp = exists(&paths.temp)?;
        let path_str = paths.original.display().to_string();

        match (original, broken, temp) {
            (false, true, true) => {
                rename(&paths.temp, &paths.original)?;
                fsync_dir(parent_dir(&paths.original))?;
                self.logger.warn(Event::RepairResumed, &[("path", &path_str)]);
                Ok(Some(RepairOutcome::Resumed {
                    path: paths.original.clone(),
                    backup: paths.broken.clone(),
                }))
            }
            (false, true, false) => {
                rename(&paths.broken, &paths.original)?;
                fsync_dir(parent_dir(&paths.original))?;
                self.logger.warn(Event::RepairRolledBack, &[("path", &path_str)]);
                Ok(None)
            }
            (false, false, _) => Err(RepairError::NotFound(paths.original.clone())),
            (true, true, _) => Err(RepairError::BackupExists {
                path: paths.original.clone(),
                backup: paths.broken.clone(),
            }),
            (true, false, true) => {
                fs::remove_file(&paths.temp).map_err(|e| {
                    RepairError::io(format!("remove stale {}", paths.temp.display()), e)
                })?;
                self.logger.trace(
                    Event::FileSkipped,
                    &[("path", &paths.temp.display().to_string()), ("reason", "stale repair temp removed")],
                );
                Ok(None)
            }
            (true, false, false) => Ok(None),
        }
    }

    /// Writes the salvageable prefix of the bucket to the temp file.
    fn rewrite(&self, paths: &RepairPaths, range: KeyRange) -> RepairResult<RepairReport> {
        let mut reader = BucketReader::open(&paths.original)?;
        let mut writer = BucketWriter::create(&paths.temp, BucketHeader::legacy())?;

        let mut report = RepairReport {
            path: paths.original.clone(),
            backup: paths.broken.clone(),
            records_kept: 0,
            records_dropped: 0,
            truncated_at: None,
            bytes_discarded: 0,
        };

        loop {
            let record_start = reader.current_offset();
            let (head, value) = match reader.read_next() {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(e) => {
                    self.logger.trace(
                        Event::RecordDecodeFailed,
                        &[
                            ("path", &paths.original.display().to_string()),
                            ("reason", &e.to_string()),
                        ],
                    );
                    report.truncated_at = Some(record_start);
                    report.bytes_discarded = reader.file_size().saturating_sub(record_start);
                    break;
                }
            };

            if range.contains(head.key) {
                writer.append(head.key, &value)?;
                report.records_kept += 1;
            } else {
                report.records_dropped += 1;
                self.logger.trace(
                    Event::RecordRangeViolation,
                    &[
                        ("path", &paths.original.display().to_string()),
                        ("offset", &head.offset.to_string()),
                        ("key", &format!("{:#x}", head.key)),
                    ],
                );
            }
        }

        writer.finish()?;
        Ok(report)
    }

    /// Two-rename commit of the temp file over the original.
    fn commit(&self, paths: &RepairPaths) -> RepairResult<()> {
        if let Err(e) = rename(&paths.original, &paths.broken) {
            let _ = fs::remove_file(&paths.temp);
            return Err(e);
        }

        if let Err(e) = fs::rename(&paths.temp, &paths.original) {
            let rolled_back = fs::rename(&paths.broken, &paths.original).is_ok();
            return Err(RepairError::io(
                format!(
                    "move {} to {} ({})",
                    paths.temp.display(),
                    paths.original.display(),
                    if rolled_back {
                        "rolled back"
                    } else {
                        "original left at .broken"
                    }
                ),
                e,
            ));
        }

        fsync_dir(parent_dir(&paths.original))
    }
}

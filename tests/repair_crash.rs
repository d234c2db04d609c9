//! Repair Crash Safety Tests
//!
//! Tests for:
//! - Lossy repair keeps exactly the decodable in-window prefix
//! - The corrupt original survives byte-for-byte as `.broken`
//! - Every interrupted commit state is recoverable by re-running repair
//! - Checksummed buckets are never modified

use dlsck::bucket::{BucketHeader, BucketReader, BucketWriter, RangeResolver};
use dlsck::check::ConsistencyChecker;
use dlsck::observability::Logger;
use dlsck::repair::{RepairError, RepairOutcome, RepairPaths, Repairer};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn repairer() -> Repairer {
    Repairer::with_logger(Logger::quiet())
}

fn bucket_path(channel: &Path) -> PathBuf {
    let dir = channel.join("0000000010");
    fs::create_dir_all(&dir).unwrap();
    dir.join("07f")
}

/// Writes `count` valid legacy records and returns the encoded bytes.
fn write_legacy_bucket(path: &Path, count: u64) -> Vec<u8> {
    let range = RangeResolver::resolve(path).unwrap();
    let mut writer = BucketWriter::create(path, BucketHeader::legacy()).unwrap();
    for i in 0..count {
        writer
            .append(range.min + i * 7, format!("payload {}", i).as_bytes())
            .unwrap();
    }
    writer.finish().unwrap();
    fs::read(path).unwrap()
}

fn repaired(outcome: RepairOutcome) -> dlsck::repair::RepairReport {
    match outcome {
        RepairOutcome::Repaired(report) => report,
        other => panic!("expected a committed repair, got {:?}", other),
    }
}

// =============================================================================
// Lossy Repair
// =============================================================================

/// N valid records followed by a truncated one: output is the first N
/// records byte-for-byte, and `.broken` is the untouched input.
#[test]
fn test_truncated_record_is_dropped() {
    let temp_dir = TempDir::new().unwrap();
    let path = bucket_path(temp_dir.path());
    let valid = write_legacy_bucket(&path, 6);

    let range = RangeResolver::resolve(&path).unwrap();
    let mut input = valid.clone();
    input.extend_from_slice(&range.max.to_le_bytes());
    input.extend_from_slice(&50u64.to_le_bytes());
    input.extend_from_slice(b"only part of the value");
    fs::write(&path, &input).unwrap();

    let report = repaired(repairer().repair(&path).unwrap());
    assert_eq!(report.records_kept, 6);
    assert_eq!(report.records_dropped, 0);
    assert_eq!(report.truncated_at, Some(valid.len() as u64));
    assert_eq!(report.bytes_discarded, (input.len() - valid.len()) as u64);

    assert_eq!(fs::read(&path).unwrap(), valid);
    assert_eq!(fs::read(&report.backup).unwrap(), input);

    let check = ConsistencyChecker::with_logger(Logger::quiet())
        .check_single(&path)
        .unwrap();
    assert!(check.is_clean());
    assert_eq!(check.records_read, 6);
}

/// Out-of-window records are dropped individually; later records survive.
#[test]
fn test_range_violations_dropped_individually() {
    let temp_dir = TempDir::new().unwrap();
    let path = bucket_path(temp_dir.path());
    let range = RangeResolver::resolve(&path).unwrap();

    let mut writer = BucketWriter::create(&path, BucketHeader::legacy()).unwrap();
    writer.append(range.min, b"keep 1").unwrap();
    writer.append(42, b"drop").unwrap();
    writer.append(range.max, b"keep 2").unwrap();
    writer.append(range.max + 1, b"drop").unwrap();
    writer.finish().unwrap();

    let report = repaired(repairer().repair(&path).unwrap());
    assert_eq!(report.records_kept, 2);
    assert_eq!(report.records_dropped, 2);

    let records = BucketReader::open(&path).unwrap().read_all().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].value, b"keep 1");
    assert_eq!(records[1].value, b"keep 2");
}

/// Checksummed buckets are reported and left as they are.
#[test]
fn test_checksummed_bucket_not_modified() {
    let temp_dir = TempDir::new().unwrap();
    let path = bucket_path(temp_dir.path());
    let mut writer = BucketWriter::create(&path, BucketHeader::checksummed()).unwrap();
    writer.append(1, b"wrong window").unwrap();
    writer.finish().unwrap();
    let before = fs::read(&path).unwrap();

    let outcome = repairer().repair(&path).unwrap();
    assert!(matches!(outcome, RepairOutcome::Refused { .. }));
    assert_eq!(fs::read(&path).unwrap(), before);

    let paths = RepairPaths::for_bucket(&path).unwrap();
    assert!(!paths.broken.exists());
    assert!(!paths.temp.exists());
}

// =============================================================================
// Interrupted Commit
// =============================================================================

/// Crash after the temp file was written, before any rename.
#[test]
fn test_crash_before_first_rename() {
    let temp_dir = TempDir::new().unwrap();
    let path = bucket_path(temp_dir.path());
    let mut input = write_legacy_bucket(&path, 3);
    input.push(0xEE);
    fs::write(&path, &input).unwrap();

    let paths = RepairPaths::for_bucket(&path).unwrap();
    fs::write(&paths.temp, b"partial").unwrap();

    let report = repaired(repairer().repair(&path).unwrap());
    assert_eq!(report.records_kept, 3);
    assert!(!paths.temp.exists());
    assert_eq!(fs::read(&paths.broken).unwrap(), input);
}

/// Crash between the two renames: the next run finishes the commit.
#[test]
fn test_crash_between_renames() {
    let temp_dir = TempDir::new().unwrap();
    let path = bucket_path(temp_dir.path());
    let valid = write_legacy_bucket(&path, 2);
    let mut input = valid.clone();
    input.extend_from_slice(&[1, 2, 3]);

    let paths = RepairPaths::for_bucket(&path).unwrap();
    fs::write(&paths.broken, &input).unwrap();
    fs::write(&paths.temp, &valid).unwrap();
    fs::remove_file(&path).unwrap();

    let outcome = repairer().repair(&path).unwrap();
    assert!(matches!(outcome, RepairOutcome::Resumed { .. }));
    assert_eq!(fs::read(&path).unwrap(), valid);
    assert_eq!(fs::read(&paths.broken).unwrap(), input);
    assert!(!paths.temp.exists());
}

/// Only the backup is left: it is restored and repaired again.
#[test]
fn test_orphaned_backup_is_restored_and_repaired() {
    let temp_dir = TempDir::new().unwrap();
    let path = bucket_path(temp_dir.path());
    let valid = write_legacy_bucket(&path, 4);
    let mut input = valid.clone();
    input.extend_from_slice(&[9; 5]);

    let paths = RepairPaths::for_bucket(&path).unwrap();
    fs::write(&paths.broken, &input).unwrap();
    fs::remove_file(&path).unwrap();

    let report = repaired(repairer().repair(&path).unwrap());
    assert_eq!(report.records_kept, 4);
    assert_eq!(fs::read(&path).unwrap(), valid);
    assert_eq!(fs::read(&paths.broken).unwrap(), input);
}

/// A second repair never overwrites the first one's backup.
#[test]
fn test_second_repair_keeps_first_backup() {
    let temp_dir = TempDir::new().unwrap();
    let path = bucket_path(temp_dir.path());
    let mut input = write_legacy_bucket(&path, 1);
    input.push(0x00);
    fs::write(&path, &input).unwrap();

    repaired(repairer().repair(&path).unwrap());

    // Corrupt the repaired file again.
    let mut again = fs::read(&path).unwrap();
    again.push(0xFF);
    fs::write(&path, &again).unwrap();

    let err = repairer().repair(&path).unwrap_err();
    assert!(matches!(err, RepairError::BackupExists { .. }));
    let paths = RepairPaths::for_bucket(&path).unwrap();
    assert_eq!(fs::read(&paths.broken).unwrap(), input);
    assert_eq!(fs::read(&path).unwrap(), again);
}

// =============================================================================
// Channel Repair
// =============================================================================

/// Every corrupt bucket in the channel is repaired; clean ones are untouched.
#[test]
fn test_channel_repair() {
    let temp_dir = TempDir::new().unwrap();
    let chan = temp_dir.path();

    let clean = chan.join("0000000001/000");
    let corrupt = chan.join("0000000001/001");
    fs::create_dir_all(chan.join("0000000001")).unwrap();
    let clean_bytes = write_legacy_bucket(&clean, 2);
    let mut corrupt_bytes = write_legacy_bucket(&corrupt, 2);
    corrupt_bytes.extend_from_slice(&[0xAA; 3]);
    fs::write(&corrupt, &corrupt_bytes).unwrap();

    let result = repairer().repair_channel(chan).unwrap();
    assert_eq!(result.check.files_with_errors, 1);
    assert_eq!(result.outcomes.len(), 1);
    assert!(result.failures.is_empty());

    assert_eq!(fs::read(&clean).unwrap(), clean_bytes);
    assert!(!chan.join("0000000001/000.broken").exists());
    assert_eq!(fs::read(chan.join("0000000001/001.broken")).unwrap(), corrupt_bytes);

    let recheck = ConsistencyChecker::with_logger(Logger::quiet())
        .check_channel(chan)
        .unwrap();
    assert!(recheck.is_clean());
}

//! Observable events
//!
//! Every log line names one of these. Events are explicit and typed.

use std::fmt;

/// Observable events of the bucket tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file loaded
    ConfigLoaded,

    // Consistency check
    /// Check of a file or channel started
    CheckBegin,
    /// One bucket file checked
    CheckFile,
    /// Periodic aggregate during a channel check
    CheckProgress,
    /// Check finished
    CheckComplete,
    /// Entry not checked (archived, repair leftover, unexpected file)
    FileSkipped,

    // Per-record findings
    /// Key outside the bucket's key window
    RecordRangeViolation,
    /// Parity checksum did not fold to zero
    RecordChecksumMismatch,
    /// Short or failed read; scan of the file stopped
    RecordDecodeFailed,

    // Repair
    /// Repair of a file started
    RepairBegin,
    /// File had no errors; left untouched
    RepairSkipped,
    /// File format cannot be repaired; left untouched
    RepairRefused,
    /// Repaired file committed
    RepairComplete,
    /// Interrupted commit finished from leftover files
    RepairResumed,
    /// Interrupted commit undone, original restored
    RepairRolledBack,
    /// Repair failed
    RepairFailed,

    // Size index
    /// Size generation started
    SizeGenerateBegin,
    /// Size generation finished
    SizeGenerateComplete,
    /// Persisted size index does not match the channel
    SizeMismatch,
    /// Size index written
    SizeIndexWritten,

    // Run
    /// Command ended with an error
    CommandFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::CheckBegin => "CHECK_BEGIN",
            Event::CheckFile => "CHECK_FILE",
            Event::CheckProgress => "CHECK_PROGRESS",
            Event::CheckComplete => "CHECK_COMPLETE",
            Event::FileSkipped => "FILE_SKIPPED",

            Event::RecordRangeViolation => "RECORD_RANGE_VIOLATION",
            Event::RecordChecksumMismatch => "RECORD_CHECKSUM_MISMATCH",
            Event::RecordDecodeFailed => "RECORD_DECODE_FAILED",

            Event::RepairBegin => "REPAIR_BEGIN",
            Event::RepairSkipped => "REPAIR_SKIPPED",
            Event::RepairRefused => "REPAIR_REFUSED",
            Event::RepairComplete => "REPAIR_COMPLETE",
            Event::RepairResumed => "REPAIR_RESUMED",
            Event::RepairRolledBack => "REPAIR_ROLLED_BACK",
            Event::RepairFailed => "REPAIR_FAILED",

            Event::SizeGenerateBegin => "SIZE_GENERATE_BEGIN",
            Event::SizeGenerateComplete => "SIZE_GENERATE_COMPLETE",
            Event::SizeMismatch => "SIZE_MISMATCH",
            Event::SizeIndexWritten => "SIZE_INDEX_WRITTEN",

            Event::CommandFailed => "COMMAND_FAILED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

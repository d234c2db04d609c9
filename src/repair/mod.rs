//! Bucket repair
//!
//! Replaces a corrupt legacy bucket with its salvageable prefix using a
//! write-temp-then-two-renames commit. The tool assumes exclusive, offline
//! access to the channel tree; no locking is done.

mod errors;
mod repairer;

pub use errors::{RepairError, RepairResult};
pub use repairer::{
    fsync_dir, ChannelRepair, RepairFailure, RepairOutcome, RepairPaths, RepairReport, Repairer,
};

//! Bucket consistency checking
//!
//! Validates bucket files one at a time, or every bucket under a channel
//! tree, and aggregates error and record counts. No single corrupt file
//! aborts a channel check.

mod checker;
mod filter;
mod report;
mod traversal;

pub use checker::{inspect_head, ConsistencyChecker, RecordIssue};
pub use filter::{BucketFilter, CompareOp};
pub use report::{CheckReport, FileCheck};
pub use traversal::{
    BucketFile, ChannelWalker, WalkStats, ARCHIVE_SUFFIX, BROKEN_SUFFIX, REPAIR_TEMP_SUFFIX,
};

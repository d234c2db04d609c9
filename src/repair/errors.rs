//! Repair error types
//!
//! A repair either commits a replacement file or leaves the original where it
//! was. Every error below is raised with the original still present under its
//! own name or under its `.broken` name.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::bucket::BucketError;

/// Result type for repair operations
pub type RepairResult<T> = Result<T, RepairError>;

/// Repair errors
#[derive(Debug, Error)]
pub enum RepairError {
    #[error("{0}")]
    Bucket(#[from] BucketError),

    #[error("Bucket not found: {0} (and no .broken backup to restore)")]
    NotFound(PathBuf),

    #[error("Refusing to repair {path}: backup {backup} already exists")]
    BackupExists { path: PathBuf, backup: PathBuf },

    #[error("I/O error during repair ({context}): {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl RepairError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

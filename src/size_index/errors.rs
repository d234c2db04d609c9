//! Size index error types

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::bucket::BucketError;

/// Result type for size index operations
pub type SizeIndexResult<T> = Result<T, SizeIndexError>;

/// Size index errors
#[derive(Debug, Error)]
pub enum SizeIndexError {
    #[error("Failed to read size index {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Size index {path} is {actual} bytes, expected {expected}")]
    InvalidLength {
        path: PathBuf,
        actual: u64,
        expected: u64,
    },

    #[error("Failed to write size index {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Bucket(#[from] BucketError),
}

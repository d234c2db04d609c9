//! Channel size aggregate

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Record count and total value bytes of a channel.
///
/// A plain value: combining two indexes yields a new one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SizeIndex {
    /// Number of records
    pub records: u64,
    /// Sum of record value lengths in bytes
    pub size: u64,
}

impl SizeIndex {
    /// An index of `records` records totalling `size` bytes
    pub const fn new(records: u64, size: u64) -> Self {
        Self { records, size }
    }

    /// The index of a single record with a value of `length` bytes
    pub const fn of_record(length: u64) -> Self {
        Self {
            records: 1,
            size: length,
        }
    }

    /// Whether the index counts nothing
    pub fn is_empty(&self) -> bool {
        self.records == 0 && self.size == 0
    }
}

impl Add for SizeIndex {
    type Output = SizeIndex;

    fn add(self, rhs: SizeIndex) -> SizeIndex {
        SizeIndex {
            records: self.records.saturating_add(rhs.records),
            size: self.size.saturating_add(rhs.size),
        }
    }
}

impl Sub for SizeIndex {
    type Output = SizeDelta;

    fn sub(self, rhs: SizeIndex) -> SizeDelta {
        SizeDelta {
            records: i128::from(self.records) - i128::from(rhs.records),
            size: i128::from(self.size) - i128::from(rhs.size),
        }
    }
}

impl Sum for SizeIndex {
    fn sum<I: Iterator<Item = SizeIndex>>(iter: I) -> SizeIndex {
        iter.fold(SizeIndex::default(), Add::add)
    }
}

impl fmt::Display for SizeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} records, {} bytes", self.records, self.size)
    }
}

/// Signed difference between two size indexes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SizeDelta {
    /// Record count difference
    pub records: i128,
    /// Byte difference
    pub size: i128,
}

impl SizeDelta {
    /// Whether both components are zero
    pub fn is_zero(&self) -> bool {
        self.records == 0 && self.size == 0
    }
}

impl fmt::Display for SizeDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+} records, {:+} bytes", self.records, self.size)
    }
}

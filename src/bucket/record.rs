//! Bucket record format
//!
//! ```text
//! +------------------+
//! | Key              | (u64 LE)
//! +------------------+
//! | Length           | (u64 LE)
//! +------------------+
//! | Checksum         | (u8, version 1 only)
//! +------------------+
//! | Value            | (Length bytes)
//! +------------------+
//! ```

use std::io::{self, Read};

use super::checksum::{compute_checksum, verify_checksum};
use super::header::BucketHeader;

/// Everything in a record that precedes the value bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHead {
    /// Record key
    pub key: u64,
    /// Number of value bytes that follow
    pub length: u64,
    /// Parity checksum, present iff the bucket is versioned
    pub checksum: Option<u8>,
    /// Byte offset of the record's first key byte
    pub offset: u64,
}

impl RecordHead {
    /// Encoded size of the head (key, length and optional checksum)
    pub fn encoded_len(&self) -> u64 {
        16 + u64::from(self.checksum.is_some())
    }

    /// Byte offset just past the record's value
    pub fn end_offset(&self) -> u64 {
        self.offset
            .saturating_add(self.encoded_len())
            .saturating_add(self.length)
    }

    /// Whether the checksum, if present, verifies. Legacy records always pass.
    pub fn checksum_ok(&self) -> bool {
        self.checksum
            .map_or(true, |c| verify_checksum(self.key, self.length, c))
    }
}

/// A fully decoded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketRecord {
    /// Record key
    pub key: u64,
    /// Value bytes
    pub value: Vec<u8>,
}

impl BucketRecord {
    /// Create a new record
    pub fn new(key: u64, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

/// Encodes one record for a bucket with the given header.
pub fn encode_record(header: &BucketHeader, key: u64, value: &[u8]) -> Vec<u8> {
    let length = value.len() as u64;
    let mut buf = Vec::with_capacity(17 + value.len());
    buf.extend_from_slice(&key.to_le_bytes());
    buf.extend_from_slice(&length.to_le_bytes());
    if header.has_checksum() {
        buf.push(compute_checksum(key, length));
    }
    buf.extend_from_slice(value);
    buf
}

/// Reads until `buf` is full or the stream ends, returning the bytes read.
///
/// Unlike `read_exact`, a short read is reported as a count rather than an
/// error so callers can tell a clean end of stream from a torn record.
pub(crate) fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

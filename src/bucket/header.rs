//! Optional bucket header
//!
//! ```text
//! +------------------+
//! | Version          | (u64 LE)
//! +------------------+
//! | Magic            | ("DLSBUCKT")
//! +------------------+
//! ```
//!
//! Legacy buckets have no header at all: the first record starts at offset 0.

use std::io::{Read, Seek, SeekFrom};

use super::errors::{BucketError, BucketResult, DecodeStage};
use super::record::read_full;

/// Literal magic that marks a versioned bucket
pub const BUCKET_MAGIC: [u8; 8] = *b"DLSBUCKT";

/// Encoded size of a versioned header
pub const HEADER_LEN: u64 = 16;

/// Version of headerless, unchecksummed buckets
pub const LEGACY_VERSION: u64 = 0;

/// Version of buckets carrying a per-record parity checksum
pub const CHECKSUMMED_VERSION: u64 = 1;

/// Decoded bucket header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketHeader {
    /// Format version: 0 (legacy) or 1 (checksummed)
    pub version: u64,
}

impl BucketHeader {
    /// Header of a legacy bucket (no bytes on disk)
    pub fn legacy() -> Self {
        Self {
            version: LEGACY_VERSION,
        }
    }

    /// Header of a checksummed bucket
    pub fn checksummed() -> Self {
        Self {
            version: CHECKSUMMED_VERSION,
        }
    }

    /// Whether records in this bucket carry a checksum byte
    pub fn has_checksum(&self) -> bool {
        self.version == CHECKSUMMED_VERSION
    }

    /// Number of bytes the header occupies on disk
    pub fn encoded_len(&self) -> u64 {
        if self.version == LEGACY_VERSION {
            0
        } else {
            HEADER_LEN
        }
    }

    /// Serialize the header. Legacy headers serialize to nothing.
    pub fn serialize(&self) -> Vec<u8> {
        if self.version == LEGACY_VERSION {
            return Vec::new();
        }
        let mut buf = Vec::with_capacity(HEADER_LEN as usize);
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&BUCKET_MAGIC);
        buf
    }

    /// Decodes the header from the start of a bucket stream.
    ///
    /// Inspects the first 16 bytes. If the trailing 8 are not the magic the
    /// stream is rewound to offset 0 and treated as legacy. If the magic
    /// matches, the leading 8 must encode version 1.
    pub fn decode<R: Read + Seek>(reader: &mut R) -> BucketResult<Self> {
        let mut buf = [0u8; HEADER_LEN as usize];
        let n = read_full(reader, &mut buf)
            .map_err(|e| BucketError::record_decode_io(DecodeStage::Header, 0, e))?;

        if n == buf.len() && buf[8..] == BUCKET_MAGIC {
            let mut version_buf = [0u8; 8];
            version_buf.copy_from_slice(&buf[..8]);
            let version = u64::from_le_bytes(version_buf);
            if version != CHECKSUMMED_VERSION {
                return Err(BucketError::unrecognized_version(version));
            }
            return Ok(Self::checksummed());
        }

        reader
            .seek(SeekFrom::Start(0))
            .map_err(|e| BucketError::record_decode_io(DecodeStage::Header, 0, e))?;
        Ok(Self::legacy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::BucketErrorCode;
    use std::io::Cursor;

    #[test]
    fn test_checksummed_header_consumed() {
        let mut bytes = BucketHeader::checksummed().serialize();
        bytes.extend_from_slice(&[0xAA; 4]);
        let mut cursor = Cursor::new(bytes);

        let header = BucketHeader::decode(&mut cursor).unwrap();
        assert_eq!(header.version, CHECKSUMMED_VERSION);
        assert_eq!(cursor.position(), HEADER_LEN);
    }

    #[test]
    fn test_missing_magic_rewinds() {
        let mut cursor = Cursor::new(vec![0x11u8; 40]);
        let header = BucketHeader::decode(&mut cursor).unwrap();
        assert_eq!(header, BucketHeader::legacy());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_short_file_is_legacy() {
        let mut cursor = Cursor::new(vec![0x01u8; 5]);
        let header = BucketHeader::decode(&mut cursor).unwrap();
        assert_eq!(header.version, LEGACY_VERSION);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_empty_file_is_legacy() {
        let mut cursor = Cursor::new(Vec::new());
        assert_eq!(
            BucketHeader::decode(&mut cursor).unwrap(),
            BucketHeader::legacy()
        );
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut bytes = 2u64.to_le_bytes().to_vec();
        bytes.extend_from_slice(&BUCKET_MAGIC);
        let mut cursor = Cursor::new(bytes);

        let err = BucketHeader::decode(&mut cursor).unwrap_err();
        assert_eq!(err.code(), BucketErrorCode::DlsHeaderUnrecognized);
    }

    #[test]
    fn test_legacy_serializes_empty() {
        assert!(BucketHeader::legacy().serialize().is_empty());
        assert_eq!(BucketHeader::legacy().encoded_len(), 0);
        assert_eq!(BucketHeader::checksummed().encoded_len(), HEADER_LEN);
    }
}

//! Persisted size index
//!
//! Layout, little-endian, no header:
//!
//! ```text
//! +-----------+-----------+
//! | records   | size      |
//! | (8 bytes) | (8 bytes) |
//! +-----------+-----------+
//! ```
//!
//! The file is always rewritten whole and fsynced.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::errors::{SizeIndexError, SizeIndexResult};
use super::index::SizeIndex;

/// Encoded length of a size index
pub const SIZE_INDEX_LEN: usize = 16;

/// Encodes a size index into its fixed layout
pub fn encode(index: &SizeIndex) -> [u8; SIZE_INDEX_LEN] {
    let mut buf = [0u8; SIZE_INDEX_LEN];
    buf[..8].copy_from_slice(&index.records.to_le_bytes());
    buf[8..].copy_from_slice(&index.size.to_le_bytes());
    buf
}

/// Decodes a size index from its fixed layout
pub fn decode(buf: &[u8; SIZE_INDEX_LEN]) -> SizeIndex {
    let mut records = [0u8; 8];
    let mut size = [0u8; 8];
    records.copy_from_slice(&buf[..8]);
    size.copy_from_slice(&buf[8..]);
    SizeIndex::new(u64::from_le_bytes(records), u64::from_le_bytes(size))
}

/// A size index file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeIndexStore {
    path: PathBuf,
}

impl SizeIndexStore {
    /// Store at an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted index.
    ///
    /// # Errors
    ///
    /// `InvalidLength` unless the file is exactly 16 bytes.
    pub fn read(&self) -> SizeIndexResult<SizeIndex> {
        let bytes = fs::read(&self.path).map_err(|source| SizeIndexError::Read {
            path: self.path.clone(),
            source,
        })?;

        let buf: [u8; SIZE_INDEX_LEN] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| SizeIndexError::InvalidLength {
                    path: self.path.clone(),
                    actual: bytes.len() as u64,
                    expected: SIZE_INDEX_LEN as u64,
                })?;

        Ok(decode(&buf))
    }

    /// Overwrites the file with `index` and fsyncs it and its directory.
    pub fn write(&self, index: &SizeIndex) -> SizeIndexResult<()> {
        let write_err = |source| SizeIndexError::Write {
            path: self.path.clone(),
            source,
        };

        let mut file = File::create(&self.path).map_err(write_err)?;
        file.write_all(&encode(index)).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            let dir = OpenOptions::new()
                .read(true)
                .open(parent)
                .map_err(write_err)?;
            dir.sync_all().map_err(write_err)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_is_records_then_size() {
        let bytes = encode(&SizeIndex::new(1, 0x0203));
        assert_eq!(&bytes[..8], &[1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&bytes[8..], &[3, 2, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let store = SizeIndexStore::new(temp_dir.path().join("sizeinfo"));
        let index = SizeIndex::new(42, 4096);

        store.write(&index).unwrap();
        assert_eq!(fs::metadata(store.path()).unwrap().len(), 16);
        assert_eq!(store.read().unwrap(), index);
    }

    #[test]
    fn test_write_overwrites_longer_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sizeinfo");
        fs::write(&path, vec![0xFF; 64]).unwrap();

        let store = SizeIndexStore::new(&path);
        store.write(&SizeIndex::new(1, 2)).unwrap();
        assert_eq!(fs::read(&path).unwrap().len(), SIZE_INDEX_LEN);
        assert_eq!(store.read().unwrap(), SizeIndex::new(1, 2));
    }

    #[test]
    fn test_wrong_length_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sizeinfo");
        fs::write(&path, [0u8; 15]).unwrap();

        let err = SizeIndexStore::new(&path).read().unwrap_err();
        assert!(matches!(
            err,
            SizeIndexError::InvalidLength { actual: 15, .. }
        ));
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = SizeIndexStore::new(temp_dir.path().join("absent"));
        assert!(matches!(store.read(), Err(SizeIndexError::Read { .. })));
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(records: u64, size: u64) {
            let index = SizeIndex::new(records, size);
            prop_assert_eq!(decode(&encode(&index)), index);
        }
    }
}

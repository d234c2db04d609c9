//! Key window derivation from bucket paths
//!
//! A bucket lives at `<channel>/<10 hex digits>/<3 hex digits>`. The two
//! trailing components concatenated form a 13-digit bucket id; padding it with
//! three zero digits gives the first key of the bucket's 4096-key slot.

use std::path::Path;

use serde::Serialize;

use super::errors::{BucketError, BucketResult};

/// Hex digits in a time-bucket directory name
pub const BUCKET_DIR_DIGITS: usize = 10;

/// Hex digits in a bucket file name
pub const BUCKET_FILE_DIGITS: usize = 3;

/// Distance from the first to the last key of a bucket's slot
pub const KEY_SLOT_SPAN: u64 = 0xFFF;

/// Inclusive key window owned by one bucket file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeyRange {
    /// First key of the slot
    pub min: u64,
    /// Last key of the slot, always `min + 0xFFF`
    pub max: u64,
}

impl KeyRange {
    /// Key window of the bucket with the given 13-digit id.
    pub fn for_bucket_id(bucket_id: u64) -> Self {
        let min = bucket_id << 12;
        Self {
            min,
            max: min + KEY_SLOT_SPAN,
        }
    }

    /// Whether `key` falls inside the window
    pub fn contains(&self, key: u64) -> bool {
        key >= self.min && key <= self.max
    }
}

/// Parses `s` as exactly `digits` hex digits.
pub fn parse_hex_component(s: &str, digits: usize) -> Option<u64> {
    if s.len() != digits || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(s, 16).ok()
}

/// Whether a directory name is a time-bucket directory
pub fn is_bucket_dir_name(name: &str) -> bool {
    parse_hex_component(name, BUCKET_DIR_DIGITS).is_some()
}

/// Bucket id from a time-bucket directory name and a bucket file name.
pub fn bucket_id(dir_name: &str, file_name: &str) -> Option<u64> {
    let dir = parse_hex_component(dir_name, BUCKET_DIR_DIGITS)?;
    let file = parse_hex_component(file_name, BUCKET_FILE_DIGITS)?;
    Some((dir << (4 * BUCKET_FILE_DIGITS)) | file)
}

/// Derives a bucket file's key window from its path.
pub struct RangeResolver;

impl RangeResolver {
    /// Resolves the key window of the bucket at `path`.
    ///
    /// # Errors
    ///
    /// `DLS_PATH_FORMAT` if the path has fewer than two components, the
    /// directory is not exactly 10 hex digits, or the file name is not
    /// exactly 3 hex digits.
    pub fn resolve(path: &Path) -> BucketResult<KeyRange> {
        Self::bucket_id(path).map(KeyRange::for_bucket_id)
    }

    /// Resolves the 13-digit bucket id of the bucket at `path`.
    pub fn bucket_id(path: &Path) -> BucketResult<u64> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| BucketError::path_format(path, "Missing bucket file name"))?;
        let dir_name = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .ok_or_else(|| BucketError::path_format(path, "Missing time-bucket directory"))?;

        if parse_hex_component(dir_name, BUCKET_DIR_DIGITS).is_none() {
            return Err(BucketError::path_format(
                path,
                format!(
                    "Directory '{}' is not {} hex digits",
                    dir_name, BUCKET_DIR_DIGITS
                ),
            ));
        }
        if parse_hex_component(file_name, BUCKET_FILE_DIGITS).is_none() {
            return Err(BucketError::path_format(
                path,
                format!(
                    "File '{}' is not {} hex digits",
                    file_name, BUCKET_FILE_DIGITS
                ),
            ));
        }

        bucket_id(dir_name, file_name)
            .ok_or_else(|| BucketError::path_format(path, "Unparseable bucket id"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::BucketErrorCode;
    use std::path::PathBuf;

    #[test]
    fn test_resolve_pads_three_zero_digits() {
        let path = PathBuf::from("/data/chan/0123456789/abc");
        let range = RangeResolver::resolve(&path).unwrap();
        assert_eq!(range.min, 0x0123_4567_89ab_c000);
        assert_eq!(range.max, 0x0123_4567_89ab_cfff);
    }

    #[test]
    fn test_resolve_relative_two_components() {
        let range = RangeResolver::resolve(Path::new("ffffffffff/fff")).unwrap();
        assert_eq!(range.min, 0xffff_ffff_ffff_f000);
        assert_eq!(range.max, u64::MAX);
    }

    #[test]
    fn test_resolve_accepts_uppercase() {
        let range = RangeResolver::resolve(Path::new("000000000A/00F")).unwrap();
        assert_eq!(range.min, 0xA00F000);
    }

    #[test]
    fn test_resolve_rejects_single_component() {
        let err = RangeResolver::resolve(Path::new("abc")).unwrap_err();
        assert_eq!(err.code(), BucketErrorCode::DlsPathFormat);
    }

    #[test]
    fn test_resolve_rejects_wrong_widths() {
        assert!(RangeResolver::resolve(Path::new("012345678/abc")).is_err());
        assert!(RangeResolver::resolve(Path::new("0123456789/abcd")).is_err());
        assert!(RangeResolver::resolve(Path::new("0123456789/ab")).is_err());
    }

    #[test]
    fn test_resolve_rejects_non_hex() {
        assert!(RangeResolver::resolve(Path::new("012345678g/abc")).is_err());
        assert!(RangeResolver::resolve(Path::new("0123456789/+bc")).is_err());
        assert!(RangeResolver::resolve(Path::new("0123456789/abc.gz")).is_err());
    }

    #[test]
    fn test_range_bounds_inclusive() {
        let range = KeyRange::for_bucket_id(0x1);
        assert!(range.contains(0x1000));
        assert!(range.contains(0x1fff));
        assert!(!range.contains(0x0fff));
        assert!(!range.contains(0x2000));
        assert_eq!(range.max - range.min, KEY_SLOT_SPAN);
    }

    #[test]
    fn test_bucket_id_concatenates() {
        assert_eq!(bucket_id("0000000001", "002"), Some(0x1002));
        assert_eq!(bucket_id("0000000001", "02"), None);
        assert!(is_bucket_dir_name("00000000ff"));
        assert!(!is_bucket_dir_name("archive"));
    }
}

//! Single-byte parity checksum for versioned bucket records
//!
//! The checksum covers the record's key and length only. It is a cheap
//! corruption hint, not an integrity guarantee: any two headers whose bytes
//! XOR to the same value collide.

/// Folds a 64-bit word down to the XOR of its eight bytes.
#[inline]
fn fold(mut p: u64) -> u8 {
    p ^= p >> 32;
    p ^= p >> 16;
    p ^= p >> 8;
    p as u8
}

/// Computes the checksum byte a writer stores after `key` and `length`.
///
/// The returned byte makes `verify_checksum(key, length, checksum)` hold.
pub fn compute_checksum(key: u64, length: u64) -> u8 {
    fold(key ^ length)
}

/// Verifies a record's checksum: the fold of `key ^ length ^ checksum` must be zero.
pub fn verify_checksum(key: u64, length: u64, checksum: u8) -> bool {
    fold(key ^ length ^ u64::from(checksum)) == 0
}

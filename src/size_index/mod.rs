//! Channel size index
//!
//! A channel's record count and total value bytes, persisted as a 16-byte
//! file so capacity queries do not need to rescan the channel. The size check
//! regenerates the index from the bucket files and reports any drift.

mod check;
mod errors;
mod generator;
mod index;
mod store;

pub use check::{SizeCheck, SizeCheckReport};
pub use errors::{SizeIndexError, SizeIndexResult};
pub use generator::SizeGenerator;
pub use index::{SizeDelta, SizeIndex};
pub use store::{decode, encode, SizeIndexStore, SIZE_INDEX_LEN};

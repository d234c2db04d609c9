//! Bucket file format
//!
//! A bucket is an append-only binary file holding the records of one 4096-key
//! slot of a channel's time bucket:
//!
//! ```text
//! [ if versioned: version:u64 | magic:"DLSBUCKT" ]
//! record*:
//!   key:u64 | length:u64 | [ if version == 1: checksum:u8 ] | value:byte[length]
//! ```
//!
//! All integers are little-endian. This module only decodes and encodes; the
//! policy of what counts as corrupt lives in `check`.

mod checksum;
mod errors;
mod header;
mod range;
mod reader;
mod record;
mod writer;

pub use checksum::{compute_checksum, verify_checksum};
pub use errors::{BucketError, BucketErrorCode, BucketResult, DecodeStage};
pub use header::{
    BucketHeader, BUCKET_MAGIC, CHECKSUMMED_VERSION, HEADER_LEN, LEGACY_VERSION,
};
pub use range::{
    bucket_id, is_bucket_dir_name, parse_hex_component, KeyRange, RangeResolver,
    BUCKET_DIR_DIGITS, BUCKET_FILE_DIGITS, KEY_SLOT_SPAN,
};
pub use reader::BucketReader;
pub use record::{encode_record, BucketRecord, RecordHead};
pub use writer::BucketWriter;

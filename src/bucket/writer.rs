//! Bucket writer
//!
//! Writes a fresh bucket file: the header (if versioned) followed by records
//! appended in order. The live engine owns the write path for real buckets;
//! this writer produces repair output and test fixtures. `finish` fsyncs the
//! file so a repaired bucket is durable before it is renamed into place.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::errors::{BucketError, BucketResult};
use super::header::BucketHeader;
use super::record::encode_record;

/// Append-only writer for a new bucket file.
pub struct BucketWriter {
    /// Path to the bucket file
    path: PathBuf,
    /// Buffered file handle
    writer: BufWriter<File>,
    /// Header written at creation
    header: BucketHeader,
    /// Offset at which the next record will be written
    current_offset: u64,
    /// Records appended so far
    records_written: u64,
}

impl BucketWriter {
    /// Creates (or truncates) the bucket file and writes its header.
    pub fn create(path: &Path, header: BucketHeader) -> BucketResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|e| BucketError::io_error_at_path(path, e))?;

        let mut writer = BufWriter::new(file);
        let header_bytes = header.serialize();
        writer
            .write_all(&header_bytes)
            .map_err(|e| BucketError::io_error_at_path(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            header,
            current_offset: header_bytes.len() as u64,
            records_written: 0,
        })
    }

    /// Returns the offset at which the next record will be written.
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Returns the number of records appended.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Appends one record, returning the offset it was written at.
    pub fn append(&mut self, key: u64, value: &[u8]) -> BucketResult<u64> {
        let bytes = encode_record(&self.header, key, value);
        self.append_raw(&bytes)?;
        self.records_written += 1;
        Ok(self.current_offset - bytes.len() as u64)
    }

    /// Appends pre-encoded bytes verbatim.
    ///
    /// Used by tests to lay down torn or hand-crafted records.
    pub fn append_raw(&mut self, bytes: &[u8]) -> BucketResult<()> {
        self.writer
            .write_all(bytes)
            .map_err(|e| BucketError::io_error_at_path(&self.path, e))?;
        self.current_offset += bytes.len() as u64;
        Ok(())
    }

    /// Flushes and fsyncs the file, returning its final size.
    pub fn finish(mut self) -> BucketResult<u64> {
        self.writer
            .flush()
            .map_err(|e| BucketError::io_error_at_path(&self.path, e))?;
        self.writer
            .get_ref()
            .sync_all()
            .map_err(|e| BucketError::io_error_at_path(&self.path, e))?;
        Ok(self.current_offset)
    }
}

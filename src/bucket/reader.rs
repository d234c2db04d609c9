//! Streaming bucket reader
//!
//! Buckets are strictly sequential: there is no index and no random access.
//! Each record is decoded in four steps (key, length, optional checksum,
//! value). Zero bytes at the key step is a clean end of stream; any other
//! short or failed read is a `DLS_RECORD_DECODE` error and the caller must
//! stop reading the file.
//!
//! Every successful step consumes at least one byte, and a value length larger
//! than the bytes left in the file is rejected before anything is allocated.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use super::errors::{BucketError, BucketResult, DecodeStage};
use super::header::BucketHeader;
use super::record::{read_full, BucketRecord, RecordHead};

/// Sequential reader over one bucket file.
pub struct BucketReader {
    /// Buffered reader
    reader: BufReader<File>,
    /// Decoded header (legacy when absent)
    header: BucketHeader,
    /// Current byte offset
    current_offset: u64,
    /// Total file size
    file_size: u64,
    /// Head whose value bytes have not been consumed yet
    pending: Option<RecordHead>,
}

impl BucketReader {
    /// Opens a bucket file and decodes its header.
    ///
    /// # Errors
    ///
    /// - `DLS_BUCKET_IO` if the file cannot be opened
    /// - `DLS_HEADER_UNRECOGNIZED` if the magic is present with an unsupported version
    pub fn open(path: &Path) -> BucketResult<Self> {
        let file = File::open(path).map_err(|e| BucketError::io_error_at_path(path, e))?;

        let file_size = file
            .metadata()
            .map_err(|e| BucketError::io_error_at_path(path, e))?
            .len();

        let mut reader = BufReader::new(file);
        let header = BucketHeader::decode(&mut reader)?;

        Ok(Self {
            reader,
            header,
            current_offset: header.encoded_len(),
            file_size,
            pending: None,
        })
    }

    /// Returns the format version.
    pub fn version(&self) -> u64 {
        self.header.version
    }

    /// Returns the current read offset.
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Returns the file size observed at open.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    fn remaining(&self) -> u64 {
        self.file_size.saturating_sub(self.current_offset)
    }

    /// Reads a little-endian u64. Returns `None` only when `allow_eof` is set
    /// and the stream ended before the first byte.
    fn read_u64(&mut self, stage: DecodeStage, allow_eof: bool) -> BucketResult<Option<u64>> {
        let mut buf = [0u8; 8];
        let n = read_full(&mut self.reader, &mut buf)
            .map_err(|e| BucketError::record_decode_io(stage, self.current_offset, e))?;

        if n == 0 && allow_eof {
            return Ok(None);
        }
        if n < buf.len() {
            let offset = self.current_offset;
            self.current_offset += n as u64;
            return Err(BucketError::record_decode(
                stage,
                offset,
                format!("Short read: {} of 8 bytes", n),
            ));
        }

        self.current_offset += 8;
        Ok(Some(u64::from_le_bytes(buf)))
    }

    fn read_checksum(&mut self) -> BucketResult<u8> {
        let mut buf = [0u8; 1];
        let n = read_full(&mut self.reader, &mut buf).map_err(|e| {
            BucketError::record_decode_io(DecodeStage::Checksum, self.current_offset, e)
        })?;
        if n == 0 {
            return Err(BucketError::record_decode(
                DecodeStage::Checksum,
                self.current_offset,
                "Short read: 0 of 1 bytes",
            ));
        }
        self.current_offset += 1;
        Ok(buf[0])
    }

    /// Reads the next record head.
    ///
    /// If the previous head's value was not consumed it is skipped first.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(head))` if a head was read and its value fits in the file
    /// - `Ok(None)` at a clean end of stream
    /// - `Err(DLS_RECORD_DECODE)` on any short or failed read
    pub fn next_head(&mut self) -> BucketResult<Option<RecordHead>> {
        if self.pending.is_some() {
            self.skip_value()?;
        }

        let offset = self.current_offset;
        let key = match self.read_u64(DecodeStage::Key, true)? {
            Some(key) => key,
            None => return Ok(None),
        };
        let length = self
            .read_u64(DecodeStage::Length, false)?
            .unwrap_or_default();
        let checksum = if self.header.has_checksum() {
            Some(self.read_checksum()?)
        } else {
            None
        };

        let remaining = self.remaining();
        if length > remaining {
            return Err(BucketError::record_decode(
                DecodeStage::Value,
                self.current_offset,
                format!(
                    "Value length {} exceeds remaining file size {}",
                    length, remaining
                ),
            ));
        }

        let head = RecordHead {
            key,
            length,
            checksum,
            offset,
        };
        self.pending = Some(head);
        Ok(Some(head))
    }

    fn take_pending(&mut self) -> BucketResult<RecordHead> {
        self.pending.take().ok_or_else(|| {
            BucketError::record_decode(
                DecodeStage::Value,
                self.current_offset,
                "No record head pending",
            )
        })
    }

    /// Reads the value bytes of the pending head.
    pub fn read_value(&mut self) -> BucketResult<Vec<u8>> {
        let head = self.take_pending()?;
        let offset = self.current_offset;
        let len = usize::try_from(head.length).map_err(|_| {
            BucketError::record_decode(
                DecodeStage::Value,
                offset,
                format!("Value length {} does not fit in memory", head.length),
            )
        })?;

        let mut value = vec![0u8; len];
        self.reader
            .read_exact(&mut value)
            .map_err(|e| BucketError::record_decode_io(DecodeStage::Value, offset, e))?;
        self.current_offset += head.length;
        Ok(value)
    }

    /// Consumes the value bytes of the pending head without keeping them.
    ///
    /// Returns the number of bytes skipped.
    pub fn skip_value(&mut self) -> BucketResult<u64> {
        let head = self.take_pending()?;
        let offset = self.current_offset;
        let copied = io::copy(&mut self.reader.by_ref().take(head.length), &mut io::sink())
            .map_err(|e| BucketError::record_decode_io(DecodeStage::Value, offset, e))?;
        self.current_offset += copied;

        if copied < head.length {
            return Err(BucketError::record_decode(
                DecodeStage::Value,
                offset,
                format!("Short read: {} of {} value bytes", copied, head.length),
            ));
        }
        Ok(copied)
    }

    /// Reads the next complete record.
    pub fn read_next(&mut self) -> BucketResult<Option<(RecordHead, Vec<u8>)>> {
        match self.next_head()? {
            Some(head) => {
                let value = self.read_value()?;
                Ok(Some((head, value)))
            }
            None => Ok(None),
        }
    }

    /// Reads all records. Any decode error causes immediate failure.
    pub fn read_all(&mut self) -> BucketResult<Vec<BucketRecord>> {
        let mut records = Vec::new();
        while let Some((head, value)) = self.read_next()? {
            records.push(BucketRecord::new(head.key, value));
        }
        Ok(records)
    }
}

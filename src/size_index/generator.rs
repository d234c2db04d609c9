//! Size index generation by full channel scan
//!
//! Every non-archived file with a 3 hex digit bucket name is decoded record
//! by record and each record's `length` field is summed. Other files in a time
//! bucket are skipped. Key windows and checksums are not checked here. A file that stops decoding part way contributes the records
//! read before the failure.

use std::path::Path;

use crate::bucket::BucketReader;
use crate::check::ChannelWalker;
use crate::observability::{Event, Logger};

use super::errors::SizeIndexResult;
use super::index::SizeIndex;

/// Computes a channel's size index from its bucket files.
#[derive(Debug, Clone, Copy)]
pub struct SizeGenerator {
    logger: Logger,
}

impl SizeGenerator {
    /// Create a generator
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    /// Scans the channel rooted at `channel_dir`.
    ///
    /// # Errors
    ///
    /// Only if `channel_dir` itself cannot be listed.
    pub fn generate(&self, channel_dir: &Path) -> SizeIndexResult<SizeIndex> {
        let dir = channel_dir.display().to_string();
        self.logger.info(Event::SizeGenerateBegin, &[("path", &dir)]);

        let mut total = SizeIndex::default();
        let mut files = 0u64;
        let walker = ChannelWalker::new(None, self.logger);
        walker.walk(channel_dir, |file| {
            if file.bucket_id.is_none() {
                self.logger.warn(
                    Event::FileSkipped,
                    &[("path", &file.path.display().to_string()), ("reason", "not a bucket file name")],
                );
                return;
            }
            files += 1;
            total = total + self.scan_file(&file.path);
        })?;

        self.logger.info(
            Event::SizeGenerateComplete,
            &[
                ("path", &dir),
                ("files", &files.to_string()),
                ("records", &total.records.to_string()),
                ("size", &total.size.to_string()),
            ],
        );
        Ok(total)
    }

    /// Size of one bucket file; stops at the first decode error.
    pub fn scan_file(&self, path: &Path) -> SizeIndex {
        let mut reader = match BucketReader::open(path) {
            Ok(reader) => reader,
            Err(e) => {
                self.logger.warn(
                    Event::FileSkipped,
                    &[("path", &path.display().to_string()), ("reason", &e.to_string())],
                );
                return SizeIndex::default();
            }
        };

        let mut index = SizeIndex::default();
        loop {
            let head = match reader.next_head() {
                Ok(Some(head)) => head,
                Ok(None) => break,
                Err(e) => {
                    self.logger.warn(
                        Event::RecordDecodeFailed,
                        &[("path", &path.display().to_string()), ("reason", &e.to_string())],
                    );
                    break;
                }
            };
            index = index + SizeIndex::of_record(head.length);
        }
        index
    }
}

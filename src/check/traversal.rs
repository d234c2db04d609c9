//! Channel directory traversal
//!
//! ```text
//! <channel>/
//!   sizeinfo                 persisted size index (not a bucket)
//!   <10 hex digits>/         time bucket
//!     <3 hex digits>         bucket file
//!     <3 hex digits>.gz      archived, never checked
//!     <3 hex digits>.broken  repair backup
//!     <3 hex digits>.repair  repair temp file
//!   <other>/                 not a time bucket, skipped without descending
//! ```
//!
//! The walk covers exactly one channel: only the time-bucket directories
//! directly under the given root are entered.
//!
//! Entries are visited in name order for reproducible logs, but every
//! aggregate built on top of the walk is an order-independent sum.

use std::fs;
use std::path::{Path, PathBuf};

use crate::bucket::{bucket_id, is_bucket_dir_name, BucketError, BucketResult};
use crate::observability::{Event, Logger};

use super::filter::BucketFilter;

/// Suffix of archived bucket files
pub const ARCHIVE_SUFFIX: &str = ".gz";

/// Suffix of the backup a repair leaves next to the repaired bucket
pub const BROKEN_SUFFIX: &str = ".broken";

/// Suffix of the temporary file a repair writes before committing
pub const REPAIR_TEMP_SUFFIX: &str = ".repair";

/// A bucket file found by the walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketFile {
    /// Full path of the file
    pub path: PathBuf,
    /// Bucket id, `None` if the file name is not 3 hex digits
    pub bucket_id: Option<u64>,
}

/// Entries the walk saw but did not visit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// `.gz` files skipped
    pub archived: u64,
    /// Buckets excluded by the filter
    pub filtered_out: u64,
    /// `.broken` / `.repair` files left by a repair
    pub repair_leftovers: Vec<PathBuf>,
    /// Directories that could not be listed
    pub unreadable_dirs: Vec<PathBuf>,
    /// Directories directly under the channel that are not time buckets
    pub skipped_dirs: Vec<PathBuf>,
}

/// Walks a channel tree and hands each bucket file to a visitor.
pub struct ChannelWalker<'a> {
    filter: Option<&'a BucketFilter>,
    logger: Logger,
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Lists a directory, returning (subdirectories, files) sorted by path.
fn list_dir(dir: &Path) -> BucketResult<(Vec<PathBuf>, Vec<PathBuf>)> {
    let entries = fs::read_dir(dir).map_err(|e| BucketError::io_error_at_path(dir, e))?;

    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BucketError::io_error_at_path(dir, e))?;
        let file_type = entry
            .file_type()
            .map_err(|e| BucketError::io_error_at_path(&entry.path(), e))?;
        if file_type.is_dir() {
            dirs.push(entry.path());
        } else {
            files.push(entry.path());
        }
    }
    dirs.sort();
    files.sort();
    Ok((dirs, files))
}

impl<'a> ChannelWalker<'a> {
    /// Create a walker. Without a filter every bucket is visited.
    pub fn new(filter: Option<&'a BucketFilter>, logger: Logger) -> Self {
        Self { filter, logger }
    }

    /// Walks the channel rooted at `channel_dir`.
    ///
    /// # Errors
    ///
    /// Only failure to list `channel_dir` itself is an error. Unreadable
    /// directories below it are logged and recorded in the stats.
    pub fn walk<F: FnMut(BucketFile)>(
        &self,
        channel_dir: &Path,
        mut visit: F,
    ) -> BucketResult<WalkStats> {
        let mut stats = WalkStats::default();
        let (dirs, files) = list_dir(channel_dir)?;
        self.walk_listing(dirs, files, &mut stats, &mut visit);
        Ok(stats)
    }

    fn walk_listing<F: FnMut(BucketFile)>(
        &self,
        dirs: Vec<PathBuf>,
        files: Vec<PathBuf>,
        stats: &mut WalkStats,
        visit: &mut F,
    ) {
        for file in files {
            self.logger.trace(
                Event::FileSkipped,
                &[("path", &file.display().to_string()), ("reason", "not in a time bucket")],
            );
        }

        for dir in dirs {
            let name = entry_name(&dir);
            if !is_bucket_dir_name(&name) {
                self.logger.warn(
                    Event::FileSkipped,
                    &[("path", &dir.display().to_string()), ("reason", "not a time bucket directory")],
                );
                stats.skipped_dirs.push(dir);
                continue;
            }

            let listing = match list_dir(&dir) {
                Ok(listing) => listing,
                Err(e) => {
                    self.logger.warn(
                        Event::FileSkipped,
                        &[("path", &dir.display().to_string()), ("reason", &e.to_string())],
                    );
                    stats.unreadable_dirs.push(dir);
                    continue;
                }
            };

            self.walk_time_bucket(&name, listing, stats, visit);
        }
    }

    fn walk_time_bucket<F: FnMut(BucketFile)>(
        &self,
        dir_name: &str,
        (dirs, files): (Vec<PathBuf>, Vec<PathBuf>),
        stats: &mut WalkStats,
        visit: &mut F,
    ) {
        for dir in dirs {
            self.logger.warn(
                Event::FileSkipped,
                &[("path", &dir.display().to_string()), ("reason", "directory inside time bucket")],
            );
        }

        for path in files {
            let name = entry_name(&path);

            if name.ends_with(ARCHIVE_SUFFIX) {
                stats.archived += 1;
                self.logger.trace(
                    Event::FileSkipped,
                    &[("path", &path.display().to_string()), ("reason", "archived")],
                );
                continue;
            }

            if name.ends_with(BROKEN_SUFFIX) || name.ends_with(REPAIR_TEMP_SUFFIX) {
                self.logger.warn(
                    Event::FileSkipped,
                    &[("path", &path.display().to_string()), ("reason", "repair leftover")],
                );
                stats.repair_leftovers.push(path);
                continue;
            }

            let id = bucket_id(dir_name, &name);
            if let (Some(filter), Some(id)) = (self.filter, id) {
                if !filter.matches(id) {
                    stats.filtered_out += 1;
                    continue;
                }
            }

            visit(BucketFile { path, bucket_id: id });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::CompareOp;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    fn collect(walker: &ChannelWalker<'_>, dir: &Path) -> (Vec<BucketFile>, WalkStats) {
        let mut found = Vec::new();
        let stats = walker.walk(dir, |f| found.push(f)).unwrap();
        (found, stats)
    }

    #[test]
    fn test_walk_finds_buckets_and_skips_archives() {
        let temp_dir = TempDir::new().unwrap();
        let chan = temp_dir.path();
        touch(&chan.join("0000000001/000"));
        touch(&chan.join("0000000001/001"));
        touch(&chan.join("0000000001/002.gz"));
        touch(&chan.join("0000000002/abc"));
        touch(&chan.join("sizeinfo"));

        let (found, stats) = collect(&ChannelWalker::new(None, Logger::quiet()), chan);
        let ids: Vec<_> = found.iter().map(|f| f.bucket_id).collect();
        assert_eq!(ids, vec![Some(0x1000), Some(0x1001), Some(0x2abc)]);
        assert_eq!(stats.archived, 1);
    }

    #[test]
    fn test_walk_applies_filter() {
        let temp_dir = TempDir::new().unwrap();
        let chan = temp_dir.path();
        touch(&chan.join("0000000001/000"));
        touch(&chan.join("0000000002/000"));

        let filter = BucketFilter::new(CompareOp::Ge, 0x2000);
        let (found, stats) = collect(&ChannelWalker::new(Some(&filter), Logger::quiet()), chan);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].bucket_id, Some(0x2000));
        assert_eq!(stats.filtered_out, 1);
    }

    #[test]
    fn test_walk_reports_repair_leftovers_and_bad_names() {
        let temp_dir = TempDir::new().unwrap();
        let chan = temp_dir.path();
        touch(&chan.join("0000000001/000.broken"));
        touch(&chan.join("0000000001/000.repair"));
        touch(&chan.join("0000000001/notes"));

        let (found, stats) = collect(&ChannelWalker::new(None, Logger::quiet()), chan);
        assert_eq!(stats.repair_leftovers.len(), 2);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].bucket_id, None);
    }

    #[test]
    fn test_walk_does_not_descend_into_other_directories() {
        let temp_dir = TempDir::new().unwrap();
        let chan = temp_dir.path();
        touch(&chan.join("0000000001/000"));
        touch(&chan.join("lost+found/0000000002/000"));
        touch(&chan.join("0000000003/nested/0000000004/000"));

        let (found, stats) = collect(&ChannelWalker::new(None, Logger::quiet()), chan);
        let ids: Vec<_> = found.iter().map(|f| f.bucket_id).collect();
        assert_eq!(ids, vec![Some(0x1000)]);
        assert_eq!(stats.skipped_dirs, vec![chan.join("lost+found")]);
    }

    #[test]
    fn test_walk_missing_root_fails() {
        let temp_dir = TempDir::new().unwrap();
        let walker = ChannelWalker::new(None, Logger::quiet());
        assert!(walker.walk(&temp_dir.path().join("absent"), |_| {}).is_err());
    }
}

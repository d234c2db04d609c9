//! CLI argument definitions using clap
//!
//! Commands:
//! - dlsck check <PATH>
//! - dlsck repair <PATH>
//! - dlsck size-check <CHANNEL> [--size-info <FILE>]
//! - dlsck generate <CHANNEL> [--write] [--size-info <FILE>]
//! - dlsck read <SIZEINFO> [--add-from <SIZEINFO>] [--write <SIZEINFO>]
//!
//! `PATH` is either a bucket file or a channel directory.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::check::BucketFilter;

/// dlsck - offline checker and repair tool for log store buckets
#[derive(Parser, Debug)]
#[command(name = "dlsck")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Emit per-file and per-record log lines
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Only scan buckets whose id matches, e.g. ">=0x1a2b" or "lt:1a2b"
    #[arg(long, global = true)]
    pub filter: Option<BucketFilter>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check a bucket file or every bucket under a channel directory
    Check {
        /// Bucket file or channel directory
        path: PathBuf,
    },

    /// Repair a corrupt legacy bucket, or every corrupt bucket in a channel
    Repair {
        /// Bucket file or channel directory
        path: PathBuf,
    },

    /// Compare a channel's persisted size index with a fresh scan
    SizeCheck {
        /// Channel directory
        path: PathBuf,

        /// Size index file (default: <channel>/<size_index_name>)
        #[arg(long)]
        size_info: Option<PathBuf>,
    },

    /// Compute a channel's size index by scanning its buckets
    Generate {
        /// Channel directory
        path: PathBuf,

        /// Persist the result to the size index file
        #[arg(long)]
        write: bool,

        /// Size index file (default: <channel>/<size_index_name>)
        #[arg(long)]
        size_info: Option<PathBuf>,
    },

    /// Print a size index file, optionally adding another and saving the sum
    Read {
        /// Size index file
        size_info: PathBuf,

        /// Size index file to add
        #[arg(long)]
        add_from: Option<PathBuf>,

        /// Write the result here
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

//! CLI module for dlsck
//!
//! Provides command-line interface for:
//! - check: Validate a bucket file or a channel tree
//! - repair: Salvage corrupt legacy buckets
//! - size-check: Reconcile a persisted size index
//! - generate: Recompute a size index
//! - read: Inspect and combine size index files

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, generate, read, repair, resolve_config, run, run_command, size_check};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};

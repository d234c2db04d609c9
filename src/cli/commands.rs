//! CLI command implementations
//!
//! Each command builds its components from the resolved `ToolConfig`, runs,
//! and prints one JSON result. Per-file corruption found by `check` and
//! `repair` is part of the result, not a command failure.

use std::path::{Path, PathBuf};

use serde_json::json;

use crate::check::ConsistencyChecker;
use crate::config::ToolConfig;
use crate::observability::{Event, Logger};
use crate::repair::Repairer;
use crate::size_index::{SizeCheck, SizeGenerator, SizeIndex, SizeIndexStore};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Parse arguments, run the command and report failures as JSON
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let result = resolve_config(&cli).and_then(|config| run_command(&config, cli.command));
    if let Err(e) = &result {
        Logger::default().fatal(
            Event::CommandFailed,
            &[("code", e.code_str()), ("message", e.message())],
        );
        let _ = write_error(e);
    }
    result
}

/// Loads the config file, if any, and applies command-line overrides
pub fn resolve_config(cli: &Cli) -> CliResult<ToolConfig> {
    let mut config = match &cli.config {
        Some(path) => ToolConfig::load(path)?,
        None => ToolConfig::default(),
    };
    if cli.verbose {
        config.verbose = true;
    }
    if let Some(filter) = cli.filter {
        config.bucket_filter = Some(filter);
    }
    config.validate()?;

    let filter = config
        .bucket_filter
        .map(|f| f.to_string())
        .unwrap_or_else(|| "none".to_string());
    config.logger().trace(
        Event::ConfigLoaded,
        &[
            ("bucket_filter", &filter),
            ("size_index_name", &config.size_index_name),
        ],
    );
    Ok(config)
}

/// Run the appropriate command based on CLI args
pub fn run_command(config: &ToolConfig, cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Check { path } => check(config, &path),
        Command::Repair { path } => repair(config, &path),
        Command::SizeCheck { path, size_info } => size_check(config, &path, size_info),
        Command::Generate {
            path,
            write,
            size_info,
        } => generate(config, &path, write, size_info),
        Command::Read {
            size_info,
            add_from,
            write,
        } => read(config, &size_info, add_from.as_deref(), write.as_deref()),
    }
}

/// Check a bucket file or a channel directory
pub fn check(config: &ToolConfig, path: &Path) -> CliResult<()> {
    let checker = ConsistencyChecker::new(config);
    if path.is_dir() {
        let report = checker.check_channel(path)?;
        write_response(json!({
            "report": report,
            "files_with_errors_pct": report.error_percentage(),
        }))
    } else {
        let check = checker.check_single(path)?;
        write_response(serde_json::to_value(&check)?)
    }
}

/// Repair a bucket file or every corrupt bucket in a channel directory
pub fn repair(config: &ToolConfig, path: &Path) -> CliResult<()> {
    let repairer = Repairer::new(config);
    if path.is_dir() {
        let result = repairer.repair_channel(path)?;
        write_response(serde_json::to_value(&result)?)
    } else {
        let outcome = repairer.repair(path)?;
        write_response(serde_json::to_value(&outcome)?)
    }
}

fn store_for(config: &ToolConfig, channel_dir: &Path, size_info: Option<PathBuf>) -> SizeIndexStore {
    SizeIndexStore::new(size_info.unwrap_or_else(|| config.size_index_path(channel_dir)))
}

/// Compare a channel's persisted size index with its bucket files
pub fn size_check(config: &ToolConfig, path: &Path, size_info: Option<PathBuf>) -> CliResult<()> {
    let store = store_for(config, path, size_info);
    let report = SizeCheck::new(config.logger()).run(path, &store)?;
    if !report.matches {
        return Err(CliError::size_mismatch(&report));
    }
    write_response(serde_json::to_value(report)?)
}

/// Generate a channel's size index, optionally persisting it
pub fn generate(
    config: &ToolConfig,
    path: &Path,
    write: bool,
    size_info: Option<PathBuf>,
) -> CliResult<()> {
    let index = SizeGenerator::new(config.logger()).generate(path)?;

    let written = if write {
        let store = store_for(config, path, size_info);
        write_index(config, &store, &index)?;
        Some(store.path().to_path_buf())
    } else {
        None
    };

    write_response(json!({ "index": index, "written": written }))
}

/// Print a size index, optionally adding another and writing the sum
pub fn read(
    config: &ToolConfig,
    size_info: &Path,
    add_from: Option<&Path>,
    write: Option<&Path>,
) -> CliResult<()> {
    let mut index = SizeIndexStore::new(size_info).read()?;
    if let Some(other) = add_from {
        index = index + SizeIndexStore::new(other).read()?;
    }

    if let Some(out) = write {
        write_index(config, &SizeIndexStore::new(out), &index)?;
    }

    write_response(json!({ "index": index, "written": write }))
}

fn write_index(config: &ToolConfig, store: &SizeIndexStore, index: &SizeIndex) -> CliResult<()> {
    store.write(index)?;
    config.logger().info(
        Event::SizeIndexWritten,
        &[
            ("path", &store.path().display().to_string()),
            ("records", &index.records.to_string()),
            ("size", &index.size.to_string()),
        ],
    );
    Ok(())
}

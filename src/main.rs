//! dlsck CLI entry point
//!
//! This is a minimal entrypoint that:
//! 1. Parses CLI arguments and runs the command (via cli::run)
//! 2. Exits with the error's exit code on failure
//!
//! All logic, including reporting the failure on stdout and stderr, is
//! delegated to the CLI module.

use dlsck::cli;

fn main() {
    if let Err(e) = cli::run() {
        std::process::exit(e.exit_code());
    }
}

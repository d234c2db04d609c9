//! JSON output for CLI commands
//!
//! Every command prints exactly one JSON object on stdout:
//! - `{"status":"ok","data":{...}}`
//! - `{"status":"error","code":"...","message":"...","data":{...}}`
//!
//! Log lines go to stderr, so stdout stays machine-readable.

use std::io::{self, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};

fn write_value<W: Write>(out: &mut W, response: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *out, response)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn ok_response(data: Value) -> Value {
    serde_json::json!({
        "status": "ok",
        "data": data
    })
}

fn error_response(err: &CliError) -> Value {
    let mut response = serde_json::json!({
        "status": "error",
        "code": err.code_str(),
        "message": err.message()
    });
    if let Some(data) = err.data() {
        response["data"] = data.clone();
    }
    response
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_value(&mut io::stdout().lock(), &ok_response(data))
}

/// Write an error response to stdout
pub fn write_error(err: &CliError) -> CliResult<()> {
    write_value(&mut io::stdout().lock(), &error_response(err))
}

//! Batch execution of RPC commands read from a stream.
//!
//! Each non-blank line is one command:
//!
//! ```text
//! # comments and blank lines are skipped
//! emulation_list
//! controller_nvme_create {"emulation_manager": "mlx5_0", "pf_id": 0}
//! ```
//!
//! Commands run strictly one after another. The first failure stops the
//! run; commands that already succeeded stay in effect on the daemon.

use std::io::{self, BufRead, Write};

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::ipc::{IpcError, RpcService};
use crate::protocol::Params;

/// A batch run stopped at a failing command.
///
/// The message lists every command executed so far and marks the failing
/// one with `<<<`.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Exception:\n{executed} <<<\n{error}")]
    Call { executed: String, error: IpcError },

    #[error("Exception:\n{executed} <<<\n{message}")]
    Parse { executed: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// One parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub method: String,
    pub params: Option<Params>,
}

/// Parse a single command line.
///
/// Returns `Ok(None)` for blank lines and `#` comments.
pub fn parse_line(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (method, rest) = match line.split_once(char::is_whitespace) {
        Some((method, rest)) => (method, rest.trim()),
        None => (line, ""),
    };

    let params = if rest.is_empty() {
        None
    } else {
        Some(parse_params(rest)?)
    };

    Ok(Some(Command {
        method: method.to_string(),
        params,
    }))
}

/// Parse a params argument, which must be a JSON object.
pub fn parse_params(text: &str) -> Result<Params, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(format!("params must be a JSON object: {text}")),
        Err(e) => Err(format!("invalid params JSON: {e}")),
    }
}

/// Render a call result the way the command line prints it.
pub fn render(result: &Value) -> String {
    serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string())
}

/// Execute every command in `input`, printing each result to `output`.
///
/// Returns the number of commands executed.
pub fn run_script<S, R, W>(service: &mut S, input: R, output: &mut W) -> Result<usize, ScriptError>
where
    S: RpcService + ?Sized,
    R: BufRead,
    W: Write,
{
    let mut executed: Vec<String> = Vec::new();
    let mut calls = 0;

    for line in input.lines() {
        let line = line?;
        let line = line.trim_end();
        if line.trim().is_empty() {
            continue;
        }
        executed.push(line.to_string());

        let command = match parse_line(line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                return Err(ScriptError::Parse {
                    executed: executed.join("\n"),
                    message,
                })
            }
        };

        info!("Executing {}", command.method);
        match service.call(&command.method, command.params.as_ref()) {
            Ok(result) => {
                writeln!(output, "{}", render(&result))?;
                calls += 1;
            }
            Err(error) => {
                return Err(ScriptError::Call {
                    executed: executed.join("\n"),
                    error,
                })
            }
        }
    }

    output.flush()?;
    Ok(calls)
}

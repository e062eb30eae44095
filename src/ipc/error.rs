//! Error taxonomy for SNAP RPC calls.
//!
//! Transport-level failures (`ConnectionFailed`, `Transport`,
//! `ConnectionClosed`, `Timeout`) are kept apart from `Rpc`, where the
//! daemon understood the request and rejected it. None of them are retried
//! here.

use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::protocol::Params;

#[derive(Debug, Error)]
pub enum IpcError {
    /// The socket path is missing, is not a socket, or refused the connect.
    #[error("Connection failed to {}: {source}", path.display())]
    ConnectionFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the request or reading the reply failed.
    #[error("Transport error: {0}")]
    Transport(#[source] std::io::Error),

    /// The daemon closed the connection before a complete reply arrived.
    #[error("Connection closed by daemon")]
    ConnectionClosed,

    /// No complete reply was decoded within the time budget.
    #[error("Response Timeout after {:.1}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// The daemon answered with a JSON-RPC `error` object.
    #[error("{}", render_rpc_error(method, *id, params.as_ref(), error))]
    Rpc {
        method: String,
        id: u64,
        params: Option<Params>,
        error: Value,
    },

    /// The decoded document is not a JSON-RPC response.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The reply grew past the configured size limit.
    #[error("Response exceeds maximum of {limit} bytes")]
    ResponseTooLarge { limit: usize },

    /// The request could not be serialized.
    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl IpcError {
    /// True for [`IpcError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, IpcError::Timeout(_))
    }

    /// True for write failures and peer closure.
    pub fn is_transport(&self) -> bool {
        matches!(self, IpcError::Transport(_) | IpcError::ConnectionClosed)
    }

    /// The daemon-supplied error payload, for `Rpc` errors.
    pub fn rpc_error(&self) -> Option<&Value> {
        match self {
            IpcError::Rpc { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Render the full request/response context of a rejected call.
///
/// ```text
/// request:
/// {
///   "method": "controller_list",
///   "req_id": 1
/// }
/// Got JSON-RPC error response
/// response:
/// {
///   "code": -1,
///   "message": "boom"
/// }
/// ```
fn render_rpc_error(method: &str, id: u64, params: Option<&Params>, error: &Value) -> String {
    let mut request = serde_json::Map::new();
    request.insert("method".into(), Value::String(method.to_string()));
    request.insert("req_id".into(), Value::from(id));
    if let Some(params) = params {
        request.insert("params".into(), Value::Object(params.clone()));
    }

    format!(
        "request:\n{}\nGot JSON-RPC error response\nresponse:\n{}",
        pretty(&Value::Object(request)),
        pretty(error)
    )
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

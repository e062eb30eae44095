//! JSON-RPC 2.0 envelopes exchanged with the SNAP daemon.
//!
//! Params and results are opaque: the daemon defines their shape per
//! method, so both are carried as `serde_json` values.

use serde::Serialize;
use serde_json::{Map, Value};

/// JSON-RPC version tag, always "2.0".
pub const JSONRPC_VERSION: &str = "2.0";

/// Parameter mapping passed through verbatim to the daemon.
pub type Params = Map<String, Value>;

/// JSON-RPC 2.0 request envelope.
///
/// Field order matches what goes on the wire:
/// `{"jsonrpc":"2.0","method":...,"id":...,"params":...}`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub method: String,
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
}

impl JsonRpcRequest {
    /// Build a request, taking an owned copy of the caller's params.
    ///
    /// An empty mapping is treated the same as no params and is left out of
    /// the envelope entirely.
    pub fn new(method: impl Into<String>, params: Option<&Params>, id: u64) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: method.into(),
            id,
            params: params.filter(|p| !p.is_empty()).cloned(),
        }
    }

    /// Serialize to the compact wire encoding.
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// A decoded JSON-RPC 2.0 response.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonRpcResponse {
    /// The daemon returned a `result` payload.
    Success { id: Option<Value>, result: Value },
    /// The daemon returned an `error` payload (shape is daemon-defined).
    Failure { id: Option<Value>, error: Value },
}

impl JsonRpcResponse {
    /// The `id` echoed by the daemon, if any.
    pub fn id(&self) -> Option<&Value> {
        match self {
            JsonRpcResponse::Success { id, .. } | JsonRpcResponse::Failure { id, .. } => {
                id.as_ref()
            }
        }
    }
}

impl TryFrom<Value> for JsonRpcResponse {
    type Error = String;

    fn try_from(document: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut fields) = document else {
            return Err(format!("expected a JSON object, got {}", kind_of(&document)));
        };

        let id = fields.remove("id");

        // `error` wins even when a `result` key is also present.
        if let Some(error) = fields.remove("error") {
            return Ok(JsonRpcResponse::Failure { id, error });
        }

        match fields.remove("result") {
            Some(result) => Ok(JsonRpcResponse::Success { id, result }),
            None => Err("response missing both result and error".to_string()),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

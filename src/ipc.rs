//! IPC client for the SNAP emulation daemon.
//!
//! This module talks JSON-RPC 2.0 to the daemon over a Unix domain socket,
//! one request at a time.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐         Unix Socket          ┌─────────────────────┐
//! │    snap_rpc     │  ◄──────────────────────────►│     SNAP daemon     │
//! │   (RpcClient)   │   JSON-RPC 2.0, unframed     │                     │
//! └─────────────────┘                              └─────────────────────┘
//! ```
//!
//! # Protocol
//!
//! There is no length prefix or delimiter. Each request is written as one
//! complete JSON object, and the reply ends where its JSON value is
//! structurally complete:
//!
//! ```text
//! -> {"jsonrpc":"2.0","method":"controller_list","id":1}
//! <- {"jsonrpc":"2.0","result":[],"id":1}
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use snap_rpc::ipc::{default_socket_path, RpcClient};
//! use std::time::Duration;
//!
//! let mut client = RpcClient::connect(&default_socket_path(), Duration::from_secs(60))?;
//! let result = client.call("emulation_list", None)?;
//! ```

mod client;
mod decoder;
mod error;
mod transport;

pub use client::{
    default_socket_path, RpcClient, RpcService, DEFAULT_SOCKET_PATH, DEFAULT_TIMEOUT_SECS,
};
pub use decoder::{Decoded, ResponseBuffer, MAX_RESPONSE_SIZE};
pub use error::IpcError;
pub use transport::{ReadOutcome, Transport};

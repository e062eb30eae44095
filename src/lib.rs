//! SNAP RPC client library.
//!
//! This library provides the pieces of the `snap_rpc` command line tool:
//!
//! - `ipc` - Unix socket transport and the blocking JSON-RPC 2.0 client
//! - `protocol` - JSON-RPC request/response envelopes
//! - `config` - Client settings (socket path, timeout, verbosity)
//! - `script` - Batch execution of commands read from a stream
//!
//! # IPC Module
//!
//! ```ignore
//! use snap_rpc::ipc::{default_socket_path, RpcClient};
//! use std::time::Duration;
//!
//! let mut client = RpcClient::connect(&default_socket_path(), Duration::from_secs(60))?;
//! let result = client.call("emulation_list", None)?;
//! ```

pub mod config;
pub mod ipc;
pub mod protocol;
pub mod script;

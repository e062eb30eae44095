//! JSON-RPC 2.0 client for the SNAP daemon.
//!
//! This module provides `RpcClient`, a blocking client that owns one Unix
//! socket connection to the daemon and issues one request at a time. Each
//! call writes a single unframed JSON request and then reads until a
//! complete JSON reply has been assembled or the time budget runs out.

use std::io;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::config::ClientConfig;
use crate::ipc::decoder::{Decoded, ResponseBuffer, MAX_RESPONSE_SIZE};
use crate::ipc::error::IpcError;
use crate::ipc::transport::{ReadOutcome, Transport};
use crate::protocol::{JsonRpcRequest, JsonRpcResponse, Params};

/// Default socket path of the SNAP daemon.
pub const DEFAULT_SOCKET_PATH: &str = "/var/tmp/spdk.sock";

/// Default reply timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Size of a single socket read.
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Resolve the default socket path for the SNAP daemon.
pub fn default_socket_path() -> PathBuf {
    PathBuf::from(DEFAULT_SOCKET_PATH)
}

/// Anything that can execute a named RPC method.
///
/// The batch runner and binary depend on this trait instead of on
/// `RpcClient` directly, so they can be driven by a mock in tests.
pub trait RpcService {
    /// Execute `method` with optional `params` and return its result.
    fn call(&mut self, method: &str, params: Option<&Params>) -> Result<Value, IpcError>;
}

/// Client for the SNAP daemon's JSON-RPC interface.
///
/// # Connection Lifecycle
///
/// - `connect()` - Open the socket (no retry)
/// - `call()` - Send a request and wait for its reply
/// - drop - Close the socket
///
/// A timeout, peer closure, oversized reply or I/O failure leaves the
/// stream out of step with the request/reply sequence, so the client shuts
/// the connection down and every later call fails with a transport error.
///
/// # Example
///
/// ```ignore
/// use snap_rpc::ipc::RpcClient;
/// use std::time::Duration;
///
/// let mut client = RpcClient::connect("/var/tmp/spdk.sock".as_ref(), Duration::from_secs(60))?;
/// let controllers = client.call("controller_list", None)?;
/// ```
#[derive(Debug)]
pub struct RpcClient {
    transport: Transport,
    /// Id of the most recently sent request; 0 before the first send.
    request_id: u64,
    timeout: Duration,
    max_response_size: usize,
    /// Cleared once a failure has shut the connection down.
    connected: bool,
}

impl RpcClient {
    /// Connect to the daemon at `socket_path`.
    ///
    /// # Errors
    ///
    /// Returns `IpcError::ConnectionFailed` if:
    /// - The socket file does not exist or is not a socket
    /// - Connection is refused (daemon not running)
    /// - Permission denied
    pub fn connect(socket_path: &Path, timeout: Duration) -> Result<Self, IpcError> {
        let transport = Transport::connect(socket_path)?;
        debug!("Connected to SNAP daemon at {}", socket_path.display());
        Ok(Self::with_transport(transport, timeout))
    }

    /// Connect using the socket path and timeout from `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, IpcError> {
        Self::connect(&config.socket_path, config.timeout)
    }

    /// Build a client over an already connected stream.
    pub fn from_stream(stream: UnixStream, timeout: Duration) -> Self {
        Self::with_transport(Transport::from_stream(stream), timeout)
    }

    fn with_transport(transport: Transport, timeout: Duration) -> Self {
        Self {
            transport,
            request_id: 0,
            timeout,
            max_response_size: MAX_RESPONSE_SIZE,
            connected: true,
        }
    }

    /// The reply timeout applied by `call()`.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Change the reply timeout for subsequent calls.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Bound the number of bytes buffered for a single reply.
    pub fn set_max_response_size(&mut self, limit: usize) {
        self.max_response_size = limit;
    }

    /// False once a failure has shut the connection down.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Id of the most recently sent request, or 0 if nothing was sent yet.
    pub fn last_request_id(&self) -> u64 {
        self.request_id
    }

    /// Encode and write one request, returning the id it was sent with.
    ///
    /// The id counter advances even if the write fails, so ids are never
    /// reused on this connection.
    pub fn send(&mut self, method: &str, params: Option<&Params>) -> Result<u64, IpcError> {
        if !self.connected {
            return Err(IpcError::Transport(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection was closed after an earlier failure",
            )));
        }

        self.request_id += 1;
        let id = self.request_id;

        let request = JsonRpcRequest::new(method, params, id);
        let bytes = request.to_bytes()?;
        debug!("request: {}", String::from_utf8_lossy(&bytes));

        self.transport
            .send_all(&bytes, self.timeout)
            .map_err(|e| self.disconnect(e))?;
        Ok(id)
    }

    /// Read until one complete JSON document has been received.
    ///
    /// Reads are bounded by whatever is left of `timeout`, measured from
    /// entry. Bytes that do not yet form a complete document (including
    /// bytes that do not parse at all) are kept and the loop reads again;
    /// only the deadline, peer closure, or a read failure end it early.
    /// Partial bytes are dropped on timeout.
    ///
    /// Any failure here shuts the connection down: the reply may still be
    /// in flight, and reading it as the answer to a later request would
    /// mismatch every reply after it.
    pub fn receive(&mut self, timeout: Duration) -> Result<Value, IpcError> {
        self.read_document(timeout).map_err(|e| self.disconnect(e))
    }

    fn read_document(&mut self, timeout: Duration) -> Result<Value, IpcError> {
        let deadline = Instant::now() + timeout;
        let mut buffer = ResponseBuffer::new();
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            let n = match self.transport.read_some(&mut chunk, remaining)? {
                ReadOutcome::Data(n) => n,
                ReadOutcome::Closed => return Err(IpcError::ConnectionClosed),
                ReadOutcome::TimedOut => break,
            };
            trace!("read {} bytes ({} buffered)", n, buffer.len() + n);

            buffer.extend(&chunk[..n]);
            if buffer.len() > self.max_response_size {
                return Err(IpcError::ResponseTooLarge {
                    limit: self.max_response_size,
                });
            }

            match buffer.try_decode() {
                Decoded::Complete(document) => return Ok(document),
                Decoded::Incomplete => continue,
                Decoded::Malformed(e) => {
                    trace!("buffered reply does not parse yet: {}", e);
                    continue;
                }
            }
        }

        debug!("no complete reply within {:?}, dropping {} bytes", timeout, buffer.len());
        Err(IpcError::Timeout(timeout))
    }

    /// Shut the connection down after `err` and hand the error back.
    fn disconnect(&mut self, err: IpcError) -> IpcError {
        if self.connected {
            debug!("closing connection after error: {}", err);
            self.transport.shutdown();
            self.connected = false;
        }
        err
    }

    /// Send a JSON-RPC 2.0 request and wait for its result.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The request cannot be written (`IpcError::Transport`)
    /// - The daemon closes the connection (`IpcError::ConnectionClosed`)
    /// - No reply arrives in time (`IpcError::Timeout`)
    /// - The daemon returns an error object (`IpcError::Rpc`)
    /// - The reply is not a JSON-RPC response (`IpcError::Protocol`)
    ///
    /// After a transport failure, a timeout or an oversized reply the
    /// connection is closed and later calls fail with `IpcError::Transport`.
    /// An error response leaves the connection usable.
    pub fn call(&mut self, method: &str, params: Option<&Params>) -> Result<Value, IpcError> {
        let id = self.send(method, params)?;
        let document = self.receive(self.timeout)?;
        debug!("response: {}", document);

        let response = JsonRpcResponse::try_from(document).map_err(IpcError::Protocol)?;
        if let Some(echoed) = response.id() {
            if echoed.as_u64() != Some(id) {
                warn!("reply to {} carries id {}, expected {}", method, echoed, id);
            }
        }

        match response {
            JsonRpcResponse::Success { result, .. } => Ok(result),
            JsonRpcResponse::Failure { error, .. } => Err(IpcError::Rpc {
                method: method.to_string(),
                id,
                params: params.filter(|p| !p.is_empty()).cloned(),
                error,
            }),
        }
    }
}

impl RpcService for RpcClient {
    fn call(&mut self, method: &str, params: Option<&Params>) -> Result<Value, IpcError> {
        RpcClient::call(self, method, params)
    }
}

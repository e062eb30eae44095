//! Blocking Unix domain socket transport.

use std::io::{self, Read, Write};
use std::net::Shutdown;
use std::os::unix::fs::FileTypeExt;
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use tracing::trace;

use super::error::IpcError;

/// Result of one bounded read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n` bytes were placed at the start of the buffer.
    Data(usize),
    /// The peer closed its end of the connection.
    Closed,
    /// Nothing arrived before the read timeout.
    TimedOut,
}

/// An open stream connection to the daemon.
#[derive(Debug)]
pub struct Transport {
    stream: UnixStream,
}

impl Transport {
    /// Connect to the Unix domain socket at `socket_path`.
    ///
    /// The path is checked first, so a missing endpoint or a path that is
    /// not a socket is reported without attempting a connect. Every failure
    /// is an [`IpcError::ConnectionFailed`] carrying the underlying cause.
    pub fn connect(socket_path: &Path) -> Result<Self, IpcError> {
        let failed = |source: io::Error| IpcError::ConnectionFailed {
            path: socket_path.to_path_buf(),
            source,
        };

        let metadata = std::fs::metadata(socket_path).map_err(failed)?;
        if !metadata.file_type().is_socket() {
            return Err(failed(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a Unix domain socket",
            )));
        }

        let stream = UnixStream::connect(socket_path).map_err(failed)?;
        trace!("Connected to {}", socket_path.display());

        Ok(Self::from_stream(stream))
    }

    /// Wrap an already connected stream.
    pub fn from_stream(stream: UnixStream) -> Self {
        Self { stream }
    }

    /// Write one complete message, bounded by `timeout`.
    pub fn send_all(&mut self, bytes: &[u8], timeout: Duration) -> Result<(), IpcError> {
        self.stream
            .set_write_timeout(non_zero(timeout))
            .map_err(IpcError::Transport)?;

        self.stream.write_all(bytes).map_err(IpcError::Transport)?;
        self.stream.flush().map_err(IpcError::Transport)?;

        Ok(())
    }

    /// Perform a single read that blocks for at most `remaining`.
    pub fn read_some(&mut self, buf: &mut [u8], remaining: Duration) -> Result<ReadOutcome, IpcError> {
        self.stream
            .set_read_timeout(non_zero(remaining))
            .map_err(IpcError::Transport)?;

        loop {
            match self.stream.read(buf) {
                Ok(0) => return Ok(ReadOutcome::Closed),
                Ok(n) => return Ok(ReadOutcome::Data(n)),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                // Unix sockets report an expired SO_RCVTIMEO as EAGAIN.
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    return Ok(ReadOutcome::TimedOut)
                }
                Err(e) if e.kind() == io::ErrorKind::ConnectionReset => {
                    return Ok(ReadOutcome::Closed)
                }
                Err(e) => return Err(IpcError::Transport(e)),
            }
        }
    }

    /// Close both directions of the connection.
    ///
    /// The daemon sees end-of-stream; any reply still in flight is discarded.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            trace!("shutdown: {}", e);
        }
    }
}

/// `set_read_timeout(Some(ZERO))` is rejected by std; clamp to the smallest
/// representable wait instead.
fn non_zero(timeout: Duration) -> Option<Duration> {
    Some(timeout.max(Duration::from_micros(1)))
}

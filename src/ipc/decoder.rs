//! Incremental decoding of daemon replies.
//!
//! The SNAP daemon does not frame its replies: there is no length prefix and
//! no delimiter. A reply ends where its JSON value is structurally complete,
//! and it may arrive split across any number of socket reads. The receive
//! loop therefore appends every chunk to a [`ResponseBuffer`] and asks it
//! whether a complete document is available yet.
//!
//! ```text
//! read #1: {"jsonrpc":"2.0","res        -> Incomplete
//! read #2: ult":[{"name":"nvme0"}],     -> Incomplete
//! read #3: "id":1}                      -> Complete(document)
//! ```

use serde_json::{Deserializer, Value};

/// Default upper bound (100MB) on buffered reply bytes.
pub const MAX_RESPONSE_SIZE: usize = 100 * 1024 * 1024;

/// Outcome of one decode attempt over the buffered bytes.
#[derive(Debug)]
pub enum Decoded {
    /// The buffer starts with one complete JSON value.
    Complete(Value),
    /// The buffer holds a prefix of a value; more bytes are needed.
    Incomplete,
    /// The buffer does not parse as JSON.
    ///
    /// The receive loop keeps reading anyway: without framing, a syntax
    /// error cannot be told apart from a reply that is still arriving.
    Malformed(serde_json::Error),
}

/// Where the structural scan of the buffer stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Scan {
    /// Only whitespace so far.
    #[default]
    Start,
    /// Inside a top-level object or array.
    Container,
    /// The top-level value is not a container; every attempt runs the parser.
    Scalar,
    /// The top-level container has closed.
    Closed,
}

/// Append-only accumulator for a single reply.
///
/// Each appended chunk is scanned once for bracket depth and string state,
/// so the full parse only runs once the top-level object or array has
/// closed. Decoding a reply therefore costs time linear in its size no
/// matter how many reads it arrives in.
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    bytes: Vec<u8>,
    scanned: usize,
    scan: Scan,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk exactly as read from the socket.
    ///
    /// Bytes are kept raw so a UTF-8 sequence split across two reads is
    /// reassembled before decoding.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
        self.scan_new_bytes();
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Try to decode the first complete JSON value in the buffer.
    ///
    /// Anything after the end of that value is ignored.
    pub fn try_decode(&self) -> Decoded {
        match self.scan {
            Scan::Start | Scan::Container => Decoded::Incomplete,
            Scan::Scalar | Scan::Closed => self.parse(),
        }
    }

    fn parse(&self) -> Decoded {
        let mut stream = Deserializer::from_slice(&self.bytes).into_iter::<Value>();

        match stream.next() {
            Some(Ok(document)) => Decoded::Complete(document),
            Some(Err(e)) if e.is_eof() => Decoded::Incomplete,
            Some(Err(e)) => Decoded::Malformed(e),
            // Empty or whitespace only
            None => Decoded::Incomplete,
        }
    }

    fn scan_new_bytes(&mut self) {
        while self.scanned < self.bytes.len() {
            let b = self.bytes[self.scanned];
            match self.scan {
                Scan::Start => match b {
                    b' ' | b'\t' | b'\n' | b'\r' => {}
                    b'{' | b'[' => {
                        self.scan = Scan::Container;
                        self.depth = 1;
                    }
                    _ => self.scan = Scan::Scalar,
                },
                Scan::Container if self.in_string => {
                    if self.escaped {
                        self.escaped = false;
                    } else if b == b'\\' {
                        self.escaped = true;
                    } else if b == b'"' {
                        self.in_string = false;
                    }
                }
                Scan::Container => match b {
                    b'"' => self.in_string = true,
                    b'{' | b'[' => self.depth += 1,
                    b'}' | b']' => {
                        self.depth -= 1;
                        if self.depth == 0 {
                            self.scan = Scan::Closed;
                        }
                    }
                    _ => {}
                },
                Scan::Scalar | Scan::Closed => return,
            }
            self.scanned += 1;
        }
    }
}

//! Incremental request framing.
//!
//! The framer owns one growable buffer per connection. Each call to
//! [`RequestFramer::next_request`] consumes exactly one request from the
//! front of that buffer, reading from the transport only when the buffered
//! bytes do not yet hold a complete request. Bytes belonging to a pipelined
//! follow-up request stay in the buffer for the next call.

use std::fmt;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::http::parser::{self, ParseError, RequestHead};
use crate::http::request::Request;
use crate::http::transport::Connection;

/// Size limits applied while framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLimits {
    /// Maximum header block size, terminator included.
    pub max_header_bytes: usize,
    /// Maximum accepted `Content-Length`.
    pub max_body_bytes: usize,
}

impl Default for FrameLimits {
    fn default() -> Self {
        Self {
            max_header_bytes: 64 * 1024,
            max_body_bytes: 8 * 1024 * 1024,
        }
    }
}

#[derive(Debug)]
pub enum FrameError {
    /// Bad start line, method or version.
    Malformed(ParseError),
    /// The peer closed in the middle of a request.
    Truncated { buffered: usize },
    /// Header block or declared body exceeds the limits.
    TooLarge { limit: usize },
    /// Transport read failed.
    Io(std::io::Error),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Malformed(e) => write!(f, "malformed request: {}", e),
            FrameError::Truncated { buffered } => {
                write!(f, "connection closed with {} bytes of an incomplete request", buffered)
            }
            FrameError::TooLarge { limit } => write!(f, "request exceeds limit of {} bytes", limit),
            FrameError::Io(e) => write!(f, "read failed: {}", e),
        }
    }
}

impl std::error::Error for FrameError {}

impl From<ParseError> for FrameError {
    fn from(e: ParseError) -> Self {
        FrameError::Malformed(e)
    }
}

pub struct RequestFramer {
    buffer: BytesMut,
    limits: FrameLimits,
}

impl RequestFramer {
    pub fn new(limits: FrameLimits) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            limits,
        }
    }

    /// Bytes received but not yet consumed by a request.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    /// Produces the next complete request.
    ///
    /// `Ok(None)` means the peer closed cleanly between requests. Every
    /// error leaves the connection unusable; no resynchronization is tried.
    pub async fn next_request<S>(
        &mut self,
        conn: &mut Connection<S>,
    ) -> Result<Option<Request>, FrameError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let Some(header_len) = self.fill_header_block(conn).await? else {
            return Ok(None);
        };

        let head = parser::parse_request_head(&self.buffer[..header_len - 4])?;

        let body_len = head.content_length();
        if body_len > self.limits.max_body_bytes {
            return Err(FrameError::TooLarge {
                limit: self.limits.max_body_bytes,
            });
        }

        let total = header_len + body_len;
        while self.buffer.len() < total {
            if self.read_more(conn).await? == 0 {
                return Err(FrameError::Truncated {
                    buffered: self.buffer.len(),
                });
            }
        }

        Ok(Some(self.take_request(head, header_len, body_len, conn.peer())))
    }

    /// Ensures the buffer starts with a complete header block and returns
    /// its length including the terminator.
    async fn fill_header_block<S>(
        &mut self,
        conn: &mut Connection<S>,
    ) -> Result<Option<usize>, FrameError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut scanned = 0;
        loop {
            // Try what is already buffered before touching the transport
            if let Some(end) = parser::find_headers_end(&self.buffer, scanned) {
                let header_len = end + 4;
                if header_len > self.limits.max_header_bytes {
                    return Err(FrameError::TooLarge {
                        limit: self.limits.max_header_bytes,
                    });
                }
                return Ok(Some(header_len));
            }

            if self.buffer.len() > self.limits.max_header_bytes {
                return Err(FrameError::TooLarge {
                    limit: self.limits.max_header_bytes,
                });
            }

            // The terminator may straddle the previous read boundary
            scanned = self.buffer.len().saturating_sub(3);

            if self.read_more(conn).await? == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err(FrameError::Truncated {
                    buffered: self.buffer.len(),
                });
            }
        }
    }

    async fn read_more<S>(&mut self, conn: &mut Connection<S>) -> Result<usize, FrameError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let n = conn
            .read_bytes(&mut self.buffer)
            .await
            .map_err(FrameError::Io)?;

        tracing::trace!(peer = %conn.peer(), read = n, buffered = self.buffer.len(), "Transport read");
        Ok(n)
    }

    /// Evicts the request's span from the front of the buffer.
    fn take_request(
        &mut self,
        head: RequestHead,
        header_len: usize,
        body_len: usize,
        peer: std::net::SocketAddr,
    ) -> Request {
        self.buffer.advance(header_len);
        let body = (body_len > 0).then(|| self.buffer.split_to(body_len).freeze());

        Request {
            method: head.method,
            target: head.target,
            version: head.version,
            headers: head.headers,
            body,
            peer: Some(peer),
        }
    }
}

impl Default for RequestFramer {
    fn default() -> Self {
        Self::new(FrameLimits::default())
    }
}

//! Byte-level connection to one client.
//!
//! Wraps any async stream so the framer and the worker can be driven by a
//! TCP socket in production and by in-memory streams in tests. The first
//! read or write failure, or a zero-length read, closes the connection.

use std::io;
use std::net::SocketAddr;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// Size of a single transport read.
pub const READ_CHUNK: usize = 8192;

pub struct Connection<S = TcpStream> {
    stream: Option<S>,
    peer: SocketAddr,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, peer: SocketAddr) -> Self {
        Self {
            stream: Some(stream),
            peer,
        }
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn peer_address(&self) -> String {
        self.peer.ip().to_string()
    }

    pub fn peer_port(&self) -> u16 {
        self.peer.port()
    }

    /// Appends the bytes of one stream read to `buf`, growing it by at least
    /// [`READ_CHUNK`] first.
    ///
    /// Returns 0 once the peer has closed; the connection is then closed too.
    pub async fn read_bytes(&mut self, buf: &mut BytesMut) -> io::Result<usize> {
        let stream = self.stream.as_mut().ok_or_else(closed_error)?;

        buf.reserve(READ_CHUNK);
        let result = stream.read_buf(buf).await;
        match result {
            Ok(0) => {
                self.close().await;
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(e) => {
                self.close().await;
                Err(e)
            }
        }
    }

    /// Writes all of `data` and flushes.
    pub async fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        let stream = self.stream.as_mut().ok_or_else(closed_error)?;

        let result = async {
            stream.write_all(data).await?;
            stream.flush().await
        }
        .await;

        if result.is_err() {
            self.close().await;
        }
        result
    }

    /// Shuts the stream down and releases it. Safe to call repeatedly.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                tracing::trace!(peer = %self.peer, error = %e, "Shutdown on close failed");
            }
        }
    }
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "connection already closed")
}

use std::fmt;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::http::response::Response;
use crate::http::transport::Connection;

const HTTP_VERSION: &str = "HTTP/1.1";

#[derive(Debug)]
pub enum WriteError {
    /// `Response::finalize` was not called before serialization.
    NotFinalized,
    /// The transport failed while sending; the connection is closed.
    Io(std::io::Error),
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::NotFinalized => f.write_str("response was not finalized"),
            WriteError::Io(e) => write!(f, "failed to send response: {}", e),
        }
    }
}

impl std::error::Error for WriteError {}

/// Renders a finalized response: status line, headers, one `Set-Cookie`
/// line per cookie, blank line, then the body bytes verbatim.
pub fn serialize_response(resp: &Response) -> Result<Vec<u8>, WriteError> {
    if !resp.is_finalized() {
        return Err(WriteError::NotFinalized);
    }

    let mut buf = Vec::with_capacity(256 + resp.body().len());

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status().as_u16(),
        resp.status().reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    for (k, v) in resp.headers().iter() {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    for cookie in resp.cookies() {
        buf.extend_from_slice(format!("Set-Cookie: {}\r\n", cookie).as_bytes());
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    // Body
    buf.extend_from_slice(resp.body());

    Ok(buf)
}

pub struct ResponseWriter {
    buffer: Vec<u8>,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Result<Self, WriteError> {
        Ok(Self {
            buffer: serialize_response(response)?,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub async fn write_to<S>(&self, connection: &mut Connection<S>) -> Result<(), WriteError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        connection
            .write_bytes(&self.buffer)
            .await
            .map_err(WriteError::Io)
    }
}

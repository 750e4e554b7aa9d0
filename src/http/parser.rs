use crate::http::headers::HeaderMap;
use crate::http::request::{Method, RequestTarget};

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Empty header block or a start line that is not three single-space separated tokens.
    InvalidRequest,
    InvalidMethod,
    InvalidVersion,
    /// Header block is not valid UTF-8.
    InvalidEncoding,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidRequest => f.write_str("malformed request line"),
            ParseError::InvalidMethod => f.write_str("unsupported method"),
            ParseError::InvalidVersion => f.write_str("unsupported HTTP version"),
            ParseError::InvalidEncoding => f.write_str("header block is not UTF-8"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Request line and headers of one request.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    pub target: RequestTarget,
    pub version: String,
    pub headers: HeaderMap,
}

impl RequestHead {
    /// Body length announced by `Content-Length`; missing, unparsable or
    /// non-positive values mean no body.
    pub fn content_length(&self) -> usize {
        self.headers
            .get("Content-Length")
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|len| *len > 0)
            .and_then(|len| usize::try_from(len).ok())
            .unwrap_or(0)
    }
}

/// Parses a header block (without the terminating blank line).
pub fn parse_request_head(header_bytes: &[u8]) -> Result<RequestHead, ParseError> {
    let headers_str =
        std::str::from_utf8(header_bytes).map_err(|_| ParseError::InvalidEncoding)?;

    let mut lines = headers_str.split("\r\n").filter(|line| !line.is_empty());

    // Request line
    let request_line = lines.next().ok_or(ParseError::InvalidRequest)?;
    // Exactly three tokens separated by single spaces
    let parts: Vec<&str> = request_line.split(' ').collect();
    let &[method_str, target, version] = parts.as_slice() else {
        return Err(ParseError::InvalidRequest);
    };
    if parts.iter().any(|token| token.is_empty()) {
        return Err(ParseError::InvalidRequest);
    }

    let method = Method::from_str(method_str).ok_or(ParseError::InvalidMethod)?;

    if !version.eq_ignore_ascii_case("HTTP/1.1") {
        return Err(ParseError::InvalidVersion);
    }

    // Headers
    let mut headers = HeaderMap::new();

    for line in lines {
        // Lines without a separator are ignored
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        headers.insert(
            key.trim(),
            value.trim_matches(|c| c == ' ' || c == '\t').to_string(),
        );
    }

    Ok(RequestHead {
        method,
        target: RequestTarget::parse(target),
        version: version.to_string(),
        headers,
    })
}

/// Position of the blank line that ends the header block, searching from
/// `from` so repeated scans over a growing buffer stay linear.
pub fn find_headers_end(buf: &[u8], from: usize) -> Option<usize> {
    let start = from.min(buf.len());
    buf[start..]
        .windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
        .map(|pos| start + pos)
}

/// Length of the header block including its terminator, if complete.
pub fn header_block_len(buf: &[u8]) -> Option<usize> {
    find_headers_end(buf, 0).map(|end| end + HEADER_TERMINATOR.len())
}

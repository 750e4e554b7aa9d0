use std::fmt;
use std::net::SocketAddr;

use bytes::Bytes;

use crate::http::headers::{CiMap, HeaderMap};

/// HTTP request methods understood by the server.
///
/// The declaration order is the table order used by the dispatch table and
/// by the `Allow` header of a 405 response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// CONNECT - Establish a tunnel
    CONNECT,
    /// DELETE - Delete a resource
    DELETE,
    /// GET - Retrieve a resource
    GET,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// TRACE - Message loop-back test
    TRACE,
}

impl Method {
    /// Number of slots in a per-method table.
    pub const COUNT: usize = 8;

    /// Every method, in table order.
    pub const ALL: [Method; Method::COUNT] = [
        Method::CONNECT,
        Method::DELETE,
        Method::GET,
        Method::HEAD,
        Method::OPTIONS,
        Method::POST,
        Method::PUT,
        Method::TRACE,
    ];

    /// Parses an HTTP method from a string, ignoring ASCII case.
    ///
    /// # Example
    ///
    /// ```
    /// # use tinyserve::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), Some(Method::GET));
    /// assert_eq!(Method::from_str("PATCH"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        Method::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::CONNECT => "CONNECT",
            Method::DELETE => "DELETE",
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::TRACE => "TRACE",
        }
    }

    /// Slot of this method in a per-method table.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request-target split into path, query parameters and fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestTarget {
    /// Path component, e.g. `/docs/index.html`
    pub path: String,
    /// Decoded query parameters; keys are case-insensitive
    pub query: CiMap<String>,
    /// Text after `#`, if any
    pub fragment: Option<String>,
}

impl RequestTarget {
    /// Splits a raw request-target such as `/search?q=rust#top`.
    ///
    /// Query pairs without `=` are ignored. An empty path becomes `/`.
    pub fn parse(raw: &str) -> Self {
        let (before_fragment, fragment) = match raw.split_once('#') {
            Some((head, fragment)) => (head, Some(fragment.to_string())),
            None => (raw, None),
        };

        let (path, query_str) = match before_fragment.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (before_fragment, None),
        };

        let mut query = CiMap::new();
        if let Some(query_str) = query_str {
            let pairs = query_str
                .split('&')
                .filter(|pair| pair.contains('='))
                .flat_map(|pair| url::form_urlencoded::parse(pair.as_bytes()));
            for (key, value) in pairs {
                query.insert(key.into_owned(), value.into_owned());
            }
        }

        Self {
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            query,
            fragment,
        }
    }
}

/// Represents a parsed HTTP request from a client.
///
/// Produced by the request framer once the header block and the whole
/// `Content-Length` body are available.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The parsed request-target
    pub target: RequestTarget,
    /// HTTP version literal (always `HTTP/1.1` for framed requests)
    pub version: String,
    /// Request headers; names are case-insensitive, last duplicate wins
    pub headers: HeaderMap,
    /// Body bytes, present only when `Content-Length` was > 0
    pub body: Option<Bytes>,
    /// Address of the connection the request arrived on
    pub peer: Option<SocketAddr>,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    method: Option<Method>,
    target: Option<RequestTarget>,
    version: Option<String>,
    headers: HeaderMap,
    body: Option<Bytes>,
    peer: Option<SocketAddr>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            target: None,
            version: None,
            headers: HeaderMap::new(),
            body: None,
            peer: None,
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the raw request-target; it is split into path, query and fragment.
    pub fn target(mut self, target: &str) -> Self {
        self.target = Some(RequestTarget::parse(target));
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the body and a matching `Content-Length` header.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        if body.is_empty() {
            self.headers.remove("Content-Length");
            self.body = None;
        } else {
            self.headers.insert("Content-Length", body.len().to_string());
            self.body = Some(body);
        }
        self
    }

    pub fn peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        Ok(Request {
            method: self.method.ok_or("method missing")?,
            target: self.target.ok_or("target missing")?,
            version: self.version.unwrap_or_else(|| "HTTP/1.1".to_string()),
            headers: self.headers,
            body: self.body,
            peer: self.peer,
        })
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    /// The request path without query or fragment.
    pub fn path(&self) -> &str {
        &self.target.path
    }

    /// Looks up a query parameter; the key is matched case-insensitively.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.target.query.get(key).map(|v| v.as_str())
    }

    /// Retrieves a header value by name, ignoring case.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }

    /// Length of the body that was read for this request.
    pub fn content_length(&self) -> usize {
        self.body.as_ref().map_or(0, |body| body.len())
    }

    /// True when the client asked for the connection to be closed.
    pub fn wants_close(&self) -> bool {
        self.header("Connection")
            .map(|v| v.eq_ignore_ascii_case("close"))
            .unwrap_or(false)
    }
}

//! HTTP request head handling.
//!
//! The request target is kept as raw bytes: it is handed to the handler untouched and
//! is not required to be valid UTF-8 or a valid URI.

use std::fmt;

use bytes::Bytes;
use http::Method;

use crate::protocol::HeaderFields;

/// `HTTP/<major>.<minor>` as found on a request or status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HttpVersion {
    major: u8,
    minor: u8,
}

impl HttpVersion {
    pub const HTTP_10: HttpVersion = HttpVersion { major: 1, minor: 0 };
    pub const HTTP_11: HttpVersion = HttpVersion { major: 1, minor: 1 };

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Parses exactly `HTTP/<digit>.<digit>`.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [b'H', b'T', b'T', b'P', b'/', major @ b'0'..=b'9', b'.', minor @ b'0'..=b'9'] => {
                Some(Self { major: major - b'0', minor: minor - b'0' })
            }
            _ => None,
        }
    }

    pub fn major(&self) -> u8 {
        self.major
    }

    pub fn minor(&self) -> u8 {
        self.minor
    }

    /// HTTP/1.1 and later keep the connection open unless told otherwise.
    pub fn is_persistent_by_default(&self) -> bool {
        *self >= Self::HTTP_11
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}

/// A parsed request head, immutable once the framer produced it.
#[derive(Debug, Clone)]
pub struct RequestHeader {
    method: Method,
    target: Bytes,
    version: HttpVersion,
    headers: HeaderFields,
}

impl RequestHeader {
    pub fn new(method: Method, target: Bytes, version: HttpVersion, headers: HeaderFields) -> Self {
        Self { method, target, version, headers }
    }

    /// Attaches a body to this header, converting it into a full [`Request`].
    pub fn body<T>(self, body: T) -> Request<T> {
        Request { head: self, body }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request target exactly as received.
    pub fn target(&self) -> &Bytes {
        &self.target
    }

    pub fn version(&self) -> HttpVersion {
        self.version
    }

    pub fn headers(&self) -> &HeaderFields {
        &self.headers
    }

    /// Whether an unframed request with this method is ambiguous rather than empty.
    ///
    /// Returns false for methods that typically don't have bodies:
    /// - GET
    /// - HEAD
    /// - DELETE
    /// - OPTIONS
    /// - CONNECT
    /// - TRACE
    pub fn need_body(&self) -> bool {
        !matches!(self.method, Method::GET | Method::HEAD | Method::DELETE | Method::OPTIONS | Method::CONNECT | Method::TRACE)
    }

    /// GET and HEAD must not carry a body at all.
    pub fn body_forbidden(&self) -> bool {
        matches!(self.method, Method::GET | Method::HEAD)
    }

    /// Whether the connection may be reused after this exchange.
    pub fn keep_alive(&self) -> bool {
        if self.headers.contains_token("connection", "close") {
            return false;
        }
        self.version.is_persistent_by_default() || self.headers.contains_token("connection", "keep-alive")
    }

    /// Whether the client waits for `100 Continue` before sending the body.
    pub fn expects_continue(&self) -> bool {
        self.headers.get("expect").is_some_and(|field| field.value().eq_ignore_ascii_case(b"100-continue"))
    }
}

/// A request as handed to the handler: the parsed head plus a lazily read body.
#[derive(Debug)]
pub struct Request<B> {
    head: RequestHeader,
    body: B,
}

impl<B> Request<B> {
    pub fn head(&self) -> &RequestHeader {
        &self.head
    }

    pub fn method(&self) -> &Method {
        self.head.method()
    }

    pub fn target(&self) -> &Bytes {
        self.head.target()
    }

    pub fn version(&self) -> HttpVersion {
        self.head.version()
    }

    pub fn headers(&self) -> &HeaderFields {
        self.head.headers()
    }

    pub fn body(&self) -> &B {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut B {
        &mut self.body
    }

    pub fn into_parts(self) -> (RequestHeader, B) {
        (self.head, self.body)
    }

    pub fn into_body(self) -> B {
        self.body
    }
}

//! HTTP response head types.
//!
//! Outgoing responses use `http::Response<()>` as their head, the body is attached
//! separately by the writer. Incoming response heads (read by [`ResponseDecoder`])
//! keep the raw header lines, like requests do.
//!
//! [`ResponseDecoder`]: crate::codec::ResponseDecoder

use bytes::Bytes;
use http::{Response, StatusCode};

use crate::protocol::{HeaderFields, HttpVersion};

/// Type alias for outgoing HTTP response headers.
pub type ResponseHead = Response<()>;

/// A response head parsed from the wire.
#[derive(Debug, Clone)]
pub struct ResponseHeader {
    version: HttpVersion,
    status: StatusCode,
    reason: Bytes,
    headers: HeaderFields,
}

impl ResponseHeader {
    pub fn new(version: HttpVersion, status: StatusCode, reason: Bytes, headers: HeaderFields) -> Self {
        Self { version, status, reason, headers }
    }

    pub fn version(&self) -> HttpVersion {
        self.version
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The reason phrase, possibly empty.
    pub fn reason(&self) -> &Bytes {
        &self.reason
    }

    pub fn headers(&self) -> &HeaderFields {
        &self.headers
    }

    /// 1xx, 204 and 304 responses never carry a body.
    pub fn body_forbidden(&self) -> bool {
        status_forbids_body(self.status)
    }
}

/// 1xx, 204 and 304 responses carry neither framing headers nor a body.
pub(crate) fn status_forbids_body(status: StatusCode) -> bool {
    status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED
}

use http::StatusCode;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ProtocolError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },
}

impl HttpError {
    /// Returns true if the error came from the underlying transport rather than from the peer's bytes.
    pub fn is_io(&self) -> bool {
        matches!(self, HttpError::RequestError { source: ProtocolError::Io { .. } } | HttpError::ResponseError { source: SendError::Io { .. } })
    }
}

/// Errors raised while framing an incoming message.
///
/// Every variant except [`ProtocolError::Io`] is the peer's fault and maps to a
/// status code through [`ProtocolError::status_code`].
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("invalid request line: {reason}")]
    BadRequestLine { reason: String },

    #[error("invalid header field: {reason}")]
    BadHeaderField { reason: String },

    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    HeaderTooLarge { current_size: usize, max_size: usize },

    #[error("invalid content-length header: {reason}")]
    BadContentLength { reason: String },

    #[error("body not allowed for method {method}")]
    BodyNotAllowed { method: String },

    #[error("unsupported transfer-encoding: {coding}")]
    UnsupportedTransferEncoding { coding: String },

    #[error("unexpected eof: {reason}")]
    UnexpectedEof { reason: String },

    #[error("invalid chunked body: {reason}")]
    InvalidChunk { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

/// Transport errors can't be cloned, the copy keeps their kind and message.
impl Clone for ProtocolError {
    fn clone(&self) -> Self {
        match self {
            Self::BadRequestLine { reason } => Self::BadRequestLine { reason: reason.clone() },
            Self::BadHeaderField { reason } => Self::BadHeaderField { reason: reason.clone() },
            Self::HeaderTooLarge { current_size, max_size } => Self::HeaderTooLarge { current_size: *current_size, max_size: *max_size },
            Self::BadContentLength { reason } => Self::BadContentLength { reason: reason.clone() },
            Self::BodyNotAllowed { method } => Self::BodyNotAllowed { method: method.clone() },
            Self::UnsupportedTransferEncoding { coding } => Self::UnsupportedTransferEncoding { coding: coding.clone() },
            Self::UnexpectedEof { reason } => Self::UnexpectedEof { reason: reason.clone() },
            Self::InvalidChunk { reason } => Self::InvalidChunk { reason: reason.clone() },
            Self::Io { source } => Self::Io { source: io::Error::new(source.kind(), source.to_string()) },
        }
    }
}

impl ProtocolError {
    pub fn bad_request_line<S: ToString>(str: S) -> Self {
        Self::BadRequestLine { reason: str.to_string() }
    }

    pub fn bad_header_field<S: ToString>(str: S) -> Self {
        Self::BadHeaderField { reason: str.to_string() }
    }

    pub fn header_too_large(current_size: usize, max_size: usize) -> Self {
        Self::HeaderTooLarge { current_size, max_size }
    }

    pub fn bad_content_length<S: ToString>(str: S) -> Self {
        Self::BadContentLength { reason: str.to_string() }
    }

    pub fn body_not_allowed<S: ToString>(method: S) -> Self {
        Self::BodyNotAllowed { method: method.to_string() }
    }

    pub fn unsupported_transfer_encoding<S: ToString>(coding: S) -> Self {
        Self::UnsupportedTransferEncoding { coding: coding.to_string() }
    }

    pub fn unexpected_eof<S: ToString>(str: S) -> Self {
        Self::UnexpectedEof { reason: str.to_string() }
    }

    pub fn invalid_chunk<S: ToString>(str: S) -> Self {
        Self::InvalidChunk { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// The status code a best-effort error response should carry, `None` for transport errors.
    pub fn status_code(&self) -> Option<StatusCode> {
        let status = match self {
            Self::BadRequestLine { .. }
            | Self::BadHeaderField { .. }
            | Self::BadContentLength { .. }
            | Self::BodyNotAllowed { .. }
            | Self::UnexpectedEof { .. }
            | Self::InvalidChunk { .. } => StatusCode::BAD_REQUEST,
            Self::HeaderTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedTransferEncoding { .. } => StatusCode::NOT_IMPLEMENTED,
            Self::Io { .. } => return None,
        };
        Some(status)
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

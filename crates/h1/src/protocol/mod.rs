//! Core HTTP protocol abstractions.
//!
//! # Architecture
//!
//! - **Message Handling** ([`message`]): Core message types and payload processing
//!   - [`Message`]: Represents either a head or a payload chunk
//!   - [`PayloadItem`]: A payload chunk or EOF
//!   - [`PayloadSize`]: How the body is delimited
//!
//! - **Header Fields** ([`header`]): raw header lines with exact-name lookup
//!
//! - **Request Processing** ([`request`]): [`RequestHeader`], [`Request`], [`HttpVersion`]
//!
//! - **Response Processing** ([`response`]): [`ResponseHead`] for outgoing and
//!   [`ResponseHeader`] for parsed responses
//!
//! - **Body Streaming** ([`body`]): [`body::ReqBody`], the lazy request body
//!
//! - **Error Handling** ([`error`]):
//!   - [`HttpError`]: Top-level error type
//!   - [`ProtocolError`]: Framing errors, each with a suggested status code
//!   - [`SendError`]: Response sending errors

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod header;
pub(crate) use header::is_token_char;
pub use header::HeaderField;
pub use header::HeaderFields;

mod request;
pub use request::HttpVersion;
pub use request::Request;
pub use request::RequestHeader;

mod response;
pub use response::ResponseHead;
pub use response::ResponseHeader;
pub(crate) use response::status_forbids_body;

mod error;
pub use error::HttpError;
pub use error::ProtocolError;
pub use error::SendError;

pub mod body;

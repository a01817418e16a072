//! Encoding and decoding of HTTP/1.1 messages.
//!
//! Every piece here is a `tokio_util::codec` [`Decoder`](tokio_util::codec::Decoder) or
//! [`Encoder`](tokio_util::codec::Encoder) working on a `BytesMut`, so they compose with
//! `FramedRead`/`FramedWrite` as well as with the hand driven loop in
//! [`connection`](crate::connection).
//!
//! - Request handling:
//!   - [`RequestDecoder`]: heads and bodies of incoming requests
//!   - [`HeaderDecoder`]: request heads only, including the body framing decision
//!
//! - Response handling:
//!   - [`ResponseEncoder`]: outgoing responses, picking `Content-Length` or chunked framing
//!   - [`ResponseDecoder`]: incoming responses, for the client side of a connection
//!
//! - Body strategies: [`PayloadDecoder`] and [`PayloadEncoder`]

mod body;
mod header;
mod request_decoder;
mod response_decoder;
mod response_encoder;

pub use body::{PayloadDecoder, PayloadEncoder};
pub use header::{HeaderBlockDecoder, HeaderDecoder, HeaderEncoder, ResponseHeaderDecoder};
pub use request_decoder::RequestDecoder;
pub use response_decoder::ResponseDecoder;
pub use response_encoder::ResponseEncoder;

//! Message body encoding and decoding.
//!
//! ## Decoders
//! - [`PayloadDecoder`]: picks one of the strategies below for a message
//!   - `LengthDecoder`: `Content-Length` framed bodies
//!   - `ChunkedDecoder`: chunked transfer coding, trailers skipped
//!   - close delimited bodies, for responses only
//!
//! ## Encoders
//! - [`PayloadEncoder`]: `Content-Length` or chunked framing for outgoing bodies

mod chunked_decoder;
mod chunked_encoder;
mod length_decoder;
mod length_encoder;
mod payload_decoder;
mod payload_encoder;

pub use payload_decoder::PayloadDecoder;
pub use payload_encoder::PayloadEncoder;

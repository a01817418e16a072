//! Head (start line plus header fields) encoding and decoding.
//!
//! - [`HeaderBlockDecoder`]: splits a complete header block off the buffer, enforcing
//!   the header size limit while the block is still incomplete
//! - [`HeaderDecoder`]: parses request heads and picks the request body framing
//! - [`ResponseHeaderDecoder`]: parses response heads and picks the response body framing
//! - [`HeaderEncoder`]: writes response heads, owning the framing headers

mod header_block;
mod header_decoder;
mod header_encoder;
mod response_header_decoder;

pub use header_block::HeaderBlockDecoder;
pub use header_decoder::HeaderDecoder;
pub use header_encoder::HeaderEncoder;
pub use response_header_decoder::ResponseHeaderDecoder;

//! Streaming request decoder.
//!
//! Decodes a request head with [`HeaderDecoder`], then the body with a
//! [`PayloadDecoder`] chosen from that head, then the next head, and so on. Fits
//! `tokio_util::codec::FramedRead` for callers that want a stream of [`Message`]s.
//!
//! ```
//! use bytes::BytesMut;
//! use micro_h1::codec::RequestDecoder;
//! use micro_h1::protocol::{Message, PayloadItem};
//! use tokio_util::codec::Decoder;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from(&b"POST /echo HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc"[..]);
//!
//! let Some(Message::Header((header, _))) = decoder.decode(&mut buffer).unwrap() else { panic!() };
//! assert_eq!(&header.target()[..], b"/echo");
//!
//! let Some(Message::Payload(PayloadItem::Chunk(body))) = decoder.decode(&mut buffer).unwrap() else { panic!() };
//! assert_eq!(&body[..], b"abc");
//! ```

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::codec::body::PayloadDecoder;
use crate::codec::header::HeaderDecoder;
use crate::config::DEFAULT_MAX_HEADER_BYTES;
use crate::protocol::{Message, PayloadItem, PayloadSize, ProtocolError, RequestHeader};

/// # State Machine
///
/// The decoder maintains its state through the `payload_decoder` field:
/// - `None`: Currently parsing headers
/// - `Some(PayloadDecoder)`: Currently parsing payload
#[derive(Debug)]
pub struct RequestDecoder {
    header_decoder: HeaderDecoder,
    payload_decoder: Option<PayloadDecoder>,
    max_header_bytes: usize,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Self::with_max_header_bytes(DEFAULT_MAX_HEADER_BYTES)
    }

    pub fn with_max_header_bytes(max_header_bytes: usize) -> Self {
        Self { header_decoder: HeaderDecoder::new(max_header_bytes), payload_decoder: None, max_header_bytes }
    }

    /// True while a body is being decoded.
    pub fn in_payload(&self) -> bool {
        self.payload_decoder.is_some()
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for RequestDecoder {
    type Item = Message<(RequestHeader, PayloadSize)>;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let item = payload_decoder.decode(src)?;
            if item.as_ref().is_some_and(PayloadItem::is_eof) {
                self.payload_decoder = None;
            }
            return Ok(item.map(Message::Payload));
        }

        let message = match self.header_decoder.decode(src)? {
            Some((header, payload_size)) => {
                self.payload_decoder = Some(PayloadDecoder::new(payload_size, self.max_header_bytes));
                Some(Message::Header((header, payload_size)))
            }
            None => None,
        };

        Ok(message)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let item = payload_decoder.decode_eof(src)?;
            if item.as_ref().is_some_and(PayloadItem::is_eof) {
                self.payload_decoder = None;
            }
            return Ok(item.map(Message::Payload));
        }

        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None if src.is_empty() => Ok(None),
            None => Err(ProtocolError::unexpected_eof(format!("connection closed with {} bytes of an incomplete request head", src.len()))),
        }
    }
}

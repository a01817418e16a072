//! Streaming response decoder, the client side counterpart of [`RequestDecoder`].
//!
//! Unlike requests, a response without any framing header is delimited by the peer
//! closing the connection, so the body only ends in [`Decoder::decode_eof`].
//!
//! [`RequestDecoder`]: crate::codec::RequestDecoder

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::codec::body::PayloadDecoder;
use crate::codec::header::ResponseHeaderDecoder;
use crate::config::DEFAULT_MAX_HEADER_BYTES;
use crate::protocol::{Message, PayloadItem, PayloadSize, ProtocolError, ResponseHeader};

#[derive(Debug)]
pub struct ResponseDecoder {
    header_decoder: ResponseHeaderDecoder,
    payload_decoder: Option<PayloadDecoder>,
    max_header_bytes: usize,
}

impl ResponseDecoder {
    pub fn new() -> Self {
        Self::with_max_header_bytes(DEFAULT_MAX_HEADER_BYTES)
    }

    pub fn with_max_header_bytes(max_header_bytes: usize) -> Self {
        Self { header_decoder: ResponseHeaderDecoder::new(max_header_bytes), payload_decoder: None, max_header_bytes }
    }
}

impl Default for ResponseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ResponseDecoder {
    type Item = Message<(ResponseHeader, PayloadSize)>;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let item = payload_decoder.decode(src)?;
            if item.as_ref().is_some_and(PayloadItem::is_eof) {
                self.payload_decoder = None;
            }
            return Ok(item.map(Message::Payload));
        }

        let Some((header, payload_size)) = self.header_decoder.decode(src)? else {
            return Ok(None);
        };
        self.payload_decoder = Some(PayloadDecoder::new(payload_size, self.max_header_bytes));
        Ok(Some(Message::Header((header, payload_size))))
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
            None => Err(ProtocolError::unexpected_eof(format!("connection closed with {} bytes of an incomplete response head", src.len()))),
        }
    }
}

//! Decoder for bodies framed by `Content-Length`.
//!
//! refer: <https://www.rfc-editor.org/rfc/rfc9112.html#name-content-length>

use std::cmp;

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::protocol::{PayloadItem, ProtocolError};

/// Hands out at most `length` bytes, in whatever pieces the buffer holds them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    /// The number of bytes remaining to be read from the payload
    length: u64,
}

impl LengthDecoder {
    pub fn new(length: u64) -> Self {
        Self { length }
    }

    pub fn remaining(&self) -> u64 {
        self.length
    }
}

impl Decoder for LengthDecoder {
    type Item = PayloadItem;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.length == 0 {
            return Ok(Some(PayloadItem::Eof));
        }

        if src.is_empty() {
            return Ok(None);
        }

        // never read into the next message
        let len = cmp::min(self.length, src.len() as u64);
        let bytes = src.split_to(len as usize).freeze();

        self.length -= bytes.len() as u64;
        Ok(Some(PayloadItem::Chunk(bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic() {
        let mut buffer: BytesMut = BytesMut::from(&b"101234567890abcdef\r\n\r\n"[..]);

        let mut length_decoder = LengthDecoder::new(10);
        let payload = length_decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(payload.is_chunk());

        let bytes = payload.as_bytes().unwrap();
        assert_eq!(&bytes[..], b"1012345678");
        assert_eq!(&buffer[..], b"90abcdef\r\n\r\n");

        assert!(length_decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
    }

    #[test]
    fn arbitrary_boundaries() {
        let body = b"0123456789abcdefghij";
        for split in 1..body.len() {
            let mut decoder = LengthDecoder::new(body.len() as u64);
            let mut buffer = BytesMut::new();
            let mut received = Vec::new();

            for piece in body.chunks(split) {
                buffer.extend_from_slice(piece);
                while let Some(PayloadItem::Chunk(bytes)) = decoder.decode(&mut buffer).unwrap() {
                    received.extend_from_slice(&bytes);
                }
            }

            assert_eq!(received, body);
            assert_eq!(decoder.remaining(), 0);
            assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
        }
    }

    #[test]
    fn waits_for_more() {
        let mut decoder = LengthDecoder::new(4);
        let mut buffer = BytesMut::from(&b"ab"[..]);
        decoder.decode(&mut buffer).unwrap();
        assert!(decoder.decode(&mut buffer).unwrap().is_none());
        assert_eq!(decoder.remaining(), 2);
    }
}

use bytes::{Buf, BytesMut};
use tokio_util::codec::Encoder;

use crate::codec::body::chunked_encoder::ChunkedEncoder;
use crate::codec::body::length_encoder::LengthEncoder;
use crate::protocol::{PayloadItem, PayloadSize, SendError};

/// Encodes a response body with the framing announced in its head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadEncoder {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    /// content-length payload
    Length(LengthEncoder),

    /// transfer-encoding chunked payload
    Chunked(ChunkedEncoder),

    /// no body on the wire, chunks are discarded
    NoBody { eof: bool },
}

impl PayloadEncoder {
    pub fn empty() -> Self {
        Self { kind: Kind::NoBody { eof: false } }
    }

    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedEncoder::new()) }
    }

    pub fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthEncoder::new(size)) }
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, Kind::NoBody { .. })
    }

    /// True once the end of the body has been encoded.
    pub fn is_finish(&self) -> bool {
        match &self.kind {
            Kind::Length(encoder) => encoder.is_finish(),
            Kind::Chunked(encoder) => encoder.is_finish(),
            Kind::NoBody { eof } => *eof,
        }
    }
}

/// A close delimited body can't be sent on a connection we want to keep, so it goes out chunked.
impl From<PayloadSize> for PayloadEncoder {
    fn from(payload_size: PayloadSize) -> Self {
        match payload_size {
            PayloadSize::Length(size) => PayloadEncoder::fix_length(size),
            PayloadSize::Chunked | PayloadSize::UntilClose => PayloadEncoder::chunked(),
            PayloadSize::Empty => PayloadEncoder::empty(),
        }
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for PayloadEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match &mut self.kind {
            Kind::Length(encoder) => encoder.encode(item, dst),
            Kind::Chunked(encoder) => encoder.encode(item, dst),
            Kind::NoBody { eof } => {
                *eof = item.is_eof();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn framing_follows_payload_size() {
        assert!(PayloadEncoder::from(PayloadSize::Length(3)) == PayloadEncoder::fix_length(3));
        assert!(PayloadEncoder::from(PayloadSize::Chunked).is_chunked());
        assert!(PayloadEncoder::from(PayloadSize::UntilClose).is_chunked());
        assert!(PayloadEncoder::from(PayloadSize::Empty).is_empty());
    }

    #[test]
    fn no_body_writes_nothing() {
        let mut encoder = PayloadEncoder::empty();
        let mut buf = BytesMut::new();

        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"ignored")), &mut buf).unwrap();
        assert!(!encoder.is_finish());
        encoder.encode(PayloadItem::<Bytes>::Eof, &mut buf).unwrap();

        assert!(buf.is_empty());
        assert!(encoder.is_finish());
    }

    #[test]
    fn chunked_body() {
        let mut encoder = PayloadEncoder::chunked();
        let mut buf = BytesMut::new();

        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"hello world")), &mut buf).unwrap();
        encoder.encode(PayloadItem::<Bytes>::Eof, &mut buf).unwrap();

        assert_eq!(&buf[..], b"B\r\nhello world\r\n0\r\n\r\n");
        assert!(encoder.is_finish());
    }
}

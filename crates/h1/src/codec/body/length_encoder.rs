//! Content-Length framed body encoding.
//!
//! The declared length is a promise to the peer: writing more bytes than declared, or
//! ending the body early, would desync the connection, so both fail the send.

use bytes::{BufMut, Buf, BytesMut};
use tokio_util::codec::Encoder;

use crate::protocol::{PayloadItem, SendError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthEncoder {
    /// bytes still owed to the peer
    remaining: u64,
    eof: bool,
}

impl LengthEncoder {
    pub fn new(length: u64) -> Self {
        Self { remaining: length, eof: false }
    }

    pub fn is_finish(&self) -> bool {
        self.eof
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for LengthEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            PayloadItem::Chunk(bytes) => {
                let len = bytes.remaining() as u64;
                if len > self.remaining {
                    return Err(SendError::invalid_body(format!("body chunk of {len} bytes exceeds the {} bytes left of content-length", self.remaining)));
                }
                self.remaining -= len;
                dst.put(bytes);
                Ok(())
            }
            PayloadItem::Eof => {
                if self.remaining > 0 {
                    return Err(SendError::invalid_body(format!("body ended {} bytes short of content-length", self.remaining)));
                }
                self.eof = true;
                Ok(())
            }
        }
    }
}

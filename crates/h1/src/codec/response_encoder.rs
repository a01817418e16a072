//! Streaming response encoder.
//!
//! Takes a [`Message::Header`] followed by payload items up to [`PayloadItem::Eof`];
//! anything out of that order is rejected rather than producing a corrupt stream.

use std::io;
use std::io::ErrorKind;

use bytes::{Buf, BytesMut};
use tokio_util::codec::Encoder;
use tracing::error;

use crate::codec::body::PayloadEncoder;
use crate::codec::header::HeaderEncoder;
use crate::protocol::{Message, PayloadItem, PayloadSize, ResponseHead, SendError};

#[derive(Debug, Default)]
pub struct ResponseEncoder {
    header_encoder: HeaderEncoder,
    payload_encoder: Option<PayloadEncoder>,
}

impl ResponseEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the head only, leaving the encoder ready for the next response.
    ///
    /// Used for responses to HEAD requests, which announce a body they never send.
    pub fn encode_head_only(&mut self, head: ResponseHead, payload_size: PayloadSize, dst: &mut BytesMut) -> Result<(), SendError> {
        if self.payload_encoder.is_some() {
            error!("expect payload item but receive response head");
            return Err(io::Error::from(ErrorKind::InvalidInput).into());
        }
        self.header_encoder.encode((head, payload_size), dst)
    }
}

impl<D: Buf> Encoder<Message<(ResponseHead, PayloadSize), D>> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: Message<(ResponseHead, PayloadSize), D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            Message::Header((head, payload_size)) => {
                if self.payload_encoder.is_some() {
                    error!("expect payload item but receive response head");
                    return Err(io::Error::from(ErrorKind::InvalidInput).into());
                }

                self.payload_encoder = Some(payload_size.into());
                self.header_encoder.encode((head, payload_size), dst)
            }

            Message::Payload(payload_item) => {
                let Some(payload_encoder) = &mut self.payload_encoder else {
                    error!("expect response header but receive payload item");
                    return Err(io::Error::from(ErrorKind::InvalidInput).into());
                };

                let is_eof = matches!(payload_item, PayloadItem::Eof);
                let result = payload_encoder.encode(payload_item, dst);

                if is_eof || result.is_err() {
                    self.payload_encoder = None;
                }

                result
            }
        }
    }
}

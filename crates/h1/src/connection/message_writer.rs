use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Encoder;

use crate::codec::ResponseEncoder;
use crate::connection::RawConnection;
use crate::protocol::{Message, PayloadSize, ResponseHead, SendError};

/// Stages encoded response bytes until they are flushed to the connection.
#[derive(Debug)]
pub struct MessageWriter {
    buffer: BytesMut,
    encoder: ResponseEncoder,
}

impl MessageWriter {
    pub fn with_capacity(buffer_size: usize) -> Self {
        Self { buffer: BytesMut::with_capacity(buffer_size), encoder: ResponseEncoder::new() }
    }

    #[inline]
    pub fn write<D>(&mut self, item: Message<(ResponseHead, PayloadSize), D>) -> Result<(), SendError>
    where
        D: Buf,
    {
        self.encoder.encode(item, &mut self.buffer)
    }

    /// Stages a head without body, see [`ResponseEncoder::encode_head_only`].
    #[inline]
    pub fn write_head_only(&mut self, head: ResponseHead, payload_size: PayloadSize) -> Result<(), SendError> {
        self.encoder.encode_head_only(head, payload_size, &mut self.buffer)
    }

    /// Bytes staged but not flushed yet.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub async fn flush<R, W>(&mut self, conn: &mut RawConnection<R, W>) -> Result<(), SendError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let bytes = self.buffer.split();
        conn.write(&bytes).await?;
        Ok(())
    }
}

//! Request side of a connection: heads and body pieces pulled out of the read buffer.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::buffer::DynamicBuffer;
use crate::codec::{HeaderDecoder, PayloadDecoder};
use crate::config::ConnectionConfig;
use crate::connection::RawConnection;
use crate::protocol::body::PayloadSource;
use crate::protocol::{PayloadItem, PayloadSize, ProtocolError, RequestHeader};

/// Owns the read buffer and the decoders for the message currently being read.
///
/// The body decoder is created together with the head and cleared once the body is
/// complete, so a head is never decoded out of leftover body bytes.
#[derive(Debug)]
pub struct MessageReader {
    buffer: DynamicBuffer,
    header_decoder: HeaderDecoder,
    payload_decoder: Option<PayloadDecoder>,
    max_header_bytes: usize,
}

impl MessageReader {
    pub fn new(config: &ConnectionConfig) -> Self {
        Self {
            buffer: DynamicBuffer::with_capacity(config.get_buffer_capacity()),
            header_decoder: HeaderDecoder::new(config.get_max_header_bytes()),
            payload_decoder: None,
            max_header_bytes: config.get_max_header_bytes(),
        }
    }

    /// Reads until a complete request head is buffered.
    ///
    /// `Ok(None)` means the peer closed the connection between requests. A close in
    /// the middle of a head is an [`ProtocolError::UnexpectedEof`].
    pub async fn read_header<R, W>(&mut self, conn: &mut RawConnection<R, W>) -> Result<Option<(RequestHeader, PayloadSize)>, ProtocolError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        debug_assert!(self.payload_decoder.is_none(), "previous body must be read before the next head");

        loop {
            if let Some((header, payload_size)) = self.header_decoder.decode(self.buffer.as_bytes_mut())? {
                self.payload_decoder = Some(PayloadDecoder::new(payload_size, self.max_header_bytes));
                return Ok(Some((header, payload_size)));
            }

            match conn.read().await.map_err(ProtocolError::io)? {
                Some(bytes) => self.buffer.append(&bytes),
                None if self.buffer.is_empty() => {
                    trace!("connection closed between requests");
                    return Ok(None);
                }
                None => {
                    return Err(ProtocolError::unexpected_eof(format!(
                        "connection closed with {} bytes of an incomplete request head",
                        self.buffer.len()
                    )));
                }
            }
        }
    }

    /// Reads the next piece of the current body.
    ///
    /// Buffered bytes are used first, the connection is only read when they don't
    /// make up a piece. Returns [`PayloadItem::Eof`] when there is no body left.
    pub async fn read_payload<R, W>(&mut self, conn: &mut RawConnection<R, W>) -> Result<PayloadItem, ProtocolError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let Some(payload_decoder) = self.payload_decoder.as_mut() else {
            return Ok(PayloadItem::Eof);
        };

        let item = loop {
            if let Some(item) = payload_decoder.decode(self.buffer.as_bytes_mut())? {
                break item;
            }

            match conn.read().await.map_err(ProtocolError::io)? {
                Some(bytes) => self.buffer.append(&bytes),
                None => break payload_decoder.decode_eof(self.buffer.as_bytes_mut())?.unwrap_or(PayloadItem::Eof),
            }
        };

        if item.is_eof() {
            self.payload_decoder = None;
        }
        Ok(item)
    }

    /// Bytes buffered but not consumed yet.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

/// A [`MessageReader`] bound to its connection, the source feeding a request body.
#[derive(Debug)]
pub(crate) struct PayloadReader<'a, R, W> {
    reader: &'a mut MessageReader,
    conn: &'a mut RawConnection<R, W>,
}

impl<'a, R, W> PayloadReader<'a, R, W> {
    pub(crate) fn new(reader: &'a mut MessageReader, conn: &'a mut RawConnection<R, W>) -> Self {
        Self { reader, conn }
    }
}

impl<R, W> PayloadSource for PayloadReader<'_, R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    fn read_payload(&mut self) -> impl Future<Output = Result<PayloadItem, ProtocolError>> + Send {
        self.reader.read_payload(self.conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::Method;
    use tokio::io::{duplex, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};

    fn connection() -> (DuplexStream, RawConnection<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>) {
        let (client, server) = duplex(1024);
        let (server_read, server_write) = tokio::io::split(server);
        (client, RawConnection::new(server_read, server_write))
    }

    #[tokio::test]
    async fn head_then_body() {
        let (mut client, mut conn) = connection();
        let mut reader = MessageReader::new(&ConnectionConfig::default());

        client.write_all(b"POST /echo HTTP/1.1\r\nContent-Length: 5\r\n\r\nhel").await.unwrap();
        let (header, payload_size) = reader.read_header(&mut conn).await.unwrap().unwrap();
        assert_eq!(*header.method(), Method::POST);
        assert_eq!(payload_size, PayloadSize::Length(5));

        assert_eq!(reader.read_payload(&mut conn).await.unwrap(), PayloadItem::Chunk(Bytes::from_static(b"hel")));

        client.write_all(b"lo").await.unwrap();
        assert_eq!(reader.read_payload(&mut conn).await.unwrap(), PayloadItem::Chunk(Bytes::from_static(b"lo")));
        assert_eq!(reader.read_payload(&mut conn).await.unwrap(), PayloadItem::Eof);
        assert_eq!(reader.read_payload(&mut conn).await.unwrap(), PayloadItem::Eof);
    }

    #[tokio::test]
    async fn pipelined_requests() {
        let (mut client, mut conn) = connection();
        let mut reader = MessageReader::new(&ConnectionConfig::default());

        client.write_all(b"GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n").await.unwrap();

        let (header, _) = reader.read_header(&mut conn).await.unwrap().unwrap();
        assert_eq!(&header.target()[..], b"/a");
        assert_eq!(reader.read_payload(&mut conn).await.unwrap(), PayloadItem::Eof);

        let (header, _) = reader.read_header(&mut conn).await.unwrap().unwrap();
        assert_eq!(&header.target()[..], b"/b");
        assert_eq!(reader.read_payload(&mut conn).await.unwrap(), PayloadItem::Eof);
        assert_eq!(reader.buffered(), 0);
    }

    #[tokio::test]
    async fn clean_close_between_requests() {
        let (client, mut conn) = connection();
        let mut reader = MessageReader::new(&ConnectionConfig::default());

        drop(client);
        assert!(reader.read_header(&mut conn).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn close_inside_head() {
        let (mut client, mut conn) = connection();
        let mut reader = MessageReader::new(&ConnectionConfig::default());

        client.write_all(b"GET / HTTP/1.1\r\nHost: x").await.unwrap();
        drop(client);
        let result = reader.read_header(&mut conn).await;
        assert!(matches!(result, Err(ProtocolError::UnexpectedEof { .. })));
    }

    #[tokio::test]
    async fn close_inside_body() {
        let (mut client, mut conn) = connection();
        let mut reader = MessageReader::new(&ConnectionConfig::default());

        client.write_all(b"PUT / HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc").await.unwrap();
        drop(client);

        reader.read_header(&mut conn).await.unwrap().unwrap();
        assert_eq!(reader.read_payload(&mut conn).await.unwrap(), PayloadItem::Chunk(Bytes::from_static(b"abc")));
        let result = reader.read_payload(&mut conn).await;
        assert!(matches!(result, Err(ProtocolError::UnexpectedEof { .. })));
    }

    #[tokio::test]
    async fn header_bound_applies_across_reads() {
        let (mut client, mut conn) = connection();
        let config = ConnectionConfig::default().max_header_bytes(64);
        let mut reader = MessageReader::new(&config);

        client.write_all(b"GET / HTTP/1.1\r\n").await.unwrap();
        client.write_all(&[b'a'; 100]).await.unwrap();
        let result = reader.read_header(&mut conn).await;
        assert!(matches!(result, Err(ProtocolError::HeaderTooLarge { max_size: 64, .. })));
    }
}

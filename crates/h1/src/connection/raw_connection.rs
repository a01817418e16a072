//! The transport end of a connection.
//!
//! [`RawConnection`] turns an [`AsyncRead`]/[`AsyncWrite`] pair into a read/write
//! contract with an explicit end of stream and a sticky error state: once the
//! transport failed, every later call fails with the same kind and message.
//!
//! Reads pull at most one chunk (`read_chunk_size`) per call and nothing while no
//! read is in progress, so a peer sending faster than we consume is held back by
//! the transport's own flow control. Every read takes `&mut self`, which makes a
//! second concurrent read impossible.

use std::io;
use std::io::ErrorKind;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{trace, warn};

use crate::config::ConnectionConfig;

#[derive(Debug)]
pub struct RawConnection<R, W> {
    reader: R,
    writer: W,
    read_buf: BytesMut,
    read_chunk_size: usize,
    idle_timeout: Option<Duration>,
    error: Option<(ErrorKind, String)>,
    eof: bool,
}

impl<R, W> RawConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_config(reader, writer, &ConnectionConfig::default())
    }

    pub fn with_config(reader: R, writer: W, config: &ConnectionConfig) -> Self {
        Self {
            reader,
            writer,
            read_buf: BytesMut::new(),
            read_chunk_size: config.get_read_chunk_size(),
            idle_timeout: config.get_idle_timeout(),
            error: None,
            eof: false,
        }
    }

    /// Waits for the next delivery from the peer.
    ///
    /// Returns `Ok(None)` once the peer closed its sending side, and keeps returning it.
    pub async fn read(&mut self) -> io::Result<Option<Bytes>> {
        self.check()?;
        if self.eof {
            return Ok(None);
        }

        self.read_buf.reserve(self.read_chunk_size);
        let mut limited = (&mut self.read_buf).limit(self.read_chunk_size);
        let result = match self.idle_timeout {
            Some(idle_timeout) => match tokio::time::timeout(idle_timeout, self.reader.read_buf(&mut limited)).await {
                Ok(result) => result,
                Err(elapsed) => Err(io::Error::new(ErrorKind::TimedOut, elapsed)),
            },
            None => self.reader.read_buf(&mut limited).await,
        };

        match result {
            Ok(0) => {
                trace!("peer closed the connection");
                self.eof = true;
                Ok(None)
            }
            Ok(n) => {
                trace!(n, "read from connection");
                Ok(Some(self.read_buf.split().freeze()))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Writes all of `bytes` and flushes them, an empty slice is a no-op.
    pub async fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.check()?;
        if bytes.is_empty() {
            return Ok(());
        }

        let result = match self.writer.write_all(bytes).await {
            Ok(()) => self.writer.flush().await,
            Err(e) => Err(e),
        };
        result.map_err(|e| self.fail(e))
    }

    /// Shuts down the writing side, the peer sees end of stream.
    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.check()?;
        self.writer.shutdown().await.map_err(|e| self.fail(e))
    }

    pub fn is_eof(&self) -> bool {
        self.eof
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }

    fn check(&self) -> io::Result<()> {
        match &self.error {
            Some((kind, message)) => Err(io::Error::new(*kind, message.clone())),
            None => Ok(()),
        }
    }

    fn fail(&mut self, e: io::Error) -> io::Error {
        warn!(cause = %e, "connection failed");
        self.error = Some((e.kind(), e.to_string()));
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::{duplex, ReadBuf};

    /// A reader that fails every read.
    struct BrokenReader;

    impl AsyncRead for BrokenReader {
        fn poll_read(self: Pin<&mut Self>, _cx: &mut Context<'_>, _buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(ErrorKind::ConnectionReset, "reset by peer")))
        }
    }

    #[tokio::test]
    async fn read_then_eof() {
        let (mut client, server) = duplex(64);
        let (server_read, server_write) = tokio::io::split(server);
        let mut conn = RawConnection::new(server_read, server_write);

        client.write_all(b"hello").await.unwrap();
        assert_eq!(conn.read().await.unwrap(), Some(Bytes::from_static(b"hello")));

        drop(client);
        assert_eq!(conn.read().await.unwrap(), None);
        assert!(conn.is_eof());
        assert_eq!(conn.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn read_is_bounded_by_chunk_size() {
        let (mut client, server) = duplex(64);
        let (server_read, server_write) = tokio::io::split(server);
        let config = ConnectionConfig::default().read_chunk_size(4);
        let mut conn = RawConnection::with_config(server_read, server_write, &config);

        client.write_all(b"abcdefghij").await.unwrap();
        assert_eq!(conn.read().await.unwrap().unwrap(), Bytes::from_static(b"abcd"));
        assert_eq!(conn.read().await.unwrap().unwrap(), Bytes::from_static(b"efgh"));
        assert_eq!(conn.read().await.unwrap().unwrap(), Bytes::from_static(b"ij"));
    }

    #[tokio::test]
    async fn write_reaches_peer() {
        let (mut client, server) = duplex(64);
        let (server_read, server_write) = tokio::io::split(server);
        let mut conn = RawConnection::new(server_read, server_write);

        conn.write(b"").await.unwrap();
        conn.write(b"HTTP/1.1 200 OK\r\n\r\n").await.unwrap();
        conn.shutdown().await.unwrap();

        let mut received = Vec::new();
        client.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"HTTP/1.1 200 OK\r\n\r\n");
    }

    #[tokio::test]
    async fn error_is_sticky() {
        let mut conn = RawConnection::new(BrokenReader, tokio::io::sink());

        let first = conn.read().await.unwrap_err();
        assert_eq!(first.kind(), ErrorKind::ConnectionReset);

        let second = conn.read().await.unwrap_err();
        assert_eq!(second.kind(), ErrorKind::ConnectionReset);
        assert_eq!(second.to_string(), "reset by peer");

        let write = conn.write(b"data").await.unwrap_err();
        assert_eq!(write.kind(), ErrorKind::ConnectionReset);
    }

    #[tokio::test]
    async fn idle_read_times_out() {
        let (_client, server) = duplex(64);
        let (server_read, server_write) = tokio::io::split(server);
        let config = ConnectionConfig::default().idle_timeout(Duration::from_millis(20));
        let mut conn = RawConnection::with_config(server_read, server_write, &config);

        let e = conn.read().await.unwrap_err();
        assert_eq!(e.kind(), ErrorKind::TimedOut);
        assert_eq!(conn.read().await.unwrap_err().kind(), ErrorKind::TimedOut);
    }
}

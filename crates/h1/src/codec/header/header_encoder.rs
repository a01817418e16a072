//! Response head serialization.
//!
//! The framing headers are owned by the encoder: whatever `Content-Length` or
//! `Transfer-Encoding` the caller put on the response is dropped, and the value
//! matching the chosen [`PayloadSize`] is written instead.

use std::io;
use std::io::{ErrorKind, Write};

use bytes::{BufMut, BytesMut};
use http::{header, Version};
use tokio_util::codec::Encoder;
use tracing::{error, warn};

use crate::protocol::{status_forbids_body, PayloadSize, ResponseHead, SendError};

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

/// Encoder for response heads implementing the [`Encoder`] trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderEncoder;

impl Encoder<(ResponseHead, PayloadSize)> for HeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, item: (ResponseHead, PayloadSize), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (header, payload_size) = item;
        let status = header.status();

        dst.reserve(INIT_HEADER_SIZE);
        match header.version() {
            // a 1.0 client understands a 1.1 status line, the framing we pick is 1.0 safe
            Version::HTTP_10 | Version::HTTP_11 => {
                write!(FastWrite(dst), "HTTP/1.1 {} {}\r\n", status.as_str(), status.canonical_reason().unwrap_or(""))?;
            }
            v => {
                error!(http_version = ?v, "unsupported http version");
                return Err(io::Error::from(ErrorKind::Unsupported).into());
            }
        }

        for (header_name, header_value) in header.headers() {
            if *header_name == header::CONTENT_LENGTH || *header_name == header::TRANSFER_ENCODING {
                warn!(header = %header_name, "drop caller supplied framing header");
                continue;
            }
            dst.put_slice(header_name.as_ref());
            dst.put_slice(b": ");
            dst.put_slice(header_value.as_ref());
            dst.put_slice(b"\r\n");
        }

        if !status_forbids_body(status) {
            match payload_size {
                PayloadSize::Length(n) => write!(FastWrite(dst), "content-length: {n}\r\n")?,
                PayloadSize::Chunked | PayloadSize::UntilClose => dst.put_slice(b"transfer-encoding: chunked\r\n"),
                PayloadSize::Empty => dst.put_slice(b"content-length: 0\r\n"),
            }
        }

        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// [`Write`] adapter appending to a [`BytesMut`], used with `write!`.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

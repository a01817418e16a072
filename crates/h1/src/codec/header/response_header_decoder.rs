//! Response head decoding, for the client side of a connection.
//!
//! Status lines look like `HTTP/1.1 200 OK`; the reason phrase is optional and may
//! contain spaces. Header lines follow the same grammar as on requests.

use bytes::{Bytes, BytesMut};
use http::StatusCode;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::header::header_block::{split_lines, HeaderBlockDecoder};
use crate::codec::header::header_decoder::{check_chunked, content_length};
use crate::protocol::{HeaderField, HeaderFields, HttpVersion, PayloadSize, ProtocolError, ResponseHeader};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHeaderDecoder {
    block_decoder: HeaderBlockDecoder,
}

impl ResponseHeaderDecoder {
    pub fn new(max_header_bytes: usize) -> Self {
        Self { block_decoder: HeaderBlockDecoder::new(max_header_bytes) }
    }
}

impl Decoder for ResponseHeaderDecoder {
    type Item = (ResponseHeader, PayloadSize);
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(block) = self.block_decoder.decode(src)? else {
            return Ok(None);
        };

        let mut lines = split_lines(&block);
        let status_line = lines.next().unwrap_or_default();
        let (version, status, reason) = parse_status_line(&status_line)?;

        let mut headers = HeaderFields::with_capacity(16);
        for line in lines {
            headers.push(HeaderField::parse(line)?);
        }

        let header = ResponseHeader::new(version, status, reason, headers);
        let payload_size = parse_payload(&header)?;
        trace!(status = header.status().as_u16(), ?payload_size, "decoded response head");

        Ok(Some((header, payload_size)))
    }
}

fn parse_status_line(line: &Bytes) -> Result<(HttpVersion, StatusCode, Bytes), ProtocolError> {
    let mut parts = line.splitn(3, |b| *b == b' ');
    let (Some(version), Some(code)) = (parts.next(), parts.next()) else {
        return Err(ProtocolError::bad_request_line(format!("invalid status line {}", line.escape_ascii())));
    };

    let version = HttpVersion::parse(version)
        .ok_or_else(|| ProtocolError::bad_request_line(format!("invalid http version {}", version.escape_ascii())))?;

    let status = match code {
        [b'1'..=b'9', b'0'..=b'9', b'0'..=b'9'] => StatusCode::from_bytes(code).ok(),
        _ => None,
    }
    .ok_or_else(|| ProtocolError::bad_request_line(format!("invalid status code {}", code.escape_ascii())))?;

    let reason = parts.next().map(|reason| line.slice_ref(reason)).unwrap_or_default();
    Ok((version, status, reason))
}

/// Response framing, in the order of RFC 9112 section 6.3.
fn parse_payload(header: &ResponseHeader) -> Result<PayloadSize, ProtocolError> {
    if header.body_forbidden() {
        return Ok(PayloadSize::new_empty());
    }
    if let Some(field) = header.headers().get(http::header::TRANSFER_ENCODING.as_str()) {
        check_chunked(field)?;
        return Ok(PayloadSize::new_chunked());
    }

    match content_length(header.headers())? {
        Some(length) => Ok(PayloadSize::new_length(length)),
        None => Ok(PayloadSize::new_until_close()),
    }
}

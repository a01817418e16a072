//! Request head decoding.
//!
//! [`HeaderDecoder`] waits for a complete header block, then parses the request line
//! and every header line by hand. Header lines are kept as raw bytes: names keep their
//! original casing, which `http::HeaderMap` would not preserve. Once the head is
//! parsed, the framing headers decide how the body is delimited.

use bytes::{Bytes, BytesMut};
use http::Method;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::header::header_block::{split_lines, HeaderBlockDecoder};
use crate::ensure;
use crate::protocol::{is_token_char, HeaderField, HeaderFields, HttpVersion, PayloadSize, ProtocolError, RequestHeader};

/// Decoder for request heads implementing the [`Decoder`] trait.
///
/// Yields the parsed [`RequestHeader`] together with the [`PayloadSize`] derived from
/// its `Content-Length` and `Transfer-Encoding` fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderDecoder {
    block_decoder: HeaderBlockDecoder,
}

impl HeaderDecoder {
    pub fn new(max_header_bytes: usize) -> Self {
        Self { block_decoder: HeaderBlockDecoder::new(max_header_bytes) }
    }
}

impl Decoder for HeaderDecoder {
    type Item = (RequestHeader, PayloadSize);
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(block) = self.block_decoder.decode(src)? else {
            return Ok(None);
        };

        let mut lines = split_lines(&block);
        let request_line = lines.next().unwrap_or_default();
        let (method, target, version) = parse_request_line(&request_line)?;

        let mut headers = HeaderFields::with_capacity(16);
        for line in lines {
            headers.push(HeaderField::parse(line)?);
        }

        let header = RequestHeader::new(method, target, version, headers);
        let payload_size = parse_payload(&header)?;
        trace!(method = %header.method(), %version, header_count = header.headers().len(), ?payload_size, "decoded request head");

        Ok(Some((header, payload_size)))
    }
}

/// `METHOD SP target SP HTTP/D.D`, with exactly one space between the parts.
fn parse_request_line(line: &Bytes) -> Result<(Method, Bytes, HttpVersion), ProtocolError> {
    let mut parts = line.split(|b| *b == b' ');
    let (Some(method), Some(target), Some(version), None) = (parts.next(), parts.next(), parts.next(), parts.next()) else {
        return Err(ProtocolError::bad_request_line(format!("expect 3 space separated parts in {:?}", line.escape_ascii().to_string())));
    };

    ensure!(!method.is_empty(), ProtocolError::bad_request_line("empty method"));
    ensure!(
        method.iter().copied().all(is_token_char),
        ProtocolError::bad_request_line(format!("method {} is not a token", method.escape_ascii()))
    );
    let method = Method::from_bytes(method).map_err(ProtocolError::bad_request_line)?;

    ensure!(!target.is_empty(), ProtocolError::bad_request_line("empty request target"));
    ensure!(
        target.iter().all(|b| b.is_ascii_graphic() || *b >= 0x80),
        ProtocolError::bad_request_line("request target contains whitespace or control characters")
    );
    let target = line.slice_ref(target);

    let version = HttpVersion::parse(version)
        .ok_or_else(|| ProtocolError::bad_request_line(format!("invalid http version {}", version.escape_ascii())))?;

    Ok((method, target, version))
}

/// Picks the body framing of a request.
///
/// refer: <https://www.rfc-editor.org/rfc/rfc9112.html#name-message-body-length>
fn parse_payload(header: &RequestHeader) -> Result<PayloadSize, ProtocolError> {
    let transfer_encoding = header.headers().get(http::header::TRANSFER_ENCODING.as_str());
    let content_length = content_length(header.headers())?;

    let payload_size = match (transfer_encoding, content_length) {
        (Some(_), Some(_)) => {
            return Err(ProtocolError::bad_content_length("transfer-encoding and content-length both present in headers"));
        }
        (Some(field), None) => {
            check_chunked(field)?;
            PayloadSize::new_chunked()
        }
        (None, Some(length)) => PayloadSize::new_length(length),
        (None, None) if header.need_body() => {
            return Err(ProtocolError::bad_content_length(format!("{} request without content-length or chunked body", header.method())));
        }
        (None, None) => PayloadSize::new_empty(),
    };

    ensure!(!(header.body_forbidden() && !payload_size.is_empty()), ProtocolError::body_not_allowed(header.method()));
    Ok(payload_size)
}

/// The declared content length, if any.
///
/// Every `Content-Length` field (and every element of a comma separated value) has to
/// be plain decimal digits, and all of them have to agree.
pub(crate) fn content_length(headers: &HeaderFields) -> Result<Option<u64>, ProtocolError> {
    let mut length = None;
    for field in headers.get_all(http::header::CONTENT_LENGTH.as_str()) {
        for value in field.value().split(|b| *b == b',') {
            let value = value.trim_ascii();
            ensure!(
                !value.is_empty() && value.iter().all(u8::is_ascii_digit),
                ProtocolError::bad_content_length(format!("value {} is not a decimal number", value.escape_ascii()))
            );

            // only ascii digits left, so the str conversion can't fail
            let parsed = std::str::from_utf8(value)
                .ok()
                .and_then(|digits| digits.parse::<u64>().ok())
                .ok_or_else(|| ProtocolError::bad_content_length(format!("value {} is too large", value.escape_ascii())))?;

            match length {
                Some(previous) if previous != parsed => {
                    return Err(ProtocolError::bad_content_length(format!("conflicting values {previous} and {parsed}")));
                }
                _ => length = Some(parsed),
            }
        }
    }
    Ok(length)
}

/// Accepts `Transfer-Encoding: chunked` only.
///
/// Any other coding would leave the body in a form we can't undo, so the request is
/// refused instead of being handed over still encoded.
pub(crate) fn check_chunked(field: &HeaderField) -> Result<(), ProtocolError> {
    const CHUNKED: &[u8] = b"chunked";

    let mut codings = field.value().split(|b| *b == b',').map(<[u8]>::trim_ascii);
    let last = codings.next_back().unwrap_or_default();
    if let Some(other) = codings.find(|coding| !coding.is_empty()) {
        return Err(ProtocolError::unsupported_transfer_encoding(other.escape_ascii()));
    }

    ensure!(last.eq_ignore_ascii_case(CHUNKED), ProtocolError::unsupported_transfer_encoding(last.escape_ascii()));
    Ok(())
}

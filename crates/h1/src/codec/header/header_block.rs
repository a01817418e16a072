//! Locates complete header blocks inside the read buffer.
//!
//! A header block is everything up to and including the first `CRLF CRLF`. Only the
//! block itself is split off the buffer, any body bytes that arrived with it stay put.
//! Until the terminator shows up the buffer may not grow past `max_header_bytes`,
//! otherwise a peer that never finishes its header would make us buffer forever.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::ProtocolError;

const CRLF: &[u8] = b"\r\n";
const CRLF_CRLF: &[u8] = b"\r\n\r\n";

/// Splits complete header blocks (terminator included) off the front of a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBlockDecoder {
    max_header_bytes: usize,
    /// bytes already searched without finding a terminator
    scanned: usize,
    /// empty lines dropped in front of the current block, they count toward the bound
    skipped: usize,
    /// the first byte of the start line was seen
    started: bool,
}

impl HeaderBlockDecoder {
    pub fn new(max_header_bytes: usize) -> Self {
        Self { max_header_bytes, scanned: 0, skipped: 0, started: false }
    }

    /// Drops empty lines in front of a start line, returns whether the start line began.
    fn skip_empty_lines(&mut self, src: &mut BytesMut) -> Result<bool, ProtocolError> {
        while src.starts_with(CRLF) {
            src.advance(CRLF.len());
            self.skipped += CRLF.len();
        }
        ensure!(self.skipped < self.max_header_bytes, ProtocolError::header_too_large(self.skipped, self.max_header_bytes));

        // a lone CR may still become an empty line
        self.started = !(src.is_empty() || src.as_ref() == b"\r");
        Ok(self.started)
    }
}

impl Decoder for HeaderBlockDecoder {
    type Item = Bytes;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if !self.started && !self.skip_empty_lines(src)? {
            return Ok(None);
        }
        let max_block_len = self.max_header_bytes - self.skipped;

        // the terminator may straddle the previous scan boundary
        let from = self.scanned.saturating_sub(CRLF_CRLF.len() - 1);
        match src[from..].windows(CRLF_CRLF.len()).position(|window| window == CRLF_CRLF) {
            Some(position) => {
                let block_len = from + position + CRLF_CRLF.len();
                ensure!(block_len <= max_block_len, ProtocolError::header_too_large(block_len + self.skipped, self.max_header_bytes));

                self.scanned = 0;
                self.skipped = 0;
                self.started = false;
                trace!(block_len, "found header block");
                Ok(Some(src.split_to(block_len).freeze()))
            }
            None => {
                ensure!(src.len() < max_block_len, ProtocolError::header_too_large(src.len() + self.skipped, self.max_header_bytes));
                self.scanned = src.len();
                Ok(None)
            }
        }
    }
}

/// Splits a header block into its lines, the terminating empty line excluded.
pub(crate) fn split_lines(block: &Bytes) -> impl Iterator<Item = Bytes> + '_ {
    let content = block.len().saturating_sub(CRLF_CRLF.len());
    let mut start = 0;
    std::iter::from_fn(move || {
        if start > content {
            return None;
        }
        let end = block[start..content].windows(CRLF.len()).position(|window| window == CRLF).map_or(content, |p| start + p);
        let line = block.slice(start..end);
        start = end + CRLF.len();
        Some(line)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn need_more_data() {
        let mut buf = BytesMut::from(&b"GET / HTTP/1.1\r\nHost: x\r\n"[..]);
        let mut decoder = HeaderBlockDecoder::new(8192);
        assert!(decoder.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 25);
    }

    #[test]
    fn leaves_body_bytes() {
        let mut buf = BytesMut::from(&b"POST / HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc"[..]);
        let block = HeaderBlockDecoder::new(8192).decode(&mut buf).unwrap().unwrap();
        assert!(block.ends_with(b"\r\n\r\n"));
        assert_eq!(&buf[..], b"abc");
    }

    #[test]
    fn terminator_split_across_deliveries() {
        let mut decoder = HeaderBlockDecoder::new(8192);
        let mut buf = BytesMut::from(&b"GET / HTTP/1.1\r\nHost: x\r"[..]);
        assert!(decoder.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(b"\n\r");
        assert!(decoder.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(b"\n");
        let block = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(&block[..], b"GET / HTTP/1.1\r\nHost: x\r\n\r\n");
        assert!(buf.is_empty());
    }

    #[test]
    fn skips_leading_empty_lines() {
        let mut buf = BytesMut::from(&b"\r\n\r\nGET / HTTP/1.1\r\n\r\n"[..]);
        let block = HeaderBlockDecoder::new(8192).decode(&mut buf).unwrap().unwrap();
        assert_eq!(&block[..], b"GET / HTTP/1.1\r\n\r\n");
    }

    #[test]
    fn leading_empty_line_split_across_deliveries() {
        let input = b"\r\nGET / HTTP/1.1\r\nHost: x\r\n\r\n";
        let mut decoder = HeaderBlockDecoder::new(8192);
        let mut buf = BytesMut::new();
        let mut blocks = Vec::new();

        for byte in input {
            buf.extend_from_slice(&[*byte]);
            if let Some(block) = decoder.decode(&mut buf).unwrap() {
                blocks.push(block);
            }
        }

        assert_eq!(blocks, vec![Bytes::from_static(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n")]);
        assert!(buf.is_empty());
    }

    #[test]
    fn empty_lines_only_reaching_limit() {
        let mut decoder = HeaderBlockDecoder::new(16);
        let mut buf = BytesMut::from(&b"\r\n\r\n\r\n\r\n"[..]);
        assert!(decoder.decode(&mut buf).unwrap().is_none());
        assert!(buf.is_empty());

        buf.extend_from_slice(b"\r\n\r\n\r\n\r\n");
        let result = decoder.decode(&mut buf);
        assert!(matches!(result, Err(ProtocolError::HeaderTooLarge { current_size: 16, max_size: 16 })));
    }

    #[test]
    fn empty_lines_count_toward_limit() {
        let mut buf = BytesMut::from(&b"\r\n\r\nGET /abc HTTP/1.1\r\n\r\n"[..]);
        let result = HeaderBlockDecoder::new(24).decode(&mut buf);
        assert!(matches!(result, Err(ProtocolError::HeaderTooLarge { current_size: 25, max_size: 24 })));

        let mut buf = BytesMut::from(&b"\r\nGET /abc HTTP/1.1\r\n\r\n"[..]);
        assert!(HeaderBlockDecoder::new(24).decode(&mut buf).unwrap().is_some());
    }

    #[test]
    fn unterminated_block_reaching_limit() {
        let mut buf = BytesMut::from(&b"GET / HTTP/1.1\r\nX-Filler: "[..]);
        buf.extend_from_slice(&[b'a'; 8192]);
        let result = HeaderBlockDecoder::new(8192).decode(&mut buf);
        assert!(matches!(result, Err(ProtocolError::HeaderTooLarge { max_size: 8192, .. })));
    }

    #[test]
    fn unterminated_block_exactly_at_limit() {
        let mut buf = BytesMut::from(&[b'a'; 16][..]);
        let result = HeaderBlockDecoder::new(16).decode(&mut buf);
        assert!(matches!(result, Err(ProtocolError::HeaderTooLarge { current_size: 16, max_size: 16 })));

        let mut buf = BytesMut::from(&[b'a'; 15][..]);
        assert!(HeaderBlockDecoder::new(16).decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn complete_block_over_limit() {
        let mut buf = BytesMut::from(&b"GET /aaaaaaaaaaaaaaaa HTTP/1.1\r\n\r\n"[..]);
        let result = HeaderBlockDecoder::new(16).decode(&mut buf);
        assert!(matches!(result, Err(ProtocolError::HeaderTooLarge { .. })));
    }

    #[test]
    fn lines() {
        let block = Bytes::from_static(b"GET / HTTP/1.1\r\nHost: x\r\nAccept: */*\r\n\r\n");
        let lines: Vec<Bytes> = split_lines(&block).collect();
        assert_eq!(lines, vec![&b"GET / HTTP/1.1"[..], &b"Host: x"[..], &b"Accept: */*"[..]]);

        let block = Bytes::from_static(b"GET / HTTP/1.1\r\n\r\n");
        let lines: Vec<Bytes> = split_lines(&block).collect();
        assert_eq!(lines, vec![&b"GET / HTTP/1.1"[..]]);
    }
}

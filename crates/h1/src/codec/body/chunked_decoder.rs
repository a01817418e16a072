//! Decoder for the chunked transfer coding.
//!
//! refer: <https://www.rfc-editor.org/rfc/rfc9112.html#name-chunked-transfer-coding>
//!
//! Works line by line rather than byte by byte: a size line is only parsed once it
//! is complete, chunk data is handed out as soon as any of it is buffered. Size lines
//! and the trailer section share the header size limit so a peer can't grow the
//! buffer without bound by never finishing a line.

use std::cmp;

use bytes::{Buf, BytesMut};
use httparse::Status;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::{HeaderField, PayloadItem, ProtocolError};

const CRLF: &[u8] = b"\r\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: ChunkedState,
    max_line_bytes: usize,
    trailer_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// hex size, optional extensions, CRLF
    ReadingSize,
    /// chunk data still owed
    ReadingData { remaining: u64 },
    /// the CRLF closing a chunk's data
    ReadingDataTrailerCrlf,
    /// trailer fields after the last chunk, up to an empty line
    ReadingTrailers,
    Done,
}

impl ChunkedDecoder {
    pub fn new(max_line_bytes: usize) -> Self {
        Self { state: ChunkedState::ReadingSize, max_line_bytes, trailer_bytes: 0 }
    }

    pub fn is_done(&self) -> bool {
        self.state == ChunkedState::Done
    }
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                ChunkedState::ReadingSize => match httparse::parse_chunk_size(src) {
                    Ok(Status::Complete((consumed, size))) => {
                        src.advance(consumed);
                        trace!(size, "read chunk size");
                        self.state = if size == 0 { ChunkedState::ReadingTrailers } else { ChunkedState::ReadingData { remaining: size } };
                    }
                    Ok(Status::Partial) => {
                        ensure!(src.len() < self.max_line_bytes, ProtocolError::invalid_chunk("chunk size line too long"));
                        return Ok(None);
                    }
                    Err(_) => return Err(ProtocolError::invalid_chunk("invalid chunk size line")),
                },

                ChunkedState::ReadingData { remaining } => {
                    if src.is_empty() {
                        return Ok(None);
                    }

                    let len = cmp::min(remaining, src.len() as u64);
                    let bytes = src.split_to(len as usize).freeze();
                    let remaining = remaining - len;
                    self.state = if remaining == 0 { ChunkedState::ReadingDataTrailerCrlf } else { ChunkedState::ReadingData { remaining } };

                    trace!(len = bytes.len(), "read chunked bytes");
                    return Ok(Some(PayloadItem::Chunk(bytes)));
                }

                ChunkedState::ReadingDataTrailerCrlf => {
                    let available = cmp::min(src.len(), CRLF.len());
                    ensure!(src[..available] == CRLF[..available], ProtocolError::invalid_chunk("missing CRLF after chunk data"));
                    if available < CRLF.len() {
                        return Ok(None);
                    }
                    src.advance(CRLF.len());
                    self.state = ChunkedState::ReadingSize;
                }

                ChunkedState::ReadingTrailers => {
                    let Some(position) = src.windows(CRLF.len()).position(|window| window == CRLF) else {
                        let pending = self.trailer_bytes + src.len();
                        ensure!(pending < self.max_line_bytes, ProtocolError::header_too_large(pending, self.max_line_bytes));
                        return Ok(None);
                    };

                    self.trailer_bytes += position + CRLF.len();
                    ensure!(self.trailer_bytes <= self.max_line_bytes, ProtocolError::header_too_large(self.trailer_bytes, self.max_line_bytes));

                    let line = src.split_to(position + CRLF.len()).freeze();
                    if position == 0 {
                        trace!("finished reading chunked data");
                        self.state = ChunkedState::Done;
                    } else {
                        // trailer fields are validated but not surfaced
                        let field = HeaderField::parse(line.slice(..position))?;
                        trace!(?field, "skip trailer field");
                    }
                }

                ChunkedState::Done => return Ok(Some(PayloadItem::Eof)),
            }
        }
    }
}

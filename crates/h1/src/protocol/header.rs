//! Raw header fields.
//!
//! A [`HeaderField`] keeps the line exactly as the peer sent it (minus surrounding
//! whitespace), so original casing survives. Name lookup is case-insensitive and
//! compares the whole name before the first colon, never a substring of the line.

use std::fmt;

use bytes::Bytes;

use crate::ensure;
use crate::protocol::ProtocolError;

/// A single validated header line, e.g. `Content-Length: 13`.
#[derive(Clone, PartialEq, Eq)]
pub struct HeaderField {
    line: Bytes,
    colon: usize,
    value: (usize, usize),
}

impl HeaderField {
    /// Validates one header line (without its CRLF).
    ///
    /// Grammar: `name ":" [SP] value`. The name must be a non-empty token, nothing may
    /// precede the colon except the name itself, and at most one space may directly follow
    /// the colon. Whitespace around the value is trimmed.
    pub fn parse(line: Bytes) -> Result<Self, ProtocolError> {
        ensure!(
            !line.iter().any(|b| *b == b'\r' || *b == b'\n'),
            ProtocolError::bad_header_field("bare CR or LF inside header line")
        );

        let colon = line.iter().position(|b| *b == b':').ok_or_else(|| ProtocolError::bad_header_field("missing colon"))?;

        let name = &line[..colon];
        ensure!(!name.is_empty(), ProtocolError::bad_header_field("empty header name"));
        if let Some(b) = name.iter().find(|b| !is_token_char(**b)) {
            return Err(if b.is_ascii_whitespace() {
                ProtocolError::bad_header_field("whitespace before colon")
            } else {
                ProtocolError::bad_header_field(format!("invalid byte {b:#04x} in header name"))
            });
        }

        let rest = &line[colon + 1..];
        ensure!(!rest.starts_with(b"  "), ProtocolError::bad_header_field("repeated whitespace after colon"));
        ensure!(
            rest.iter().all(|b| *b == b'\t' || (*b >= 0x20 && *b != 0x7f)),
            ProtocolError::bad_header_field("control character in header value")
        );

        let leading = rest.iter().take_while(|b| is_ows(**b)).count();
        let trailing = rest[leading..].iter().rev().take_while(|b| is_ows(**b)).count();
        let value = (colon + 1 + leading, line.len() - trailing);

        let line = line.slice(..value.1);

        Ok(Self { line, colon, value })
    }

    /// The header name with its original casing.
    pub fn name(&self) -> &[u8] {
        &self.line[..self.colon]
    }

    /// The trimmed value.
    pub fn value(&self) -> &[u8] {
        &self.line[self.value.0..self.value.1]
    }

    /// The value as text, `None` if it's not valid UTF-8.
    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(self.value()).ok()
    }

    /// The raw line as received.
    pub fn as_bytes(&self) -> &[u8] {
        &self.line
    }

    /// Case-insensitive comparison against the whole name.
    #[inline]
    pub fn is(&self, name: &str) -> bool {
        self.name().eq_ignore_ascii_case(name.as_bytes())
    }
}

impl fmt::Debug for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HeaderField").field(&String::from_utf8_lossy(&self.line)).finish()
    }
}

/// Ordered list of header fields as they appeared on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields {
    fields: Vec<HeaderField>,
}

impl HeaderFields {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { fields: Vec::with_capacity(capacity) }
    }

    pub fn push(&mut self, field: HeaderField) {
        self.fields.push(field);
    }

    /// Last field with the given name; later occurrences override earlier ones.
    pub fn get(&self, name: &str) -> Option<&HeaderField> {
        self.fields.iter().rev().find(|field| field.is(name))
    }

    /// All fields with the given name, in wire order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a HeaderField> + 'a {
        self.fields.iter().filter(move |field| field.is(name))
    }

    /// Whether any comma separated element of the named fields equals `token`, ignoring case.
    pub fn contains_token(&self, name: &str, token: &str) -> bool {
        self.get_all(name)
            .flat_map(|field| field.value().split(|b| *b == b','))
            .any(|element| element.trim_ascii().eq_ignore_ascii_case(token.as_bytes()))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HeaderField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a HeaderFields {
    type Item = &'a HeaderField;
    type IntoIter = std::slice::Iter<'a, HeaderField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[inline]
fn is_ows(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// `tchar` from RFC 9110 section 5.6.2.
#[inline]
pub(crate) fn is_token_char(b: u8) -> bool {
    matches!(b,
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~'
        | b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z')
}

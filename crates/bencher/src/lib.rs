//! Shared fixtures for the micro-h1 benchmarks.

/// A raw request captured as it would arrive on the wire, CRLF line endings included.
#[derive(Debug, Copy, Clone)]
pub struct RequestFixture {
    name: &'static str,
    content: &'static str,
}

impl RequestFixture {
    pub const fn new(name: &'static str, content: &'static str) -> Self {
        Self { name, content }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// The fixture split into deliveries of at most `size` bytes.
    pub fn deliveries(&self, size: usize) -> impl Iterator<Item = &'static [u8]> {
        self.content.as_bytes().chunks(size.max(1))
    }
}

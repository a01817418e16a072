//! Growable read buffer holding only the bytes nobody has consumed yet.
//!
//! Capacity grows by doubling plus one whenever an append would overflow it. The
//! backing store is a [`BytesMut`], so consuming a prefix is an index move and later
//! growth reclaims the consumed space instead of allocating when it can.

use bytes::{Buf, BytesMut};
use tracing::trace;

#[derive(Debug, Default)]
pub struct DynamicBuffer {
    inner: BytesMut,
    capacity: usize,
}

impl DynamicBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { inner: BytesMut::with_capacity(capacity), capacity }
    }

    /// Copies `bytes` after the current content, growing the capacity first if needed.
    pub fn append(&mut self, bytes: &[u8]) {
        let required = self.inner.len() + bytes.len();
        if required > self.capacity {
            let mut capacity = self.capacity;
            while capacity < required {
                capacity = capacity * 2 + 1;
            }
            trace!(from = self.capacity, to = capacity, "grow read buffer");
            self.capacity = capacity;
        }

        self.inner.reserve(self.capacity - self.inner.len());
        self.inner.extend_from_slice(bytes);
    }

    /// Removes the first `n` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `n` is larger than [`len`](Self::len).
    pub fn consume_prefix(&mut self, n: usize) {
        assert!(n <= self.inner.len(), "consume {n} bytes but only {} buffered", self.inner.len());
        self.inner.advance(n);
    }

    /// Number of unconsumed bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Logical capacity, grown only by [`append`](Self::append).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.inner
    }

    /// Access for decoders; everything they split off counts as consumed.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut BytesMut {
        &mut self.inner
    }
}

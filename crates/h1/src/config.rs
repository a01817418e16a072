//! Per-connection tunables.

use std::time::Duration;

/// Maximum size in bytes allowed for the entire header section
pub const DEFAULT_MAX_HEADER_BYTES: usize = 8 * 1024;

/// Initial capacity of the per-connection read buffer
pub const DEFAULT_BUFFER_CAPACITY: usize = 4 * 1024;

/// Upper bound of a single transport read
pub const DEFAULT_READ_CHUNK_SIZE: usize = 8 * 1024;

/// Settings shared by every connection a server accepts.
///
/// ```
/// use std::time::Duration;
/// use micro_h1::config::ConnectionConfig;
///
/// let config = ConnectionConfig::default().max_header_bytes(16 * 1024).idle_timeout(Duration::from_secs(30));
/// assert_eq!(config.get_max_header_bytes(), 16 * 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    max_header_bytes: usize,
    buffer_capacity: usize,
    read_chunk_size: usize,
    idle_timeout: Option<Duration>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            idle_timeout: None,
        }
    }
}

impl ConnectionConfig {
    /// Bound for an unterminated header block, also applied to chunk size lines and trailers.
    #[must_use]
    pub fn max_header_bytes(mut self, max_header_bytes: usize) -> Self {
        self.max_header_bytes = max_header_bytes;
        self
    }

    #[must_use]
    pub fn buffer_capacity(mut self, buffer_capacity: usize) -> Self {
        self.buffer_capacity = buffer_capacity;
        self
    }

    /// Values below one byte are raised to one.
    #[must_use]
    pub fn read_chunk_size(mut self, read_chunk_size: usize) -> Self {
        self.read_chunk_size = read_chunk_size.max(1);
        self
    }

    /// Fails a read that waits longer than `idle_timeout` for the peer.
    #[must_use]
    pub fn idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = Some(idle_timeout);
        self
    }

    pub fn get_max_header_bytes(&self) -> usize {
        self.max_header_bytes
    }

    pub fn get_buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    pub fn get_read_chunk_size(&self) -> usize {
        self.read_chunk_size
    }

    pub fn get_idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }
}

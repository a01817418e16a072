//! HTTP connection handling module
//!
//! This module drives a single connection from its first byte to its close.
//!
//! # Components
//!
//! - [`RawConnection`]: the transport, one bounded read at a time, sticky errors
//! - [`MessageReader`]: request heads and body pieces pulled out of the read buffer
//! - [`MessageWriter`]: encoded responses staged until they are flushed
//! - [`HttpConnection`]: the request/response loop on top of the three:
//!   - Streams request bodies to the handler on demand
//!   - Answers `Expect: 100-continue`
//!   - Keeps the connection open per HTTP version and `Connection` header
//!   - Turns framing errors into a single error response

mod http_connection;
mod message_reader;
mod message_writer;
mod raw_connection;

pub use http_connection::HttpConnection;
pub use message_reader::MessageReader;
pub use message_writer::MessageWriter;
pub use raw_connection::RawConnection;

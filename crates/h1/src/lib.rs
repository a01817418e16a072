//! Streaming HTTP/1.1 message framing on top of a raw byte stream
//!
//! This crate takes a bidirectional byte stream (a TCP connection, or anything
//! implementing tokio's `AsyncRead`/`AsyncWrite`) and turns it into a sequence of
//! HTTP/1.1 exchanges. Requests are assembled from arbitrarily fragmented
//! deliveries, their bodies are read only as fast as the handler consumes them, and
//! responses are framed and written back on the same stream.
//!
//! # Features
//!
//! - Incremental request parsing, independent of how the bytes were split on the wire
//! - Bounded header size against peers that never finish their head
//! - Fixed-length, chunked and close-delimited bodies
//! - Lazy, backpressured request bodies implementing `http_body::Body`
//! - Automatic `Content-Length` or chunked framing of responses
//! - Keep-alive per HTTP version and `Connection` header
//! - `Expect: 100-continue`
//! - One best-effort error response for malformed requests
//!
//! # Example
//!
//! ```no_run
//! use std::error::Error;
//! use std::sync::Arc;
//!
//! use http::{Response, StatusCode};
//! use http_body_util::BodyExt;
//! use tokio::net::TcpListener;
//! use tracing::{error, info, warn, Level};
//! use tracing_subscriber::FmtSubscriber;
//!
//! use micro_h1::connection::HttpConnection;
//! use micro_h1::handler::make_handler;
//! use micro_h1::protocol::body::ReqBody;
//! use micro_h1::protocol::Request;
//!
//! #[tokio::main]
//! async fn main() {
//!     let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
//!     tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
//!
//!     info!(port = 8080, "start listening");
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     let handler = Arc::new(make_handler(echo));
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let handler = Arc::clone(&handler);
//!
//!         tokio::spawn(async move {
//!             let (reader, writer) = tcp_stream.into_split();
//!             let connection = HttpConnection::new(reader, writer);
//!             if let Err(e) = connection.process(handler).await {
//!                 error!(cause = %e, "service has error, connection shutdown");
//!             }
//!         });
//!     }
//! }
//!
//! async fn echo(request: Request<ReqBody>) -> Result<Response<String>, Box<dyn Error + Send + Sync>> {
//!     let body = request.into_body().collect().await?.to_bytes();
//!     let response = Response::builder().status(StatusCode::OK).body(String::from_utf8(body.to_vec())?)?;
//!     Ok(response)
//! }
//! ```
//!
//! The [`server`] module wraps the accept loop above, including graceful shutdown.
//!
//! # Architecture
//!
//! Leaves first:
//!
//! - [`buffer`]: the growable read buffer
//! - [`protocol`]: message types, header fields, errors and the request body
//! - [`codec`]: `tokio_util` decoders and encoders for heads and bodies
//! - [`connection`]: the transport adapter and the request/response loop
//! - [`handler`]: the trait application code implements
//! - [`server`]: accepting connections
//! - [`config`]: per-connection tunables
//!
//! # Error Handling
//!
//! - [`protocol::ProtocolError`]: the peer sent something that can't be framed; each
//!   variant carries the status code of the error response
//! - [`protocol::SendError`]: a response couldn't be written
//! - [`protocol::HttpError`]: either of the two, returned by a connection
//!
//! # Limitations
//!
//! - HTTP/1.x only
//! - No TLS, put a terminating proxy in front
//! - Obsolete line folding is rejected, not unfolded

pub mod buffer;
pub mod codec;
pub mod config;
pub mod connection;
pub mod handler;
pub mod protocol;
pub mod server;

mod utils;
pub(crate) use utils::ensure;

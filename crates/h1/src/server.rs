//! Accept loop: one task per connection, all sharing one handler.
//!
//! ```no_run
//! use std::convert::Infallible;
//! use http::Response;
//! use micro_h1::handler::make_handler;
//! use micro_h1::protocol::body::ReqBody;
//! use micro_h1::protocol::Request;
//! use micro_h1::server::Server;
//!
//! async fn hello(_request: Request<ReqBody>) -> Result<Response<String>, Infallible> {
//!     Ok(Response::new("Hello World!\n".to_string()))
//! }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let server = Server::builder().address("127.0.0.1:8080").build()?;
//! server.start(make_handler(hello)).await?;
//! # Ok(())
//! # }
//! ```

use std::fmt::Display;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use bytes::Bytes;
use http_body::Body;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::select;
use tracing::{error, info, warn};

use crate::config::ConnectionConfig;
use crate::connection::HttpConnection;
use crate::handler::Handler;

#[derive(Debug)]
pub struct ServerBuilder {
    address: Option<io::Result<Vec<SocketAddr>>>,
    config: ConnectionConfig,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { address: None, config: ConnectionConfig::default() }
    }

    /// Where to listen. Resolution errors are reported by [`build`](Self::build).
    #[must_use]
    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(address.to_socket_addrs().map(Iterator::collect));
        self
    }

    #[must_use]
    pub fn config(mut self, config: ConnectionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let address = self.address.ok_or(ServerBuildError::MissingAddress)??;
        if address.is_empty() {
            return Err(ServerBuildError::MissingAddress);
        }
        Ok(Server { address, config: self.config })
    }
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("address must be set")]
    MissingAddress,
    #[error("invalid address: {source}")]
    InvalidAddress {
        #[from]
        source: io::Error,
    },
}

#[derive(Debug)]
pub struct Server {
    address: Vec<SocketAddr>,
    config: ConnectionConfig,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn address(&self) -> &[SocketAddr] {
        &self.address
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Binds the first address that accepts and serves until the process ends.
    pub async fn start<H>(self, handler: H) -> io::Result<()>
    where
        H: Handler + 'static,
        H::RespBody: Body<Data = Bytes> + Send + Unpin + 'static,
        <H::RespBody as Body>::Error: Display + Send,
        H::Error: Send + 'static,
    {
        info!("start listening at {:?}", self.address);
        let tcp_listener = TcpListener::bind(self.address.as_slice()).await.inspect_err(|e| error!(cause = %e, "bind server error"))?;

        serve(tcp_listener, Arc::new(handler), self.config).await;
        Ok(())
    }
}

/// Serves connections accepted from `listener` forever.
pub async fn serve<H>(listener: TcpListener, handler: Arc<H>, config: ConnectionConfig)
where
    H: Handler + 'static,
    H::RespBody: Body<Data = Bytes> + Send + Unpin + 'static,
    <H::RespBody as Body>::Error: Display + Send,
    H::Error: Send + 'static,
{
    serve_with_shutdown(listener, handler, config, std::future::pending()).await;
}

/// Serves connections accepted from `listener` until `shutdown` completes.
///
/// Connections already accepted keep running on their own tasks.
pub async fn serve_with_shutdown<H, S>(listener: TcpListener, handler: Arc<H>, config: ConnectionConfig, shutdown: S)
where
    H: Handler + 'static,
    H::RespBody: Body<Data = Bytes> + Send + Unpin + 'static,
    <H::RespBody as Body>::Error: Display + Send,
    H::Error: Send + 'static,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        let (tcp_stream, remote_addr) = select! {
            biased;
            () = &mut shutdown => {
                info!("receive shutdown signal, stop accepting");
                return;
            }
            accepted = listener.accept() => match accepted {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            },
        };

        let handler = Arc::clone(&handler);

        tokio::spawn(async move {
            let (reader, writer) = tcp_stream.into_split();
            let connection = HttpConnection::with_config(reader, writer, config);
            match connection.process(handler).await {
                Ok(()) => {
                    info!(%remote_addr, "finished process, connection shutdown");
                }
                Err(e) => {
                    error!(%remote_addr, cause = %e, "service has error, connection shutdown");
                }
            }
        });
    }
}

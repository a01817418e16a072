//! `GET /` answers `Hello World!`, `/echo` sends the request body back.
//!
//! Listens on `MICRO_H1_HOST`:`MICRO_H1_PORT`, `127.0.0.1:8080` by default.
//!
//! ```sh
//! curl -v http://127.0.0.1:8080/
//! curl -v --data 'abc' http://127.0.0.1:8080/echo
//! ```

use std::env;
use std::error::Error;

use bytes::Bytes;
use http::{header, Method, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use micro_h1::handler::make_handler;
use micro_h1::protocol::body::ReqBody;
use micro_h1::protocol::Request;
use micro_h1::server::Server;

async fn handle(request: Request<ReqBody>) -> Result<Response<Full<Bytes>>, Box<dyn Error + Send + Sync>> {
    let method = request.method().clone();
    let target = request.target().clone();
    info!(%method, target = %target.escape_ascii(), "receive request");

    let response = match (&method, &target[..]) {
        (&Method::GET | &Method::HEAD, b"/") => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(Full::new(Bytes::from_static(b"Hello World!\n")))?,

        (_, b"/echo") => {
            let body = request.into_body().collect().await?.to_bytes();
            info!(size = body.len(), "echo request body");
            Response::builder().status(StatusCode::OK).header(header::CONTENT_TYPE, "application/octet-stream").body(Full::new(body))?
        }

        _ => Response::builder().status(StatusCode::NOT_FOUND).body(Full::new(Bytes::from_static(b"404 not found\n")))?,
    };

    Ok(response)
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let host = env::var("MICRO_H1_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("MICRO_H1_PORT").ok().and_then(|port| port.parse::<u16>().ok()).unwrap_or(8080);

    let server = match Server::builder().address((host.as_str(), port)).build() {
        Ok(server) => server,
        Err(e) => {
            error!(cause = %e, "invalid server configuration");
            return;
        }
    };

    if let Err(e) = server.start(make_handler(handle)).await {
        error!(cause = %e, "server stopped");
    }
}

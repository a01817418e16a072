//! The seam between the framing layer and application code.
//!
//! A [`Handler`] receives one parsed [`Request`] at a time and answers with an
//! [`http::Response`]. Its body is streamed out by the connection, framed with
//! `Content-Length` when `size_hint` is exact and chunked otherwise.
//!
//! Plain async functions become handlers through [`make_handler`]:
//!
//! ```
//! use std::convert::Infallible;
//! use http::Response;
//! use micro_h1::handler::make_handler;
//! use micro_h1::protocol::body::ReqBody;
//! use micro_h1::protocol::Request;
//!
//! async fn hello(_request: Request<ReqBody>) -> Result<Response<String>, Infallible> {
//!     Ok(Response::new("Hello World!\n".to_string()))
//! }
//!
//! let handler = make_handler(hello);
//! # let _ = handler;
//! ```

use std::error::Error;

use async_trait::async_trait;
use http::Response;
use http_body::Body;

use crate::protocol::body::ReqBody;
use crate::protocol::Request;

#[async_trait]
pub trait Handler: Send + Sync {
    type RespBody: Body;
    type Error: Into<Box<dyn Error + Send + Sync>>;

    /// Produces the response for `req`.
    ///
    /// Returning `Err` makes the connection answer `500 Internal Server Error`.
    async fn call(&self, req: Request<ReqBody>) -> Result<Response<Self::RespBody>, Self::Error>;
}

#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<RespBody, Err, F, Fut> Handler for HandlerFn<F>
where
    RespBody: Body,
    F: Fn(Request<ReqBody>) -> Fut + Send + Sync,
    Err: Into<Box<dyn Error + Send + Sync>>,
    Fut: Future<Output = Result<Response<RespBody>, Err>> + Send,
{
    type RespBody = RespBody;
    type Error = Err;

    async fn call(&self, req: Request<ReqBody>) -> Result<Response<Self::RespBody>, Self::Error> {
        (self.f)(req).await
    }
}

pub fn make_handler<F, RespBody, Err, Ret>(f: F) -> HandlerFn<F>
where
    RespBody: Body,
    Err: Into<Box<dyn Error + Send + Sync>>,
    Ret: Future<Output = Result<Response<RespBody>, Err>>,
    F: Fn(Request<ReqBody>) -> Ret,
{
    HandlerFn { f }
}

// each test binary uses a different part of this module
#![allow(dead_code, reason = "shared between test binaries")]

use std::convert::Infallible;
use std::error::Error;

use bytes::{Bytes, BytesMut};
use futures::stream;
use http::{Response, StatusCode};
use http_body::Frame;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use micro_h1::protocol::body::ReqBody;
use micro_h1::protocol::Request;
use tokio::io::{AsyncRead, AsyncReadExt};

pub type TestBody = BoxBody<Bytes, Infallible>;

/// `/` says hello, `/echo` returns the body, `/ignore` never reads it, `/stream`
/// has no known length and `/fail` makes the handler fail.
pub async fn route(request: Request<ReqBody>) -> Result<Response<TestBody>, Box<dyn Error + Send + Sync>> {
    let target = request.target().clone();
    let response = match &target[..] {
        b"/" => Response::new(full("Hello World!\n")),
        b"/echo" => {
            let body = request.into_body().collect().await?.to_bytes();
            Response::new(Full::new(body).boxed())
        }
        b"/ignore" => Response::new(full("ignored")),
        b"/stream" => {
            let frames = vec![Ok::<_, Infallible>(Frame::data(Bytes::from_static(b"hello "))), Ok(Frame::data(Bytes::from_static(b"world")))];
            Response::new(StreamBody::new(stream::iter(frames)).boxed())
        }
        b"/fail" => return Err("handler failed".into()),
        _ => Response::builder().status(StatusCode::NOT_FOUND).body(full("not found"))?,
    };
    Ok(response)
}

fn full(content: &'static str) -> TestBody {
    Full::new(Bytes::from_static(content.as_bytes())).boxed()
}

/// Reads responses off a client stream, keeping whatever arrived past the current one.
pub struct ResponseReader<S> {
    stream: S,
    pending: BytesMut,
}

impl<S: AsyncRead + Unpin> ResponseReader<S> {
    pub fn new(stream: S) -> Self {
        Self { stream, pending: BytesMut::new() }
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Status line and headers, terminating empty line included.
    pub async fn read_head(&mut self) -> String {
        loop {
            if let Some(pos) = self.pending.windows(4).position(|window| window == b"\r\n\r\n") {
                let head = self.pending.split_to(pos + 4);
                return String::from_utf8(head.to_vec()).unwrap();
            }
            self.fill().await;
        }
    }

    /// A whole response, the body still in its wire framing.
    pub async fn read_response(&mut self) -> (String, String) {
        let head = self.read_head().await;
        let lower = head.to_ascii_lowercase();

        let body = if let Some(length) = header_value(&lower, "content-length") {
            let length: usize = length.parse().unwrap();
            while self.pending.len() < length {
                self.fill().await;
            }
            self.pending.split_to(length)
        } else if header_value(&lower, "transfer-encoding") == Some("chunked") {
            loop {
                if let Some(pos) = self.pending.windows(5).position(|window| window == b"0\r\n\r\n") {
                    break self.pending.split_to(pos + 5);
                }
                self.fill().await;
            }
        } else {
            BytesMut::new()
        };

        (head, String::from_utf8(body.to_vec()).unwrap())
    }

    /// Everything up to the peer closing the connection.
    pub async fn read_to_end(&mut self) -> String {
        let mut rest = Vec::new();
        self.stream.read_to_end(&mut rest).await.unwrap();
        let mut all = self.pending.split().to_vec();
        all.extend_from_slice(&rest);
        String::from_utf8(all).unwrap()
    }

    async fn fill(&mut self) {
        let n = self.stream.read_buf(&mut self.pending).await.unwrap();
        assert!(n > 0, "connection closed before the response was complete, got {:?}", self.pending);
    }
}

fn header_value<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().filter_map(|line| line.split_once(':')).find(|(field, _)| field.trim() == name).map(|(_, value)| value.trim())
}

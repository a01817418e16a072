use std::error::Error;
use std::fmt::Display;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{CONNECTION, CONTENT_TYPE};
use http::{HeaderValue, Method, Response, StatusCode};
use http_body::Body;
use http_body_util::{BodyExt, Full};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::select;
use tracing::{debug, error, info, trace, warn};

use crate::config::ConnectionConfig;
use crate::connection::message_reader::PayloadReader;
use crate::connection::{MessageReader, MessageWriter, RawConnection};
use crate::handler::Handler;
use crate::protocol::body::{create_body_sender_receiver, BodySender};
use crate::protocol::{status_forbids_body, HttpError, Message, PayloadItem, PayloadSize, ProtocolError, RequestHeader, ResponseHead, SendError};

const CONTINUE: &[u8] = b"HTTP/1.1 100 Continue\r\n\r\n";

/// An HTTP connection that manages request processing and response streaming
///
/// `HttpConnection` runs the request/response cycle of one connection:
/// - Reading request heads and choosing how their body is framed
/// - Handing the request to the [`Handler`] while streaming its body on demand
/// - Answering `Expect: 100-continue`
/// - Writing the response and discarding whatever body the handler left unread
/// - Keeping the connection open or closing it after the exchange
///
/// A request the peer got wrong is answered once with an error response carrying
/// the matching status, then the connection is closed. Transport errors close it
/// without an answer.
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct HttpConnection<R, W> {
    conn: RawConnection<R, W>,
    reader: MessageReader,
    writer: MessageWriter,
    /// set once the first byte of a response was staged
    responding: bool,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_config(reader, writer, ConnectionConfig::default())
    }

    pub fn with_config(reader: R, writer: W, config: ConnectionConfig) -> Self {
        Self {
            conn: RawConnection::with_config(reader, writer, &config),
            reader: MessageReader::new(&config),
            writer: MessageWriter::with_capacity(config.get_buffer_capacity()),
            responding: false,
        }
    }

    /// Serves requests until the peer closes the connection, the exchange says
    /// close, or an error ends it.
    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
        H::RespBody: Body<Data = Bytes> + Send + Unpin,
        <H::RespBody as Body>::Error: Display,
    {
        let result = self.serve(&handler).await;

        if let Err(HttpError::RequestError { source }) = &result {
            match source.status_code() {
                Some(status) if !self.responding => {
                    warn!(cause = %source, status = status.as_u16(), "bad request, answer with error response");
                    self.send_error_response(status, source).await;
                }
                _ => {}
            }
        }

        if result.as_ref().is_err_and(HttpError::is_io) {
            return result;
        }

        if let Err(e) = self.conn.shutdown().await {
            debug!(cause = %e, "failed to shut down connection");
        }
        result
    }

    async fn serve<H>(&mut self, handler: &Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
        H::RespBody: Body<Data = Bytes> + Send + Unpin,
        <H::RespBody as Body>::Error: Display,
    {
        loop {
            self.responding = false;

            let Some((header, payload_size)) = self.reader.read_header(&mut self.conn).await? else {
                info!("cant read more request, break this connection down");
                return Ok(());
            };

            if !self.do_process(header, payload_size, handler).await? {
                debug!("exchange asked for close, break this connection down");
                return Ok(());
            }
        }
    }

    /// Runs one exchange, returns whether the connection stays open.
    async fn do_process<H>(&mut self, header: RequestHeader, payload_size: PayloadSize, handler: &Arc<H>) -> Result<bool, HttpError>
    where
        H: Handler,
        H::RespBody: Body<Data = Bytes> + Send + Unpin,
        <H::RespBody as Body>::Error: Display,
    {
        let exchange = Exchange {
            keep_alive: header.keep_alive(),
            legacy_version: !header.version().is_persistent_by_default(),
            head_request: *header.method() == Method::HEAD,
        };
        trace!(method = %header.method(), ?payload_size, keep_alive = exchange.keep_alive, "received request");

        if header.expects_continue() && !payload_size.is_empty() {
            self.conn.write(CONTINUE).await.map_err(SendError::io)?;
            info!("receive expect request header, sent continue response");
        }

        let (mut body_sender, req_body) = create_body_sender_receiver(payload_size);
        let request = header.body(req_body);

        // The handler and the body sender are polled together: the handler may wait
        // for body data that only the sender reads from the connection.
        let (response_result, body_result) = {
            let mut source = PayloadReader::new(&mut self.reader, &mut self.conn);
            tokio::pin! {
                let handler_future = handler.call(request);
                let body_future = body_sender.start(&mut source);
            }

            let mut body_result = None;
            let response_result = loop {
                select! {
                    biased;
                    response = &mut handler_future => break response,
                    result = &mut body_future, if body_result.is_none() => body_result = Some(result),
                }
            };
            (response_result, body_result)
        };

        if let Some(Err(e)) = body_result {
            return Err(e.into());
        }

        self.responding = true;
        match response_result {
            // the response body may itself read the request body
            Ok(response) => self.do_send_response(response, &exchange, Some(&mut body_sender)).await?,
            Err(e) => {
                let cause: Box<dyn Error + Send + Sync> = e.into();
                error!(cause = %cause, "handle response error");
                let response = build_error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string());
                self.do_send_response(response, &exchange, None).await?;
            }
        }
        body_sender.close();

        // the next head starts after this body, read or not
        let mut source = PayloadReader::new(&mut self.reader, &mut self.conn);
        let skipped = body_sender.skip_data(&mut source).await?;
        if skipped > 0 {
            trace!(skipped, "discarded unread request body");
        }

        Ok(exchange.keep_alive)
    }

    async fn do_send_response<T>(&mut self, response: Response<T>, exchange: &Exchange, mut body_sender: Option<&mut BodySender>) -> Result<(), HttpError>
    where
        T: Body + Unpin,
        T::Error: Display,
    {
        let (mut parts, mut body) = response.into_parts();

        if !exchange.keep_alive {
            parts.headers.insert(CONNECTION, HeaderValue::from_static("close"));
        } else if exchange.legacy_version {
            parts.headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        }

        let payload_size = if status_forbids_body(parts.status) { PayloadSize::new_empty() } else { PayloadSize::from(body.size_hint()) };
        let head = ResponseHead::from_parts(parts, ());

        // HEAD announces the body it would have sent, without sending it
        if exchange.head_request || payload_size.is_empty() {
            self.writer.write_head_only(head, payload_size)?;
            self.writer.flush(&mut self.conn).await?;
            return Ok(());
        }

        // the head is flushed together with the first chunk
        self.writer.write::<T::Data>(Message::Header((head, payload_size)))?;

        loop {
            if let Some(sender) = body_sender.as_deref_mut().filter(|sender| sender.is_requested()) {
                let mut source = PayloadReader::new(&mut self.reader, &mut self.conn);
                sender.answer(&mut source).await?;
                continue;
            }

            let serving = body_sender.as_ref().is_some_and(|sender| sender.is_serving());
            let frame = select! {
                biased;
                frame = body.frame() => frame.map(|frame| frame.map_err(|e| SendError::invalid_body(format!("resolve response body error: {e}")))),
                () = wait_body_request(body_sender.as_deref_mut()), if serving => continue,
            };

            let Some(frame) = frame else {
                break;
            };
            let Ok(data) = frame?.into_data() else {
                trace!("drop trailers of response body");
                continue;
            };
            self.writer.write(Message::Payload(PayloadItem::Chunk(data)))?;
            self.writer.flush(&mut self.conn).await?;
        }

        self.writer.write(Message::Payload(PayloadItem::<T::Data>::Eof))?;
        self.writer.flush(&mut self.conn).await?;
        Ok(())
    }

    /// Best effort, a failure here only gets logged.
    async fn send_error_response(&mut self, status: StatusCode, cause: &ProtocolError) {
        let response = build_error_response(status, format!("{cause}\n"));
        let exchange = Exchange { keep_alive: false, legacy_version: false, head_request: false };
        if let Err(e) = self.do_send_response(response, &exchange, None).await {
            warn!(cause = %e, "failed to send error response");
        }
    }
}

/// What the request decided about the response.
#[derive(Debug)]
struct Exchange {
    keep_alive: bool,
    /// HTTP/1.0 and below only keep the connection when told so
    legacy_version: bool,
    head_request: bool,
}

async fn wait_body_request(body_sender: Option<&mut BodySender>) {
    if let Some(sender) = body_sender {
        sender.wait_request().await;
    }
}

fn build_error_response(status: StatusCode, message: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(message)));
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    use indoc::indoc;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

    use crate::handler::make_handler;
    use crate::protocol::body::ReqBody;
    use crate::protocol::Request;

    async fn echo(request: Request<ReqBody>) -> Result<Response<Full<Bytes>>, Infallible> {
        let body = request.into_body().collect().await.map(|collected| collected.to_bytes()).unwrap_or_default();
        Ok(Response::new(Full::new(body)))
    }

    async fn stream_back(request: Request<ReqBody>) -> Result<Response<ReqBody>, Infallible> {
        Ok(Response::new(request.into_body()))
    }

    async fn run(input: &str) -> (String, Result<(), HttpError>) {
        run_with(make_handler(echo), input).await
    }

    async fn run_with<H>(handler: H, input: &str) -> (String, Result<(), HttpError>)
    where
        H: Handler,
        H::RespBody: Body<Data = Bytes> + Send + Unpin,
        <H::RespBody as Body>::Error: Display,
    {
        let (mut client, server) = duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server);
        let connection = HttpConnection::new(server_read, server_write);

        client.write_all(input.replace('\n', "\r\n").as_bytes()).await.unwrap();
        client.shutdown().await.unwrap();

        let result = connection.process(Arc::new(handler)).await;
        let mut output = String::new();
        client.read_to_string(&mut output).await.unwrap();
        (output, result)
    }

    #[tokio::test]
    async fn keep_alive_then_clean_close() {
        let (output, result) = run(indoc! {"
            POST /echo HTTP/1.1
            Content-Length: 3

            abcPOST /echo HTTP/1.1
            Content-Length: 2

            de"})
        .await;

        assert!(result.is_ok());
        assert_eq!(output, "HTTP/1.1 200 OK\r\ncontent-length: 3\r\n\r\nabcHTTP/1.1 200 OK\r\ncontent-length: 2\r\n\r\nde");
    }

    #[tokio::test]
    async fn http_10_closes_after_one_exchange() {
        let (output, result) = run("GET / HTTP/1.0\n\nGET / HTTP/1.0\n\n").await;

        assert!(result.is_ok());
        assert_eq!(output, "HTTP/1.1 200 OK\r\nconnection: close\r\ncontent-length: 0\r\n\r\n");
    }

    #[tokio::test]
    async fn bad_request_line_answered_once() {
        let (output, result) = run("GET /\n\n").await;

        assert!(matches!(result, Err(HttpError::RequestError { source: ProtocolError::BadRequestLine { .. } })));
        assert!(output.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{output}");
        assert!(output.contains("connection: close\r\n"));
    }

    #[tokio::test]
    async fn unsupported_transfer_encoding() {
        let (output, result) = run("POST / HTTP/1.1\nTransfer-Encoding: gzip\n\n").await;

        assert!(result.is_err());
        assert!(output.starts_with("HTTP/1.1 501 Not Implemented\r\n"), "{output}");
    }

    #[tokio::test]
    async fn truncated_body_is_answered_before_any_response() {
        let (output, result) = run("POST /echo HTTP/1.1\nContent-Length: 10\n\nabc").await;

        assert!(matches!(result, Err(HttpError::RequestError { source: ProtocolError::UnexpectedEof { .. } })));
        assert!(output.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{output}");
        assert_eq!(output.matches("HTTP/1.1").count(), 1);
    }

    #[tokio::test]
    async fn request_body_streamed_back_as_response() {
        let (output, result) = run_with(make_handler(stream_back), "POST /echo HTTP/1.1\nContent-Length: 3\n\nabcGET / HTTP/1.1\n\n").await;

        assert!(result.is_ok());
        assert_eq!(output, "HTTP/1.1 200 OK\r\ncontent-length: 3\r\n\r\nabcHTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n");
    }

    #[tokio::test]
    async fn chunked_request_body_streamed_back() {
        let (output, result) = run_with(make_handler(stream_back), "POST /echo HTTP/1.1\nTransfer-Encoding: chunked\n\n5\nhello\n0\n\n").await;

        assert!(result.is_ok());
        assert!(output.starts_with("HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\n"), "{output}");
        assert!(output.ends_with("0\r\n\r\n"), "{output}");
        assert!(output.contains("hello"), "{output}");
    }

    #[tokio::test]
    async fn truncated_request_body_streamed_back_closes() {
        let (output, result) = run_with(make_handler(stream_back), "POST /echo HTTP/1.1\nContent-Length: 10\n\nabc").await;

        assert!(matches!(result, Err(HttpError::RequestError { source: ProtocolError::UnexpectedEof { .. } })));
        assert!(!output.contains("400"), "{output}");
    }
}

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::channel::mpsc;
use futures::{Sink, StreamExt};
use http_body::{Body, Frame, SizeHint};
use http_body_util::BodyExt;
use tracing::error;

use crate::protocol::body::body_channel::BodyRequestSignal;
use crate::protocol::{PayloadItem, PayloadSize, ProtocolError};

/// The body of an incoming request.
///
/// Nothing is read from the connection until the body is polled, and then only one
/// piece at a time. Whatever the handler leaves unread is discarded by the
/// connection once the response is written.
#[derive(Debug)]
pub struct ReqBody {
    signal_sender: mpsc::Sender<BodyRequestSignal>,
    data_receiver: mpsc::Receiver<Result<PayloadItem, ProtocolError>>,
    payload_size: PayloadSize,
    in_flight: bool,
    eof: bool,
}

impl ReqBody {
    pub(crate) fn new(
        signal_sender: mpsc::Sender<BodyRequestSignal>,
        data_receiver: mpsc::Receiver<Result<PayloadItem, ProtocolError>>,
        payload_size: PayloadSize,
    ) -> Self {
        let eof = payload_size.is_empty();
        Self { signal_sender, data_receiver, payload_size, in_flight: false, eof }
    }

    /// How the body is framed on the wire.
    pub fn payload_size(&self) -> PayloadSize {
        self.payload_size
    }

    /// The next piece of the body, `None` once all of it has been read.
    pub async fn read(&mut self) -> Result<Option<Bytes>, ProtocolError> {
        while let Some(frame) = self.frame().await {
            if let Ok(data) = frame?.into_data() {
                return Ok(Some(data));
            }
        }
        Ok(None)
    }
}

impl Body for ReqBody {
    type Data = Bytes;
    type Error = ProtocolError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();

        if this.eof {
            return Poll::Ready(None);
        }

        // at most one request for data is outstanding
        if !this.in_flight {
            match Pin::new(&mut this.signal_sender).poll_ready(cx) {
                Poll::Ready(Ok(())) => {
                    if let Err(e) = Pin::new(&mut this.signal_sender).start_send(BodyRequestSignal::RequestData) {
                        error!(cause = %e, "failed to request body data");
                        return Poll::Ready(Some(Err(ProtocolError::unexpected_eof("request body is no longer readable"))));
                    }
                    this.in_flight = true;
                }
                Poll::Ready(Err(e)) => {
                    error!(cause = %e, "failed to request body data");
                    return Poll::Ready(Some(Err(ProtocolError::unexpected_eof("request body is no longer readable"))));
                }
                Poll::Pending => return Poll::Pending,
            }
        }

        match this.data_receiver.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(PayloadItem::Chunk(bytes)))) => {
                this.in_flight = false;
                Poll::Ready(Some(Ok(Frame::data(bytes))))
            }
            Poll::Ready(Some(Ok(PayloadItem::Eof))) => {
                this.in_flight = false;
                this.eof = true;
                Poll::Ready(None)
            }
            Poll::Ready(Some(Err(e))) => {
                this.in_flight = false;
                this.eof = true;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.in_flight = false;
                this.eof = true;
                Poll::Ready(Some(Err(ProtocolError::unexpected_eof("request body is no longer readable"))))
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.eof
    }

    fn size_hint(&self) -> SizeHint {
        self.payload_size.into()
    }
}

impl From<SizeHint> for PayloadSize {
    fn from(size_hint: SizeHint) -> Self {
        match size_hint.exact() {
            Some(length) => PayloadSize::new_length(length),
            None => PayloadSize::new_chunked(),
        }
    }
}

impl From<PayloadSize> for SizeHint {
    fn from(payload_size: PayloadSize) -> Self {
        match payload_size {
            PayloadSize::Length(length) => SizeHint::with_exact(length),
            PayloadSize::Chunked | PayloadSize::UntilClose => SizeHint::new(),
            PayloadSize::Empty => SizeHint::with_exact(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::task::noop_waker_ref;
    use futures::FutureExt;

    fn body(payload_size: PayloadSize) -> (mpsc::Receiver<BodyRequestSignal>, mpsc::Sender<Result<PayloadItem, ProtocolError>>, ReqBody) {
        let (signal_sender, signal_receiver) = mpsc::channel(1);
        let (data_sender, data_receiver) = mpsc::channel(1);
        (signal_receiver, data_sender, ReqBody::new(signal_sender, data_receiver, payload_size))
    }

    #[tokio::test]
    async fn only_requests_once_until_response() {
        let (mut signal_receiver, mut data_sender, mut req_body) = body(PayloadSize::new_chunked());

        let waker = noop_waker_ref();
        let mut cx = Context::from_waker(waker);

        assert!(matches!(Pin::new(&mut req_body).poll_frame(&mut cx), Poll::Pending));
        assert!(matches!(signal_receiver.next().await, Some(BodyRequestSignal::RequestData)));

        assert!(matches!(Pin::new(&mut req_body).poll_frame(&mut cx), Poll::Pending));
        assert!(signal_receiver.next().now_or_never().is_none());

        data_sender.try_send(Ok(PayloadItem::Chunk(Bytes::from_static(b"hello")))).expect("send chunk");

        match Pin::new(&mut req_body).poll_frame(&mut cx) {
            Poll::Ready(Some(Ok(frame))) => {
                let data = frame.into_data().expect("expected data frame");
                assert_eq!(data, Bytes::from_static(b"hello"));
            }
            other => panic!("unexpected poll result: {other:?}"),
        }

        assert!(matches!(Pin::new(&mut req_body).poll_frame(&mut cx), Poll::Pending));
        assert!(matches!(signal_receiver.next().await, Some(BodyRequestSignal::RequestData)));

        data_sender.try_send(Ok(PayloadItem::Eof)).expect("send eof");

        assert!(matches!(Pin::new(&mut req_body).poll_frame(&mut cx), Poll::Ready(None)));
        assert!(req_body.is_end_stream());
    }

    #[tokio::test]
    async fn empty_body_never_asks() {
        let (mut signal_receiver, _data_sender, mut req_body) = body(PayloadSize::Empty);

        assert!(req_body.is_end_stream());
        assert_eq!(req_body.size_hint().exact(), Some(0));
        assert!(req_body.read().await.unwrap().is_none());
        assert!(signal_receiver.next().now_or_never().is_none());
    }

    #[tokio::test]
    async fn sender_gone() {
        let (signal_receiver, data_sender, mut req_body) = body(PayloadSize::Length(3));
        drop(signal_receiver);
        drop(data_sender);

        assert!(matches!(req_body.read().await, Err(ProtocolError::UnexpectedEof { .. })));
    }

    #[test]
    fn size_hint() {
        assert_eq!(SizeHint::from(PayloadSize::Length(13)).exact(), Some(13));
        assert_eq!(SizeHint::from(PayloadSize::Chunked).exact(), None);
        assert_eq!(PayloadSize::from(SizeHint::with_exact(0)), PayloadSize::Empty);
        assert_eq!(PayloadSize::from(SizeHint::new()), PayloadSize::Chunked);
    }
}

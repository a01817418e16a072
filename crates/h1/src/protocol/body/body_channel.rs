//! The connection side of the request body pipe.
//!
//! [`BodySender`] runs on the connection task next to the handler. Every time the
//! [`ReqBody`] asks for data it reads exactly one payload item from its
//! [`PayloadSource`] and passes it on, so no body byte is read before the handler wants it.

use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use tracing::{error, trace};

use crate::protocol::body::ReqBody;
use crate::protocol::{PayloadItem, PayloadSize, ProtocolError};

/// Where the body bytes of the current request come from.
pub(crate) trait PayloadSource {
    /// The next piece of the body, [`PayloadItem::Eof`] once it is complete.
    fn read_payload(&mut self) -> impl Future<Output = Result<PayloadItem, ProtocolError>> + Send;
}

pub(crate) fn create_body_sender_receiver(payload_size: PayloadSize) -> (BodySender, ReqBody) {
    let (signal_sender, signal_receiver) = mpsc::channel(1);
    let (data_sender, data_receiver) = mpsc::channel(1);

    (BodySender::new(signal_receiver, data_sender), ReqBody::new(signal_sender, data_receiver, payload_size))
}

#[derive(Debug)]
pub(crate) enum BodyRequestSignal {
    RequestData,
}

#[derive(Debug)]
pub(crate) struct BodySender {
    signal_receiver: mpsc::Receiver<BodyRequestSignal>,
    data_sender: mpsc::Sender<Result<PayloadItem, ProtocolError>>,
    eof: bool,
    /// the body reader is waiting for an answer
    requested: bool,
    /// the body reader is gone or the pipe was closed
    detached: bool,
}

impl BodySender {
    fn new(signal_receiver: mpsc::Receiver<BodyRequestSignal>, data_sender: mpsc::Sender<Result<PayloadItem, ProtocolError>>) -> Self {
        Self { signal_receiver, data_sender, eof: false, requested: false, detached: false }
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.eof
    }

    /// Whether a body reader may still ask for data.
    pub(crate) fn is_serving(&self) -> bool {
        !self.eof && !self.detached
    }

    pub(crate) fn is_requested(&self) -> bool {
        self.requested
    }

    /// Serves read requests until the body is complete or the [`ReqBody`] is dropped.
    ///
    /// A read error is handed to the body reader and returned, the connection can't
    /// continue after it.
    pub(crate) async fn start<S: PayloadSource>(&mut self, source: &mut S) -> Result<(), ProtocolError> {
        while self.is_serving() {
            if self.requested {
                self.answer(source).await?;
            } else {
                self.wait_request().await;
            }
        }
        Ok(())
    }

    /// Waits until the body reader asks for data. Cancel safe, a received request is
    /// remembered until [`answer`](Self::answer) serves it.
    pub(crate) async fn wait_request(&mut self) {
        match self.signal_receiver.next().await {
            Some(BodyRequestSignal::RequestData) => self.requested = true,
            None => {
                trace!("request body reader is gone");
                self.detached = true;
            }
        }
    }

    /// Reads one payload item and hands it to the body reader.
    pub(crate) async fn answer<S: PayloadSource>(&mut self, source: &mut S) -> Result<(), ProtocolError> {
        let result = source.read_payload().await;
        self.requested = false;

        match result {
            Ok(payload_item) => {
                // recorded before sending, the send may be cancelled
                self.eof = payload_item.is_eof();
                if self.data_sender.send(Ok(payload_item)).await.is_err() {
                    trace!("request body dropped while data was in flight");
                    self.detached = true;
                }
                Ok(())
            }

            Err(e) => {
                error!(cause = %e, "failed to read request body");
                if self.data_sender.send(Err(e.clone())).await.is_err() {
                    trace!("request body dropped before the error could be delivered");
                }
                self.detached = true;
                Err(e)
            }
        }
    }

    /// Stops serving the body, a [`ReqBody`] polled after this fails instead of waiting forever.
    pub(crate) fn close(&mut self) {
        self.detached = true;
        self.requested = false;
        self.signal_receiver.close();
        self.data_sender.close_channel();
    }

    /// Reads and discards what the handler left of the body, returning the discarded byte count.
    pub(crate) async fn skip_data<S: PayloadSource>(&mut self, source: &mut S) -> Result<u64, ProtocolError> {
        let mut size = 0;
        while !self.eof {
            match source.read_payload().await? {
                PayloadItem::Chunk(bytes) => size += bytes.len() as u64,
                PayloadItem::Eof => self.eof = true,
            }
        }
        Ok(size)
    }
}

//! Streaming request bodies.
//!
//! The body is a pipe between two halves living on the same connection task:
//!
//! - [`ReqBody`]: the consumer side handed to the handler, implements `http_body::Body`
//! - `BodySender`: the producer side, reads one payload item from the connection per
//!   request from [`ReqBody`] and drains whatever the handler left unread
//!
//! The two halves talk through `futures` channels, which keeps reads lazy: a handler
//! that never touches its body never causes a body byte to be read on its behalf.

mod body_channel;
mod req_body;

pub(crate) use body_channel::{create_body_sender_receiver, BodySender, PayloadSource};
pub use req_body::ReqBody;

//! Transport
//!
//! A connection only needs an ordered stream of inbound text messages and a
//! sink for outbound fragments. [`Inbound`] and [`Outbound`] erase whatever
//! carries them; [`websocket`] supplies the production carrier and tests use
//! in-memory channels.

pub mod websocket;

use std::pin::Pin;

use futures_util::{Sink, Stream};

pub use crate::error::TransportError;

/// Text messages from the client, in arrival order. Ends when the peer closes.
pub type Inbound = Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send>>;

/// HTML fragments to the client.
pub type Outbound = Pin<Box<dyn Sink<String, Error = TransportError> + Send>>;

/// Erase a stream of client messages.
pub fn inbound<S>(stream: S) -> Inbound
where
    S: Stream<Item = Result<String, TransportError>> + Send + 'static,
{
    Box::pin(stream)
}

/// Erase a sink of fragments.
pub fn outbound<S>(sink: S) -> Outbound
where
    S: Sink<String, Error = TransportError> + Send + 'static,
{
    Box::pin(sink)
}

//! Push channel abstraction
//!
//! A `Channel` is a full-duplex link to the simulation producer. The session
//! sends one subscription frame, then is the channel's only reader. Any
//! transport that can move `ChannelFrame`s both ways can implement it; the
//! ZMQ DEALER transport lives in `zmq_channel`, and `memory_channel` backs
//! tests and local producers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use epiproto::{ChannelFrame, WireError};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum ChannelError {
    /// The transport itself failed. Terminal for the session.
    #[error("transport error: {0}")]
    Transport(String),

    /// One inbound message could not be decoded. The channel is still usable.
    #[error("undecodable frame: {0}")]
    Decode(#[from] WireError),

    #[error("channel is closed")]
    Closed,
}

impl ChannelError {
    /// Whether the session can keep reading after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ChannelError::Decode(_))
    }
}

#[async_trait]
pub trait Channel: Send {
    /// Send a frame to the producer.
    async fn send(&mut self, frame: ChannelFrame) -> Result<(), ChannelError>;

    /// Next inbound frame, in producer order.
    ///
    /// Returns `None` once the channel has been closed, locally or by the
    /// peer.
    async fn recv(&mut self) -> Option<Result<ChannelFrame, ChannelError>>;

    /// Release the transport. Idempotent.
    fn close(&mut self);

    fn is_closed(&self) -> bool;
}

type Inbound = Result<ChannelFrame, ChannelError>;

/// Create an in-process channel pair.
pub fn memory_channel() -> (MemoryChannel, MemoryProducer) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let closed = Arc::new(AtomicBool::new(false));

    let channel = MemoryChannel {
        inbound: Some(inbound_rx),
        outbound: Some(outbound_tx),
        closed: Arc::clone(&closed),
    };
    let producer = MemoryProducer {
        inbound: inbound_tx,
        outbound: outbound_rx,
        closed,
    };
    (channel, producer)
}

/// Viewer end of an in-process channel.
pub struct MemoryChannel {
    inbound: Option<mpsc::UnboundedReceiver<Inbound>>,
    outbound: Option<mpsc::UnboundedSender<ChannelFrame>>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl Channel for MemoryChannel {
    async fn send(&mut self, frame: ChannelFrame) -> Result<(), ChannelError> {
        let outbound = self.outbound.as_ref().ok_or(ChannelError::Closed)?;
        outbound
            .send(frame)
            .map_err(|_| ChannelError::Transport("producer went away".to_string()))
    }

    async fn recv(&mut self) -> Option<Inbound> {
        self.inbound.as_mut()?.recv().await
    }

    fn close(&mut self) {
        self.inbound = None;
        self.outbound = None;
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Producer end of an in-process channel.
pub struct MemoryProducer {
    inbound: mpsc::UnboundedSender<Inbound>,
    outbound: mpsc::UnboundedReceiver<ChannelFrame>,
    closed: Arc<AtomicBool>,
}

impl MemoryProducer {
    /// Push a `gridData` payload. Returns false once the viewer has closed.
    pub fn push(&self, payload: Value) -> bool {
        self.push_frame(ChannelFrame::grid_data(payload))
    }

    pub fn push_frame(&self, frame: ChannelFrame) -> bool {
        self.inbound.send(Ok(frame)).is_ok()
    }

    /// Deliver an error to the viewer as if the transport produced it.
    pub fn inject_error(&self, error: ChannelError) -> bool {
        self.inbound.send(Err(error)).is_ok()
    }

    /// Next frame the viewer sent, if any is waiting.
    pub fn try_recv_sent(&mut self) -> Option<ChannelFrame> {
        self.outbound.try_recv().ok()
    }

    /// Whether the viewer has released its end.
    pub fn viewer_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Drop the connection without an end-of-stream message.
    pub fn hang_up(self) {}
}

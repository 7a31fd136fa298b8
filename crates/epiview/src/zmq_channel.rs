//! ZMQ DEALER transport for the grid-updates channel
//!
//! The producer binds a ROUTER; each viewer connects a DEALER whose routing
//! identity embeds the simulation id. One JSON frame per message.

use anyhow::Result;
use async_trait::async_trait;
use epiproto::socket_config::{create_dealer_and_connect, single_frame, Multipart, ZmqContext};
use epiproto::{wire, ChannelFrame};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tmq::dealer::Dealer;
use tracing::{debug, info};

use crate::channel::{Channel, ChannelError};

pub struct ZmqChannel {
    endpoint: String,
    // Keeps the libzmq context alive as long as the socket halves
    _context: ZmqContext,
    tx: Option<SplitSink<Dealer, Multipart>>,
    rx: Option<SplitStream<Dealer>>,
}

impl ZmqChannel {
    /// Connect to the producer. ZMQ connects lazily, so this succeeds even if
    /// the producer is not up yet; frames queue until it is.
    pub fn connect(endpoint: &str, identity: &[u8]) -> Result<Self> {
        let context = ZmqContext::new();
        let socket = create_dealer_and_connect(&context, endpoint, identity, "grid-updates")?;
        let (tx, rx) = socket.split();

        info!("grid-updates channel connecting to {}", endpoint);

        Ok(Self {
            endpoint: endpoint.to_string(),
            _context: context,
            tx: Some(tx),
            rx: Some(rx),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Channel for ZmqChannel {
    async fn send(&mut self, frame: ChannelFrame) -> Result<(), ChannelError> {
        let tx = self.tx.as_mut().ok_or(ChannelError::Closed)?;
        let bytes = wire::encode(&frame).map_err(|e| ChannelError::Transport(e.to_string()))?;
        tx.send(single_frame(bytes))
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<ChannelFrame, ChannelError>> {
        let rx = self.rx.as_mut()?;
        match rx.next().await? {
            Ok(multipart) => {
                // DEALER sees only the payload; take the last frame in case
                // the producer sent an empty delimiter first
                let data = multipart.into_iter().last().map(|m| m.to_vec());
                let decoded = match data {
                    Some(bytes) => wire::decode(&bytes).map_err(ChannelError::from),
                    None => Err(ChannelError::Decode(epiproto::WireError::Empty)),
                };
                Some(decoded)
            }
            Err(e) => Some(Err(ChannelError::Transport(e.to_string()))),
        }
    }

    fn close(&mut self) {
        let tx = self.tx.take();
        let rx = self.rx.take();
        if tx.is_some() || rx.is_some() {
            debug!("grid-updates channel to {} closed", self.endpoint);
        }
    }

    fn is_closed(&self) -> bool {
        self.tx.is_none() && self.rx.is_none()
    }
}

//! Two named pub/sub topics separating adapter-produced traffic (`Ingress`)
//! from hub-produced traffic (`Egress`), each a simple publish /
//! subscribe-stream pair over a [`fishroom_broker::Broker`].

use std::pin::Pin;
use std::sync::Arc;

use fishroom_broker::{Broker, BrokerError};
use fishroom_core::{codec, keys, Message};
use futures::{Stream, StreamExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ingress,
    Egress,
}

impl Direction {
    fn channel(self, prefix: &str) -> String {
        match self {
            Direction::Ingress => keys::ingress_channel(prefix),
            Direction::Egress => keys::egress_channel(prefix),
        }
    }
}

/// A bus instance bound to one direction. Construct one `Bus` per worker
/// rather than sharing a single instance across directions, mirroring the
/// "one broker connection per worker" resource policy.
pub struct Bus {
    broker: Arc<dyn Broker>,
    prefix: String,
    direction: Direction,
}

impl Bus {
    pub fn new(broker: Arc<dyn Broker>, prefix: impl Into<String>, direction: Direction) -> Self {
        Bus {
            broker,
            prefix: prefix.into(),
            direction,
        }
    }

    pub fn channel(&self) -> String {
        self.direction.channel(&self.prefix)
    }

    pub async fn publish(&self, msg: &Message) -> Result<(), BrokerError> {
        self.broker.publish(&self.channel(), &codec::encode(msg)).await
    }

    /// Subscribes and returns a stream that decodes every payload, never
    /// terminating on a bad payload (it yields the decode-error sentinel
    /// instead) — the stream is the hub's only source of liveness.
    pub async fn subscribe(&self) -> Result<Pin<Box<dyn Stream<Item = Message> + Send>>, BrokerError> {
        let raw = self.broker.subscribe(&self.channel()).await?;
        let decoded = raw.map(|payload| codec::decode(&payload));
        Ok(Box::pin(decoded))
    }
}

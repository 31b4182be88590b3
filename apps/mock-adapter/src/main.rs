use std::sync::Arc;

use async_trait::async_trait;
use fishroom_adapter::{Adapter, AdapterError, Capabilities, TextSend};
use fishroom_broker::{Broker, RedisBroker};
use fishroom_bus::{Bus, Direction};
use fishroom_core::{ChannelTag, FishroomConfig, Message};
use futures::StreamExt;
use time::OffsetDateTime;
use tokio::io::{AsyncBufReadExt, BufReader};

/// A demo adapter exercising the [`Adapter`] contract end to end: lines
/// typed on stdin become ingress messages from channel `mock`, and any
/// egress message routed to `mock` is printed to stdout. Useful for driving
/// the hub manually without a real protocol integration.
struct StdioAdapter {
    receiver: String,
}

#[async_trait]
impl Adapter for StdioAdapter {
    fn tag(&self) -> ChannelTag {
        ChannelTag::Other("mock".to_string())
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            supports_multiline: true,
            supports_photo: false,
        }
    }

    async fn receive_loop(&self, ingress: &Bus) -> Result<(), AdapterError> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            let mut msg = Message::new(self.tag(), "mock-user", self.receiver.clone(), line);
            let now = OffsetDateTime::now_utc();
            msg.date = format!("{:04}-{:02}-{:02}", now.year(), now.month() as u8, now.day());
            msg.time = format!("{:02}:{:02}:{:02}", now.hour(), now.minute(), now.second());
            ingress.publish(&msg).await?;
        }
        Ok(())
    }

    async fn send_text(&self, send: TextSend<'_>) -> Result<(), AdapterError> {
        match send.sender {
            Some(sender) => println!("[mock -> {}] {}: {}", send.target, sender, send.content),
            None => println!("[mock -> {}] {}", send.target, send.content),
        }
        Ok(())
    }

    async fn send_photo(&self, target: &str, bytes: &[u8], sender: Option<&str>) -> Result<(), AdapterError> {
        println!("[mock -> {target}] <photo {} bytes from {:?}>", bytes.len(), sender);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = FishroomConfig::from_env()?;
    let broker: Arc<dyn Broker> = Arc::new(RedisBroker::connect(&config.redis_url).await?);
    let adapter = Arc::new(StdioAdapter {
        receiver: "#mock".to_string(),
    });

    let ingress = Bus::new(broker.clone(), &config.key_prefix, Direction::Ingress);
    let egress = Bus::new(broker.clone(), &config.key_prefix, Direction::Egress);

    let receive_task = {
        let adapter = adapter.clone();
        tokio::spawn(async move { adapter.receive_loop(&ingress).await })
    };

    let egress_task = {
        let adapter = adapter.clone();
        tokio::spawn(async move {
            let mut stream = egress.subscribe().await?;
            while let Some(msg) = stream.next().await {
                adapter.forward_from_hub(&msg).await;
            }
            Ok::<(), anyhow::Error>(())
        })
    };

    tokio::select! {
        res = receive_task => { res??; }
        res = egress_task => { res??; }
    }
    Ok(())
}

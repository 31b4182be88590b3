use std::sync::Arc;

use async_trait::async_trait;
use fishroom_broker::Broker;
use fishroom_core::keys;
use fishroom_core::Message;
use time::OffsetDateTime;

use crate::error::StoreError;

/// Append-only per-`(room, date)` log, used both for the web chat history
/// view and as the redirect target for overflowed long text.
#[async_trait]
pub trait ChatLog: Send + Sync {
    /// Appends `msg` and returns its index within the day's log (the
    /// `msg_id` used to build a `/log/<room>/<date>/<msg_id>` URL).
    async fn log(&self, room: &str, date: &str, msg: &Message) -> Result<i64, StoreError>;
    async fn range(&self, room: &str, date: &str, start: i64, stop: i64) -> Result<Vec<Message>, StoreError>;
}

pub struct BrokerChatLog {
    broker: Arc<dyn Broker>,
    prefix: String,
}

impl BrokerChatLog {
    pub fn new(broker: Arc<dyn Broker>, prefix: impl Into<String>) -> Self {
        BrokerChatLog {
            broker,
            prefix: prefix.into(),
        }
    }

    /// Formats a UTC timestamp the way chat log keys are dated (`YYYY-MM-DD`).
    pub fn today() -> String {
        let now = OffsetDateTime::now_utc();
        format!("{:04}-{:02}-{:02}", now.year(), now.month() as u8, now.day())
    }
}

#[async_trait]
impl ChatLog for BrokerChatLog {
    async fn log(&self, room: &str, date: &str, msg: &Message) -> Result<i64, StoreError> {
        let key = keys::chat_log_key(&self.prefix, room, date);
        let msg_id = self.broker.llen(&key).await?;
        self.broker.rpush(&key, &fishroom_core::codec::encode(msg)).await?;
        Ok(msg_id)
    }

    async fn range(&self, room: &str, date: &str, start: i64, stop: i64) -> Result<Vec<Message>, StoreError> {
        let key = keys::chat_log_key(&self.prefix, room, date);
        let raw = self.broker.lrange(&key, start, stop).await?;
        Ok(raw.iter().map(|payload| fishroom_core::codec::decode(payload)).collect())
    }
}

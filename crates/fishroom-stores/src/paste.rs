use std::sync::Arc;

use async_trait::async_trait;
use fishroom_broker::Broker;
use fishroom_core::keys;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use time::OffsetDateTime;

use crate::error::StoreError;

/// A request to overflow a message's text somewhere off-band, returning the
/// URL to splice into the truncated line sent to the network instead.
pub struct PasteRequest<'a> {
    pub content: &'a str,
    pub sender: &'a str,
    pub room: &'a str,
    pub date: &'a str,
    pub time: &'a str,
    pub msg_id: i64,
}

/// Collaborator the hub calls when a message's rendered text would overflow
/// a network's single-message limit. Returning `None` means "send the text
/// unmodified anyway" (no paste backend configured).
#[async_trait]
pub trait NewPaste: Send + Sync {
    async fn new_paste(&self, req: PasteRequest<'_>) -> Result<Option<String>, StoreError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredPaste {
    title: String,
    time: String,
    content: String,
}

/// Stores the overflowed text as its own JSON blob in the broker and returns
/// a `{baseurl}/text/{id}` link, where `id` is a short hash of the content.
pub struct RedisPasteStore {
    broker: Arc<dyn Broker>,
    prefix: String,
    baseurl: String,
}

impl RedisPasteStore {
    pub fn new(broker: Arc<dyn Broker>, prefix: impl Into<String>, baseurl: impl Into<String>) -> Self {
        RedisPasteStore {
            broker,
            prefix: prefix.into(),
            baseurl: baseurl.into(),
        }
    }
}

#[async_trait]
impl NewPaste for RedisPasteStore {
    async fn new_paste(&self, req: PasteRequest<'_>) -> Result<Option<String>, StoreError> {
        let stamp = OffsetDateTime::now_utc().unix_timestamp();
        let mut hasher = Sha1::new();
        hasher.update(req.content.as_bytes());
        hasher.update(req.sender.as_bytes());
        hasher.update(stamp.to_string().as_bytes());
        let id = &hex::encode(hasher.finalize())[..16];

        let stored = StoredPaste {
            title: format!("Text from {}", req.sender),
            time: req.time.to_string(),
            content: req.content.to_string(),
        };
        let key = keys::text_store_key(&self.prefix, id);
        self.broker.set(&key, &serde_json::to_string(&stored)?).await?;
        Ok(Some(format!("{}/text/{id}", self.baseurl)))
    }
}

/// Redirects overflowed text to the chat log entry that already holds it in
/// full, rather than storing a second copy.
pub struct ChatLogRedirectPaste {
    baseurl: String,
}

impl ChatLogRedirectPaste {
    pub fn new(baseurl: impl Into<String>) -> Self {
        ChatLogRedirectPaste { baseurl: baseurl.into() }
    }
}

#[async_trait]
impl NewPaste for ChatLogRedirectPaste {
    async fn new_paste(&self, req: PasteRequest<'_>) -> Result<Option<String>, StoreError> {
        Ok(Some(format!("{}/log/{}/{}/{}", self.baseurl, req.room, req.date, req.msg_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fishroom_broker::InMemoryBroker;

    #[tokio::test]
    async fn redis_paste_store_stores_the_content_and_returns_a_text_url() {
        let store = RedisPasteStore::new(Arc::new(InMemoryBroker::new()), "fishroom", "https://fish.example");
        let url = store
            .new_paste(PasteRequest {
                content: "a very long message",
                sender: "alice",
                room: "lounge",
                date: "2026-08-01",
                time: "12:00:00",
                msg_id: 3,
            })
            .await
            .unwrap()
            .unwrap();
        assert!(url.starts_with("https://fish.example/text/"));
    }

    #[tokio::test]
    async fn chat_log_redirect_paste_builds_a_deterministic_url() {
        let store = ChatLogRedirectPaste::new("https://fish.example");
        let url = store
            .new_paste(PasteRequest {
                content: "a very long message",
                sender: "alice",
                room: "lounge",
                date: "2026-08-01",
                time: "12:00:00",
                msg_id: 3,
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(url, "https://fish.example/log/lounge/2026-08-01/3");
    }
}

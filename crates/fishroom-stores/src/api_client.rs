use std::sync::Arc;

use async_trait::async_trait;
use fishroom_broker::Broker;
use fishroom_core::keys;
use fishroom_core::Message;
use sha1::{Digest, Sha1};

use crate::error::StoreError;

const QUEUE_MAX_LEN: i64 = 15;
const QUEUE_TTL_SECS: i64 = 60;

fn digest_hex(token_key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(token_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Registry of long-poll API clients: `token_id` names a client, `token_key`
/// is the secret it authenticates with (stored only as a sha1 digest), and
/// each registered client gets its own bounded, TTL'd inbox queue.
///
/// The original implementation this is grounded on accidentally checked a
/// module-global `args.token_id` instead of the `token_id` argument in
/// `revoke`/`exists`, so any token id would revoke or report on whatever
/// token happened to be last parsed from argv. That bug is not reproduced
/// here: both methods operate on the `token_id` the caller actually passed.
#[async_trait]
pub trait ApiClientRegistry: Send + Sync {
    async fn add(&self, token_id: &str, token_key: &str, name: &str) -> Result<(), StoreError>;
    async fn auth(&self, token_id: &str, token_key: &str) -> Result<bool, StoreError>;
    async fn name(&self, token_id: &str) -> Result<Option<String>, StoreError>;
    async fn list(&self) -> Result<Vec<(String, String)>, StoreError>;
    async fn revoke(&self, token_id: &str) -> Result<(), StoreError>;
    async fn exists(&self, token_id: &str) -> Result<bool, StoreError>;
    async fn publish(&self, msg: &Message) -> Result<(), StoreError>;
    async fn poll(&self, token_id: &str, timeout: std::time::Duration) -> Result<Option<Message>, StoreError>;
}

pub struct BrokerApiClientRegistry {
    broker: Arc<dyn Broker>,
    prefix: String,
}

impl BrokerApiClientRegistry {
    pub fn new(broker: Arc<dyn Broker>, prefix: impl Into<String>) -> Self {
        BrokerApiClientRegistry {
            broker,
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl ApiClientRegistry for BrokerApiClientRegistry {
    async fn add(&self, token_id: &str, token_key: &str, name: &str) -> Result<(), StoreError> {
        let clients_key = keys::api_clients_key(&self.prefix);
        if self.broker.hexists(&clients_key, token_id).await? {
            return Err(StoreError::TokenAlreadyExists(token_id.to_string()));
        }
        self.broker.hset(&clients_key, token_id, &digest_hex(token_key)).await?;
        let names_key = keys::api_clients_name_key(&self.prefix);
        self.broker.hset(&names_key, token_id, name).await?;
        Ok(())
    }

    async fn auth(&self, token_id: &str, token_key: &str) -> Result<bool, StoreError> {
        let clients_key = keys::api_clients_key(&self.prefix);
        let stored = self.broker.hget(&clients_key, token_id).await?;
        Ok(stored.as_deref() == Some(digest_hex(token_key).as_str()))
    }

    async fn name(&self, token_id: &str) -> Result<Option<String>, StoreError> {
        let names_key = keys::api_clients_name_key(&self.prefix);
        Ok(self.broker.hget(&names_key, token_id).await?)
    }

    async fn list(&self) -> Result<Vec<(String, String)>, StoreError> {
        let clients_key = keys::api_clients_key(&self.prefix);
        let names_key = keys::api_clients_name_key(&self.prefix);
        let ids = self.broker.hgetall(&clients_key).await?;
        let names: std::collections::HashMap<String, String> = self.broker.hgetall(&names_key).await?.into_iter().collect();
        Ok(ids
            .into_iter()
            .map(|(id, _)| {
                let name = names.get(&id).cloned().unwrap_or_else(|| "nobot".to_string());
                (id, name)
            })
            .collect())
    }

    async fn revoke(&self, token_id: &str) -> Result<(), StoreError> {
        let clients_key = keys::api_clients_key(&self.prefix);
        let names_key = keys::api_clients_name_key(&self.prefix);
        self.broker.hdel(&clients_key, token_id).await?;
        self.broker.hdel(&names_key, token_id).await?;
        let queue_key = keys::api_queue_key(&self.prefix, token_id);
        self.broker.ltrim(&queue_key, 1, 0).await?;
        Ok(())
    }

    async fn exists(&self, token_id: &str) -> Result<bool, StoreError> {
        let clients_key = keys::api_clients_key(&self.prefix);
        Ok(self.broker.hexists(&clients_key, token_id).await?)
    }

    async fn publish(&self, msg: &Message) -> Result<(), StoreError> {
        let clients_key = keys::api_clients_key(&self.prefix);
        let ids = self.broker.hgetall(&clients_key).await?;
        let payload = fishroom_core::codec::encode(msg);
        for (token_id, _) in ids {
            let queue_key = keys::api_queue_key(&self.prefix, &token_id);
            self.broker.rpush(&queue_key, &payload).await?;
            self.broker.ltrim(&queue_key, -QUEUE_MAX_LEN, -1).await?;
            self.broker.expire(&queue_key, QUEUE_TTL_SECS).await?;
        }
        Ok(())
    }

    async fn poll(&self, token_id: &str, timeout: std::time::Duration) -> Result<Option<Message>, StoreError> {
        let queue_key = keys::api_queue_key(&self.prefix, token_id);
        let payload = self.broker.blpop(&queue_key, timeout).await?;
        Ok(payload.map(|p| fishroom_core::codec::decode(&p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fishroom_broker::InMemoryBroker;
    use fishroom_core::ChannelTag;

    fn registry() -> BrokerApiClientRegistry {
        BrokerApiClientRegistry::new(Arc::new(InMemoryBroker::new()), "fishroom")
    }

    #[tokio::test]
    async fn add_then_auth_round_trips() {
        let reg = registry();
        reg.add("abc", "secret", "webbot").await.unwrap();
        assert!(reg.auth("abc", "secret").await.unwrap());
        assert!(!reg.auth("abc", "wrong").await.unwrap());
    }

    #[tokio::test]
    async fn add_rejects_duplicate_token_id() {
        let reg = registry();
        reg.add("abc", "secret", "webbot").await.unwrap();
        let err = reg.add("abc", "other", "webbot2").await.unwrap_err();
        assert!(matches!(err, StoreError::TokenAlreadyExists(id) if id == "abc"));
    }

    #[tokio::test]
    async fn list_defaults_missing_name_to_nobot() {
        let reg = registry();
        reg.add("abc", "secret", "webbot").await.unwrap();
        let clients_key = keys::api_clients_key("fishroom");
        reg.broker.hset(&clients_key, "noname", &digest_hex("x")).await.unwrap();
        let mut listed = reg.list().await.unwrap();
        listed.sort();
        assert_eq!(listed, vec![("abc".to_string(), "webbot".to_string()), ("noname".to_string(), "nobot".to_string())]);
    }

    #[tokio::test]
    async fn name_resolves_the_registered_display_name() {
        let reg = registry();
        reg.add("abc", "secret", "webbot").await.unwrap();
        assert_eq!(reg.name("abc").await.unwrap(), Some("webbot".to_string()));
        assert_eq!(reg.name("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn revoke_only_affects_the_given_token_id() {
        let reg = registry();
        reg.add("abc", "secret", "webbot").await.unwrap();
        reg.add("xyz", "secret2", "otherbot").await.unwrap();
        reg.revoke("abc").await.unwrap();
        assert!(!reg.exists("abc").await.unwrap());
        assert!(reg.exists("xyz").await.unwrap());
    }

    #[tokio::test]
    async fn publish_fans_out_to_every_registered_client_queue() {
        let reg = registry();
        reg.add("abc", "secret", "webbot").await.unwrap();
        reg.add("xyz", "secret2", "otherbot").await.unwrap();
        let msg = Message::new(ChannelTag::Irc, "alice", "#lounge", "hi");
        reg.publish(&msg).await.unwrap();
        let got = reg.poll("abc", std::time::Duration::from_millis(10)).await.unwrap();
        assert_eq!(got.unwrap().content, "hi");
        let got = reg.poll("xyz", std::time::Duration::from_millis(10)).await.unwrap();
        assert_eq!(got.unwrap().content, "hi");
    }

    #[tokio::test]
    async fn poll_times_out_on_an_empty_queue() {
        let reg = registry();
        reg.add("abc", "secret", "webbot").await.unwrap();
        let got = reg.poll("abc", std::time::Duration::from_millis(10)).await.unwrap();
        assert!(got.is_none());
    }
}

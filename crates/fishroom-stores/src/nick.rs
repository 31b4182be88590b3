use std::sync::Arc;

use async_trait::async_trait;
use fishroom_broker::Broker;
use fishroom_core::keys;

use crate::error::StoreError;

/// `(user_id -> nickname)` and reverse `(nickname -> username)`, used to
/// substitute `@nick` mentions into network-native handles on egress.
#[async_trait]
pub trait NickStore: Send + Sync {
    async fn get(&self, user_id: &str, hint_username: Option<&str>) -> Result<String, StoreError>;
    async fn set(&self, user_id: &str, nickname: &str) -> Result<(), StoreError>;
    async fn get_username(&self, nickname: &str) -> Result<Option<String>, StoreError>;
    async fn set_username(&self, nickname: &str, username: &str) -> Result<(), StoreError>;
}

pub struct BrokerNickStore {
    broker: Arc<dyn Broker>,
    prefix: String,
}

impl BrokerNickStore {
    pub fn new(broker: Arc<dyn Broker>, prefix: impl Into<String>) -> Self {
        BrokerNickStore {
            broker,
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl NickStore for BrokerNickStore {
    async fn get(&self, user_id: &str, hint_username: Option<&str>) -> Result<String, StoreError> {
        let key = keys::nick_key(&self.prefix);
        let nick = self.broker.hget(&key, user_id).await?;
        if let Some(nick) = nick.filter(|n| !n.is_empty()) {
            return Ok(nick);
        }
        if let Some(username) = hint_username.filter(|u| !u.is_empty()) {
            self.set(user_id, username).await?;
            return Ok(username.to_string());
        }
        Ok(format!("tg-{user_id}"))
    }

    async fn set(&self, user_id: &str, nickname: &str) -> Result<(), StoreError> {
        let key = keys::nick_key(&self.prefix);
        self.broker.hset(&key, user_id, nickname).await?;
        Ok(())
    }

    async fn get_username(&self, nickname: &str) -> Result<Option<String>, StoreError> {
        let key = keys::username_key(&self.prefix);
        Ok(self.broker.hget(&key, nickname).await?)
    }

    async fn set_username(&self, nickname: &str, username: &str) -> Result<(), StoreError> {
        let key = keys::username_key(&self.prefix);
        self.broker.hset(&key, nickname, username).await?;
        Ok(())
    }
}

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use redis::AsyncCommands;

use crate::{Broker, BrokerError, SubscriptionStream};

/// Redis-backed broker. Regular commands go through a cloned
/// [`redis::aio::ConnectionManager`] (cheap to clone, auto-reconnects);
/// `subscribe` opens its own dedicated pub/sub connection since a
/// `ConnectionManager` cannot multiplex `SUBSCRIBE` with normal commands.
pub struct RedisBroker {
    client: redis::Client,
    conn: redis::aio::ConnectionManager,
}

impl RedisBroker {
    pub async fn connect(url: &str) -> Result<Self, BrokerError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(RedisBroker { client, conn })
    }
}

#[async_trait]
impl Broker for RedisBroker {
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), BrokerError> {
        let mut conn = self.conn.clone();
        conn.hset::<_, _, _, ()>(key, field, value).await?;
        Ok(())
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, BrokerError> {
        let mut conn = self.conn.clone();
        Ok(conn.hget(key, field).await?)
    }

    async fn hgetall(&self, key: &str) -> Result<Vec<(String, String)>, BrokerError> {
        let mut conn = self.conn.clone();
        let map: std::collections::HashMap<String, String> = conn.hgetall(key).await?;
        Ok(map.into_iter().collect())
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<(), BrokerError> {
        let mut conn = self.conn.clone();
        conn.hdel::<_, _, ()>(key, field).await?;
        Ok(())
    }

    async fn hexists(&self, key: &str, field: &str) -> Result<bool, BrokerError> {
        let mut conn = self.conn.clone();
        Ok(conn.hexists(key, field).await?)
    }

    async fn rpush(&self, key: &str, value: &str) -> Result<i64, BrokerError> {
        let mut conn = self.conn.clone();
        Ok(conn.rpush(key, value).await?)
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>, BrokerError> {
        let mut conn = self.conn.clone();
        Ok(conn.lrange(key, start as isize, stop as isize).await?)
    }

    async fn llen(&self, key: &str) -> Result<i64, BrokerError> {
        let mut conn = self.conn.clone();
        Ok(conn.llen(key).await?)
    }

    async fn ltrim(&self, key: &str, start: i64, stop: i64) -> Result<(), BrokerError> {
        let mut conn = self.conn.clone();
        conn.ltrim::<_, ()>(key, start as isize, stop as isize).await?;
        Ok(())
    }

    async fn lindex(&self, key: &str, index: i64) -> Result<Option<String>, BrokerError> {
        let mut conn = self.conn.clone();
        Ok(conn.lindex(key, index as isize).await?)
    }

    async fn blpop(&self, key: &str, timeout: Duration) -> Result<Option<String>, BrokerError> {
        let mut conn = self.conn.clone();
        let result: Option<(String, String)> =
            conn.blpop(key, timeout.as_secs_f64()).await?;
        Ok(result.map(|(_, value)| value))
    }

    async fn expire(&self, key: &str, seconds: i64) -> Result<(), BrokerError> {
        let mut conn = self.conn.clone();
        conn.expire::<_, ()>(key, seconds).await?;
        Ok(())
    }

    async fn incr_by(&self, key: &str, amount: i64) -> Result<i64, BrokerError> {
        let mut conn = self.conn.clone();
        Ok(conn.incr(key, amount).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), BrokerError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, BrokerError> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<(), BrokerError> {
        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(channel, payload).await?;
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<SubscriptionStream, BrokerError> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(channel).await?;
        let stream = pubsub
            .into_on_message()
            .filter_map(|msg| async move { msg.get_payload::<String>().ok() });
        Ok(Box::pin(stream))
    }
}

//! Thin abstraction over a key/value store offering hashes, lists, atomic
//! counters, blocking list-pop and pub/sub channels. Every stateful
//! sub-component (bus, stores) is built against the [`Broker`] trait rather
//! than a concrete Redis type, so tests can run against [`memory::InMemoryBroker`].

pub mod error;
pub mod memory;
pub mod redis_broker;

pub use error::BrokerError;
pub use memory::InMemoryBroker;
pub use redis_broker::RedisBroker;

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;

pub type SubscriptionStream = Pin<Box<dyn Stream<Item = String> + Send>>;

#[async_trait]
pub trait Broker: Send + Sync {
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), BrokerError>;
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, BrokerError>;
    async fn hgetall(&self, key: &str) -> Result<Vec<(String, String)>, BrokerError>;
    async fn hdel(&self, key: &str, field: &str) -> Result<(), BrokerError>;
    async fn hexists(&self, key: &str, field: &str) -> Result<bool, BrokerError>;

    async fn rpush(&self, key: &str, value: &str) -> Result<i64, BrokerError>;
    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>, BrokerError>;
    async fn llen(&self, key: &str) -> Result<i64, BrokerError>;
    async fn ltrim(&self, key: &str, start: i64, stop: i64) -> Result<(), BrokerError>;
    async fn lindex(&self, key: &str, index: i64) -> Result<Option<String>, BrokerError>;
    async fn blpop(&self, key: &str, timeout: Duration) -> Result<Option<String>, BrokerError>;

    async fn expire(&self, key: &str, seconds: i64) -> Result<(), BrokerError>;

    async fn incr_by(&self, key: &str, amount: i64) -> Result<i64, BrokerError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), BrokerError>;
    async fn get(&self, key: &str) -> Result<Option<String>, BrokerError>;

    async fn publish(&self, channel: &str, payload: &str) -> Result<(), BrokerError>;
    async fn subscribe(&self, channel: &str) -> Result<SubscriptionStream, BrokerError>;
}

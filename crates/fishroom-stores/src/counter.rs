use std::sync::Arc;

use async_trait::async_trait;
use fishroom_broker::Broker;
use fishroom_core::keys;

use crate::error::StoreError;

/// Named atomic counter, used to mint unique names for uploaded blobs.
#[async_trait]
pub trait Counter: Send + Sync {
    async fn incr(&self, name: &str, amount: i64) -> Result<i64, StoreError>;
}

pub struct BrokerCounter {
    broker: Arc<dyn Broker>,
    prefix: String,
}

impl BrokerCounter {
    pub fn new(broker: Arc<dyn Broker>, prefix: impl Into<String>) -> Self {
        BrokerCounter {
            broker,
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl Counter for BrokerCounter {
    async fn incr(&self, name: &str, amount: i64) -> Result<i64, StoreError> {
        let key = keys::counter_key(&self.prefix, name);
        Ok(self.broker.incr_by(&key, amount).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fishroom_broker::InMemoryBroker;

    #[tokio::test]
    async fn increments_accumulate_per_name() {
        let counter = BrokerCounter::new(Arc::new(InMemoryBroker::new()), "fishroom");
        assert_eq!(counter.incr("qiniu", 1).await.unwrap(), 1);
        assert_eq!(counter.incr("qiniu", 1).await.unwrap(), 2);
        assert_eq!(counter.incr("other", 5).await.unwrap(), 5);
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use fishroom_broker::Broker;
use fishroom_core::keys;
use time::OffsetDateTime;

use crate::error::StoreError;

/// Sliding-window-of-last-N-triggers rate limiter per `(room, command)`: a
/// list of recent trigger timestamps is trimmed to the last `count` entries,
/// and a new trigger is allowed only once the oldest of those is older than
/// `period_secs`.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Checks and, if allowed, records a trigger at `now` (unix seconds).
    async fn check_at(&self, room: &str, cmd: &str, period_secs: i64, count: i64, now: i64) -> Result<bool, StoreError>;

    /// Convenience wrapper using the wall clock.
    async fn check(&self, room: &str, cmd: &str, period_secs: i64, count: i64) -> Result<bool, StoreError> {
        self.check_at(room, cmd, period_secs, count, OffsetDateTime::now_utc().unix_timestamp())
            .await
    }
}

pub struct BrokerRateLimiter {
    broker: Arc<dyn Broker>,
    prefix: String,
}

impl BrokerRateLimiter {
    pub fn new(broker: Arc<dyn Broker>, prefix: impl Into<String>) -> Self {
        BrokerRateLimiter {
            broker,
            prefix: prefix.into(),
        }
    }

    async fn trigger(&self, key: &str, now: i64) -> Result<(), StoreError> {
        self.broker.rpush(key, &now.to_string()).await?;
        Ok(())
    }
}

#[async_trait]
impl RateLimiter for BrokerRateLimiter {
    async fn check_at(&self, room: &str, cmd: &str, period_secs: i64, count: i64, now: i64) -> Result<bool, StoreError> {
        let key = keys::rate_limit_key(&self.prefix, room, cmd);
        let len = self.broker.llen(&key).await?;
        if len < count {
            self.trigger(&key, now).await?;
            return Ok(true);
        }

        self.broker.ltrim(&key, -count, -1).await?;
        let oldest = self.broker.lindex(&key, 0).await?.and_then(|s| s.parse::<i64>().ok());
        match oldest {
            Some(oldest) if now - oldest <= period_secs => Ok(false),
            _ => {
                self.trigger(&key, now).await?;
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fishroom_broker::InMemoryBroker;

    fn limiter() -> BrokerRateLimiter {
        BrokerRateLimiter::new(Arc::new(InMemoryBroker::new()), "fishroom")
    }

    #[tokio::test]
    async fn allows_up_to_count_triggers_then_denies_within_period() {
        let limiter = limiter();
        assert!(limiter.check_at("lounge", "pia", 30, 2, 0).await.unwrap());
        assert!(limiter.check_at("lounge", "pia", 30, 2, 1).await.unwrap());
        assert!(!limiter.check_at("lounge", "pia", 30, 2, 2).await.unwrap());
    }

    #[tokio::test]
    async fn allows_again_once_the_oldest_trigger_ages_out() {
        let limiter = limiter();
        assert!(limiter.check_at("lounge", "pia", 30, 2, 0).await.unwrap());
        assert!(limiter.check_at("lounge", "pia", 30, 2, 1).await.unwrap());
        assert!(!limiter.check_at("lounge", "pia", 30, 2, 2).await.unwrap());
        assert!(limiter.check_at("lounge", "pia", 30, 2, 31).await.unwrap());
    }

    #[tokio::test]
    async fn rooms_and_commands_are_independent() {
        let limiter = limiter();
        assert!(limiter.check_at("lounge", "pia", 30, 1, 0).await.unwrap());
        assert!(!limiter.check_at("lounge", "pia", 30, 1, 1).await.unwrap());
        assert!(limiter.check_at("lounge", "vote", 30, 1, 1).await.unwrap());
        assert!(limiter.check_at("other-room", "pia", 30, 1, 1).await.unwrap());
    }
}

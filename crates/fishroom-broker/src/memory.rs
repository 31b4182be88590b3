use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::{Broker, BrokerError, SubscriptionStream};

/// In-process stand-in for [`crate::RedisBroker`], used by every store and
/// bus test so the suite does not require a live Redis instance. TTLs are
/// honored lazily (checked on access) rather than by a background sweeper.
#[derive(Default)]
pub struct InMemoryBroker {
    hashes: Mutex<HashMap<String, HashMap<String, String>>>,
    lists: Mutex<HashMap<String, VecDeque<String>>>,
    strings: Mutex<HashMap<String, String>>,
    counters: Mutex<HashMap<String, i64>>,
    expirations: Mutex<HashMap<String, Instant>>,
    channels: Mutex<HashMap<String, broadcast::Sender<String>>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn purge_if_expired(&self, key: &str) {
        let expired = {
            let expirations = self.expirations.lock().unwrap();
            matches!(expirations.get(key), Some(deadline) if Instant::now() >= *deadline)
        };
        if expired {
            self.expirations.lock().unwrap().remove(key);
            self.hashes.lock().unwrap().remove(key);
            self.lists.lock().unwrap().remove(key);
            self.strings.lock().unwrap().remove(key);
            self.counters.lock().unwrap().remove(key);
        }
    }

    fn sender_for(&self, channel: &str) -> broadcast::Sender<String> {
        let mut channels = self.channels.lock().unwrap();
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(256).0)
            .clone()
    }
}

#[async_trait]
impl Broker for InMemoryBroker {
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), BrokerError> {
        self.purge_if_expired(key);
        self.hashes
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, BrokerError> {
        self.purge_if_expired(key);
        Ok(self
            .hashes
            .lock()
            .unwrap()
            .get(key)
            .and_then(|h| h.get(field).cloned()))
    }

    async fn hgetall(&self, key: &str) -> Result<Vec<(String, String)>, BrokerError> {
        self.purge_if_expired(key);
        Ok(self
            .hashes
            .lock()
            .unwrap()
            .get(key)
            .map(|h| h.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<(), BrokerError> {
        if let Some(h) = self.hashes.lock().unwrap().get_mut(key) {
            h.remove(field);
        }
        Ok(())
    }

    async fn hexists(&self, key: &str, field: &str) -> Result<bool, BrokerError> {
        self.purge_if_expired(key);
        Ok(self
            .hashes
            .lock()
            .unwrap()
            .get(key)
            .map(|h| h.contains_key(field))
            .unwrap_or(false))
    }

    async fn rpush(&self, key: &str, value: &str) -> Result<i64, BrokerError> {
        self.purge_if_expired(key);
        let mut lists = self.lists.lock().unwrap();
        let list = lists.entry(key.to_string()).or_default();
        list.push_back(value.to_string());
        Ok(list.len() as i64)
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>, BrokerError> {
        self.purge_if_expired(key);
        let lists = self.lists.lock().unwrap();
        let Some(list) = lists.get(key) else {
            return Ok(Vec::new());
        };
        Ok(slice_range(list, start, stop))
    }

    async fn llen(&self, key: &str) -> Result<i64, BrokerError> {
        self.purge_if_expired(key);
        Ok(self.lists.lock().unwrap().get(key).map(|l| l.len() as i64).unwrap_or(0))
    }

    async fn ltrim(&self, key: &str, start: i64, stop: i64) -> Result<(), BrokerError> {
        let mut lists = self.lists.lock().unwrap();
        if let Some(list) = lists.get_mut(key) {
            let kept = slice_range(list, start, stop);
            *list = kept.into_iter().collect();
        }
        Ok(())
    }

    async fn lindex(&self, key: &str, index: i64) -> Result<Option<String>, BrokerError> {
        self.purge_if_expired(key);
        let lists = self.lists.lock().unwrap();
        let Some(list) = lists.get(key) else {
            return Ok(None);
        };
        Ok(normalize_index(list, index).map(|i| list[i].clone()))
    }

    async fn blpop(&self, key: &str, timeout: Duration) -> Result<Option<String>, BrokerError> {
        let deadline = Instant::now() + timeout;
        loop {
            self.purge_if_expired(key);
            {
                let mut lists = self.lists.lock().unwrap();
                if let Some(list) = lists.get_mut(key) {
                    if let Some(value) = list.pop_front() {
                        return Ok(Some(value));
                    }
                }
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn expire(&self, key: &str, seconds: i64) -> Result<(), BrokerError> {
        self.expirations
            .lock()
            .unwrap()
            .insert(key.to_string(), Instant::now() + Duration::from_secs(seconds.max(0) as u64));
        Ok(())
    }

    async fn incr_by(&self, key: &str, amount: i64) -> Result<i64, BrokerError> {
        self.purge_if_expired(key);
        let mut counters = self.counters.lock().unwrap();
        let value = counters.entry(key.to_string()).or_insert(0);
        *value += amount;
        Ok(*value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), BrokerError> {
        self.strings.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, BrokerError> {
        self.purge_if_expired(key);
        Ok(self.strings.lock().unwrap().get(key).cloned())
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<(), BrokerError> {
        let _ = self.sender_for(channel).send(payload.to_string());
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<SubscriptionStream, BrokerError> {
        let receiver = self.sender_for(channel).subscribe();
        let stream = futures::stream::unfold(receiver, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(payload) => return Some((payload, rx)),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });
        Ok(Box::pin(stream))
    }
}

fn slice_range(list: &VecDeque<String>, start: i64, stop: i64) -> Vec<String> {
    let len = list.len() as i64;
    if len == 0 {
        return Vec::new();
    }
    let start = normalize_bound(start, len).max(0);
    let stop = normalize_bound(stop, len).min(len - 1);
    if start > stop || start >= len {
        return Vec::new();
    }
    list.iter()
        .skip(start as usize)
        .take((stop - start + 1) as usize)
        .cloned()
        .collect()
}

fn normalize_bound(i: i64, len: i64) -> i64 {
    if i < 0 { (len + i).max(0) } else { i }
}

fn normalize_index(list: &VecDeque<String>, index: i64) -> Option<usize> {
    let len = list.len() as i64;
    let idx = if index < 0 { len + index } else { index };
    if idx < 0 || idx >= len {
        None
    } else {
        Some(idx as usize)
    }
}

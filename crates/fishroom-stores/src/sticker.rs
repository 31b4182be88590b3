use std::sync::Arc;

use async_trait::async_trait;
use fishroom_broker::Broker;
use fishroom_core::keys;

use crate::error::StoreError;

/// `(sticker_file_id OR content_md5 -> hosted_url)`. Callers store the same
/// URL under both the source file-id and a content hash so that identical
/// stickers arriving under different ids collapse to one upload.
#[async_trait]
pub trait StickerCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, url: &str) -> Result<(), StoreError>;
}

pub struct BrokerStickerCache {
    broker: Arc<dyn Broker>,
    prefix: String,
}

impl BrokerStickerCache {
    pub fn new(broker: Arc<dyn Broker>, prefix: impl Into<String>) -> Self {
        BrokerStickerCache {
            broker,
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl StickerCache for BrokerStickerCache {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let hash = keys::sticker_key(&self.prefix);
        Ok(self.broker.hget(&hash, key).await?)
    }

    async fn set(&self, key: &str, url: &str) -> Result<(), StoreError> {
        let hash = keys::sticker_key(&self.prefix);
        self.broker.hset(&hash, key, url).await?;
        Ok(())
    }
}

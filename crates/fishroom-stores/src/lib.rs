pub mod api_client;
pub mod chatlog;
pub mod counter;
pub mod error;
pub mod nick;
pub mod paste;
pub mod ratelimit;
pub mod sticker;

pub use api_client::{ApiClientRegistry, BrokerApiClientRegistry};
pub use chatlog::{BrokerChatLog, ChatLog};
pub use counter::{BrokerCounter, Counter};
pub use error::StoreError;
pub use nick::{BrokerNickStore, NickStore};
pub use paste::{ChatLogRedirectPaste, NewPaste, PasteRequest, RedisPasteStore};
pub use ratelimit::{BrokerRateLimiter, RateLimiter};
pub use sticker::{BrokerStickerCache, StickerCache};

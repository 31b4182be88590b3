//! Normalized message model, wire codec, broker key templates and
//! environment-driven configuration shared by every other fishroom crate.

pub mod codec;
pub mod config;
pub mod error;
pub mod keys;
pub mod types;

pub use codec::{decode, encode, try_decode};
pub use config::{Binding, Bindings, FishroomConfig};
pub use error::ConfigError;
pub use types::{ChannelTag, Color, Message, MessageType, Opt, RichText, Route, TextStyle};

//! Shared adapter contract: per-protocol plugins implement the primitive
//! sends and a receive loop; the egress delivery procedure is implemented
//! once here and inherited by every adapter.

pub mod adapter;
pub mod error;
pub mod nick;

pub use adapter::{Adapter, Capabilities, TextSend};
pub use error::AdapterError;
pub use nick::match_nickname_content;

pub use fishroom_command::{parse_command, CommandRegistry, LEADING_CHARS};

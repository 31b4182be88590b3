//! Command classification and the process-wide command registry: shell-style
//! parsing of `/cmd arg...` content and dispatch to registered handlers.

pub mod parse;
pub mod registry;

pub use parse::{parse_command, LEADING_CHARS};
pub use registry::{CommandContext, CommandHandler, CommandRegistry, CommandRegistryBuilder, CommandSpec};

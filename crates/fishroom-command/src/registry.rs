use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use fishroom_core::{Message, Opt};

use crate::parse::parse_command;

/// A single dispatch's inputs: the parsed command name/args plus the
/// triggering message and its resolved room.
pub struct CommandContext {
    pub cmd: String,
    pub args: Vec<String>,
    pub msg: Message,
    pub room: String,
}

/// A registered command's logic. Handlers run after the hub has already
/// resolved the room and logged the triggering message.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn call(&self, ctx: &CommandContext) -> Option<(String, Opt)>;
}

#[async_trait]
impl<F, Fut> CommandHandler for F
where
    F: Fn(&CommandContext) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Option<(String, Opt)>> + Send,
{
    async fn call(&self, ctx: &CommandContext) -> Option<(String, Opt)> {
        (self)(ctx).await
    }
}

pub struct CommandSpec {
    pub desc: String,
    pub usage: String,
    pub handler: Arc<dyn CommandHandler>,
}

/// Process-wide immutable-after-init command table. Built once via
/// [`CommandRegistryBuilder`] and shared as an `Arc` by the hub and every
/// worker that needs to classify or dispatch commands.
pub struct CommandRegistry {
    commands: BTreeMap<String, CommandSpec>,
}

impl CommandRegistry {
    pub fn builder() -> CommandRegistryBuilder {
        CommandRegistryBuilder::new()
    }

    pub fn contains(&self, name: &str) -> bool {
        name == "help" || self.commands.contains_key(name)
    }

    pub fn is_cmd(&self, content: &str, leading_chars: &[char], cmd_me: &str) -> bool {
        match parse_command(content, leading_chars, cmd_me) {
            Some((name, _)) => self.contains(&name),
            None => false,
        }
    }

    /// Dispatches a pre-parsed command, returning `None` if the name isn't
    /// registered (the hub demotes such messages back to plain Text) or if
    /// the handler itself produced no reply.
    pub async fn dispatch(&self, cmd: &str, args: Vec<String>, msg: &Message, room: &str) -> Option<(String, Opt)> {
        if cmd == "help" {
            return Some(self.help(args.first().map(String::as_str)));
        }
        let spec = self.commands.get(cmd)?;
        let ctx = CommandContext {
            cmd: cmd.to_string(),
            args,
            msg: msg.clone(),
            room: room.to_string(),
        };
        spec.handler.call(&ctx).await
    }

    fn help(&self, name: Option<&str>) -> (String, Opt) {
        match name {
            Some("help") => ("help [command] - list commands, or show one command's usage".to_string(), Opt::default()),
            Some(name) => match self.commands.get(name) {
                Some(spec) => (format!("{name}: {}\nusage: {}", spec.desc, spec.usage), Opt::default()),
                None => (format!("no such command: {name}"), Opt::default()),
            },
            None => {
                let mut lines = vec!["help [command] - list commands, or show one command's usage".to_string()];
                for (name, spec) in &self.commands {
                    lines.push(format!("{name} - {}", spec.desc));
                }
                (lines.join("\n"), Opt::default())
            }
        }
    }
}

pub struct CommandRegistryBuilder {
    commands: BTreeMap<String, CommandSpec>,
}

impl CommandRegistryBuilder {
    pub fn new() -> Self {
        CommandRegistryBuilder {
            commands: BTreeMap::new(),
        }
    }

    /// Registers a command. Panics on a duplicate name: this mirrors the
    /// original `register_command` decorator, which is a load-time plugin
    /// wiring error, not a runtime condition to recover from.
    pub fn register(mut self, name: &str, desc: &str, usage: &str, handler: Arc<dyn CommandHandler>) -> Self {
        if name == "help" {
            panic!("command 'help' is built into the registry and cannot be overridden");
        }
        let spec = CommandSpec {
            desc: desc.to_string(),
            usage: usage.to_string(),
            handler,
        };
        if self.commands.insert(name.to_string(), spec).is_some() {
            panic!("duplicate command registration: {name}");
        }
        self
    }

    pub fn build(self) -> CommandRegistry {
        CommandRegistry { commands: self.commands }
    }
}

impl Default for CommandRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

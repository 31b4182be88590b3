use std::sync::Arc;

use fishroom_bus::Bus;
use fishroom_command::{parse_command, CommandRegistry, LEADING_CHARS};
use fishroom_core::config::resolve_room;
use fishroom_core::{Bindings, Message, MessageType};
use fishroom_stores::{ApiClientRegistry, ChatLog, NewPaste, PasteRequest};
use futures::StreamExt;

use crate::error::HubError;
use crate::stamp;

const OVERFLOW_NEWLINE_THRESHOLD: usize = 5;
const OVERFLOW_BYTE_THRESHOLD: usize = 400;

fn overflows(content: &str) -> bool {
    content.matches('\n').count() > OVERFLOW_NEWLINE_THRESHOLD || content.len() >= OVERFLOW_BYTE_THRESHOLD
}

/// The single-consumer routing engine: resolves a room, fans out to API
/// clients, logs, dispatches commands, handles long-text overflow, and
/// republishes to egress. See the component design for the exact six steps.
pub struct Hub {
    pub ingress: Bus,
    pub egress: Bus,
    pub bindings: Bindings,
    pub api_clients: Arc<dyn ApiClientRegistry>,
    pub chat_log: Arc<dyn ChatLog>,
    pub commands: Arc<CommandRegistry>,
    pub paste: Arc<dyn NewPaste>,
    pub bot_name: String,
    pub cmd_me: String,
}

impl Hub {
    /// Runs forever, consuming the ingress stream. Returns only if the
    /// underlying subscribe stream itself terminates, which the supervisor
    /// treats as a fatal worker exit.
    pub async fn run(&self) -> Result<(), HubError> {
        let mut stream = self.ingress.subscribe().await?;
        while let Some(msg) = stream.next().await {
            if let Err(err) = self.process(msg).await {
                tracing::error!(error = %err, "hub step failed, dropping this message");
            }
        }
        Ok(())
    }

    async fn process(&self, mut msg: Message) -> Result<(), HubError> {
        let room = match self.resolve(&mut msg) {
            Some(room) => room,
            None => {
                tracing::warn!(channel = %msg.channel, receiver = %msg.receiver, "no binding matches, dropping");
                return Ok(());
            }
        };

        self.api_clients.publish(&msg).await?;

        let date = stamp::today();
        let msg_id = self.chat_log.log(&room, &date, &msg).await?;

        if msg.mtype == MessageType::Command {
            self.dispatch_command(&mut msg, &room).await?;
        }

        if overflows(&msg.content) {
            match self
                .paste
                .new_paste(PasteRequest {
                    content: &msg.content,
                    sender: &msg.sender,
                    room: &room,
                    date: &date,
                    time: &msg.time,
                    msg_id,
                })
                .await
            {
                Ok(Some(url)) => msg.opt.text_url = Some(url),
                Ok(None) => {
                    tracing::warn!(room, "overflow store produced no url, dropping message");
                    return Ok(());
                }
                Err(err) => {
                    tracing::warn!(error = %err, room, "overflow store failed, dropping message");
                    return Ok(());
                }
            }
        }

        if let Some(binding) = self.bindings.get(&room) {
            msg.route = Some(binding.clone());
        }
        self.egress.publish(&msg).await?;
        Ok(())
    }

    fn resolve(&self, msg: &mut Message) -> Option<String> {
        if let Some(room) = &msg.room {
            return Some(room.clone());
        }
        let room = resolve_room(&self.bindings, msg.channel.as_str().as_ref(), &msg.receiver)?;
        msg.room = Some(room.to_string());
        msg.room.clone()
    }

    async fn dispatch_command(&self, msg: &mut Message, room: &str) -> Result<(), HubError> {
        let Some((cmd, args)) = parse_command(&msg.content, &LEADING_CHARS, &self.cmd_me) else {
            msg.mtype = MessageType::Text;
            return Ok(());
        };
        if !self.commands.contains(&cmd) {
            msg.mtype = MessageType::Text;
            return Ok(());
        }

        let reply = self.commands.dispatch(&cmd, args, msg, room).await;
        let Some((reply, opt)) = reply else {
            return Ok(());
        };
        if reply.is_empty() {
            return Ok(());
        }

        let mut reply_msg = Message::new(msg.channel.clone(), self.bot_name.clone(), msg.receiver.clone(), reply);
        reply_msg.botmsg = true;
        reply_msg.room = Some(room.to_string());
        reply_msg.opt = opt;
        stamp::stamp(&mut reply_msg);
        self.ingress.publish(&reply_msg).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fishroom_broker::{Broker, InMemoryBroker};
    use fishroom_bus::Direction;
    use fishroom_core::{Binding, ChannelTag, Opt};
    use fishroom_stores::{BrokerApiClientRegistry, BrokerChatLog, ChatLogRedirectPaste};
    use std::time::Duration;

    fn bindings() -> Bindings {
        let mut bindings = Bindings::new();
        let mut lounge = Binding::new();
        lounge.insert("irc".to_string(), "#lounge".to_string());
        lounge.insert("telegram".to_string(), "-100".to_string());
        bindings.insert("lounge".to_string(), lounge);
        bindings
    }

    fn hub(broker: Arc<dyn Broker>, bindings: Bindings) -> Hub {
        Hub {
            ingress: Bus::new(broker.clone(), "fishroom", Direction::Ingress),
            egress: Bus::new(broker.clone(), "fishroom", Direction::Egress),
            bindings,
            api_clients: Arc::new(BrokerApiClientRegistry::new(broker.clone(), "fishroom")),
            chat_log: Arc::new(BrokerChatLog::new(broker.clone(), "fishroom")),
            commands: Arc::new(CommandRegistry::builder().build()),
            paste: Arc::new(ChatLogRedirectPaste::new("https://fish.example")),
            bot_name: "bot".to_string(),
            cmd_me: String::new(),
        }
    }

    #[tokio::test]
    async fn unbound_message_is_dropped_without_reaching_egress() {
        let broker: Arc<dyn Broker> = Arc::new(InMemoryBroker::new());
        let hub = hub(broker.clone(), bindings());
        let mut egress = hub.egress.subscribe().await.unwrap();

        let msg = Message::new(ChannelTag::Irc, "alice", "#unbound", "hi");
        hub.process(msg).await.unwrap();

        let got = tokio::time::timeout(Duration::from_millis(50), egress.next()).await;
        assert!(got.is_err(), "no message should have reached egress");
    }

    #[tokio::test]
    async fn bound_message_is_logged_and_routed() {
        let broker: Arc<dyn Broker> = Arc::new(InMemoryBroker::new());
        let hub = hub(broker.clone(), bindings());
        let mut egress = hub.egress.subscribe().await.unwrap();

        let msg = Message::new(ChannelTag::Irc, "alice", "#lounge", "hi");
        hub.process(msg).await.unwrap();

        let routed = egress.next().await.unwrap();
        assert_eq!(routed.room.as_deref(), Some("lounge"));
        assert_eq!(routed.route.unwrap().get("telegram").map(String::as_str), Some("-100"));

        let log = hub.chat_log.range("lounge", &stamp::today(), 0, -1).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].content, "hi");
    }

    #[tokio::test]
    async fn unknown_command_is_demoted_to_text_and_still_routed() {
        let broker: Arc<dyn Broker> = Arc::new(InMemoryBroker::new());
        let hub = hub(broker.clone(), bindings());
        let mut egress = hub.egress.subscribe().await.unwrap();

        let mut msg = Message::new(ChannelTag::Irc, "alice", "#lounge", "/nope");
        msg.mtype = MessageType::Command;
        hub.process(msg).await.unwrap();

        let routed = egress.next().await.unwrap();
        assert_eq!(routed.mtype, MessageType::Text);
    }

    #[tokio::test]
    async fn registered_command_reply_is_republished_with_botmsg() {
        let broker: Arc<dyn Broker> = Arc::new(InMemoryBroker::new());
        let mut hub = hub(broker.clone(), bindings());
        hub.commands = Arc::new(
            CommandRegistry::builder()
                .register(
                    "echo",
                    "echoes its arguments",
                    "echo <text>",
                    Arc::new(|ctx: &fishroom_command::CommandContext| {
                        let reply = ctx.args.join(" ");
                        async move { Some((reply, Opt::default())) }
                    }),
                )
                .build(),
        );
        let mut egress = hub.egress.subscribe().await.unwrap();
        let mut ingress = hub.ingress.subscribe().await.unwrap();

        let mut msg = Message::new(ChannelTag::Irc, "alice", "#lounge", "/echo hi there");
        msg.mtype = MessageType::Command;
        hub.process(msg).await.unwrap();

        let first = egress.next().await.unwrap();
        assert_eq!(first.mtype, MessageType::Command);

        // The command handler's reply re-enters via ingress; drive it
        // through the loop a second time the way `run` would.
        let republished = ingress.next().await.unwrap();
        hub.process(republished).await.unwrap();

        let reply = egress.next().await.unwrap();
        assert_eq!(reply.content, "hi there");
        assert!(reply.botmsg);
        assert_eq!(reply.sender, "bot");

        let log = hub.chat_log.range("lounge", &stamp::today(), 0, -1).await.unwrap();
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn long_content_overflows_to_a_text_url() {
        let broker: Arc<dyn Broker> = Arc::new(InMemoryBroker::new());
        let hub = hub(broker.clone(), bindings());
        let mut egress = hub.egress.subscribe().await.unwrap();

        let long_content = "a".repeat(500);
        let msg = Message::new(ChannelTag::Irc, "alice", "#lounge", long_content);
        hub.process(msg).await.unwrap();

        let routed = egress.next().await.unwrap();
        assert!(routed.opt.text_url.unwrap().starts_with("https://fish.example/log/lounge/"));
    }
}

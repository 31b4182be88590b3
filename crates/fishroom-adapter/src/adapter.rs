use async_trait::async_trait;
use fishroom_bus::Bus;
use fishroom_core::{ChannelTag, Message, MessageType, Opt, RichText};

use crate::error::AdapterError;

/// What an adapter can render without the hub's long-text-overflow or
/// photo-to-text fallbacks kicking in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub supports_multiline: bool,
    pub supports_photo: bool,
}

/// One line of text to deliver, with the reply-quote prefix attached only on
/// the first line of a multi-line fallback send.
pub struct TextSend<'a> {
    pub target: &'a str,
    pub content: &'a str,
    pub sender: Option<&'a str>,
    pub rich_text: Option<&'a RichText>,
    pub opt: &'a Opt,
    pub first: bool,
}

/// Per-protocol agent: reads its network and publishes to ingress, and
/// renders egress messages whose route targets this adapter's tag.
///
/// `forward_from_hub` is the one piece of behavior every adapter shares
/// verbatim; protocols only implement the two primitive sends and the
/// receive loop.
#[async_trait]
pub trait Adapter: Send + Sync {
    fn tag(&self) -> ChannelTag;
    fn capabilities(&self) -> Capabilities;

    /// Runs until cancelled, publishing one `Message` per inbound event to
    /// `ingress`. A returned `Err` is fatal for this adapter (see the
    /// concurrency/resource model's failure table) and the supervisor tears
    /// down the whole process.
    async fn receive_loop(&self, ingress: &Bus) -> Result<(), AdapterError>;

    async fn send_text(&self, send: TextSend<'_>) -> Result<(), AdapterError>;
    async fn send_photo(&self, target: &str, bytes: &[u8], sender: Option<&str>) -> Result<(), AdapterError>;

    /// The canonical egress delivery procedure, identical across every
    /// adapter. Errors from the underlying sends are logged and swallowed —
    /// a single failed delivery must not take down the adapter.
    async fn forward_from_hub(&self, msg: &Message) {
        let Some(route) = &msg.route else {
            return;
        };
        let Some(target) = route.get(self.tag().as_str().as_ref()) else {
            return;
        };

        if msg.channel == self.tag() && !msg.botmsg {
            return;
        }

        let caps = self.capabilities();

        if msg.mtype == MessageType::Photo && caps.supports_photo {
            if let Some(media_url) = &msg.media_url {
                match fetch_image_bytes(media_url).await {
                    Ok(bytes) => {
                        if let Err(err) = self.send_photo(target, &bytes, Some(&msg.sender)).await {
                            tracing::warn!(error = %err, channel = %self.tag(), "send_photo failed");
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, url = %media_url, "photo fetch failed, falling back to text");
                        self.send_fallback_text(target, msg).await;
                    }
                }
                return;
            }
        }

        if msg.mtype == MessageType::Event {
            self.try_send_text(TextSend {
                target,
                content: &msg.content,
                sender: None,
                rich_text: None,
                opt: &msg.opt,
                first: true,
            })
            .await;
            return;
        }

        if caps.supports_multiline {
            self.try_send_text(TextSend {
                target,
                content: &msg.content,
                sender: Some(&msg.sender),
                rich_text: msg.rich_text.as_ref(),
                opt: &msg.opt,
                first: true,
            })
            .await;
            return;
        }

        self.send_fallback_text(target, msg).await;
    }

    /// Single-line-capable fallback: either the overflow URL, or the
    /// content split line by line with `first` set only on line 0.
    async fn send_fallback_text(&self, target: &str, msg: &Message) {
        if let Some(url) = &msg.opt.text_url {
            self.try_send_text(TextSend {
                target,
                content: &format!("{url} (long text)"),
                sender: Some(&msg.sender),
                rich_text: None,
                opt: &msg.opt,
                first: true,
            })
            .await;
            return;
        }

        for (i, line) in msg.lines().into_iter().enumerate() {
            self.try_send_text(TextSend {
                target,
                content: line,
                sender: Some(&msg.sender),
                rich_text: None,
                opt: &msg.opt,
                first: i == 0,
            })
            .await;
        }
    }

    async fn try_send_text(&self, send: TextSend<'_>) {
        let target = send.target.to_string();
        if let Err(err) = self.send_text(send).await {
            tracing::warn!(error = %err, channel = %self.tag(), target, "send_text failed");
        }
    }
}

async fn fetch_image_bytes(url: &str) -> Result<Vec<u8>, AdapterError> {
    let resp = reqwest::get(url).await?.error_for_status()?;
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !content_type.starts_with("image/") {
        return Err(AdapterError::NotAnImage(url.to_string()));
    }
    Ok(resp.bytes().await?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fishroom_core::Route;
    use std::sync::Mutex;

    struct RecordingAdapter {
        tag: ChannelTag,
        caps: Capabilities,
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Adapter for RecordingAdapter {
        fn tag(&self) -> ChannelTag {
            self.tag.clone()
        }

        fn capabilities(&self) -> Capabilities {
            self.caps
        }

        async fn receive_loop(&self, _ingress: &Bus) -> Result<(), AdapterError> {
            Ok(())
        }

        async fn send_text(&self, send: TextSend<'_>) -> Result<(), AdapterError> {
            self.sent.lock().unwrap().push(send.content.to_string());
            Ok(())
        }

        async fn send_photo(&self, _target: &str, _bytes: &[u8], _sender: Option<&str>) -> Result<(), AdapterError> {
            self.sent.lock().unwrap().push("<photo>".to_string());
            Ok(())
        }
    }

    fn routed_message(channel: ChannelTag, content: &str, botmsg: bool) -> Message {
        let mut msg = Message::new(channel, "alice", "#lounge", content);
        let mut route = Route::new();
        route.insert("irc".to_string(), "#lounge".to_string());
        route.insert("telegram".to_string(), "-100".to_string());
        msg.route = Some(route);
        msg.botmsg = botmsg;
        msg
    }

    #[tokio::test]
    async fn drops_when_route_has_no_entry_for_this_tag() {
        let adapter = RecordingAdapter {
            tag: ChannelTag::Matrix,
            caps: Capabilities::default(),
            sent: Mutex::new(Vec::new()),
        };
        let msg = routed_message(ChannelTag::Irc, "hi", false);
        adapter.forward_from_hub(&msg).await;
        assert!(adapter.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn suppresses_self_originated_messages() {
        let adapter = RecordingAdapter {
            tag: ChannelTag::Irc,
            caps: Capabilities { supports_multiline: true, supports_photo: false },
            sent: Mutex::new(Vec::new()),
        };
        let msg = routed_message(ChannelTag::Irc, "hi", false);
        adapter.forward_from_hub(&msg).await;
        assert!(adapter.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delivers_a_botmsg_back_to_its_own_channel() {
        let adapter = RecordingAdapter {
            tag: ChannelTag::Irc,
            caps: Capabilities { supports_multiline: true, supports_photo: false },
            sent: Mutex::new(Vec::new()),
        };
        let msg = routed_message(ChannelTag::Irc, "command reply", true);
        adapter.forward_from_hub(&msg).await;
        assert_eq!(*adapter.sent.lock().unwrap(), vec!["command reply".to_string()]);
    }

    #[tokio::test]
    async fn multiline_capable_adapter_sends_one_call_with_full_content() {
        let adapter = RecordingAdapter {
            tag: ChannelTag::Telegram,
            caps: Capabilities { supports_multiline: true, supports_photo: false },
            sent: Mutex::new(Vec::new()),
        };
        let msg = routed_message(ChannelTag::Irc, "line one\nline two", false);
        adapter.forward_from_hub(&msg).await;
        assert_eq!(*adapter.sent.lock().unwrap(), vec!["line one\nline two".to_string()]);
    }

    #[tokio::test]
    async fn single_line_adapter_splits_content_by_newline() {
        let adapter = RecordingAdapter {
            tag: ChannelTag::Telegram,
            caps: Capabilities { supports_multiline: false, supports_photo: false },
            sent: Mutex::new(Vec::new()),
        };
        let msg = routed_message(ChannelTag::Irc, "line one\nline two", false);
        adapter.forward_from_hub(&msg).await;
        assert_eq!(*adapter.sent.lock().unwrap(), vec!["line one".to_string(), "line two".to_string()]);
    }

    #[tokio::test]
    async fn single_line_adapter_prefers_the_overflow_url_when_set() {
        let adapter = RecordingAdapter {
            tag: ChannelTag::Telegram,
            caps: Capabilities { supports_multiline: false, supports_photo: false },
            sent: Mutex::new(Vec::new()),
        };
        let mut msg = routed_message(ChannelTag::Irc, "a very long message", false);
        msg.opt.text_url = Some("https://fish.example/text/abc".to_string());
        adapter.forward_from_hub(&msg).await;
        assert_eq!(
            *adapter.sent.lock().unwrap(),
            vec!["https://fish.example/text/abc (long text)".to_string()]
        );
    }

    #[tokio::test]
    async fn event_messages_send_with_no_sender_regardless_of_capability() {
        let adapter = RecordingAdapter {
            tag: ChannelTag::Telegram,
            caps: Capabilities { supports_multiline: false, supports_photo: false },
            sent: Mutex::new(Vec::new()),
        };
        let mut msg = routed_message(ChannelTag::Irc, "alice joined", false);
        msg.mtype = MessageType::Event;
        adapter.forward_from_hub(&msg).await;
        assert_eq!(*adapter.sent.lock().unwrap(), vec!["alice joined".to_string()]);
    }
}

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-protocol adapter tag. Known protocols get a dedicated variant so routing
/// code can match on them without stringly-typed comparisons; `Api` and `Other`
/// keep the model open for the dynamic `api-<name>` tags minted per API client
/// and for adapters this crate doesn't know about yet.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChannelTag {
    Irc,
    Xmpp,
    Telegram,
    Matrix,
    Gitter,
    Wechat,
    Web,
    /// Sentinel channel used only by the decode-failure message (see `codec`).
    Fishroom,
    Api(String),
    Other(String),
}

impl ChannelTag {
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        match self {
            ChannelTag::Irc => "irc".into(),
            ChannelTag::Xmpp => "xmpp".into(),
            ChannelTag::Telegram => "telegram".into(),
            ChannelTag::Matrix => "matrix".into(),
            ChannelTag::Gitter => "gitter".into(),
            ChannelTag::Wechat => "wechat".into(),
            ChannelTag::Web => "web".into(),
            ChannelTag::Fishroom => "fishroom".into(),
            ChannelTag::Api(name) => format!("api-{name}").into(),
            ChannelTag::Other(s) => s.clone().into(),
        }
    }

    pub fn parse(s: &str) -> ChannelTag {
        match s {
            "irc" => ChannelTag::Irc,
            "xmpp" => ChannelTag::Xmpp,
            "telegram" => ChannelTag::Telegram,
            "matrix" => ChannelTag::Matrix,
            "gitter" => ChannelTag::Gitter,
            "wechat" => ChannelTag::Wechat,
            "web" => ChannelTag::Web,
            "fishroom" => ChannelTag::Fishroom,
            other => match other.strip_prefix("api-") {
                Some(name) => ChannelTag::Api(name.to_string()),
                None => ChannelTag::Other(other.to_string()),
            },
        }
    }
}

impl fmt::Display for ChannelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl Serialize for ChannelTag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.as_str())
    }
}

impl<'de> Deserialize<'de> for ChannelTag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(ChannelTag::parse(&s))
    }
}

/// Semantic classification of a `Message` body, matching the original
/// `MessageType` enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Command,
    Photo,
    Sticker,
    Animation,
    Video,
    Audio,
    File,
    Location,
    Event,
}

impl MessageType {
    /// mtypes that carry a resolved `media_url` once upload/download succeeds.
    pub fn carries_media_url(&self) -> bool {
        matches!(
            self,
            MessageType::Photo
                | MessageType::Sticker
                | MessageType::Video
                | MessageType::Audio
                | MessageType::File
                | MessageType::Animation
        )
    }
}

/// mIRC-style foreground/background color pair attached to a styled segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub fg: u8,
    pub bg: Option<u8>,
}

impl Color {
    pub fn new(fg: u8, bg: Option<u8>) -> Self {
        Color { fg, bg }
    }

    pub fn swap(&self) -> Color {
        Color {
            fg: self.bg.unwrap_or(self.fg),
            bg: Some(self.fg),
        }
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self.bg {
            Some(bg) => [self.fg, bg].serialize(serializer),
            None => [self.fg].serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let parts = Vec::<u8>::deserialize(deserializer)?;
        match parts.as_slice() {
            [fg] => Ok(Color::new(*fg, None)),
            [fg, bg] => Ok(Color::new(*fg, Some(*bg))),
            _ => Err(serde::de::Error::custom(
                "color must be a 1- or 2-element array",
            )),
        }
    }
}

/// Bitmask style flags plus an optional color, mirroring `TextStyle` from the
/// original model. `NORMAL` carries no bits set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextStyle {
    bits: u8,
    pub color: Option<Color>,
}

impl TextStyle {
    pub const NORMAL: u8 = 0;
    pub const COLOR: u8 = 1;
    pub const ITALIC: u8 = 2;
    pub const BOLD: u8 = 4;
    pub const UNDERLINE: u8 = 8;

    pub fn normal() -> Self {
        TextStyle::default()
    }

    pub fn set(&mut self, mask: u8) {
        self.bits |= mask;
    }

    pub fn clear(&mut self, mask: u8) {
        self.bits &= !mask;
    }

    pub fn toggle(&mut self, mask: u8) {
        self.bits ^= mask;
    }

    pub fn set_color(&mut self, fg: u8, bg: Option<u8>) {
        self.bits |= Self::COLOR;
        self.color = Some(Color::new(fg, bg));
    }

    pub fn is_normal(&self) -> bool {
        self.bits == Self::NORMAL && self.color.is_none()
    }

    pub fn is_italic(&self) -> bool {
        self.bits & Self::ITALIC != 0
    }

    pub fn is_bold(&self) -> bool {
        self.bits & Self::BOLD != 0
    }

    pub fn is_underline(&self) -> bool {
        self.bits & Self::UNDERLINE != 0
    }

    pub fn has_color(&self) -> bool {
        self.color.is_some()
    }

    /// Style flag names in the order the original model checks them:
    /// italic, bold, underline. Color is reported separately.
    pub fn style_list(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.is_italic() {
            names.push("italic");
        }
        if self.is_bold() {
            names.push("bold");
        }
        if self.is_underline() {
            names.push("underline");
        }
        names
    }
}

#[derive(Serialize, Deserialize)]
struct TextStyleWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<Color>,
    #[serde(default)]
    style: Vec<String>,
}

impl Serialize for TextStyle {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let wire = TextStyleWire {
            color: self.color,
            style: self.style_list().into_iter().map(str::to_string).collect(),
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TextStyle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let wire = TextStyleWire::deserialize(deserializer)?;
        let mut style = TextStyle::normal();
        for name in &wire.style {
            match name.as_str() {
                "italic" => style.set(TextStyle::ITALIC),
                "bold" => style.set(TextStyle::BOLD),
                "underline" => style.set(TextStyle::UNDERLINE),
                _ => {}
            }
        }
        if let Some(color) = wire.color {
            style.set(TextStyle::COLOR);
            style.color = Some(color);
        }
        Ok(style)
    }
}

/// Ordered sequence of styled segments whose concatenation equals `Message::content`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(pub Vec<(TextStyle, String)>);

impl RichText {
    pub fn new(segments: Vec<(TextStyle, String)>) -> Self {
        RichText(segments)
    }

    pub fn to_plain(&self) -> String {
        self.0.iter().map(|(_, text)| text.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a RichText {
    type Item = &'a (TextStyle, String);
    type IntoIter = std::slice::Iter<'a, (TextStyle, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Typed bag of adapter-specific hints, plus an open extension map so the
/// codec stays lenient about keys this crate doesn't know about yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Opt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "telegram-raw")]
    pub telegram_raw: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "matrix-user")]
    pub matrix_user: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Opt {
    pub fn is_empty(&self) -> bool {
        self == &Opt::default()
    }
}

/// Frozen `adapter_tag -> target_address` map computed by the hub before an
/// egress publish. Absent on ingress.
pub type Route = BTreeMap<String, String>;

/// The sole transport unit across every component: a normalized, cross-network
/// chat message plus whatever routing/hub metadata has been attached so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub channel: ChannelTag,
    pub sender: String,
    pub receiver: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich_text: Option<RichText>,
    pub mtype: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub botmsg: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Route>,
    #[serde(default, skip_serializing_if = "Opt::is_empty")]
    pub opt: Opt,
}

impl Message {
    pub fn new(channel: ChannelTag, sender: impl Into<String>, receiver: impl Into<String>, content: impl Into<String>) -> Self {
        Message {
            channel,
            sender: sender.into(),
            receiver: receiver.into(),
            content: content.into(),
            rich_text: None,
            mtype: MessageType::Text,
            media_url: None,
            date: String::new(),
            time: String::new(),
            botmsg: false,
            room: None,
            route: None,
            opt: Opt::default(),
        }
    }

    /// The sentinel value produced when a wire payload fails to decode (see
    /// `codec::decode`). Keeps the bus stream alive rather than terminating it.
    pub fn decode_error_sentinel() -> Self {
        Message::new(ChannelTag::Fishroom, "fishroom", "None", "Error")
    }

    /// Plain lines for adapters that must split long content by newline on
    /// egress (see the hub's long-text overflow / egress delivery rules).
    pub fn lines(&self) -> Vec<&str> {
        self.content.lines().filter(|l| !l.trim().is_empty()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_tag_round_trips_known_tags() {
        for raw in ["irc", "xmpp", "telegram", "matrix", "gitter", "wechat", "web"] {
            let tag = ChannelTag::parse(raw);
            assert_eq!(tag.as_str(), raw);
        }
    }

    #[test]
    fn channel_tag_api_round_trips() {
        let tag = ChannelTag::parse("api-mybot");
        assert_eq!(tag, ChannelTag::Api("mybot".into()));
        assert_eq!(tag.as_str(), "api-mybot");
    }

    #[test]
    fn rich_text_to_plain_concatenates_segments() {
        let mut bold = TextStyle::normal();
        bold.set(TextStyle::BOLD);
        let rt = RichText::new(vec![
            (TextStyle::normal(), "hello ".into()),
            (bold, "world".into()),
        ]);
        assert_eq!(rt.to_plain(), "hello world");
    }

    #[test]
    fn text_style_list_orders_italic_bold_underline() {
        let mut style = TextStyle::normal();
        style.set(TextStyle::UNDERLINE);
        style.set(TextStyle::BOLD);
        style.set(TextStyle::ITALIC);
        assert_eq!(style.style_list(), vec!["italic", "bold", "underline"]);
    }

    #[test]
    fn decode_error_sentinel_matches_original_fields() {
        let sentinel = Message::decode_error_sentinel();
        assert_eq!(sentinel.channel, ChannelTag::Fishroom);
        assert_eq!(sentinel.sender, "fishroom");
        assert_eq!(sentinel.receiver, "None");
        assert_eq!(sentinel.content, "Error");
        assert_eq!(sentinel.mtype, MessageType::Text);
    }
}

use fishroom_core::Message;
use time::OffsetDateTime;

/// `date`/`time` stamping for messages the hub originates itself (command
/// replies). Adapters stamp inbound messages with their own wall clock on
/// receive; this covers only the republished-reply path.
///
/// Timestamps are always UTC: the configured `FISHROOM_TIMEZONE` is applied
/// only to the chat-log date key (`today()`), not to individual message
/// timestamps, since the corpus carries no IANA timezone database crate (see
/// DESIGN.md).
pub fn stamp(msg: &mut Message) {
    let now = OffsetDateTime::now_utc();
    msg.date = today();
    msg.time = format!("{:02}:{:02}:{:02}", now.hour(), now.minute(), now.second());
}

pub fn today() -> String {
    let now = OffsetDateTime::now_utc();
    format!("{:04}-{:02}-{:02}", now.year(), now.month() as u8, now.day())
}

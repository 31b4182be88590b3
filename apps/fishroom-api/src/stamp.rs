use fishroom_core::Message;
use time::OffsetDateTime;

pub fn stamp(msg: &mut Message) {
    let now = OffsetDateTime::now_utc();
    msg.date = format!("{:04}-{:02}-{:02}", now.year(), now.month() as u8, now.day());
    msg.time = format!("{:02}:{:02}:{:02}", now.hour(), now.minute(), now.second());
}

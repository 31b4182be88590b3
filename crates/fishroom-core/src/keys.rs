//! Broker key templates. Every stateful component routes its Redis keys
//! through these functions rather than formatting strings ad hoc, so the
//! key layout documented in the external interfaces stays in one place.

pub fn api_clients_key(prefix: &str) -> String {
    format!("{prefix}:api_clients")
}

pub fn api_clients_name_key(prefix: &str) -> String {
    format!("{prefix}:api_clients_name")
}

pub fn api_queue_key(prefix: &str, token_id: &str) -> String {
    format!("{prefix}:api:{token_id}")
}

pub fn ingress_channel(prefix: &str) -> String {
    format!("{prefix}:im_msg_channel")
}

pub fn egress_channel(prefix: &str) -> String {
    format!("{prefix}:fish_msg_channel")
}

pub fn room_channel(prefix: &str, room: &str) -> String {
    format!("{prefix}:msg_channel:{room}")
}

pub fn chat_log_key(prefix: &str, room: &str, date: &str) -> String {
    format!("{prefix}:log:{room}:{date}")
}

pub fn counter_key(prefix: &str, name: &str) -> String {
    format!("{prefix}:counter:{name}")
}

pub fn rate_limit_key(prefix: &str, room: &str, cmd: &str) -> String {
    format!("{prefix}:rate_limit:{room}:{cmd}")
}

pub fn nick_key(prefix: &str) -> String {
    format!("{prefix}:telegram_nicks")
}

pub fn username_key(prefix: &str) -> String {
    format!("{prefix}:telegram_usernames")
}

pub fn sticker_key(prefix: &str) -> String {
    format!("{prefix}:telegram_stickers")
}

pub fn text_store_key(prefix: &str, id: &str) -> String {
    format!("{prefix}:text_store:{id}")
}

use crate::types::Message;

/// Serializes a `Message` to its wire form (a JSON object keyed by the
/// `Message` fields, per the external interface section of the design doc).
pub fn encode(msg: &Message) -> String {
    serde_json::to_string(msg).expect("Message serialization is infallible for well-formed values")
}

/// Lower-level decode that surfaces the underlying error instead of masking
/// it with the sentinel. Most callers want [`decode`].
pub fn try_decode(raw: &str) -> Result<Message, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Decodes a wire payload, never failing: a malformed payload yields the
/// fixed decode-error sentinel (`Message::decode_error_sentinel`) so that a
/// single corrupt message on the bus cannot terminate the subscriber stream.
pub fn decode(raw: &str) -> Message {
    match try_decode(raw) {
        Ok(msg) => msg,
        Err(err) => {
            tracing::warn!(error = %err, "failed to decode message payload, substituting sentinel");
            Message::decode_error_sentinel()
        }
    }
}

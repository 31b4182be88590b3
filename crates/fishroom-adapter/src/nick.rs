use once_cell::sync::Lazy;
use regex::Regex;

/// Matches the bridged-message nickname prefix adapters stamp on when they
/// don't have a native "sender" field to use (`"[alice] hello"`).
static NICKNAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[(?P<nick>.+?)\] (?P<content>.*)$").unwrap());

/// Unpacks a bridged `"[nick] body"` line into `(nick, body)`, if present.
pub fn match_nickname_content(content: &str) -> Option<(String, String)> {
    let caps = NICKNAME_PATTERN.captures(content)?;
    Some((caps["nick"].to_string(), caps["content"].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpacks_a_bridged_nickname_prefix() {
        let (nick, content) = match_nickname_content("[alice] hello there").unwrap();
        assert_eq!(nick, "alice");
        assert_eq!(content, "hello there");
    }

    #[test]
    fn returns_none_without_a_bracketed_prefix() {
        assert_eq!(match_nickname_content("hello there"), None);
    }
}

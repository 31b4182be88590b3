/// Leading characters recognized at the start of a command, mirroring the
/// original `LEADING_CHARS`.
pub const LEADING_CHARS: [char; 2] = ['/', '.'];

/// Splits `content` into `(command_name, args)` iff it looks like a command:
/// at least 3 characters, starting with a leading char not repeated as the
/// second character, shell-tokenizable, and — if the head carries an
/// `@botname` suffix — addressed to `cmd_me`.
///
/// Returns `None` for anything that isn't shaped like a command at all, and
/// also for an `@botname` suffix that doesn't match: per the registry's
/// multi-bot policy such input is silently ignored rather than rejected.
pub fn parse_command(content: &str, leading_chars: &[char], cmd_me: &str) -> Option<(String, Vec<String>)> {
    if content.chars().count() <= 2 {
        return None;
    }
    let mut chars = content.chars();
    let first = chars.next()?;
    if !leading_chars.contains(&first) {
        return None;
    }
    let second = chars.next()?;
    if leading_chars.contains(&second) {
        return None;
    }

    let mut tokens = shlex::split(content)?;
    if tokens.is_empty() {
        return None;
    }
    let head = tokens.remove(0);
    let stripped = &head[first.len_utf8()..];

    let name = match stripped.split_once('@') {
        Some((name, botname)) if botname == cmd_me => name.to_string(),
        Some(_) => return None,
        None => stripped.to_string(),
    };

    Some((name, tokens))
}

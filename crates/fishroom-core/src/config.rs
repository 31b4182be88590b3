use std::collections::BTreeMap;

use crate::error::ConfigError;

/// A named room's per-adapter delivery address, e.g.
/// `{"irc": "#lounge", "telegram": "-100123", "xmpp": "lounge@muc.example"}`.
pub type Binding = BTreeMap<String, String>;

/// The full, immutable-at-runtime binding table: room name -> binding.
pub type Bindings = BTreeMap<String, Binding>;

/// Process-wide configuration, assembled once at startup from the
/// environment following the `*_from_env()` convention used throughout this
/// codebase (see e.g. `fishroom_command`'s registry setup).
#[derive(Debug, Clone)]
pub struct FishroomConfig {
    pub redis_url: String,
    pub key_prefix: String,
    pub cmd_me: String,
    pub timezone: String,
    pub bot_name: String,
    pub baseurl: String,
    pub api_bind: String,
    pub bindings: Bindings,
}

impl FishroomConfig {
    /// Reads environment variables and the bindings file they point to.
    /// Fatal by design: any error here should stop the process before a
    /// single worker is spawned (see the error-handling design notes).
    pub fn from_env() -> Result<Self, ConfigError> {
        let redis_url = std::env::var("FISHROOM_REDIS_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let key_prefix = std::env::var("FISHROOM_KEY_PREFIX").unwrap_or_else(|_| "fishroom".to_string());
        let cmd_me = std::env::var("FISHROOM_CMD_ME").unwrap_or_default();
        let timezone = std::env::var("FISHROOM_TIMEZONE").unwrap_or_else(|_| "UTC".to_string());
        let bot_name = std::env::var("FISHROOM_BOT_NAME").unwrap_or_else(|_| "bot".to_string());
        let baseurl = std::env::var("FISHROOM_BASEURL").unwrap_or_else(|_| "http://localhost:8130".to_string());
        let api_bind = std::env::var("FISHROOM_API_BIND").unwrap_or_else(|_| "0.0.0.0:8130".to_string());

        let bindings = match std::env::var("FISHROOM_BINDINGS_FILE") {
            Ok(path) => load_bindings_file(&path)?,
            Err(_) => Bindings::new(),
        };
        validate_bindings(&bindings)?;

        Ok(FishroomConfig {
            redis_url,
            key_prefix,
            cmd_me,
            timezone,
            bot_name,
            baseurl,
            api_bind,
            bindings,
        })
    }
}

/// Loads and validates a bindings file (YAML or JSON; both parse via the same
/// YAML-superset parser the rest of the corpus uses for config files).
pub fn load_bindings_file(path: &str) -> Result<Bindings, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadBindings {
        path: path.to_string(),
        source,
    })?;
    let bindings: Bindings =
        serde_yaml_bw::from_str(&raw).map_err(|source| ConfigError::ParseBindings {
            path: path.to_string(),
            source,
        })?;
    validate_bindings(&bindings)?;
    Ok(bindings)
}

/// Enforces the data-model invariant that a network address appears in at
/// most one binding, per adapter tag.
fn validate_bindings(bindings: &Bindings) -> Result<(), ConfigError> {
    let mut seen: BTreeMap<(&str, &str), &str> = BTreeMap::new();
    for (room, binding) in bindings {
        for (adapter, address) in binding {
            if let Some(other_room) = seen.insert((adapter.as_str(), address.as_str()), room.as_str()) {
                if other_room != room {
                    return Err(ConfigError::DuplicateAddress {
                        room: room.clone(),
                        other_room: other_room.to_string(),
                        adapter: adapter.clone(),
                        address: address.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Finds the room whose binding claims `(channel, receiver)`, per the hub's
/// room-resolution step.
pub fn resolve_room<'a>(bindings: &'a Bindings, channel: &str, receiver: &str) -> Option<&'a str> {
    bindings
        .iter()
        .find(|(_, binding)| binding.get(channel).map(String::as_str) == Some(receiver))
        .map(|(room, _)| room.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bindings() -> Bindings {
        let mut bindings = Bindings::new();
        let mut lounge = Binding::new();
        lounge.insert("irc".into(), "#lounge".into());
        lounge.insert("telegram".into(), "-100".into());
        bindings.insert("lounge".into(), lounge);
        bindings
    }

    #[test]
    fn resolve_room_finds_matching_binding() {
        let bindings = sample_bindings();
        assert_eq!(resolve_room(&bindings, "irc", "#lounge"), Some("lounge"));
        assert_eq!(resolve_room(&bindings, "irc", "#other"), None);
    }

    #[test]
    fn validate_bindings_rejects_shared_address() {
        let mut bindings = sample_bindings();
        let mut dup = Binding::new();
        dup.insert("irc".into(), "#lounge".into());
        bindings.insert("dup-room".into(), dup);
        assert!(validate_bindings(&bindings).is_err());
    }
}

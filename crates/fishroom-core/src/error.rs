use thiserror::Error;

/// Fatal configuration problems. The process refuses to start rather than
/// run with a partially-valid binding table.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read bindings file {path}: {source}")]
    ReadBindings {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse bindings file {path}: {source}")]
    ParseBindings {
        path: String,
        #[source]
        source: serde_yaml_bw::Error,
    },
    #[error("binding '{room}' and '{other_room}' both claim address '{address}' on adapter '{adapter}'")]
    DuplicateAddress {
        room: String,
        other_room: String,
        adapter: String,
        address: String,
    },
    #[error("required environment variable {0} is not set")]
    MissingEnv(&'static str),
}

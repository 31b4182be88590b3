use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Bus(#[from] fishroom_broker::BrokerError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("fetched media at {0} is not an image")]
    NotAnImage(String),
    #[error("adapter connect/auth failed: {0}")]
    Connect(String),
}

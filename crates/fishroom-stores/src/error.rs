use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Broker(#[from] fishroom_broker::BrokerError),
    #[error("token id '{0}' is already registered")]
    TokenAlreadyExists(String),
    #[error("malformed stored payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

use thiserror::Error;

/// Errors that terminate the hub's routing loop. Per-message failures
/// (command panics, overflow-store misses) are handled inline and never
/// surface here — only a broken bus or a broken store is fatal.
#[derive(Debug, Error)]
pub enum HubError {
    #[error(transparent)]
    Bus(#[from] fishroom_broker::BrokerError),
    #[error(transparent)]
    Store(#[from] fishroom_stores::StoreError),
}

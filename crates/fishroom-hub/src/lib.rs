//! The routing engine: single-consumer loop over the ingress bus that
//! resolves bindings, fans out to API clients, logs, dispatches commands,
//! handles long-text overflow, and republishes to egress.

pub mod error;
pub mod hub;
pub mod stamp;

pub use error::HubError;
pub use hub::Hub;

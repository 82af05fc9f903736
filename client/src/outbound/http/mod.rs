//! LogiTrack backend HTTP adapters.
//!
//! One [`ApiClient`] is shared by the authentication and transaction
//! gateways so every call passes the same status inspection.

mod api_client;
mod auth_gateway;
mod dto;
mod transaction_gateway;

pub use api_client::{ApiClient, ApiClientConfig, Credential, DEFAULT_TIMEOUT, DEFAULT_TOKEN_HEADER};
pub use auth_gateway::HttpAuthGateway;
pub use transaction_gateway::HttpTransactionGateway;

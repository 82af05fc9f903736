//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod api;
mod auth_gateway;
mod notifier;
mod session_storage;
mod transaction_gateway;

pub use api::{Acknowledgement, ApiError, ApiEvent};
#[cfg(test)]
pub use auth_gateway::MockAuthGateway;
pub use auth_gateway::{AuthGateway, LoginGrant};
#[cfg(test)]
pub use notifier::MockNotifier;
pub use notifier::{Notification, NotificationLevel, Notifier};
#[cfg(test)]
pub use session_storage::MockSessionStorage;
pub use session_storage::{
    DEFAULT_TOKEN_KEY, DEFAULT_USER_KEY, InMemorySessionStorage, SessionStorage, StorageError,
    StorageKeys,
};
#[cfg(test)]
pub use transaction_gateway::MockTransactionGateway;
pub use transaction_gateway::TransactionGateway;

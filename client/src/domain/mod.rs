//! Domain primitives, stores and ports.
//!
//! Purpose: hold the session lifecycle, the transaction collection and the
//! route guard independently of HTTP, storage files or terminals. Adapters
//! in `outbound` implement the ports declared in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: user-facing failure with a stable category.
//! - SessionStore / SessionState: authentication state and transitions.
//! - TransactionStore: cached transaction collection and mutations.
//! - Router / authorize: guarded navigation over the route table.

pub mod auth;
pub mod error;
pub mod guard;
mod loading;
pub mod ports;
pub mod routing;
pub mod session;
pub mod transaction;
pub mod transactions_store;
pub mod user;

pub use self::auth::{
    AuthToken, LoginCredentials, LoginValidationError, RegistrationDetails,
    RegistrationValidationError,
};
pub use self::error::{
    Error, ErrorCode, NETWORK_FAILURE_MESSAGE, SERVER_FAULT_MESSAGE, SESSION_EXPIRED_MESSAGE,
};
pub use self::guard::{
    GuardDecision, LANDING_PATH, LOGIN_PATH, MAX_REDIRECT_HOPS, Navigation, Router, authorize,
};
pub use self::routing::{
    GuardFlags, Resolution, RouteDescriptor, RouteError, RouteMatch, RouteTable, View,
};
pub use self::session::{HydrationPolicy, SessionState, SessionStore};
pub use self::transaction::{
    Amount, Transaction, TransactionChanges, TransactionDraft, TransactionId,
    TransactionValidationError, non_blank,
};
pub use self::transactions_store::{Operation, RefreshFailurePolicy, TransactionStore};
pub use self::user::{Role, UserId, UserProfile};

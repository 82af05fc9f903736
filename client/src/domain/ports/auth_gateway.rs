//! Driven port for the backend's authentication endpoints.
//!
//! The session store talks to this port only; whether the credential is
//! carried over HTTP headers or anything else is an adapter concern.

use async_trait::async_trait;

use super::{Acknowledgement, ApiError};
use crate::domain::{AuthToken, LoginCredentials, RegistrationDetails, UserProfile};

/// Successful login result.
///
/// Backends may embed the profile in the login response; when they do not,
/// the session store fetches it separately before committing the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginGrant {
    /// Credential to attach to subsequent requests.
    pub token: AuthToken,
    /// Profile embedded in the login response, if any.
    pub user: Option<UserProfile>,
}

/// Port for login, registration and current-user lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Exchange credentials for a token. Sent without any session token.
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginGrant, ApiError>;

    /// Create an account. Does not authenticate it.
    async fn register(&self, details: &RegistrationDetails) -> Result<Acknowledgement, ApiError>;

    /// Fetch the profile of the user owning the session `token`.
    ///
    /// A 401 here means the session has expired.
    async fn current_user(&self, token: &AuthToken) -> Result<UserProfile, ApiError>;

    /// Fetch the profile behind a token just granted by [`Self::login`].
    ///
    /// The token is not yet the session's, so a 401 is a failed login and
    /// must leave any existing session alone.
    async fn grant_profile(&self, token: &AuthToken) -> Result<UserProfile, ApiError>;

    /// Invalidate `token` on the backend.
    async fn logout(&self, token: &AuthToken) -> Result<Acknowledgement, ApiError>;
}

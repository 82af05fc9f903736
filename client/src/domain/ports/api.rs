//! Shared contract between the domain and the HTTP client adapter.
//!
//! Both gateway ports report failures with [`ApiError`], and the adapter
//! publishes cross-cutting [`ApiEvent`]s for the application to act on.

use super::define_port_error;
use crate::domain::SERVER_FAULT_MESSAGE;

define_port_error! {
    /// Errors surfaced by the backend HTTP adapter.
    pub enum ApiError {
        /// The backend rejected the session token (HTTP 401).
        Unauthorized { message: String } =>
            "session rejected: {message}",
        /// The backend refused the request and explained why.
        Rejected { status: u16, message: String } =>
            "request rejected with status {status}: {message}",
        /// The backend refused the request without a message.
        Status { status: u16 } =>
            "request failed with status {status}",
        /// The backend failed (HTTP 5xx).
        ServerFault { status: u16 } =>
            "server fault with status {status}",
        /// Network transport failed before a response arrived.
        Transport { message: String } =>
            "transport failed: {message}",
        /// The request exceeded the configured timeout.
        Timeout { message: String } =>
            "request timed out: {message}",
        /// A successful response could not be decoded.
        Decode { message: String } =>
            "response decode failed: {message}",
        /// The adapter refused to build the request.
        InvalidRequest { message: String } =>
            "request invalid: {message}",
    }
}

impl ApiError {
    /// Text to surface verbatim to the user, when the backend supplied one.
    ///
    /// Server faults surface the generic fault text; transport and decode
    /// failures have no user-facing text and callers fall back to their own.
    ///
    /// # Examples
    /// ```
    /// use client::domain::ports::ApiError;
    ///
    /// let err = ApiError::rejected(400_u16, "Username already exists");
    /// assert_eq!(err.user_message(), Some("Username already exists"));
    /// assert_eq!(ApiError::transport("refused").user_message(), None);
    /// ```
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } | Self::Unauthorized { message } => {
                Some(message.as_str())
            }
            Self::ServerFault { .. } => Some(SERVER_FAULT_MESSAGE),
            Self::Status { .. }
            | Self::Transport { .. }
            | Self::Timeout { .. }
            | Self::Decode { .. }
            | Self::InvalidRequest { .. } => None,
        }
    }

    /// Return whether the failure tore down the session.
    pub fn is_session_expiry(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Return whether the adapter also published an [`ApiEvent`] for this
    /// failure, so the application already tells the user about it.
    pub fn is_announced(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::ServerFault { .. })
    }
}

/// Cross-cutting events published by the HTTP adapter.
///
/// The adapter only reports what happened; reacting (tearing down the
/// in-memory session, redirecting, notifying) is the application's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiEvent {
    /// A token-bearing request came back 401; durable storage was cleared.
    SessionExpired,
    /// The backend answered with a 5xx status.
    ServerFault {
        /// HTTP status code returned by the backend.
        status: u16,
    },
}

/// Acknowledgement body returned by mutating endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Acknowledgement {
    /// Optional human-readable message supplied by the backend.
    pub message: Option<String>,
}

impl Acknowledgement {
    /// Build an acknowledgement carrying a backend message.
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ApiError::rejected(400_u16, "Invalid credentials"), Some("Invalid credentials"))]
    #[case(ApiError::unauthorized("expired"), Some("expired"))]
    #[case(ApiError::server_fault(503_u16), Some(SERVER_FAULT_MESSAGE))]
    #[case(ApiError::status(409_u16), None)]
    #[case(ApiError::timeout("10s"), None)]
    #[case(ApiError::decode("bad json"), None)]
    fn user_message_only_exposes_backend_text(
        #[case] error: ApiError,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(error.user_message(), expected);
    }

    #[test]
    fn only_unauthorized_counts_as_session_expiry() {
        assert!(ApiError::unauthorized("expired").is_session_expiry());
        assert!(!ApiError::rejected(401_u16, "Invalid credentials").is_session_expiry());
    }

    #[rstest]
    #[case(ApiError::unauthorized("expired"), true)]
    #[case(ApiError::server_fault(500_u16), true)]
    #[case(ApiError::rejected(401_u16, "Invalid credentials"), false)]
    #[case(ApiError::status(401_u16), false)]
    #[case(ApiError::transport("refused"), false)]
    fn announced_failures_match_published_events(#[case] error: ApiError, #[case] announced: bool) {
        assert_eq!(error.is_announced(), announced);
    }
}

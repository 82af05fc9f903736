//! Domain-level error type.
//!
//! Store operations never panic or leak transport errors: every failure is
//! converted into this error, whose message is always fit to show a user.

use std::fmt;

use crate::domain::ports::ApiError;

/// Generic text shown for backend faults. Response bodies are never echoed.
pub const SERVER_FAULT_MESSAGE: &str = "Server error occurred. Please try again later.";

/// Generic text shown when the backend cannot be reached.
pub const NETWORK_FAILURE_MESSAGE: &str =
    "Unable to reach the server. Check your connection and try again.";

/// Text shown when the backend rejects the session token.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    /// Input failed validation or the backend rejected the request.
    InvalidRequest,
    /// Credentials were rejected or the session has expired.
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    Forbidden,
    /// The requested record does not exist.
    NotFound,
    /// The backend failed or could not be reached.
    ServiceUnavailable,
    /// An unexpected error occurred inside the client.
    InternalError,
}

impl ErrorCode {
    fn default_message(self) -> &'static str {
        match self {
            Self::InvalidRequest => "request was rejected",
            Self::Unauthorized => "authentication required",
            Self::Forbidden => "not permitted",
            Self::NotFound => "not found",
            Self::ServiceUnavailable => NETWORK_FAILURE_MESSAGE,
            Self::InternalError => "unexpected client error",
        }
    }
}

/// Domain error payload.
///
/// ## Invariants
/// - `message` is non-empty once trimmed of whitespace; blank input is
///   replaced by a default message for the code.
///
/// # Examples
/// ```
/// use client::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("transaction 7 does not exist");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// assert_eq!(Error::unauthorized("  ").message(), "authentication required");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    code: ErrorCode,
    message: String,
}

impl Error {
    /// Create a new error, substituting a default for blank messages.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            code.default_message().to_owned()
        } else {
            message
        };
        Self { code, message }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message suitable for notifications.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::ServiceUnavailable`].
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {}

fn code_for_status(status: u16) -> ErrorCode {
    match status {
        401 => ErrorCode::Unauthorized,
        403 => ErrorCode::Forbidden,
        404 => ErrorCode::NotFound,
        _ => ErrorCode::InvalidRequest,
    }
}

impl Error {
    /// Map an adapter failure, preferring the backend's own text and
    /// otherwise using `fallback` as the user-facing message.
    ///
    /// # Examples
    /// ```
    /// use client::domain::{Error, ErrorCode};
    /// use client::domain::ports::ApiError;
    ///
    /// let err = Error::from_api(ApiError::status(400_u16), "Failed to create transaction");
    /// assert_eq!(err.code(), ErrorCode::InvalidRequest);
    /// assert_eq!(err.message(), "Failed to create transaction");
    /// ```
    pub fn from_api(error: ApiError, fallback: &str) -> Self {
        let message = error.user_message().unwrap_or(fallback).to_owned();
        let code = Self::from(error).code();
        Self::new(code, message)
    }
}

impl From<ApiError> for Error {
    fn from(value: ApiError) -> Self {
        match value {
            ApiError::Unauthorized { message } => Self::unauthorized(message),
            ApiError::Rejected { status, message } => Self::new(code_for_status(status), message),
            ApiError::Status { status } => Self::new(
                code_for_status(status),
                format!("request failed with status {status}"),
            ),
            ApiError::ServerFault { .. } => Self::service_unavailable(SERVER_FAULT_MESSAGE),
            ApiError::Transport { .. } | ApiError::Timeout { .. } => {
                Self::service_unavailable(NETWORK_FAILURE_MESSAGE)
            }
            ApiError::Decode { message } => {
                Self::internal(format!("unexpected response from server: {message}"))
            }
            ApiError::InvalidRequest { message } => Self::invalid_request(message),
        }
    }
}

#[cfg(test)]
mod tests;

//! Tests for domain error construction and port error mapping.

use rstest::rstest;

use super::*;

#[rstest]
#[case(ErrorCode::InvalidRequest, "request was rejected")]
#[case(ErrorCode::Unauthorized, "authentication required")]
#[case(ErrorCode::ServiceUnavailable, NETWORK_FAILURE_MESSAGE)]
fn blank_messages_fall_back_to_code_default(#[case] code: ErrorCode, #[case] expected: &str) {
    let err = Error::new(code, "   ");
    assert_eq!(err.message(), expected);
    assert_eq!(err.code(), code);
}

#[test]
fn display_uses_message() {
    let err = Error::invalid_request("Username already exists");
    assert_eq!(err.to_string(), "Username already exists");
}

#[rstest]
#[case(ApiError::rejected(400_u16, "Invalid credentials"), ErrorCode::InvalidRequest, "Invalid credentials")]
#[case(ApiError::rejected(401_u16, "Invalid credentials"), ErrorCode::Unauthorized, "Invalid credentials")]
#[case(ApiError::rejected(404_u16, "Not found"), ErrorCode::NotFound, "Not found")]
#[case(ApiError::status(403_u16), ErrorCode::Forbidden, "request failed with status 403")]
#[case(ApiError::unauthorized("token expired"), ErrorCode::Unauthorized, "token expired")]
#[case(ApiError::server_fault(502_u16), ErrorCode::ServiceUnavailable, SERVER_FAULT_MESSAGE)]
#[case(ApiError::timeout("deadline elapsed"), ErrorCode::ServiceUnavailable, NETWORK_FAILURE_MESSAGE)]
#[case(ApiError::transport("connection refused"), ErrorCode::ServiceUnavailable, NETWORK_FAILURE_MESSAGE)]
fn api_errors_map_to_user_facing_errors(
    #[case] source: ApiError,
    #[case] code: ErrorCode,
    #[case] message: &str,
) {
    let err = Error::from(source);
    assert_eq!(err.code(), code);
    assert_eq!(err.message(), message);
}

#[test]
fn server_fault_never_leaks_status_detail() {
    let err = Error::from(ApiError::server_fault(500_u16));
    assert!(!err.message().contains("500"));
}

#[rstest]
#[case(ApiError::rejected(400_u16, "Name taken"), ErrorCode::InvalidRequest, "Name taken")]
#[case(ApiError::status(400_u16), ErrorCode::InvalidRequest, "Login failed")]
#[case(ApiError::transport("refused"), ErrorCode::ServiceUnavailable, "Login failed")]
#[case(ApiError::server_fault(503_u16), ErrorCode::ServiceUnavailable, SERVER_FAULT_MESSAGE)]
fn from_api_prefers_backend_text_over_fallback(
    #[case] source: ApiError,
    #[case] code: ErrorCode,
    #[case] message: &str,
) {
    let err = Error::from_api(source, "Login failed");
    assert_eq!(err.code(), code);
    assert_eq!(err.message(), message);
}

//! HTTP implementation of the `AuthGateway` port.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;

use super::api_client::{ApiClient, Credential};
use super::dto::{LoginRequestDto, LoginResponseDto, RegisterRequestDto, UserDto};
use crate::domain::ports::{Acknowledgement, ApiError, AuthGateway, LoginGrant};
use crate::domain::{AuthToken, LoginCredentials, RegistrationDetails, UserProfile};

/// Authentication endpoints: `/login`, `/register`, `/home`, `/logout`.
pub struct HttpAuthGateway {
    api: Arc<ApiClient>,
}

impl HttpAuthGateway {
    /// Gateway sharing `api` with the other adapters.
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginGrant, ApiError> {
        let body = LoginRequestDto {
            username: credentials.username(),
            password: credentials.password(),
        };
        let response: LoginResponseDto = self
            .api
            .fetch(Method::POST, "login", Some(&body), Credential::Anonymous)
            .await?;
        let token = AuthToken::new(response.token)
            .ok_or_else(|| ApiError::decode("login response carried a blank token"))?;
        Ok(LoginGrant {
            token,
            user: response.user.map(UserDto::into_domain),
        })
    }

    async fn register(&self, details: &RegistrationDetails) -> Result<Acknowledgement, ApiError> {
        let body = RegisterRequestDto {
            username: details.username(),
            email: details.email(),
            password: details.password(),
        };
        self.api
            .acknowledge(Method::POST, "register", Some(&body), Credential::Anonymous)
            .await
    }

    async fn current_user(&self, token: &AuthToken) -> Result<UserProfile, ApiError> {
        let profile: UserDto = self
            .api
            .fetch::<_, ()>(Method::GET, "home", None, Credential::Explicit(token))
            .await?;
        Ok(profile.into_domain())
    }

    async fn grant_profile(&self, token: &AuthToken) -> Result<UserProfile, ApiError> {
        let profile: UserDto = self
            .api
            .fetch::<_, ()>(Method::GET, "home", None, Credential::Candidate(token))
            .await?;
        Ok(profile.into_domain())
    }

    async fn logout(&self, token: &AuthToken) -> Result<Acknowledgement, ApiError> {
        self.api
            .acknowledge::<()>(Method::POST, "logout", None, Credential::Explicit(token))
            .await
    }
}

//! Reqwest-backed chokepoint for every backend call.
//!
//! This client owns transport details only: base URL joining, the token
//! header, the timeout, status inspection and JSON decoding. Side effects of
//! a status (clearing durable storage on 401, broadcasting events) happen
//! here; reacting to them is left to the application.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderName};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::dto::{AcknowledgementDto, ErrorBodyDto};
use crate::domain::{AuthToken, SESSION_EXPIRED_MESSAGE};
use crate::domain::ports::{Acknowledgement, ApiError, ApiEvent, SessionStorage, StorageKeys};

/// Header carrying the session token unless configured otherwise.
pub const DEFAULT_TOKEN_HEADER: &str = "Authentication-Token";
/// Request timeout unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const EVENT_CAPACITY: usize = 32;

/// Connection settings for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Root every endpoint path is joined onto.
    pub base_url: Url,
    /// Upper bound for one request, connect to last byte.
    pub timeout: Duration,
    /// Header the token is sent in.
    pub token_header: String,
    /// Durable keys cleared when the backend rejects the session.
    pub keys: StorageKeys,
}

impl ApiClientConfig {
    /// Settings with the default timeout, header and keys.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            token_header: DEFAULT_TOKEN_HEADER.to_owned(),
            keys: StorageKeys::default(),
        }
    }
}

/// Which token, if any, a request carries.
#[derive(Debug, Clone, Copy)]
pub enum Credential<'a> {
    /// Read the token from durable storage at send time.
    Stored,
    /// Attach this session token.
    Explicit(&'a AuthToken),
    /// Attach a token that is not yet the session's; a 401 is a rejection.
    Candidate(&'a AuthToken),
    /// Attach nothing.
    Anonymous,
}

impl Credential<'_> {
    fn is_session_bound(self) -> bool {
        matches!(self, Self::Stored | Self::Explicit(_))
    }
}

/// Shared HTTP client used by both gateway adapters.
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token_header: HeaderName,
    storage: Arc<dyn SessionStorage>,
    keys: StorageKeys,
    events: broadcast::Sender<ApiEvent>,
}

impl ApiClient {
    /// Build a client over `storage`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] when the header name is invalid
    /// or the reqwest client cannot be constructed.
    pub fn new(config: ApiClientConfig, storage: Arc<dyn SessionStorage>) -> Result<Self, ApiError> {
        let token_header = HeaderName::from_bytes(config.token_header.trim().as_bytes())
            .map_err(|err| ApiError::invalid_request(format!("invalid token header: {err}")))?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ApiError::invalid_request(format!("http client: {err}")))?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            client,
            base_url: with_trailing_slash(config.base_url),
            token_header,
            storage,
            keys: config.keys,
            events,
        })
    }

    /// Receive events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ApiEvent> {
        self.events.subscribe()
    }

    /// Root endpoint paths are joined onto.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send a request and decode a JSON success body into `T`.
    pub async fn fetch<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        credential: Credential<'_>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let bytes = self.send(method, path, body, credential).await?;
        serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::decode(format!("invalid JSON from {path}: {err}")))
    }

    /// Send a request whose success body is an optional `{message}`.
    ///
    /// Empty success bodies are accepted.
    pub async fn acknowledge<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        credential: Credential<'_>,
    ) -> Result<Acknowledgement, ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let bytes = self.send(method, path, body, credential).await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Acknowledgement::default());
        }
        serde_json::from_slice::<AcknowledgementDto>(&bytes)
            .map(Acknowledgement::from)
            .map_err(|err| ApiError::decode(format!("invalid JSON from {path}: {err}")))
    }

    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        credential: Credential<'_>,
    ) -> Result<Vec<u8>, ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ApiError::invalid_request(format!("invalid path {path}: {err}")))?;

        let stored;
        let token = match credential {
            Credential::Stored => {
                stored = self.stored_token();
                stored.as_ref()
            }
            Credential::Explicit(token) | Credential::Candidate(token) => Some(token),
            Credential::Anonymous => None,
        };

        let mut request = self
            .client
            .request(method.clone(), url)
            .header(ACCEPT, "application/json");
        if let Some(token) = token {
            request = request.header(self.token_header.clone(), token.expose());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, path, authenticated = token.is_some(), "sending request");
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?.to_vec();
        debug!(%method, path, status = status.as_u16(), "received response");

        if status.is_success() {
            Ok(bytes)
        } else {
            Err(self.map_failure(status, &bytes, credential))
        }
    }

    fn stored_token(&self) -> Option<AuthToken> {
        match self.storage.get(&self.keys.token) {
            Ok(raw) => raw.and_then(AuthToken::new),
            Err(err) => {
                warn!(error = %err, "failed to read token; sending request without it");
                None
            }
        }
    }

    fn map_failure(&self, status: StatusCode, body: &[u8], credential: Credential<'_>) -> ApiError {
        let message = error_message(body);
        if status == StatusCode::UNAUTHORIZED && credential.is_session_bound() {
            self.expire_session();
            return ApiError::unauthorized(
                message.unwrap_or_else(|| SESSION_EXPIRED_MESSAGE.to_owned()),
            );
        }
        if status.is_server_error() {
            warn!(status = status.as_u16(), "backend fault");
            self.publish(ApiEvent::ServerFault {
                status: status.as_u16(),
            });
            return ApiError::server_fault(status.as_u16());
        }
        match message {
            Some(message) => ApiError::rejected(status.as_u16(), message),
            None => ApiError::status(status.as_u16()),
        }
    }

    fn expire_session(&self) {
        warn!("backend rejected the session token; clearing stored session");
        for key in [&self.keys.token, &self.keys.user] {
            if let Err(err) = self.storage.remove(key) {
                warn!(key = key.as_str(), error = %err, "failed to clear session storage");
            }
        }
        self.publish(ApiEvent::SessionExpired);
    }

    fn publish(&self, event: ApiEvent) {
        if self.events.send(event).is_err() {
            debug!(?event, "no subscribers for api event");
        }
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBodyDto>(body)
        .ok()
        .and_then(ErrorBodyDto::into_message)
}

fn map_transport_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::timeout(error.to_string())
    } else {
        ApiError::transport(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network helpers.
    use super::*;
    use crate::domain::ports::InMemorySessionStorage;
    use rstest::rstest;

    fn client(storage: Arc<InMemorySessionStorage>) -> ApiClient {
        let base = Url::parse("http://localhost:5000/api").expect("url");
        ApiClient::new(ApiClientConfig::new(base), storage).expect("client")
    }

    #[rstest]
    #[case("http://localhost:5000/api", "http://localhost:5000/api/")]
    #[case("http://localhost:5000/api/", "http://localhost:5000/api/")]
    #[case("http://localhost:5000", "http://localhost:5000/")]
    fn base_urls_gain_trailing_slash(#[case] raw: &str, #[case] expected: &str) {
        let url = with_trailing_slash(Url::parse(raw).expect("url"));
        assert_eq!(url.as_str(), expected);
    }

    #[rstest]
    #[case(br#"{"message":"Invalid username or password"}"#.as_slice(), Some("Invalid username or password"))]
    #[case(br#"{"error":"Transaction not found"}"#.as_slice(), Some("Transaction not found"))]
    #[case(br#"{"message":"  "}"#.as_slice(), None)]
    #[case(b"<h1>Bad Request</h1>".as_slice(), None)]
    fn error_messages_come_from_json_bodies(#[case] body: &[u8], #[case] expected: Option<&str>) {
        assert_eq!(error_message(body).as_deref(), expected);
    }

    #[test]
    fn session_bound_401_clears_storage_and_publishes() {
        let storage = Arc::new(InMemorySessionStorage::with_entries([
            ("token", "T1"),
            ("user", "{}"),
        ]));
        let api = client(Arc::clone(&storage));
        let mut events = api.subscribe();

        let err = api.map_failure(StatusCode::UNAUTHORIZED, b"", Credential::Stored);

        assert!(err.is_session_expiry());
        assert!(storage.snapshot().is_empty());
        assert_eq!(events.try_recv().expect("event"), ApiEvent::SessionExpired);
    }

    #[test]
    fn anonymous_401_is_a_rejection() {
        let storage = Arc::new(InMemorySessionStorage::with_entries([("token", "T1")]));
        let api = client(Arc::clone(&storage));
        let mut events = api.subscribe();

        let err = api.map_failure(
            StatusCode::UNAUTHORIZED,
            br#"{"message":"Invalid username or password"}"#,
            Credential::Anonymous,
        );

        assert_eq!(
            err,
            ApiError::rejected(401_u16, "Invalid username or password")
        );
        assert_eq!(storage.snapshot().len(), 1);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn candidate_token_401_is_a_rejection() {
        let storage = Arc::new(InMemorySessionStorage::with_entries([
            ("token", "T0"),
            ("user", "{}"),
        ]));
        let api = client(Arc::clone(&storage));
        let mut events = api.subscribe();
        let fresh = AuthToken::new("T1").expect("token");

        let err = api.map_failure(StatusCode::UNAUTHORIZED, b"", Credential::Candidate(&fresh));

        assert_eq!(err, ApiError::status(401_u16));
        assert!(!err.is_session_expiry());
        assert_eq!(storage.snapshot().len(), 2);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn server_faults_publish_and_hide_body() {
        let api = client(Arc::new(InMemorySessionStorage::default()));
        let mut events = api.subscribe();

        let err = api.map_failure(
            StatusCode::BAD_GATEWAY,
            br#"{"message":"stack trace"}"#,
            Credential::Stored,
        );

        assert_eq!(err, ApiError::server_fault(502_u16));
        assert_eq!(
            events.try_recv().expect("event"),
            ApiEvent::ServerFault { status: 502 }
        );
    }

    #[test]
    fn invalid_header_names_are_rejected() {
        let mut config =
            ApiClientConfig::new(Url::parse("http://localhost:5000").expect("url"));
        config.token_header = "bad header".to_owned();
        let result = ApiClient::new(config, Arc::new(InMemorySessionStorage::default()));
        assert!(matches!(result, Err(ApiError::InvalidRequest { .. })));
    }
}

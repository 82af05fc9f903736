//! Session store: the process-wide authentication state.
//!
//! The store owns the token and the user profile, mirrors both into durable
//! storage, and mediates login, registration, hydration and logout. The
//! in-memory state lives in a watch channel so every replacement is atomic
//! from an observer's point of view.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::loading::InFlight;
use crate::domain::ports::{AuthGateway, SessionStorage, StorageError, StorageKeys};
use crate::domain::{AuthToken, Error, LoginCredentials, RegistrationDetails, UserProfile};

const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";
const REGISTRATION_SUCCEEDED: &str = "Registration successful";
const PROFILE_FAILED: &str = "Failed to load user details";

/// How a persisted token is turned back into an authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HydrationPolicy {
    /// Always fetch the profile from the backend.
    #[default]
    Revalidate,
    /// Use the persisted profile when it parses; fetch only when it does not.
    TrustStored,
}

impl HydrationPolicy {
    /// Configuration spelling of the policy.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Revalidate => "revalidate",
            Self::TrustStored => "trust-stored",
        }
    }
}

impl fmt::Display for HydrationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HydrationPolicy {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "revalidate" => Ok(Self::Revalidate),
            "trust-stored" | "trust_stored" => Ok(Self::TrustStored),
            other => Err(Error::invalid_request(format!(
                "unknown hydration policy `{other}`"
            ))),
        }
    }
}

/// Snapshot of the session.
///
/// ## Invariants
/// - A user is only ever present alongside a token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    token: Option<AuthToken>,
    user: Option<UserProfile>,
}

impl SessionState {
    /// Session with neither token nor profile.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Session holding a token whose profile has not been loaded yet.
    pub fn pending(token: AuthToken) -> Self {
        Self {
            token: Some(token),
            user: None,
        }
    }

    /// Fully authenticated session.
    pub fn authenticated(token: AuthToken, user: UserProfile) -> Self {
        Self {
            token: Some(token),
            user: Some(user),
        }
    }

    /// Current token, if any.
    pub fn token(&self) -> Option<&AuthToken> {
        self.token.as_ref()
    }

    /// Current profile, if loaded.
    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    /// Token and profile are both present.
    ///
    /// # Examples
    /// ```
    /// use client::domain::{AuthToken, SessionState};
    ///
    /// let token = AuthToken::new("T1").unwrap();
    /// assert!(!SessionState::pending(token).is_authenticated());
    /// assert!(!SessionState::anonymous().is_authenticated());
    /// ```
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    /// A token is held but the profile still has to be fetched.
    pub fn needs_hydration(&self) -> bool {
        self.token.is_some() && self.user.is_none()
    }

    /// The loaded profile carries the `admin` role.
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(UserProfile::is_admin)
    }

    /// The loaded profile carries the `user` role.
    pub fn is_user(&self) -> bool {
        self.user.as_ref().is_some_and(UserProfile::is_user)
    }
}

/// Store mediating every session transition.
pub struct SessionStore<A: ?Sized, S: ?Sized> {
    auth: Arc<A>,
    storage: Arc<S>,
    keys: StorageKeys,
    policy: HydrationPolicy,
    state: watch::Sender<SessionState>,
    in_flight: InFlight,
}

impl<A, S> SessionStore<A, S>
where
    A: AuthGateway + ?Sized,
    S: SessionStorage + ?Sized,
{
    /// Create the store and resume the persisted token, if any.
    ///
    /// Only the token is read here; the profile is loaded by
    /// [`Self::initialize_auth`], so a restart resumes into the
    /// `needs_hydration` state.
    pub fn new(auth: Arc<A>, storage: Arc<S>, keys: StorageKeys, policy: HydrationPolicy) -> Self {
        let initial = read_token(storage.as_ref(), &keys)
            .map(SessionState::pending)
            .unwrap_or_default();
        let (state, _) = watch::channel(initial);
        Self {
            auth,
            storage,
            keys,
            policy,
            state,
            in_flight: InFlight::new(),
        }
    }

    /// Copy of the current session.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Observe session replacements.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Observe the in-flight counter; non-zero while an operation runs.
    pub fn subscribe_loading(&self) -> watch::Receiver<usize> {
        self.in_flight.subscribe()
    }

    /// A login, registration or hydration is in flight.
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_active()
    }

    /// See [`SessionState::is_authenticated`].
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// See [`SessionState::needs_hydration`].
    pub fn needs_hydration(&self) -> bool {
        self.state.borrow().needs_hydration()
    }

    /// See [`SessionState::is_admin`].
    pub fn is_admin(&self) -> bool {
        self.state.borrow().is_admin()
    }

    /// See [`SessionState::is_user`].
    pub fn is_user(&self) -> bool {
        self.state.borrow().is_user()
    }

    /// Policy applied by [`Self::initialize_auth`].
    pub fn hydration_policy(&self) -> HydrationPolicy {
        self.policy
    }

    /// Exchange credentials for a session.
    ///
    /// The new token and profile are committed to storage and memory only
    /// once both are known; any failure leaves the previous session as it
    /// was.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserProfile, Error> {
        let _loading = self.in_flight.begin();
        let credentials = LoginCredentials::try_from_parts(username, password)
            .map_err(|err| Error::invalid_request(err.to_string()))?;

        let grant = self.auth.login(&credentials).await.map_err(|err| {
            warn!(
                username = credentials.username(),
                kind = err.kind(),
                error = %err,
                "login rejected"
            );
            Error::from_api(err, LOGIN_FAILED)
        })?;

        let user = match grant.user {
            Some(user) => user,
            None => self.auth.grant_profile(&grant.token).await.map_err(|err| {
                warn!(error = %err, "profile lookup after login failed");
                Error::from_api(err, LOGIN_FAILED)
            })?,
        };

        self.commit(&grant.token, &user)?;
        self.state
            .send_replace(SessionState::authenticated(grant.token, user.clone()));
        info!(user_id = %user.id(), username = user.username(), "login succeeded");
        Ok(user)
    }

    /// Create an account; the session is not touched.
    ///
    /// Returns the backend's acknowledgement text.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<String, Error> {
        let _loading = self.in_flight.begin();
        let details = RegistrationDetails::try_from_parts(username, email, password)
            .map_err(|err| Error::invalid_request(err.to_string()))?;

        let ack = self.auth.register(&details).await.map_err(|err| {
            warn!(username = details.username(), error = %err, "registration rejected");
            Error::from_api(err, REGISTRATION_FAILED)
        })?;
        info!(username = details.username(), "registration accepted");
        Ok(ack
            .message
            .unwrap_or_else(|| REGISTRATION_SUCCEEDED.to_owned()))
    }

    /// Load the profile for the current token.
    ///
    /// Returns `Ok(None)` without a token. Any failure logs the session
    /// out before the error is returned.
    pub async fn fetch_user_details(&self) -> Result<Option<UserProfile>, Error> {
        let _loading = self.in_flight.begin();
        let Some(token) = self.snapshot().token().cloned() else {
            debug!("no session token; skipping profile fetch");
            return Ok(None);
        };
        self.fetch_profile(token).await.map(Some)
    }

    /// Resolve the session after startup or when a navigation finds a token
    /// without a profile. Never fails: unusable sessions are logged out.
    pub async fn initialize_auth(&self) -> SessionState {
        let _loading = self.in_flight.begin();
        let token = self
            .snapshot()
            .token()
            .cloned()
            .or_else(|| read_token(self.storage.as_ref(), &self.keys));
        let Some(token) = token else {
            self.state.send_replace(SessionState::anonymous());
            return self.snapshot();
        };

        if self.policy == HydrationPolicy::TrustStored
            && let Some(user) = self.read_stored_user()
        {
            debug!(user_id = %user.id(), "trusting persisted profile");
            self.state
                .send_replace(SessionState::authenticated(token, user));
            return self.snapshot();
        }

        if let Err(err) = self.fetch_profile(token).await {
            debug!(error = %err, "hydration ended in logout");
        }
        self.snapshot()
    }

    /// Clear token, profile and both storage keys. Never fails.
    pub fn logout(&self) {
        self.state.send_replace(SessionState::anonymous());
        for key in [&self.keys.token, &self.keys.user] {
            if let Err(err) = self.storage.remove(key) {
                warn!(key = key.as_str(), error = %err, "failed to clear session storage");
            }
        }
        info!("session cleared");
    }

    /// Tell the backend the token is done with, then [`Self::logout`].
    ///
    /// The backend call is best effort.
    pub async fn end_session(&self) {
        if let Some(token) = self.snapshot().token().cloned() {
            if let Err(err) = self.auth.logout(&token).await {
                warn!(error = %err, "backend logout failed; clearing local session anyway");
            }
        }
        self.logout();
    }

    async fn fetch_profile(&self, token: AuthToken) -> Result<UserProfile, Error> {
        match self.auth.current_user(&token).await {
            Ok(user) => {
                if let Err(err) = self.write_user(&user) {
                    warn!(error = %err, "failed to persist user profile");
                }
                self.state
                    .send_replace(SessionState::authenticated(token, user.clone()));
                info!(user_id = %user.id(), "session hydrated");
                Ok(user)
            }
            Err(err) => {
                warn!(error = %err, "profile fetch failed; logging out");
                self.logout();
                Err(Error::from_api(err, PROFILE_FAILED))
            }
        }
    }

    fn read_stored_user(&self) -> Option<UserProfile> {
        let raw = match self.storage.get(&self.keys.user) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(error = %err, "failed to read persisted profile");
                return None;
            }
        };
        serde_json::from_str(&raw)
            .map_err(|err| warn!(error = %err, "persisted profile is unreadable"))
            .ok()
    }

    fn write_user(&self, user: &UserProfile) -> Result<(), StorageError> {
        let encoded =
            serde_json::to_string(user).map_err(|err| StorageError::corrupt(err.to_string()))?;
        self.storage.set(&self.keys.user, &encoded)
    }

    /// Persist token and profile together, restoring the previous entries
    /// when either write fails.
    fn commit(&self, token: &AuthToken, user: &UserProfile) -> Result<(), Error> {
        let previous_token = self.storage.get(&self.keys.token).ok().flatten();
        let previous_user = self.storage.get(&self.keys.user).ok().flatten();

        let written = self
            .storage
            .set(&self.keys.token, token.expose())
            .and_then(|()| self.write_user(user));
        let Err(err) = written else {
            return Ok(());
        };

        warn!(error = %err, "failed to persist session; restoring previous entries");
        self.restore(&self.keys.token, previous_token.as_deref());
        self.restore(&self.keys.user, previous_user.as_deref());
        Err(Error::internal(format!("could not save session: {err}")))
    }

    fn restore(&self, key: &str, value: Option<&str>) {
        let result = match value {
            Some(value) => self.storage.set(key, value),
            None => self.storage.remove(key),
        };
        if let Err(err) = result {
            warn!(key, error = %err, "failed to restore session storage entry");
        }
    }
}

fn read_token<S>(storage: &S, keys: &StorageKeys) -> Option<AuthToken>
where
    S: SessionStorage + ?Sized,
{
    match storage.get(&keys.token) {
        Ok(raw) => raw.and_then(AuthToken::new),
        Err(err) => {
            warn!(error = %err, "failed to read persisted token");
            None
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;

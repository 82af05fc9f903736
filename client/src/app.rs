//! Application context wiring stores, router and adapters together.
//!
//! The context owns the only subscription to the HTTP adapter's event
//! stream and reacts to it in [`Application::process_events`]: an expired
//! session is torn down and the user is sent to the login route; backend
//! faults surface as a generic notification.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::config::ClientSettings;
use crate::domain::ports::{
    ApiEvent, AuthGateway, Notification, Notifier, SessionStorage, StorageKeys,
    TransactionGateway,
};
use crate::domain::{
    Error, HydrationPolicy, LOGIN_PATH, Navigation, RefreshFailurePolicy, RouteError, RouteMatch,
    Router, SERVER_FAULT_MESSAGE, SESSION_EXPIRED_MESSAGE, SessionStore, TransactionStore,
};
use crate::outbound::http::{ApiClient, ApiClientConfig, HttpAuthGateway, HttpTransactionGateway};
use crate::outbound::storage::FileSessionStorage;

/// Session store over type-erased ports.
pub type Session = SessionStore<dyn AuthGateway, dyn SessionStorage>;
/// Transaction store over type-erased ports.
pub type Transactions = TransactionStore<dyn TransactionGateway, dyn Notifier>;

/// Driven ports the application is assembled from.
#[derive(Clone)]
pub struct Ports {
    /// Authentication endpoints.
    pub auth: Arc<dyn AuthGateway>,
    /// Transaction endpoints.
    pub transactions: Arc<dyn TransactionGateway>,
    /// Durable session storage.
    pub storage: Arc<dyn SessionStorage>,
    /// User-facing notifications.
    pub notifier: Arc<dyn Notifier>,
}

/// Behavioural knobs shared by the stores.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppOptions {
    /// Durable keys for the token and profile.
    pub keys: StorageKeys,
    /// How a stored token is turned into a session.
    pub hydration: HydrationPolicy,
    /// What a failed refresh does to the cached transactions.
    pub refresh_failure: RefreshFailurePolicy,
}

impl AppOptions {
    /// Options described by `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] when a policy value is not recognised.
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, Error> {
        Ok(Self {
            keys: settings.storage_keys(),
            hydration: settings.hydration_policy()?,
            refresh_failure: settings.refresh_failure_policy()?,
        })
    }
}

/// Running client: stores, router, current location and event handling.
pub struct Application {
    session: Session,
    transactions: Transactions,
    router: Router,
    notifier: Arc<dyn Notifier>,
    events: Mutex<broadcast::Receiver<ApiEvent>>,
    location: watch::Sender<Option<RouteMatch>>,
}

impl Application {
    /// Assemble the application from explicit ports.
    ///
    /// `events` should come from the same adapter that backs the gateways.
    pub fn new(ports: Ports, events: broadcast::Receiver<ApiEvent>, options: AppOptions) -> Self {
        let Ports {
            auth,
            transactions,
            storage,
            notifier,
        } = ports;
        let session = SessionStore::new(auth, storage, options.keys, options.hydration);
        let transactions =
            TransactionStore::new(transactions, Arc::clone(&notifier), options.refresh_failure);
        let (location, _) = watch::channel(None);
        Self {
            session,
            transactions,
            router: Router::default(),
            notifier,
            events: Mutex::new(events),
            location,
        }
    }

    /// Assemble the application over the HTTP adapters.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] when the HTTP client cannot be built.
    pub fn connect(
        api: ApiClientConfig,
        storage: Arc<dyn SessionStorage>,
        notifier: Arc<dyn Notifier>,
        options: AppOptions,
    ) -> Result<Self, Error> {
        let client = Arc::new(ApiClient::new(api, Arc::clone(&storage))?);
        let events = client.subscribe();
        let ports = Ports {
            auth: Arc::new(HttpAuthGateway::new(Arc::clone(&client))),
            transactions: Arc::new(HttpTransactionGateway::new(client)),
            storage,
            notifier,
        };
        Ok(Self::new(ports, events, options))
    }

    /// Assemble the application from configuration, persisting the session
    /// to the configured file.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] when a setting is invalid or no storage location
    /// can be determined.
    pub fn from_settings(
        settings: &ClientSettings,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, Error> {
        let path = settings.storage_path().ok_or_else(|| {
            Error::invalid_request("no session file location; set LOGITRACK_STORAGE_PATH")
        })?;
        debug!(path = %path.display(), "using session file");
        let storage: Arc<dyn SessionStorage> = Arc::new(FileSessionStorage::new(path));
        Self::connect(
            settings.api_config()?,
            storage,
            notifier,
            AppOptions::from_settings(settings)?,
        )
    }

    /// Session store.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Transaction store.
    pub fn transactions(&self) -> &Transactions {
        &self.transactions
    }

    /// Router in use.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Route the last successful navigation ended on.
    pub fn location(&self) -> Option<RouteMatch> {
        self.location.borrow().clone()
    }

    /// Navigate to `path` through the guard and record where it ended.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] when nothing matches or redirects loop; the
    /// recorded location is left unchanged.
    pub async fn navigate(&self, path: &str) -> Result<Navigation, RouteError> {
        let navigation = self.router.navigate(path, &self.session).await?;
        match navigation.redirected_from.as_deref() {
            Some(from) => info!(from, to = navigation.location.path(), "navigation redirected"),
            None => debug!(to = navigation.location.path(), "navigated"),
        }
        self.location.send_replace(Some(navigation.location.clone()));
        Ok(navigation)
    }

    /// Handle every adapter event published since the last call.
    ///
    /// Returns how many events were handled.
    pub async fn process_events(&self) -> usize {
        let pending = self.drain_events();
        for event in &pending {
            match *event {
                ApiEvent::SessionExpired => self.expire_session().await,
                ApiEvent::ServerFault { status } => {
                    debug!(status, "reporting backend fault");
                    self.notifier.notify(&Notification::error(SERVER_FAULT_MESSAGE));
                }
            }
        }
        pending.len()
    }

    fn drain_events(&self) -> Vec<ApiEvent> {
        let mut receiver = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        let mut pending = Vec::new();
        loop {
            match receiver.try_recv() {
                Ok(event) => pending.push(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "dropped api events");
                }
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => break,
            }
        }
        pending
    }

    async fn expire_session(&self) {
        info!("session expired; signing out");
        self.session.logout();
        self.notifier
            .notify(&Notification::warning(SESSION_EXPIRED_MESSAGE));
        if let Err(err) = self.navigate(LOGIN_PATH).await {
            warn!(error = %err, "failed to route to login after session expiry");
        }
    }
}

//! Shared harness: the real HTTP adapters against a wiremock backend.

use std::sync::Arc;

use client::domain::ports::{InMemorySessionStorage, Notifier, SessionStorage};
use client::outbound::http::ApiClientConfig;
use client::test_support::RecordingNotifier;
use client::{AppOptions, Application};
use url::Url;
use wiremock::MockServer;

/// Application wired to a stub backend.
pub struct Backend {
    pub server: MockServer,
    pub app: Application,
    pub storage: Arc<InMemorySessionStorage>,
    pub notifier: Arc<RecordingNotifier>,
}

/// Start a stub backend and an application whose storage holds `entries`.
pub async fn start(entries: &[(&str, &str)]) -> Backend {
    let server = MockServer::start().await;
    let base = Url::parse(&format!("{}/api", server.uri())).expect("server url");
    let storage = Arc::new(InMemorySessionStorage::with_entries(entries.iter().copied()));
    let notifier = Arc::new(RecordingNotifier::default());
    let app = Application::connect(
        ApiClientConfig::new(base),
        Arc::clone(&storage) as Arc<dyn SessionStorage>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        AppOptions::default(),
    )
    .expect("application");
    Backend {
        server,
        app,
        storage,
        notifier,
    }
}

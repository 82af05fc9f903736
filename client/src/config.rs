//! Client configuration loaded via OrthoConfig.
//!
//! Values come from `LOGITRACK_*` environment variables and the optional
//! configuration file; accessors supply the defaults.

use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::ports::{DEFAULT_TOKEN_KEY, DEFAULT_USER_KEY, StorageKeys};
use crate::domain::{Error, HydrationPolicy, RefreshFailurePolicy};
use crate::outbound::http::{ApiClientConfig, DEFAULT_TIMEOUT, DEFAULT_TOKEN_HEADER};
use crate::outbound::storage::FileSessionStorage;

/// Backend root used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Configuration values for the LogiTrack client.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LOGITRACK")]
pub struct ClientSettings {
    /// Backend root every endpoint is joined onto.
    pub base_url: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Header carrying the session token.
    pub token_header: Option<String>,
    /// Session file location.
    pub storage_path: Option<PathBuf>,
    /// Storage key of the token.
    pub token_key: Option<String>,
    /// Storage key of the user profile.
    pub user_key: Option<String>,
    /// `revalidate` or `trust-stored`.
    pub hydration: Option<String>,
    /// `clear` or `preserve`.
    pub refresh_failure: Option<String>,
}

impl ClientSettings {
    /// Parsed backend root, falling back to [`DEFAULT_BASE_URL`].
    pub fn base_url(&self) -> Result<Url, Error> {
        let raw = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        Url::parse(raw.trim())
            .map_err(|err| Error::invalid_request(format!("invalid base URL `{raw}`: {err}")))
    }

    /// Request timeout; zero falls back to the default.
    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs)
    }

    /// Token header name.
    pub fn token_header(&self) -> &str {
        non_blank_or(self.token_header.as_deref(), DEFAULT_TOKEN_HEADER)
    }

    /// Durable storage keys.
    pub fn storage_keys(&self) -> StorageKeys {
        StorageKeys {
            token: non_blank_or(self.token_key.as_deref(), DEFAULT_TOKEN_KEY).to_owned(),
            user: non_blank_or(self.user_key.as_deref(), DEFAULT_USER_KEY).to_owned(),
        }
    }

    /// Session file location; `None` when neither configured nor derivable
    /// from `HOME`.
    pub fn storage_path(&self) -> Option<PathBuf> {
        self.storage_path
            .clone()
            .or_else(FileSessionStorage::default_path)
    }

    /// Hydration policy, defaulting to revalidation.
    pub fn hydration_policy(&self) -> Result<HydrationPolicy, Error> {
        self.hydration
            .as_deref()
            .map_or(Ok(HydrationPolicy::default()), str::parse)
    }

    /// Refresh-failure policy, defaulting to clearing the cache.
    pub fn refresh_failure_policy(&self) -> Result<RefreshFailurePolicy, Error> {
        self.refresh_failure
            .as_deref()
            .map_or(Ok(RefreshFailurePolicy::default()), str::parse)
    }

    /// Settings for the HTTP client.
    pub fn api_config(&self) -> Result<ApiClientConfig, Error> {
        Ok(ApiClientConfig {
            base_url: self.base_url()?,
            timeout: self.timeout(),
            token_header: self.token_header().to_owned(),
            keys: self.storage_keys(),
        })
    }
}

fn non_blank_or<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    //! Unit tests for client configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 8] = [
        "LOGITRACK_BASE_URL",
        "LOGITRACK_TIMEOUT_SECS",
        "LOGITRACK_TOKEN_HEADER",
        "LOGITRACK_STORAGE_PATH",
        "LOGITRACK_TOKEN_KEY",
        "LOGITRACK_USER_KEY",
        "LOGITRACK_HYDRATION",
        "LOGITRACK_REFRESH_FAILURE",
    ];

    fn load_from_empty_args() -> ClientSettings {
        ClientSettings::load_from_iter([OsString::from("logitrack")]).expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.base_url().expect("default url").as_str(),
            "http://localhost:5000/api"
        );
        assert_eq!(settings.timeout(), Duration::from_secs(10));
        assert_eq!(settings.token_header(), "Authentication-Token");
        assert_eq!(settings.storage_keys(), StorageKeys::default());
        assert_eq!(
            settings.hydration_policy().expect("policy"),
            HydrationPolicy::Revalidate
        );
        assert_eq!(
            settings.refresh_failure_policy().expect("policy"),
            RefreshFailurePolicy::Clear
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("LOGITRACK_BASE_URL", Some("https://logistics.example/api".to_owned())),
            ("LOGITRACK_TIMEOUT_SECS", Some("3".to_owned())),
            ("LOGITRACK_TOKEN_HEADER", Some("X-Auth".to_owned())),
            ("LOGITRACK_STORAGE_PATH", Some("/tmp/logitrack.json".to_owned())),
            ("LOGITRACK_TOKEN_KEY", Some("auth_token".to_owned())),
            ("LOGITRACK_USER_KEY", Some("profile".to_owned())),
            ("LOGITRACK_HYDRATION", Some("trust-stored".to_owned())),
            ("LOGITRACK_REFRESH_FAILURE", Some("preserve".to_owned())),
        ]);

        let settings = load_from_empty_args();
        let api = settings.api_config().expect("api config");
        assert_eq!(api.base_url.as_str(), "https://logistics.example/api");
        assert_eq!(api.timeout, Duration::from_secs(3));
        assert_eq!(api.token_header, "X-Auth");
        assert_eq!(api.keys.token, "auth_token");
        assert_eq!(api.keys.user, "profile");
        assert_eq!(
            settings.storage_path(),
            Some(PathBuf::from("/tmp/logitrack.json"))
        );
        assert_eq!(
            settings.hydration_policy().expect("policy"),
            HydrationPolicy::TrustStored
        );
        assert_eq!(
            settings.refresh_failure_policy().expect("policy"),
            RefreshFailurePolicy::Preserve
        );
    }

    #[rstest]
    fn invalid_values_are_reported() {
        let _guard = lock_env([
            ("LOGITRACK_BASE_URL", Some("not a url".to_owned())),
            ("LOGITRACK_HYDRATION", Some("sometimes".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert!(settings.base_url().is_err());
        assert!(settings.hydration_policy().is_err());
    }
}

//! Driven port for durable key/value session storage.
//!
//! This mirrors browser local storage: string keys, string values, and
//! synchronous access. The file adapter lives in `outbound::storage`.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use super::define_port_error;

/// Default key holding the raw session token.
pub const DEFAULT_TOKEN_KEY: &str = "token";
/// Default key holding the JSON-serialised user profile.
pub const DEFAULT_USER_KEY: &str = "user";

/// Names of the durable keys shared by the session store and HTTP adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    /// Key of the token entry.
    pub token: String,
    /// Key of the profile entry.
    pub user: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            token: DEFAULT_TOKEN_KEY.to_owned(),
            user: DEFAULT_USER_KEY.to_owned(),
        }
    }
}

define_port_error! {
    /// Errors raised by session storage adapters.
    pub enum StorageError {
        /// The backing medium could not be read or written.
        Io { message: String } =>
            "session storage unavailable: {message}",
        /// The backing medium holds data that cannot be parsed.
        Corrupt { message: String } =>
            "session storage corrupt: {message}",
    }
}

/// Durable string key/value storage.
#[cfg_attr(test, mockall::automock)]
pub trait SessionStorage: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value; removing a missing key succeeds.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local storage used when persistence is disabled and in tests.
#[derive(Debug, Default)]
pub struct InMemorySessionStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl InMemorySessionStorage {
    /// Create storage pre-populated with `entries`.
    ///
    /// # Examples
    /// ```
    /// use client::domain::ports::{InMemorySessionStorage, SessionStorage};
    ///
    /// let storage = InMemorySessionStorage::with_entries([("token", "T1")]);
    /// assert_eq!(storage.get("token").unwrap().as_deref(), Some("T1"));
    /// ```
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let map = entries
            .into_iter()
            .map(|(key, value)| (key.to_owned(), value.to_owned()))
            .collect();
        Self {
            entries: Mutex::new(map),
        }
    }

    /// Copy of every stored entry.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionStorage for InMemorySessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

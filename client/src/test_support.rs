//! Test utilities for the client crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled for tests and when the `test-support` feature is enabled.

use std::sync::{Mutex, PoisonError};

use crate::domain::ports::{Notification, NotificationLevel, Notifier};
use crate::domain::{Amount, Transaction, TransactionId, UserId};
use crate::outbound::storage::FileSessionStorage;

/// Notifier that keeps every notification for later assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Every notification so far, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages of notifications at `level`, oldest first.
    pub fn messages(&self, level: NotificationLevel) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter(|notification| notification.level == level)
            .map(|notification| notification.message)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification.clone());
    }
}

/// A requested, unpaid shipment with `id` and `name`.
///
/// # Examples
/// ```
/// use client::test_support::transaction;
///
/// let record = transaction(3, "Piano");
/// assert_eq!(record.id.get(), 3);
/// assert!(!record.is_paid());
/// ```
pub fn transaction(id: u64, name: &str) -> Transaction {
    Transaction {
        id: TransactionId::new(id),
        name: name.to_owned(),
        user_id: UserId::new(1),
        kind: "furniture".to_owned(),
        date: "2024-05-01".to_owned(),
        delivery_date: "to be updated".to_owned(),
        source_city: "Pune".to_owned(),
        destination_city: "Delhi".to_owned(),
        internal_status: "requested".to_owned(),
        delivery_status: "processing".to_owned(),
        description: String::new(),
        amount: Amount::ZERO,
        user: "alice".to_owned(),
    }
}

/// File-backed session storage inside a fresh temporary directory.
///
/// Keep the returned directory alive for as long as the storage is used.
pub fn temp_file_storage() -> std::io::Result<(tempfile::TempDir, FileSessionStorage)> {
    let dir = tempfile::tempdir()?;
    let storage = FileSessionStorage::new(dir.path().join("session.json"));
    Ok((dir, storage))
}

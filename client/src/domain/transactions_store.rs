//! Resource store for the transaction collection.
//!
//! The cached collection is always a full snapshot from `GET /get`: every
//! successful mutation is followed by a re-fetch that replaces it, and
//! nothing is ever patched in place.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::loading::InFlight;
use crate::domain::ports::{Acknowledgement, ApiError, Notification, Notifier, TransactionGateway};
use crate::domain::{
    Amount, Error, Transaction, TransactionChanges, TransactionDraft, TransactionId,
    TransactionValidationError, non_blank,
};

/// What happens to the cached collection when a refresh fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshFailurePolicy {
    /// Reset to an empty collection.
    #[default]
    Clear,
    /// Keep the stale collection.
    Preserve,
}

impl RefreshFailurePolicy {
    /// Configuration spelling of the policy.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Preserve => "preserve",
        }
    }
}

impl fmt::Display for RefreshFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RefreshFailurePolicy {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "clear" => Ok(Self::Clear),
            "preserve" => Ok(Self::Preserve),
            other => Err(Error::invalid_request(format!(
                "unknown refresh failure policy `{other}`"
            ))),
        }
    }
}

/// Mutations offered by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `POST /create`.
    Create,
    /// `PUT /update/{id}`.
    Update,
    /// `DELETE /delete/{id}`.
    Delete,
    /// `GET /pay/{id}`.
    Pay,
    /// `PUT /update_delivery_status/{id}`.
    UpdateDeliveryStatus,
    /// `POST /update_amount/{id}`.
    UpdateAmount,
    /// `POST /update_delivery_date/{id}`.
    UpdateDeliveryDate,
}

impl Operation {
    /// Shown when the backend acknowledges without a message.
    pub fn success_message(self) -> &'static str {
        match self {
            Self::Create => "Transaction created successfully",
            Self::Update => "Transaction updated successfully",
            Self::Delete => "Transaction deleted successfully",
            Self::Pay => "Payment successful",
            Self::UpdateDeliveryStatus => "Delivery status updated",
            Self::UpdateAmount => "Amount updated",
            Self::UpdateDeliveryDate => "Delivery date updated",
        }
    }

    /// Shown when the failure carries no backend message.
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Create => "Failed to create transaction",
            Self::Update => "Failed to update transaction",
            Self::Delete => "Failed to delete transaction",
            Self::Pay => "Payment failed",
            Self::UpdateDeliveryStatus => "Failed to update delivery status",
            Self::UpdateAmount => "Failed to update amount",
            Self::UpdateDeliveryDate => "Failed to update delivery date",
        }
    }
}

const REVIEW_FAILED: &str = "Failed to load transaction";
const REFRESH_FAILED: &str = "Failed to load transactions";

/// Store owning the cached transaction collection.
pub struct TransactionStore<G: ?Sized, N: ?Sized> {
    gateway: Arc<G>,
    notifier: Arc<N>,
    policy: RefreshFailurePolicy,
    transactions: watch::Sender<Vec<Transaction>>,
    in_flight: InFlight,
}

impl<G, N> TransactionStore<G, N>
where
    G: TransactionGateway + ?Sized,
    N: Notifier + ?Sized,
{
    /// Create an empty store.
    pub fn new(gateway: Arc<G>, notifier: Arc<N>, policy: RefreshFailurePolicy) -> Self {
        let (transactions, _) = watch::channel(Vec::new());
        Self {
            gateway,
            notifier,
            policy,
            transactions,
            in_flight: InFlight::new(),
        }
    }

    /// Copy of the cached collection.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.transactions.borrow().clone()
    }

    /// Cached record with `id`, if present.
    pub fn find(&self, id: TransactionId) -> Option<Transaction> {
        self.transactions
            .borrow()
            .iter()
            .find(|transaction| transaction.id == id)
            .cloned()
    }

    /// Observe snapshot replacements.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Transaction>> {
        self.transactions.subscribe()
    }

    /// Observe the in-flight counter.
    pub fn subscribe_loading(&self) -> watch::Receiver<usize> {
        self.in_flight.subscribe()
    }

    /// A fetch or mutation is in flight.
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_active()
    }

    /// Replace the cached collection with the backend's.
    ///
    /// On failure the refresh-failure policy decides whether the stale
    /// collection survives.
    pub async fn fetch_transactions(&self) -> Result<usize, Error> {
        let _loading = self.in_flight.begin();
        match self.gateway.list().await {
            Ok(fresh) => {
                let count = fresh.len();
                self.transactions.send_replace(fresh);
                debug!(count, "transactions refreshed");
                Ok(count)
            }
            Err(err) => {
                warn!(error = %err, policy = %self.policy, "transaction refresh failed");
                if self.policy == RefreshFailurePolicy::Clear {
                    self.transactions.send_replace(Vec::new());
                }
                Err(Error::from_api(err, REFRESH_FAILED))
            }
        }
    }

    /// Fetch one record for review without touching the cache.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, Error> {
        let _loading = self.in_flight.begin();
        self.gateway.get(id).await.map_err(|err| {
            warn!(%id, error = %err, "transaction review failed");
            Error::from_api(err, REVIEW_FAILED)
        })
    }

    /// Create a transaction owned by the current user.
    pub async fn create_transaction(&self, draft: &TransactionDraft) -> Result<String, Error> {
        let _loading = self.in_flight.begin();
        let draft = self.validate(Operation::Create, draft.validated())?;
        let outcome = self.gateway.create(&draft).await;
        self.settle(Operation::Create, outcome).await
    }

    /// Apply a partial update.
    pub async fn update_transaction(
        &self,
        id: TransactionId,
        changes: &TransactionChanges,
    ) -> Result<String, Error> {
        let _loading = self.in_flight.begin();
        self.validate(Operation::Update, changes.validate())?;
        let outcome = self.gateway.update(id, changes).await;
        self.settle(Operation::Update, outcome).await
    }

    /// Delete a transaction.
    pub async fn delete_transaction(&self, id: TransactionId) -> Result<String, Error> {
        let _loading = self.in_flight.begin();
        let outcome = self.gateway.delete(id).await;
        self.settle(Operation::Delete, outcome).await
    }

    /// Mark a transaction paid.
    pub async fn pay_transaction(&self, id: TransactionId) -> Result<String, Error> {
        let _loading = self.in_flight.begin();
        let outcome = self.gateway.pay(id).await;
        self.settle(Operation::Pay, outcome).await
    }

    /// Move the delivery status.
    pub async fn update_delivery_status(
        &self,
        id: TransactionId,
        status: &str,
    ) -> Result<String, Error> {
        let _loading = self.in_flight.begin();
        let operation = Operation::UpdateDeliveryStatus;
        let status = self.validate(operation, non_blank("delivery_status", status))?;
        let outcome = self.gateway.update_delivery_status(id, &status).await;
        self.settle(operation, outcome).await
    }

    /// Set the amount charged.
    pub async fn update_amount(&self, id: TransactionId, amount: f64) -> Result<String, Error> {
        let _loading = self.in_flight.begin();
        let operation = Operation::UpdateAmount;
        let amount = self.validate(operation, Amount::new(amount))?;
        let outcome = self.gateway.update_amount(id, amount).await;
        self.settle(operation, outcome).await
    }

    /// Set the promised delivery date.
    pub async fn update_delivery_date(
        &self,
        id: TransactionId,
        delivery_date: &str,
    ) -> Result<String, Error> {
        let _loading = self.in_flight.begin();
        let operation = Operation::UpdateDeliveryDate;
        let date = self.validate(operation, non_blank("delivery_date", delivery_date))?;
        let outcome = self.gateway.update_delivery_date(id, &date).await;
        self.settle(operation, outcome).await
    }

    fn validate<T>(
        &self,
        operation: Operation,
        checked: Result<T, TransactionValidationError>,
    ) -> Result<T, Error> {
        checked.map_err(|err| {
            debug!(?operation, error = %err, "mutation rejected before dispatch");
            let error = Error::invalid_request(err.to_string());
            self.notifier.notify(&Notification::error(error.message()));
            error
        })
    }

    async fn settle(
        &self,
        operation: Operation,
        outcome: Result<Acknowledgement, ApiError>,
    ) -> Result<String, Error> {
        match outcome {
            Ok(ack) => {
                if let Err(err) = self.fetch_transactions().await {
                    warn!(?operation, error = %err, "refresh after mutation failed");
                }
                let message = ack
                    .message
                    .unwrap_or_else(|| operation.success_message().to_owned());
                info!(?operation, "mutation succeeded");
                self.notifier.notify(&Notification::success(message.as_str()));
                Ok(message)
            }
            Err(err) => {
                warn!(?operation, kind = err.kind(), error = %err, "mutation failed");
                let announced = err.is_announced();
                let error = Error::from_api(err, operation.failure_message());
                if !announced {
                    self.notifier.notify(&Notification::error(error.message()));
                }
                Err(error)
            }
        }
    }
}

#[cfg(test)]
#[path = "transactions_store_tests.rs"]
mod tests;

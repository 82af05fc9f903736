//! Driven port for the backend's transaction collection.

use async_trait::async_trait;

use super::{Acknowledgement, ApiError};
use crate::domain::{Amount, Transaction, TransactionChanges, TransactionDraft, TransactionId};

/// Port for reading and mutating transactions.
///
/// Every call authenticates with the session token currently held in durable
/// storage; callers never pass it in.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionGateway: Send + Sync {
    /// Fetch the full collection visible to the current user.
    async fn list(&self) -> Result<Vec<Transaction>, ApiError>;

    /// Fetch one transaction for review.
    async fn get(&self, id: TransactionId) -> Result<Transaction, ApiError>;

    /// Create a transaction owned by the current user.
    async fn create(&self, draft: &TransactionDraft) -> Result<Acknowledgement, ApiError>;

    /// Apply a partial update.
    async fn update(
        &self,
        id: TransactionId,
        changes: &TransactionChanges,
    ) -> Result<Acknowledgement, ApiError>;

    /// Delete a transaction.
    async fn delete(&self, id: TransactionId) -> Result<Acknowledgement, ApiError>;

    /// Mark a transaction paid.
    async fn pay(&self, id: TransactionId) -> Result<Acknowledgement, ApiError>;

    /// Move the delivery status to `status`.
    async fn update_delivery_status(
        &self,
        id: TransactionId,
        status: &str,
    ) -> Result<Acknowledgement, ApiError>;

    /// Set the amount; the backend moves the shipment to `Payment Pending`.
    async fn update_amount(
        &self,
        id: TransactionId,
        amount: Amount,
    ) -> Result<Acknowledgement, ApiError>;

    /// Set the promised delivery date.
    async fn update_delivery_date(
        &self,
        id: TransactionId,
        delivery_date: &str,
    ) -> Result<Acknowledgement, ApiError>;
}

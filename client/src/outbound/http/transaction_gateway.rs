//! HTTP implementation of the `TransactionGateway` port.
//!
//! Every call uses the token held in durable storage at send time. Listing
//! drops records that fail validation and keeps the rest.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use tracing::warn;

use super::api_client::{ApiClient, Credential};
use super::dto::{
    AmountDto, ChangesDto, DeliveryDateDto, DeliveryStatusDto, DraftDto, TransactionDto,
};
use crate::domain::ports::{Acknowledgement, ApiError, TransactionGateway};
use crate::domain::{Amount, Transaction, TransactionChanges, TransactionDraft, TransactionId};

/// Transaction endpoints of the backend.
pub struct HttpTransactionGateway {
    api: Arc<ApiClient>,
}

impl HttpTransactionGateway {
    /// Gateway sharing `api` with the other adapters.
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    async fn send<B>(&self, method: Method, path: &str, body: &B) -> Result<Acknowledgement, ApiError>
    where
        B: serde::Serialize + Sync,
    {
        self.api
            .acknowledge(method, path, Some(body), Credential::Stored)
            .await
    }

    async fn send_empty(&self, method: Method, path: &str) -> Result<Acknowledgement, ApiError> {
        self.api
            .acknowledge::<()>(method, path, None, Credential::Stored)
            .await
    }
}

fn into_domain(dto: TransactionDto) -> Result<Transaction, ApiError> {
    dto.into_domain().map_err(ApiError::decode)
}

#[async_trait]
impl TransactionGateway for HttpTransactionGateway {
    async fn list(&self) -> Result<Vec<Transaction>, ApiError> {
        let records: Vec<TransactionDto> = self
            .api
            .fetch::<_, ()>(Method::GET, "get", None, Credential::Stored)
            .await?;
        Ok(records
            .into_iter()
            .filter_map(|record| match record.into_domain() {
                Ok(transaction) => Some(transaction),
                Err(reason) => {
                    warn!(%reason, "skipping invalid transaction record");
                    None
                }
            })
            .collect())
    }

    async fn get(&self, id: TransactionId) -> Result<Transaction, ApiError> {
        let record: TransactionDto = self
            .api
            .fetch::<_, ()>(
                Method::GET,
                &format!("review_transaction/{id}"),
                None,
                Credential::Stored,
            )
            .await?;
        into_domain(record)
    }

    async fn create(&self, draft: &TransactionDraft) -> Result<Acknowledgement, ApiError> {
        self.send(Method::POST, "create", &DraftDto::from(draft))
            .await
    }

    async fn update(
        &self,
        id: TransactionId,
        changes: &TransactionChanges,
    ) -> Result<Acknowledgement, ApiError> {
        self.send(Method::PUT, &format!("update/{id}"), &ChangesDto::from(changes))
            .await
    }

    async fn delete(&self, id: TransactionId) -> Result<Acknowledgement, ApiError> {
        self.send_empty(Method::DELETE, &format!("delete/{id}"))
            .await
    }

    async fn pay(&self, id: TransactionId) -> Result<Acknowledgement, ApiError> {
        self.send_empty(Method::GET, &format!("pay/{id}")).await
    }

    async fn update_delivery_status(
        &self,
        id: TransactionId,
        status: &str,
    ) -> Result<Acknowledgement, ApiError> {
        let body = DeliveryStatusDto {
            delivery_status: status,
        };
        self.send(Method::PUT, &format!("update_delivery_status/{id}"), &body)
            .await
    }

    async fn update_amount(
        &self,
        id: TransactionId,
        amount: Amount,
    ) -> Result<Acknowledgement, ApiError> {
        let body = AmountDto {
            amount: amount.get(),
        };
        self.send(Method::POST, &format!("update_amount/{id}"), &body)
            .await
    }

    async fn update_delivery_date(
        &self,
        id: TransactionId,
        delivery_date: &str,
    ) -> Result<Acknowledgement, ApiError> {
        let body = DeliveryDateDto { delivery_date };
        self.send(Method::POST, &format!("update_delivery_date/{id}"), &body)
            .await
    }
}

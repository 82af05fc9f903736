//! Wire DTOs for the LogiTrack backend.
//!
//! Responses decode into these transport shapes first, then map into domain
//! records in one pass. Request bodies serialise straight from the domain
//! payloads through the borrowed request DTOs below.

use serde::{Deserialize, Serialize};

use crate::domain::ports::Acknowledgement;
use crate::domain::{
    Amount, Role, Transaction, TransactionChanges, TransactionDraft, TransactionId, UserId,
    UserProfile,
};

#[derive(Debug, Deserialize)]
pub(super) struct LoginResponseDto {
    #[serde(alias = "auth_token")]
    pub(super) token: String,
    #[serde(default)]
    pub(super) user: Option<UserDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserDto {
    #[serde(default, alias = "user_id")]
    id: u64,
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    roles: Vec<String>,
    /// Single-role form; merged with `roles`.
    #[serde(default)]
    role: Option<String>,
}

impl UserDto {
    pub(super) fn into_domain(self) -> UserProfile {
        UserProfile::new(
            UserId::new(self.id),
            self.username,
            self.email,
            self.role
                .into_iter()
                .chain(self.roles)
                .filter(|role| !role.trim().is_empty())
                .map(Role::from),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct AcknowledgementDto {
    #[serde(default)]
    message: Option<String>,
}

impl From<AcknowledgementDto> for Acknowledgement {
    fn from(value: AcknowledgementDto) -> Self {
        Self {
            message: value.message.filter(|message| !message.trim().is_empty()),
        }
    }
}

/// Error body: Flask handlers use either `message` or `error`.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorBodyDto {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBodyDto {
    pub(super) fn into_message(self) -> Option<String> {
        self.message
            .or(self.error)
            .filter(|message| !message.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct TransactionDto {
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    user_id: u64,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default, alias = "initiation_date")]
    date: Option<String>,
    #[serde(default)]
    delivery_date: Option<String>,
    #[serde(default)]
    source_city: String,
    #[serde(default)]
    destination_city: String,
    #[serde(default)]
    internal_status: String,
    #[serde(default)]
    delivery_status: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    amount: Option<f64>,
    #[serde(default)]
    user: String,
}

impl TransactionDto {
    pub(super) fn into_domain(self) -> Result<Transaction, String> {
        let amount = Amount::new(self.amount.unwrap_or_default())
            .map_err(|err| format!("transaction {}: {err}", self.id))?;
        Ok(Transaction {
            id: TransactionId::new(self.id),
            name: self.name,
            user_id: UserId::new(self.user_id),
            kind: self.kind,
            date: self.date.unwrap_or_default(),
            delivery_date: self.delivery_date.unwrap_or_default(),
            source_city: self.source_city,
            destination_city: self.destination_city,
            internal_status: self.internal_status,
            delivery_status: self.delivery_status,
            description: self.description.unwrap_or_default(),
            amount,
            user: self.user,
        })
    }
}

#[derive(Debug, Serialize)]
pub(super) struct LoginRequestDto<'a> {
    pub(super) username: &'a str,
    pub(super) password: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct RegisterRequestDto<'a> {
    pub(super) username: &'a str,
    pub(super) email: &'a str,
    pub(super) password: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct DraftDto<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    date: &'a str,
    source_city: &'a str,
    destination_city: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    amount: Option<f64>,
}

impl<'a> From<&'a TransactionDraft> for DraftDto<'a> {
    fn from(value: &'a TransactionDraft) -> Self {
        Self {
            name: &value.name,
            kind: &value.kind,
            date: &value.date,
            source_city: &value.source_city,
            destination_city: &value.destination_city,
            description: value.description.as_deref(),
            amount: value.amount.map(Amount::get),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ChangesDto<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_city: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    destination_city: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

impl<'a> From<&'a TransactionChanges> for ChangesDto<'a> {
    fn from(value: &'a TransactionChanges) -> Self {
        Self {
            name: value.name.as_deref(),
            kind: value.kind.as_deref(),
            date: value.date.as_deref(),
            source_city: value.source_city.as_deref(),
            destination_city: value.destination_city.as_deref(),
            description: value.description.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct DeliveryStatusDto<'a> {
    pub(super) delivery_status: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct AmountDto {
    pub(super) amount: f64,
}

#[derive(Debug, Serialize)]
pub(super) struct DeliveryDateDto<'a> {
    pub(super) delivery_date: &'a str,
}

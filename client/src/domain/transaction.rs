//! Transaction (shipment) records and the payloads used to change them.

use std::fmt;

use crate::domain::UserId;

/// Backend-assigned transaction identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Wrap a raw identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw identifier value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TransactionId {
    type Err = TransactionValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| TransactionValidationError::InvalidId)
    }
}

/// Validation failures for transaction payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionValidationError {
    /// Identifier was not a non-negative integer.
    InvalidId,
    /// A required text field was blank.
    MissingField {
        /// Wire name of the offending field.
        field: &'static str,
    },
    /// Amount was negative, infinite or NaN.
    InvalidAmount,
    /// An update carried no fields.
    EmptyChanges,
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "transaction id must be a non-negative integer"),
            Self::MissingField { field } => write!(f, "{field} must not be empty"),
            Self::InvalidAmount => write!(f, "amount must be a finite, non-negative number"),
            Self::EmptyChanges => write!(f, "update must change at least one field"),
        }
    }
}

impl std::error::Error for TransactionValidationError {}

/// Monetary amount charged for a shipment.
///
/// ## Invariants
/// - finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Amount(f64);

impl Amount {
    /// No charge; the backend's value for freshly requested shipments.
    pub const ZERO: Self = Self(0.0);

    /// Validate a raw amount.
    ///
    /// # Examples
    /// ```
    /// use client::domain::Amount;
    ///
    /// assert!(Amount::new(100.0).is_ok());
    /// assert!(Amount::new(-1.0).is_err());
    /// assert!(Amount::new(f64::NAN).is_err());
    /// ```
    pub fn new(raw: f64) -> Result<Self, TransactionValidationError> {
        if raw.is_finite() && raw >= 0.0 {
            Ok(Self(raw))
        } else {
            Err(TransactionValidationError::InvalidAmount)
        }
    }

    /// Raw value.
    pub const fn get(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// One shipment as listed by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Stable identifier.
    pub id: TransactionId,
    /// Short shipment name.
    pub name: String,
    /// Owning user.
    pub user_id: UserId,
    /// Shipment category (wire name `type`).
    pub kind: String,
    /// Creation date as entered by the customer.
    pub date: String,
    /// Promised delivery date; `to be updated` until an admin sets it.
    pub delivery_date: String,
    /// Origin city.
    pub source_city: String,
    /// Destination city.
    pub destination_city: String,
    /// Lifecycle and payment status (`requested`, `Payment Pending`, `paid`).
    pub internal_status: String,
    /// Delivery progress, tracked independently of `internal_status`.
    pub delivery_status: String,
    /// Free-form notes.
    pub description: String,
    /// Amount charged.
    pub amount: Amount,
    /// Owner's display name.
    pub user: String,
}

impl Transaction {
    /// Return whether the backend has marked the shipment paid.
    pub fn is_paid(&self) -> bool {
        self.internal_status.eq_ignore_ascii_case("paid")
    }
}

fn required(field: &'static str, value: &str) -> Result<String, TransactionValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(TransactionValidationError::MissingField { field })
    } else {
        Ok(trimmed.to_owned())
    }
}

/// Payload for creating a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    /// Short shipment name.
    pub name: String,
    /// Shipment category.
    pub kind: String,
    /// Creation date.
    pub date: String,
    /// Origin city.
    pub source_city: String,
    /// Destination city.
    pub destination_city: String,
    /// Optional notes.
    pub description: Option<String>,
    /// Optional proposed amount.
    pub amount: Option<Amount>,
}

impl TransactionDraft {
    /// Check that all required fields are present.
    ///
    /// Returns a copy with required fields trimmed.
    pub fn validated(&self) -> Result<Self, TransactionValidationError> {
        Ok(Self {
            name: required("name", &self.name)?,
            kind: required("type", &self.kind)?,
            date: required("date", &self.date)?,
            source_city: required("source_city", &self.source_city)?,
            destination_city: required("destination_city", &self.destination_city)?,
            description: self.description.clone(),
            amount: self.amount,
        })
    }
}

/// Partial update payload; `None` fields are left untouched by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransactionChanges {
    /// New name.
    pub name: Option<String>,
    /// New category.
    pub kind: Option<String>,
    /// New creation date.
    pub date: Option<String>,
    /// New origin city.
    pub source_city: Option<String>,
    /// New destination city.
    pub destination_city: Option<String>,
    /// New notes.
    pub description: Option<String>,
}

impl TransactionChanges {
    /// Return whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.kind.is_none()
            && self.date.is_none()
            && self.source_city.is_none()
            && self.destination_city.is_none()
            && self.description.is_none()
    }

    /// Reject empty updates and blank values for required fields.
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if self.is_empty() {
            return Err(TransactionValidationError::EmptyChanges);
        }
        let checks = [
            ("name", &self.name),
            ("type", &self.kind),
            ("date", &self.date),
            ("source_city", &self.source_city),
            ("destination_city", &self.destination_city),
        ];
        for (field, value) in checks {
            if let Some(value) = value {
                required(field, value)?;
            }
        }
        Ok(())
    }
}

/// Validate a free-text status or date value used by transition endpoints.
pub fn non_blank(field: &'static str, value: &str) -> Result<String, TransactionValidationError> {
    required(field, value)
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::fmt;
use crate::domain::models::booking::UnknownVariant;

/// What a deposit payment pays for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum PaymentTarget {
    Booking(String),
    Group(String),
}

impl PaymentTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            PaymentTarget::Booking(_) => "booking",
            PaymentTarget::Group(_) => "group",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            PaymentTarget::Booking(id) | PaymentTarget::Group(id) => id,
        }
    }

    /// Parses the `external_reference` echoed back by the provider.
    pub fn parse_reference(reference: &str) -> Option<Self> {
        let (kind, id) = reference.split_once(':')?;
        if id.is_empty() {
            return None;
        }
        match kind {
            "booking" => Some(PaymentTarget::Booking(id.to_string())),
            "group" => Some(PaymentTarget::Group(id.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Rejected => "rejected",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Refunded => "refunded",
        }
    }

    /// Maps the provider's vocabulary onto ours.
    pub fn from_provider(status: &str) -> Self {
        match status {
            "approved" | "authorized" => PaymentStatus::Approved,
            "rejected" => PaymentStatus::Rejected,
            "cancelled" => PaymentStatus::Cancelled,
            "refunded" | "charged_back" => PaymentStatus::Refunded,
            _ => PaymentStatus::Pending,
        }
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "approved" => Ok(PaymentStatus::Approved),
            "rejected" => Ok(PaymentStatus::Rejected),
            "cancelled" => Ok(PaymentStatus::Cancelled),
            "refunded" => Ok(PaymentStatus::Refunded),
            _ => Err(UnknownVariant { kind: "payment status", value }),
        }
    }
}

/// A provider payment as we last saw it. One row per provider payment id.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Payment {
    pub id: String,
    pub provider_payment_id: String,
    pub target_kind: String,
    pub target_id: String,
    pub amount: i64,
    pub currency: String,
    #[sqlx(try_from = "String")]
    pub status: PaymentStatus,
    pub received_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn from_provider(provider: &ProviderPayment, target: &PaymentTarget, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            provider_payment_id: provider.id.clone(),
            target_kind: target.kind().to_string(),
            target_id: target.id().to_string(),
            amount: provider.amount,
            currency: provider.currency.clone(),
            status: provider.status,
            received_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentRecordOutcome {
    Inserted,
    Updated,
    /// Same payment id and state already stored; redelivered notification.
    Duplicate,
}

/// Payment as reported by the provider's API.
#[derive(Debug, Clone)]
pub struct ProviderPayment {
    pub id: String,
    pub status: PaymentStatus,
    pub amount: i64,
    pub currency: String,
    pub external_reference: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PreferenceRequest {
    pub title: String,
    pub amount: i64,
    pub currency: String,
    pub external_reference: String,
    pub payer_email: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub notification_url: Option<String>,
    pub back_url: Option<String>,
}

/// Checkout preference created at the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub preference_id: String,
    pub init_point: String,
    pub sandbox_init_point: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DepositTotals {
    pub target: i64,
    pub collected: i64,
    pub remaining: i64,
    pub fully_paid: bool,
}

impl DepositTotals {
    pub fn new(target: i64, collected: i64) -> Self {
        Self {
            target,
            collected,
            remaining: (target - collected).max(0),
            fully_paid: collected >= target,
        }
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::fmt;
use thiserror::Error;
use crate::domain::models::payment::PaymentTarget;

#[derive(Debug, Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum DepositType {
    Fixed,
    Percent,
}

impl DepositType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepositType::Fixed => "FIXED",
            DepositType::Percent => "PERCENT",
        }
    }
}

impl TryFrom<String> for DepositType {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_uppercase().as_str() {
            "FIXED" => Ok(DepositType::Fixed),
            "PERCENT" => Ok(DepositType::Percent),
            _ => Err(UnknownVariant { kind: "deposit type", value }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Canceled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Canceled => "canceled",
        }
    }

    /// Pending and confirmed bookings hold their interval on the calendar.
    pub fn blocks_calendar(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

impl TryFrom<String> for BookingStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "canceled" => Ok(BookingStatus::Canceled),
            _ => Err(UnknownVariant { kind: "booking status", value }),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DepositStatus {
    NotRequired,
    Unpaid,
    Pending,
    Paid,
    Refunded,
    Expired,
}

impl DepositStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepositStatus::NotRequired => "not_required",
            DepositStatus::Unpaid => "unpaid",
            DepositStatus::Pending => "pending",
            DepositStatus::Paid => "paid",
            DepositStatus::Refunded => "refunded",
            DepositStatus::Expired => "expired",
        }
    }

    /// Still waiting on money; the only states a payment or the sweep may move.
    pub fn is_awaiting_payment(&self) -> bool {
        matches!(self, DepositStatus::Unpaid | DepositStatus::Pending)
    }
}

impl TryFrom<String> for DepositStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "not_required" => Ok(DepositStatus::NotRequired),
            "unpaid" => Ok(DepositStatus::Unpaid),
            "pending" => Ok(DepositStatus::Pending),
            "paid" => Ok(DepositStatus::Paid),
            "refunded" => Ok(DepositStatus::Refunded),
            "expired" => Ok(DepositStatus::Expired),
            _ => Err(UnknownVariant { kind: "deposit status", value }),
        }
    }
}

impl fmt::Display for DepositStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub tenant_id: String,
    pub group_id: Option<String>,
    pub service_id: String,
    pub professional_id: String,
    pub branch_id: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: Option<String>,
    pub client_dni: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub timezone: String,
    #[sqlx(try_from = "String")]
    pub status: BookingStatus,
    pub price: i64,
    pub currency: String,
    pub notes: Option<String>,
    pub deposit_required: bool,
    #[sqlx(try_from = "String")]
    pub deposit_type: DepositType,
    pub deposit_value_applied: i64,
    pub deposit_amount: i64,
    pub deposit_currency: String,
    #[sqlx(try_from = "String")]
    pub deposit_status: DepositStatus,
    pub deposit_deadline_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub deposit_preference_id: Option<String>,
    pub deposit_init_point: Option<String>,
    pub deposit_sandbox_init_point: Option<String>,
    #[serde(skip_serializing)]
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClientInfo {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub dni: Option<String>,
}

/// Deposit terms fixed at reservation time.
#[derive(Debug, Clone)]
pub struct DepositTerms {
    pub required: bool,
    pub deposit_type: DepositType,
    pub value_applied: i64,
    pub amount: i64,
    pub currency: String,
    pub deadline_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewBookingParams {
    pub tenant_id: String,
    pub group_id: Option<String>,
    pub service_id: String,
    pub branch_id: String,
    pub start: DateTime<Utc>,
    pub duration_min: i32,
    pub timezone: String,
    pub client: ClientInfo,
    pub notes: Option<String>,
    pub price: i64,
    pub currency: String,
    pub deposit: DepositTerms,
    pub idempotency_key: Option<String>,
}

impl Booking {
    /// Builds the row for a professional chosen inside the reservation
    /// transaction.
    pub fn new(params: NewBookingParams, professional_id: String, now: DateTime<Utc>) -> Self {
        let end_time = params.start + chrono::Duration::minutes(params.duration_min as i64);

        let (status, deposit_status) = if params.deposit.required {
            (BookingStatus::Pending, DepositStatus::Unpaid)
        } else {
            (BookingStatus::Confirmed, DepositStatus::NotRequired)
        };

        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id: params.tenant_id,
            group_id: params.group_id,
            service_id: params.service_id,
            professional_id,
            branch_id: params.branch_id,
            client_name: params.client.name,
            client_email: params.client.email,
            client_phone: params.client.phone,
            client_dni: params.client.dni,
            start_time: params.start,
            end_time,
            timezone: params.timezone,
            status,
            price: params.price,
            currency: params.currency,
            notes: params.notes,
            deposit_required: params.deposit.required,
            deposit_type: params.deposit.deposit_type,
            deposit_value_applied: params.deposit.value_applied,
            deposit_amount: params.deposit.amount,
            deposit_currency: params.deposit.currency,
            deposit_status,
            deposit_deadline_at: params.deposit.deadline_at,
            deposit_preference_id: None,
            deposit_init_point: None,
            deposit_sandbox_init_point: None,
            idempotency_key: params.idempotency_key,
            created_at: now,
            updated_at: now,
        }
    }

    /// Deposits of grouped bookings are paid against the group.
    pub fn payment_target(&self) -> PaymentTarget {
        match &self.group_id {
            Some(group_id) => PaymentTarget::Group(group_id.clone()),
            None => PaymentTarget::Booking(self.id.clone()),
        }
    }
}

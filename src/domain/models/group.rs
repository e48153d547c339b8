use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Bookings created together and paying one shared deposit.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct BookingGroup {
    pub id: String,
    pub tenant_id: String,
    pub price_total: i64,
    /// Sum of the member bookings' deposit amounts.
    pub deposit_target: i64,
    pub currency: String,
    #[serde(skip_serializing)]
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BookingGroup {
    pub fn new(tenant_id: String, currency: String, idempotency_key: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id,
            price_total: 0,
            deposit_target: 0,
            currency,
            idempotency_key,
            created_at: now,
        }
    }
}

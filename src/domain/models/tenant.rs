use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sqlx::FromRow;
use crate::domain::models::booking::DepositType;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Tenant {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub timezone: String,
    pub currency: String,
    pub bookings_blocked: bool,
    /// Grid step for slot start times. `None` means "same as the service duration".
    pub slot_step_min: Option<i32>,
    pub max_horizon_days: i32,
    pub min_notice_min: i32,
    #[sqlx(try_from = "String")]
    pub deposit_type: DepositType,
    pub deposit_value: i64,
    pub deposit_grace_min: i32,
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(chrono_tz::UTC)
    }
}

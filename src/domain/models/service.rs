use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use crate::domain::models::booking::DepositType;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Service {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub category: Option<String>,
    pub session_duration_min: i32,
    pub sessions_count: i32,
    pub price: i64,
    pub currency: String,
    pub deposit_required: bool,
    #[sqlx(try_from = "String")]
    pub deposit_type: DepositType,
    pub deposit_value: i64,
    pub uses_global_deposit_config: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

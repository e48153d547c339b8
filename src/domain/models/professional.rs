use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::warn;
use crate::domain::models::schedule::WeekdayConfig;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Professional {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub photo_url: Option<String>,
    pub active: bool,
    #[serde(skip_serializing)]
    pub working_hours_json: String,
    pub created_at: DateTime<Utc>,
}

impl Professional {
    pub fn working_hours(&self) -> WeekdayConfig {
        serde_json::from_str(&self.working_hours_json).unwrap_or_else(|e| {
            warn!("Professional {} has unreadable working hours: {}", self.id, e);
            WeekdayConfig::default()
        })
    }
}

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::warn;
use crate::domain::models::schedule::WeekdayConfig;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Branch {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub location: Option<String>,
    pub active: bool,
    pub is_default: bool,
    #[serde(skip_serializing)]
    pub opening_hours_json: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Branch {
    /// `None` means the branch does not restrict professional hours.
    pub fn opening_hours(&self) -> Option<WeekdayConfig> {
        let json = self.opening_hours_json.as_deref()?;
        match serde_json::from_str(json) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Branch {} has unreadable opening hours, treating as closed: {}", self.id, e);
                Some(WeekdayConfig::default())
            }
        }
    }
}

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A closed period. Tenant-wide when both scopes are empty, branch-wide
/// when only `branch_id` is set.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Blackout {
    pub id: String,
    pub tenant_id: String,
    pub branch_id: Option<String>,
    pub professional_id: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub reason: Option<String>,
}

impl Blackout {
    pub fn applies_to(&self, branch_id: &str, professional_id: &str) -> bool {
        let branch_ok = self.branch_id.as_deref().is_none_or(|b| b == branch_id);
        let professional_ok = self.professional_id.as_deref().is_none_or(|p| p == professional_id);
        branch_ok && professional_ok
    }
}

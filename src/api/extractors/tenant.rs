use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::Span;
use crate::domain::models::tenant::Tenant;
use crate::error::AppError;
use crate::state::AppState;

/// The tenant named by the `{tenant}` path segment. Rejects blocked tenants
/// with the sentinel response before the handler runs.
pub struct TenantContext(pub Tenant);

impl FromRequestParts<Arc<AppState>> for TenantContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let params: Path<HashMap<String, String>> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Validation("Invalid path".into()))?;

        let slug = params.get("tenant").ok_or(AppError::Validation("Missing tenant".into()))?;

        let tenant = state.catalog.resolve_tenant(slug).await?;
        Span::current().record("tenant_id", tenant.id.as_str());
        Ok(TenantContext(tenant))
    }
}

use axum::{extract::{Path, State}, response::IntoResponse, Json};
use std::sync::Arc;
use crate::api::extractors::tenant::TenantContext;
use crate::error::AppError;
use crate::state::AppState;

pub async fn list_services(
    State(state): State<Arc<AppState>>,
    TenantContext(tenant): TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let services = state.catalog.list_services(&tenant).await?;
    Ok(Json(services))
}

pub async fn list_branches(
    State(state): State<Arc<AppState>>,
    TenantContext(tenant): TenantContext,
    Path((_, service_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let branches = state.catalog.list_branches_for_service(&tenant, &service_id).await?;
    Ok(Json(branches))
}

pub async fn list_professionals(
    State(state): State<Arc<AppState>>,
    TenantContext(tenant): TenantContext,
    Path((_, service_id, branch_id)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let professionals = state.catalog.list_professionals(&tenant, &service_id, &branch_id).await?;
    Ok(Json(professionals))
}

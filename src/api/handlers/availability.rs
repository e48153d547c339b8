use axum::{extract::{Query, State}, response::IntoResponse, Json};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::debug;
use crate::api::dtos::requests::{AvailableDaysQuery, DaySlotsQuery};
use crate::api::dtos::responses::{AvailableDaysResponse, SlotsResponse};
use crate::api::extractors::tenant::TenantContext;
use crate::domain::services::availability::{parse_month, ProfessionalSelector, SlotQuery};
use crate::error::AppError;
use crate::state::AppState;

pub async fn available_days(
    State(state): State<Arc<AppState>>,
    TenantContext(tenant): TenantContext,
    Query(params): Query<AvailableDaysQuery>,
) -> Result<impl IntoResponse, AppError> {
    let month = parse_month(&params.month)?;
    let query = SlotQuery {
        service_id: params.service,
        branch_id: params.branch,
        professional: ProfessionalSelector::from_request(params.professional.as_deref(), params.indistint),
    };

    let days = state.availability.available_days(&tenant, &query, month, Utc::now()).await?;
    debug!("available_days: {} day(s) for {}", days.len(), params.month);

    Ok(Json(AvailableDaysResponse {
        days: days.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect(),
    }))
}

pub async fn day_slots(
    State(state): State<Arc<AppState>>,
    TenantContext(tenant): TenantContext,
    Query(params): Query<DaySlotsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let date = NaiveDate::parse_from_str(&params.date, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Invalid date format (YYYY-MM-DD)".into()))?;
    let query = SlotQuery {
        service_id: params.service,
        branch_id: params.branch,
        professional: ProfessionalSelector::from_request(params.professional.as_deref(), params.indistint),
    };

    let slots = state.availability.day_slots(&tenant, &query, date, Utc::now()).await?;

    Ok(Json(SlotsResponse {
        date: params.date,
        slots: slots.iter().map(|t| t.format("%H:%M").to_string()).collect(),
    }))
}

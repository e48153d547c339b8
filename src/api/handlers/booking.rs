use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{info, warn};
use crate::api::dtos::requests::{BookingLookupQuery, CreateBookingRequest};
use crate::api::dtos::responses::CreateBookingResponse;
use crate::api::extractors::tenant::TenantContext;
use crate::domain::models::booking::ClientInfo;
use crate::domain::services::availability::ProfessionalSelector;
use crate::domain::services::reservation::{ReservationItem, ReservationRequest};
use crate::error::AppError;
use crate::state::AppState;

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    TenantContext(tenant): TenantContext,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    info!("create_booking: service {} on {} {}", payload.service, payload.day, payload.hour);

    if let Some(tz) = payload.timezone.as_deref()
        && tz != tenant.timezone
    {
        warn!("create_booking: client timezone {} differs from tenant timezone {}", tz, tenant.timezone);
    }

    let request = into_reservation(payload, tenant.tz())?;
    let now = Utc::now();
    let reservation = state.reservations.create_booking(&tenant, request, now).await?;

    let payment = match reservation.primary() {
        Some(first) if first.deposit_status.is_awaiting_payment() => {
            match state.deposits.create_payment_intent(&first.payment_target(), now).await {
                Ok(intent) => Some(intent.into()),
                Err(e) => {
                    // The booking stands; the client can ask for the link again.
                    warn!("create_booking: payment intent failed for booking {}: {}", first.id, e);
                    None
                }
            }
        }
        _ => None,
    };

    let booking = if reservation.group.is_none() { reservation.primary().cloned() } else { None };

    Ok((StatusCode::CREATED, Json(CreateBookingResponse {
        booking,
        group: reservation.group,
        bookings: reservation.bookings,
        payment,
    })))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<BookingLookupQuery>,
) -> Result<Response, AppError> {
    if params.group_mode {
        let detail = state.queries.get_group(&id).await?;
        return Ok(Json(detail).into_response());
    }

    let detail = state.queries.get_booking(&id).await?;
    Ok(Json(detail).into_response())
}

fn into_reservation(payload: CreateBookingRequest, tz: Tz) -> Result<ReservationRequest, AppError> {
    let mut items = vec![ReservationItem {
        service_id: payload.service.clone(),
        branch_id: payload.branch.clone(),
        professional: ProfessionalSelector::from_request(payload.professional.as_deref(), payload.indistint),
        day: parse_day(&payload.day)?,
        hour: parse_hour(&payload.hour, tz)?,
        start_iso: payload.start_iso.as_deref().map(parse_instant).transpose()?,
    }];

    for extra in payload.additional {
        let indistinct = extra.indistint.unwrap_or(payload.indistint);
        let professional = extra.professional.as_deref().or(payload.professional.as_deref());
        items.push(ReservationItem {
            service_id: extra.service.unwrap_or_else(|| payload.service.clone()),
            branch_id: extra.branch.or_else(|| payload.branch.clone()),
            professional: ProfessionalSelector::from_request(professional, indistinct),
            day: parse_day(&extra.day)?,
            hour: parse_hour(&extra.hour, tz)?,
            start_iso: extra.start_iso.as_deref().map(parse_instant).transpose()?,
        });
    }

    Ok(ReservationRequest {
        items,
        client: ClientInfo {
            name: payload.client.name.trim().to_string(),
            email: payload.client.email.trim().to_string(),
            phone: payload.client.phone.filter(|p| !p.trim().is_empty()),
            dni: payload.client.dni.filter(|d| !d.trim().is_empty()),
        },
        notes: payload.notes.filter(|n| !n.trim().is_empty()),
        idempotency_key: payload.idempotency_key,
    })
}

fn parse_day(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Invalid day format (YYYY-MM-DD)".into()))
}

/// Accepts "HH:MM" or a full ISO instant, read in the tenant's timezone.
fn parse_hour(value: &str, tz: Tz) -> Result<NaiveTime, AppError> {
    if value.contains('T') {
        return Ok(parse_instant(value)?.with_timezone(&tz).time());
    }
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| AppError::Validation("Invalid hour format (HH:MM)".into()))
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::Validation("Invalid ISO time format".into()))
}

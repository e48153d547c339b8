use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use crate::api::dtos::requests::{BookingLookupQuery, PaymentWebhookPayload};
use crate::api::dtos::responses::{PaymentLinksResponse, WebhookAck};
use crate::domain::models::payment::PaymentTarget;
use crate::domain::services::deposit::{PaymentNotification, WebhookOutcome};
use crate::error::AppError;
use crate::state::AppState;

/// Returns the checkout links for a booking's deposit, or for its group's.
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<BookingLookupQuery>,
) -> Result<impl IntoResponse, AppError> {
    let target = if params.group_mode && state.booking_repo.find_group(&id).await?.is_some() {
        PaymentTarget::Group(id)
    } else {
        state.booking_repo.find_by_id(&id).await?
            .ok_or(AppError::NotFound("Booking not found".into()))?
            .payment_target()
    };

    let intent = state.deposits.create_payment_intent(&target, Utc::now()).await?;
    Ok(Json(PaymentLinksResponse::from(intent)))
}

pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PaymentWebhookPayload>,
) -> Result<impl IntoResponse, AppError> {
    let payment_id = match payload.data.map(|d| d.id) {
        Some(Value::String(id)) => id,
        Some(Value::Number(id)) => id.to_string(),
        _ => String::new(),
    };
    let notification = PaymentNotification {
        kind: payload.kind.unwrap_or_default(),
        payment_id,
    };

    let outcome = state.deposits.on_payment_webhook(&notification, Utc::now()).await?;
    let status = match outcome {
        WebhookOutcome::Ignored => "ignored",
        WebhookOutcome::Duplicate => "duplicate",
        WebhookOutcome::Recorded { target, totals } => {
            info!("Webhook for {}: {}/{} collected", target, totals.collected, totals.target);
            "processed"
        }
    };

    Ok(Json(WebhookAck { status }))
}

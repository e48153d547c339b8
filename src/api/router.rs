use axum::{
    body::Body,
    extract::Request,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{availability, booking, catalog, health, payment};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Catalog
        .route("/api/v1/{tenant}/services", get(catalog::list_services))
        .route("/api/v1/{tenant}/services/{service_id}/branches", get(catalog::list_branches))
        .route("/api/v1/{tenant}/services/{service_id}/branches/{branch_id}/professionals", get(catalog::list_professionals))

        // Availability
        .route("/api/v1/{tenant}/available-days", get(availability::available_days))
        .route("/api/v1/{tenant}/day-slots", get(availability::day_slots))

        // Reservation
        .route("/api/v1/{tenant}/create-booking", post(booking::create_booking))

        // Tracking & deposits
        .route("/api/v1/booking/{id}", get(booking::get_booking))
        .route("/api/v1/booking/{id}/payment", post(payment::create_payment))
        .route("/api/v1/payments/webhook", post(payment::payment_webhook))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        tenant_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}

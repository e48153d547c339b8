use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Body the booking front-end treats as a tenant-wide freeze.
pub const BOOKINGS_BLOCKED_MESSAGE: &str = "Reservas bloqueadas";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Bookings are blocked for this tenant")]
    BookingsBlocked,
    #[error("Slot taken: {0}")]
    SlotTaken(String),
    #[error("Payment provider error: {0}")]
    PaymentProvider(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal server error")]
    Internal,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl AppError {
    /// Errors the caller may fix by retrying, possibly with another slot.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::SlotTaken(_) | AppError::PaymentProvider(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                if let Some(db_err) = e.as_database_error() {
                    let code = db_err.code().unwrap_or_default();

                    // 2067 = SQLite Unique Constraint
                    // 23505 = PostgreSQL Unique Violation
                    if code == "2067" || code == "23505" {
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({ "error": "Resource already exists (duplicate entry)" }))
                        ).into_response();
                    }
                }

                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Configuration(msg) => {
                warn!("Configuration error surfaced to client: {}", msg);
                (StatusCode::UNPROCESSABLE_ENTITY, format!("no disponible: {}", msg))
            }
            AppError::BookingsBlocked => {
                return (
                    StatusCode::LOCKED,
                    Json(json!({ "message": BOOKINGS_BLOCKED_MESSAGE }))
                ).into_response();
            }
            AppError::SlotTaken(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::PaymentProvider(msg) => {
                error!("Payment provider error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Payment provider unavailable, please retry".to_string())
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message,
            "retryable": self.is_retryable(),
        }));

        (status, body).into_response()
    }
}

use crate::error::AppError;

pub mod sqlite_booking_repo;
pub mod sqlite_catalog_repo;
pub mod sqlite_payment_repo;
pub mod sqlite_tenant_repo;

pub mod postgres_booking_repo;
pub mod postgres_catalog_repo;
pub mod postgres_payment_repo;
pub mod postgres_tenant_repo;

/// Translates the database-level overlap guard into `SlotTaken`.
/// SQLite raises `booking_overlap` from a trigger; Postgres reports the
/// exclusion constraint (23P01), a deadlock (40P01) or a serialization
/// failure (40001).
pub(crate) fn map_reservation_error(e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        let code = db_err.code().unwrap_or_default();
        if matches!(code.as_ref(), "23P01" | "40P01" | "40001") || db_err.message().contains("booking_overlap") {
            return AppError::SlotTaken("The requested time was just taken".into());
        }
    }
    AppError::Database(e)
}

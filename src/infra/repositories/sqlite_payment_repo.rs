use crate::domain::{
    models::payment::{Payment, PaymentRecordOutcome, PaymentTarget},
    ports::PaymentRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqlitePaymentRepo {
    pool: SqlitePool,
}

impl SqlitePaymentRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for SqlitePaymentRepo {
    async fn record(&self, payment: &Payment) -> Result<PaymentRecordOutcome, AppError> {
        let existing = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE provider_payment_id = ?")
            .bind(&payment.provider_payment_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        match existing {
            None => {
                let result = sqlx::query(
                    "INSERT INTO payments (id, provider_payment_id, target_kind, target_id, amount, currency, status, received_at, updated_at)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                     ON CONFLICT(provider_payment_id) DO NOTHING"
                )
                    .bind(&payment.id).bind(&payment.provider_payment_id).bind(&payment.target_kind).bind(&payment.target_id)
                    .bind(payment.amount).bind(&payment.currency).bind(payment.status.as_str())
                    .bind(payment.received_at).bind(payment.updated_at)
                    .execute(&self.pool)
                    .await
                    .map_err(AppError::Database)?;

                Ok(if result.rows_affected() == 0 { PaymentRecordOutcome::Duplicate } else { PaymentRecordOutcome::Inserted })
            }
            Some(stored) if stored.status == payment.status && stored.amount == payment.amount => Ok(PaymentRecordOutcome::Duplicate),
            Some(stored) => {
                let result = sqlx::query(
                    "UPDATE payments SET status = ?, amount = ?, currency = ?, updated_at = ?
                     WHERE provider_payment_id = ? AND status = ? AND amount = ?"
                )
                    .bind(payment.status.as_str()).bind(payment.amount).bind(&payment.currency).bind(payment.updated_at)
                    .bind(&payment.provider_payment_id).bind(stored.status.as_str()).bind(stored.amount)
                    .execute(&self.pool)
                    .await
                    .map_err(AppError::Database)?;

                Ok(if result.rows_affected() == 0 { PaymentRecordOutcome::Duplicate } else { PaymentRecordOutcome::Updated })
            }
        }
    }

    async fn net_collected(&self, target: &PaymentTarget) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE target_kind = ? AND target_id = ? AND status = 'approved'"
        )
            .bind(target.kind())
            .bind(target.id())
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_target(&self, target: &PaymentTarget) -> Result<Vec<Payment>, AppError> {
        sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE target_kind = ? AND target_id = ? ORDER BY received_at ASC"
        )
            .bind(target.kind())
            .bind(target.id())
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}

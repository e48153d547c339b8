use crate::domain::{
    models::payment::{Payment, PaymentRecordOutcome, PaymentTarget},
    ports::PaymentRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresPaymentRepo {
    pool: PgPool,
}

impl PostgresPaymentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepo {
    async fn record(&self, payment: &Payment) -> Result<PaymentRecordOutcome, AppError> {
        let existing = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE provider_payment_id = $1")
            .bind(&payment.provider_payment_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        match existing {
            None => {
                let result = sqlx::query(
                    "INSERT INTO payments (id, provider_payment_id, target_kind, target_id, amount, currency, status, received_at, updated_at)
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
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
                    "UPDATE payments SET status = $1, amount = $2, currency = $3, updated_at = $4
                     WHERE provider_payment_id = $5 AND status = $6 AND amount = $7"
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
            "SELECT COALESCE(SUM(amount), 0)::BIGINT FROM payments WHERE target_kind = $1 AND target_id = $2 AND status = 'approved'"
        )
            .bind(target.kind())
            .bind(target.id())
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_target(&self, target: &PaymentTarget) -> Result<Vec<Payment>, AppError> {
        sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE target_kind = $1 AND target_id = $2 ORDER BY received_at ASC"
        )
            .bind(target.kind())
            .bind(target.id())
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}

use crate::domain::{
    models::{
        booking::Booking,
        group::BookingGroup,
        payment::PaymentIntent,
        reservation::{Reservation, ReservationPlan},
    },
    ports::BookingRepository,
};
use crate::error::AppError;
use crate::infra::repositories::map_reservation_error;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};
use tracing::debug;

pub struct SqliteBookingRepo {
    pool: SqlitePool,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn insert_booking(tx: &mut Transaction<'_, Sqlite>, booking: &Booking) -> Result<Booking, AppError> {
        sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, tenant_id, group_id, service_id, professional_id, branch_id, client_name, client_email, client_phone, client_dni,
                start_time, end_time, timezone, status, price, currency, notes, deposit_required, deposit_type, deposit_value_applied, deposit_amount,
                deposit_currency, deposit_status, deposit_deadline_at, deposit_preference_id, deposit_init_point, deposit_sandbox_init_point,
                idempotency_key, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&booking.id).bind(&booking.tenant_id).bind(&booking.group_id).bind(&booking.service_id)
            .bind(&booking.professional_id).bind(&booking.branch_id).bind(&booking.client_name).bind(&booking.client_email)
            .bind(&booking.client_phone).bind(&booking.client_dni).bind(booking.start_time).bind(booking.end_time)
            .bind(&booking.timezone).bind(booking.status.as_str()).bind(booking.price).bind(&booking.currency)
            .bind(&booking.notes).bind(booking.deposit_required).bind(booking.deposit_type.as_str())
            .bind(booking.deposit_value_applied).bind(booking.deposit_amount).bind(&booking.deposit_currency)
            .bind(booking.deposit_status.as_str()).bind(booking.deposit_deadline_at).bind(&booking.deposit_preference_id)
            .bind(&booking.deposit_init_point).bind(&booking.deposit_sandbox_init_point).bind(&booking.idempotency_key)
            .bind(booking.created_at).bind(booking.updated_at)
            .fetch_one(&mut **tx).await.map_err(map_reservation_error)
    }

    async fn is_free(tx: &mut Transaction<'_, Sqlite>, professional_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE professional_id = ? AND status IN ('pending', 'confirmed') AND start_time < ? AND end_time > ?"
        )
            .bind(professional_id).bind(end).bind(start)
            .fetch_one(&mut **tx).await.map_err(AppError::Database)?;
        Ok(count == 0)
    }

    /// Runs one CAS update per booking inside a transaction and sums the moved rows.
    async fn transition(&self, booking_ids: &[String], sql: &str, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let mut moved = 0;
        for id in booking_ids {
            moved += sqlx::query(sql).bind(now).bind(id).execute(&mut *tx).await.map_err(AppError::Database)?.rows_affected();
        }
        tx.commit().await.map_err(AppError::Database)?;
        Ok(moved)
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn create_reservation(&self, plan: &ReservationPlan) -> Result<Reservation, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Writing first takes the database write lock, so concurrent
        // reservations queue on busy_timeout instead of racing the re-check.
        let mut professional_ids: Vec<&str> = plan.items.iter()
            .flat_map(|item| item.candidates.iter().map(String::as_str))
            .collect();
        professional_ids.sort_unstable();
        professional_ids.dedup();
        for professional_id in professional_ids {
            sqlx::query("INSERT INTO calendar_locks (professional_id, version) VALUES (?, 1) ON CONFLICT(professional_id) DO UPDATE SET version = calendar_locks.version + 1")
                .bind(professional_id).execute(&mut *tx).await.map_err(map_reservation_error)?;
        }

        let group = match &plan.group {
            Some(group) => Some(sqlx::query_as::<_, BookingGroup>(
                "INSERT INTO booking_groups (id, tenant_id, price_total, deposit_target, currency, idempotency_key, created_at) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING *"
            )
                .bind(&group.id).bind(&group.tenant_id).bind(group.price_total).bind(group.deposit_target)
                .bind(&group.currency).bind(&group.idempotency_key).bind(group.created_at)
                .fetch_one(&mut *tx).await.map_err(AppError::Database)?),
            None => None,
        };

        let mut bookings = Vec::with_capacity(plan.items.len());
        for item in &plan.items {
            let start = item.params.start;
            let end = start + Duration::minutes(item.params.duration_min as i64);

            let mut chosen = None;
            for candidate in &item.candidates {
                if Self::is_free(&mut tx, candidate, start, end).await? {
                    chosen = Some(candidate.clone());
                    break;
                }
            }
            let Some(professional_id) = chosen else {
                return Err(AppError::SlotTaken(format!("{} is no longer available", start.to_rfc3339())));
            };

            debug!("Assigning professional {} for {}", professional_id, start);
            let booking = Booking::new(item.params.clone(), professional_id, plan.requested_at);
            bookings.push(Self::insert_booking(&mut tx, &booking).await?);
        }

        tx.commit().await.map_err(map_reservation_error)?;
        Ok(Reservation { group, bookings })
    }

    async fn find_reservation_by_key(&self, tenant_id: &str, idempotency_key: &str) -> Result<Option<Reservation>, AppError> {
        let group = sqlx::query_as::<_, BookingGroup>("SELECT * FROM booking_groups WHERE tenant_id = ? AND idempotency_key = ?")
            .bind(tenant_id).bind(idempotency_key).fetch_optional(&self.pool).await.map_err(AppError::Database)?;
        if let Some(group) = group {
            let bookings = self.list_by_group(&group.id).await?;
            return Ok(Some(Reservation { group: Some(group), bookings }));
        }

        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE tenant_id = ? AND idempotency_key = ? AND group_id IS NULL")
            .bind(tenant_id).bind(idempotency_key).fetch_optional(&self.pool).await.map_err(AppError::Database)?;
        Ok(booking.map(|b| Reservation { group: None, bookings: vec![b] }))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_group(&self, id: &str) -> Result<Option<BookingGroup>, AppError> {
        sqlx::query_as::<_, BookingGroup>("SELECT * FROM booking_groups WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_group(&self, group_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE group_id = ? ORDER BY start_time ASC").bind(group_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_active_for_professionals(&self, professional_ids: &[String], start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Booking>, AppError> {
        if professional_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM bookings WHERE status IN ('pending', 'confirmed') AND start_time < ");
        qb.push_bind(end).push(" AND end_time > ").push_bind(start).push(" AND professional_id IN (");
        let mut ids = qb.separated(", ");
        for id in professional_ids {
            ids.push_bind(id);
        }
        ids.push_unseparated(") ORDER BY start_time ASC");

        qb.build_query_as::<Booking>().fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn attach_payment_intent(&self, booking_ids: &[String], intent: &PaymentIntent, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let mut moved = 0;
        for id in booking_ids {
            moved += sqlx::query(
                "UPDATE bookings SET deposit_preference_id = ?, deposit_init_point = ?, deposit_sandbox_init_point = ?, updated_at = ?
                 WHERE id = ? AND status = 'pending' AND deposit_status IN ('unpaid', 'pending')"
            )
                .bind(&intent.preference_id).bind(&intent.init_point).bind(&intent.sandbox_init_point).bind(now).bind(id)
                .execute(&mut *tx).await.map_err(AppError::Database)?.rows_affected();
        }
        tx.commit().await.map_err(AppError::Database)?;
        Ok(moved)
    }

    async fn mark_deposit_pending(&self, booking_ids: &[String], now: DateTime<Utc>) -> Result<u64, AppError> {
        self.transition(booking_ids,
            "UPDATE bookings SET deposit_status = 'pending', updated_at = ? WHERE id = ? AND status = 'pending' AND deposit_status = 'unpaid'",
            now).await
    }

    async fn confirm_deposit(&self, booking_ids: &[String], now: DateTime<Utc>) -> Result<u64, AppError> {
        self.transition(booking_ids,
            "UPDATE bookings SET status = 'confirmed', deposit_status = 'paid', updated_at = ? WHERE id = ? AND status = 'pending' AND deposit_status IN ('unpaid', 'pending')",
            now).await
    }

    async fn mark_deposit_refunded(&self, booking_ids: &[String], now: DateTime<Utc>) -> Result<u64, AppError> {
        self.transition(booking_ids,
            "UPDATE bookings SET deposit_status = 'refunded', updated_at = ? WHERE id = ? AND deposit_status IN ('paid', 'pending')",
            now).await
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'canceled', deposit_status = 'expired', updated_at = ?
             WHERE status = 'pending' AND deposit_status IN ('unpaid', 'pending')
               AND deposit_deadline_at IS NOT NULL AND deposit_deadline_at < ?
             RETURNING *"
        )
            .bind(now).bind(now)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}

use crate::domain::models::{
    tenant::Tenant, service::Service, branch::Branch, professional::Professional,
    blackout::Blackout, booking::Booking, group::BookingGroup,
    reservation::{Reservation, ReservationPlan},
    payment::{Payment, PaymentIntent, PaymentRecordOutcome, PaymentTarget, PreferenceRequest, ProviderPayment},
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>, AppError>;
}

/// Read-only view of the catalog. Rows are provisioned outside the scheduler.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_services(&self, tenant_id: &str) -> Result<Vec<Service>, AppError>;
    async fn find_service(&self, tenant_id: &str, service_id: &str) -> Result<Option<Service>, AppError>;
    async fn list_branches_for_service(&self, tenant_id: &str, service_id: &str) -> Result<Vec<Branch>, AppError>;
    async fn find_branch(&self, tenant_id: &str, branch_id: &str) -> Result<Option<Branch>, AppError>;
    /// Active professionals eligible for the pair, ordered by id.
    async fn list_professionals(&self, tenant_id: &str, service_id: &str, branch_id: &str) -> Result<Vec<Professional>, AppError>;
    async fn list_blackouts(&self, tenant_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Blackout>, AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Places every planned booking or none. Fails with `SlotTaken` when an
    /// item has no free candidate at commit time.
    async fn create_reservation(&self, plan: &ReservationPlan) -> Result<Reservation, AppError>;
    async fn find_reservation_by_key(&self, tenant_id: &str, idempotency_key: &str) -> Result<Option<Reservation>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn find_group(&self, id: &str) -> Result<Option<BookingGroup>, AppError>;
    async fn list_by_group(&self, group_id: &str) -> Result<Vec<Booking>, AppError>;
    /// Pending and confirmed bookings of the given professionals overlapping [start, end).
    async fn list_active_for_professionals(&self, professional_ids: &[String], start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Booking>, AppError>;

    // Deposit transitions. Each is a compare-and-swap on the current
    // deposit status and returns the number of bookings that moved.
    async fn attach_payment_intent(&self, booking_ids: &[String], intent: &PaymentIntent, now: DateTime<Utc>) -> Result<u64, AppError>;
    async fn mark_deposit_pending(&self, booking_ids: &[String], now: DateTime<Utc>) -> Result<u64, AppError>;
    async fn confirm_deposit(&self, booking_ids: &[String], now: DateTime<Utc>) -> Result<u64, AppError>;
    async fn mark_deposit_refunded(&self, booking_ids: &[String], now: DateTime<Utc>) -> Result<u64, AppError>;
    /// Cancels unpaid bookings whose deadline passed and returns them.
    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Booking>, AppError>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn record(&self, payment: &Payment) -> Result<PaymentRecordOutcome, AppError>;
    /// Sum of approved payments for the target.
    async fn net_collected(&self, target: &PaymentTarget) -> Result<i64, AppError>;
    async fn list_by_target(&self, target: &PaymentTarget) -> Result<Vec<Payment>, AppError>;
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_preference(&self, request: &PreferenceRequest) -> Result<PaymentIntent, AppError>;
    async fn fetch_payment(&self, payment_id: &str) -> Result<ProviderPayment, AppError>;
}

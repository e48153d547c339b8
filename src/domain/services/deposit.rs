use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use crate::domain::models::{
    booking::{Booking, DepositStatus},
    payment::{DepositTotals, Payment, PaymentIntent, PaymentRecordOutcome, PaymentStatus, PaymentTarget, PreferenceRequest, ProviderPayment},
};
use crate::domain::ports::{BookingRepository, PaymentProvider, PaymentRepository};
use crate::error::AppError;

/// Provider notification as posted to the webhook.
#[derive(Debug, Clone)]
pub struct PaymentNotification {
    pub kind: String,
    pub payment_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Ignored,
    Duplicate,
    Recorded { target: PaymentTarget, totals: DepositTotals },
}

pub struct DepositService {
    booking_repo: Arc<dyn BookingRepository>,
    payment_repo: Arc<dyn PaymentRepository>,
    provider: Arc<dyn PaymentProvider>,
    notification_url: Option<String>,
    public_base_url: String,
}

impl DepositService {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        payment_repo: Arc<dyn PaymentRepository>,
        provider: Arc<dyn PaymentProvider>,
        notification_url: Option<String>,
        public_base_url: String,
    ) -> Self {
        Self { booking_repo, payment_repo, provider, notification_url, public_base_url }
    }

    /// Returns the checkout links for a booking's or group's deposit,
    /// creating a provider preference for the remaining amount when none
    /// is stored yet. A provider failure leaves the deposit unpaid.
    pub async fn create_payment_intent(&self, target: &PaymentTarget, now: DateTime<Utc>) -> Result<PaymentIntent, AppError> {
        let bookings = self.target_bookings(target).await?;
        let Some(first) = bookings.first() else {
            return Err(AppError::NotFound("Booking not found".into()));
        };

        if !bookings.iter().any(|b| b.deposit_required) {
            return Err(AppError::Validation("This booking does not require a deposit".into()));
        }
        if bookings.iter().any(|b| b.deposit_status == DepositStatus::Expired) {
            return Err(AppError::Conflict("The deposit deadline has passed".into()));
        }
        if bookings.iter().all(|b| !b.deposit_status.is_awaiting_payment()) {
            return Err(AppError::Conflict("The deposit is already settled".into()));
        }

        if let (Some(preference_id), Some(init_point)) = (&first.deposit_preference_id, &first.deposit_init_point) {
            debug!("Reusing payment intent {} for {}", preference_id, target);
            return Ok(PaymentIntent {
                preference_id: preference_id.clone(),
                init_point: init_point.clone(),
                sandbox_init_point: first.deposit_sandbox_init_point.clone(),
            });
        }

        let totals = self.totals(target).await?;
        if totals.fully_paid {
            return Err(AppError::Conflict("The deposit is already settled".into()));
        }

        let request = PreferenceRequest {
            title: match target {
                PaymentTarget::Group(_) => format!("Seña de {} turnos", bookings.len()),
                PaymentTarget::Booking(_) => "Seña de turno".to_string(),
            },
            amount: totals.remaining,
            currency: first.deposit_currency.clone(),
            external_reference: target.to_string(),
            payer_email: first.client_email.clone(),
            expires_at: bookings.iter().filter_map(|b| b.deposit_deadline_at).min(),
            notification_url: self.notification_url.clone(),
            back_url: Some(self.tracking_url(target, first)),
        };

        let intent = self.provider.create_preference(&request).await?;

        let ids: Vec<String> = bookings.iter().map(|b| b.id.clone()).collect();
        let attached = self.booking_repo.attach_payment_intent(&ids, &intent, now).await?;
        if attached == 0 {
            warn!("Payment intent {} created but {} moved on meanwhile", intent.preference_id, target);
            return Err(AppError::Conflict("The deposit is no longer payable".into()));
        }

        info!("Payment intent {} created for {} ({} {})", intent.preference_id, target, request.amount, request.currency);
        Ok(intent)
    }

    /// Handles one provider notification. Safe under redelivery: payments
    /// are deduplicated by provider id and status changes are CAS updates.
    pub async fn on_payment_webhook(&self, notification: &PaymentNotification, now: DateTime<Utc>) -> Result<WebhookOutcome, AppError> {
        if notification.kind != "payment" || notification.payment_id.is_empty() {
            debug!("Ignoring provider notification of type {}", notification.kind);
            return Ok(WebhookOutcome::Ignored);
        }

        let payment = self.provider.fetch_payment(&notification.payment_id).await?;
        self.apply_payment(&payment, now).await
    }

    /// Records the payment and moves the target's bookings to match what
    /// has been collected. A redelivered payment is still reconciled, so a
    /// status update lost after the payment was stored is retried.
    pub async fn apply_payment(&self, payment: &ProviderPayment, now: DateTime<Utc>) -> Result<WebhookOutcome, AppError> {
        let Some(target) = payment.external_reference.as_deref().and_then(PaymentTarget::parse_reference) else {
            warn!("Payment {} has no usable external reference, ignoring", payment.id);
            return Ok(WebhookOutcome::Ignored);
        };

        let bookings = self.target_bookings(&target).await?;
        let Some(first) = bookings.first() else {
            warn!("Payment {} references unknown {}", payment.id, target);
            return Ok(WebhookOutcome::Ignored);
        };

        if !payment.currency.is_empty() && !payment.currency.eq_ignore_ascii_case(&first.deposit_currency) {
            warn!(
                "Payment {} is in {} but the deposit for {} is in {}, ignoring",
                payment.id, payment.currency, target, first.deposit_currency
            );
            return Ok(WebhookOutcome::Ignored);
        }

        let record = Payment::from_provider(payment, &target, now);
        let recorded = self.payment_repo.record(&record).await?;
        match recorded {
            PaymentRecordOutcome::Duplicate => debug!("Payment {} already recorded as {}, reconciling", payment.id, payment.status.as_str()),
            outcome => debug!("Payment {} {:?} as {}", payment.id, outcome, payment.status.as_str()),
        }

        let totals = self.totals(&target).await?;
        let ids: Vec<String> = bookings.iter().map(|b| b.id.clone()).collect();

        if totals.fully_paid && totals.collected > 0 {
            let moved = self.booking_repo.confirm_deposit(&ids, now).await?;
            if moved == 0 && bookings.iter().any(|b| b.deposit_status == DepositStatus::Expired) {
                warn!("Payment {} arrived after {} expired; needs manual refund", payment.id, target);
            } else if moved > 0 {
                info!("Deposit for {} fully paid ({}/{}), {} booking(s) confirmed", target, totals.collected, totals.target, moved);
            }
        } else if totals.collected > 0 {
            self.booking_repo.mark_deposit_pending(&ids, now).await?;
            info!("Deposit for {} partially paid ({}/{})", target, totals.collected, totals.target);
        } else if payment.status == PaymentStatus::Refunded {
            let moved = self.booking_repo.mark_deposit_refunded(&ids, now).await?;
            info!("Deposit for {} refunded, {} booking(s) updated", target, moved);
        }

        if recorded == PaymentRecordOutcome::Duplicate {
            return Ok(WebhookOutcome::Duplicate);
        }
        Ok(WebhookOutcome::Recorded { target, totals })
    }

    /// Cancels bookings whose deposit deadline passed unpaid. Running it
    /// again with nothing overdue changes nothing.
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Booking>, AppError> {
        let expired = self.booking_repo.expire_overdue(now).await?;
        if !expired.is_empty() {
            info!("Expired {} booking(s) with unpaid deposits", expired.len());
        }
        Ok(expired)
    }

    pub async fn totals(&self, target: &PaymentTarget) -> Result<DepositTotals, AppError> {
        let deposit_target = match target {
            PaymentTarget::Group(id) => self.booking_repo.find_group(id).await?
                .ok_or(AppError::NotFound("Group not found".into()))?
                .deposit_target,
            PaymentTarget::Booking(id) => self.booking_repo.find_by_id(id).await?
                .ok_or(AppError::NotFound("Booking not found".into()))?
                .deposit_amount,
        };
        let collected = self.payment_repo.net_collected(target).await?;
        Ok(DepositTotals::new(deposit_target, collected))
    }

    async fn target_bookings(&self, target: &PaymentTarget) -> Result<Vec<Booking>, AppError> {
        match target {
            PaymentTarget::Group(id) => self.booking_repo.list_by_group(id).await,
            PaymentTarget::Booking(id) => Ok(self.booking_repo.find_by_id(id).await?.into_iter().collect()),
        }
    }

    fn tracking_url(&self, target: &PaymentTarget, first: &Booking) -> String {
        let base = self.public_base_url.trim_end_matches('/');
        match target {
            PaymentTarget::Group(id) => format!("{}/booking/{}?groupMode=true", base, id),
            PaymentTarget::Booking(_) => format!("{}/booking/{}", base, first.id),
        }
    }
}

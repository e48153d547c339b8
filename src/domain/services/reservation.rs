use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use crate::domain::models::{
    booking::{ClientInfo, DepositTerms, DepositType, NewBookingParams},
    group::BookingGroup,
    reservation::{PlannedBooking, Reservation, ReservationPlan},
    service::Service,
    tenant::Tenant,
};
use crate::domain::ports::BookingRepository;
use crate::domain::services::availability::{is_within_horizon, local_to_utc, AvailabilityService, ProfessionalSelector, SlotRules};
use crate::domain::services::catalog::CatalogService;
use crate::error::AppError;

/// One session the client asked for.
#[derive(Debug, Clone)]
pub struct ReservationItem {
    pub service_id: String,
    pub branch_id: Option<String>,
    pub professional: ProfessionalSelector,
    pub day: NaiveDate,
    pub hour: NaiveTime,
    /// Instant the client computed for `day`/`hour`; must agree when present.
    pub start_iso: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ReservationRequest {
    pub items: Vec<ReservationItem>,
    pub client: ClientInfo,
    pub notes: Option<String>,
    pub idempotency_key: Option<String>,
}

/// Rounds `value * percent / 100` half-up on integer amounts.
pub fn percent_of(value: i64, percent: i64) -> i64 {
    let product = value as i128 * percent as i128;
    let rounded = if product >= 0 { (product + 50) / 100 } else { (product - 50) / 100 };
    rounded.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// Deposit owed for one booking of `service`. With the global config flag
/// the tenant's type and value replace the service's own.
pub fn compute_deposit(tenant: &Tenant, service: &Service, now: DateTime<Utc>) -> DepositTerms {
    let (deposit_type, value) = if service.uses_global_deposit_config {
        (tenant.deposit_type, tenant.deposit_value)
    } else {
        (service.deposit_type, service.deposit_value)
    };

    let value_applied = match deposit_type {
        DepositType::Fixed => value,
        DepositType::Percent => percent_of(service.price, value),
    };
    let amount = value_applied.clamp(0, service.price.max(0));
    let required = service.deposit_required && amount > 0;

    DepositTerms {
        required,
        deposit_type,
        value_applied,
        amount: if required { amount } else { 0 },
        currency: service.currency.clone(),
        deadline_at: required.then(|| now + Duration::minutes(tenant.deposit_grace_min.max(0) as i64)),
    }
}

pub struct ReservationService {
    catalog: Arc<CatalogService>,
    availability: Arc<AvailabilityService>,
    booking_repo: Arc<dyn BookingRepository>,
}

impl ReservationService {
    pub fn new(
        catalog: Arc<CatalogService>,
        availability: Arc<AvailabilityService>,
        booking_repo: Arc<dyn BookingRepository>,
    ) -> Self {
        Self { catalog, availability, booking_repo }
    }

    /// Creates one booking, or a group when the request holds several
    /// items. The plan is checked against current availability first; the
    /// repository then re-checks every interval inside one transaction.
    pub async fn create_booking(
        &self,
        tenant: &Tenant,
        request: ReservationRequest,
        now: DateTime<Utc>,
    ) -> Result<Reservation, AppError> {
        CatalogService::ensure_open(tenant)?;
        validate_client(&request.client)?;
        if request.items.is_empty() {
            return Err(AppError::Validation("At least one session is required".into()));
        }

        let idempotency_key = request.idempotency_key.as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        if let Some(key) = &idempotency_key
            && let Some(existing) = self.booking_repo.find_reservation_by_key(&tenant.id, key).await?
        {
            info!("Replaying reservation for idempotency key {}", key);
            return Ok(existing);
        }

        let plan = self.plan(tenant, &request, idempotency_key.clone(), now).await?;

        match self.booking_repo.create_reservation(&plan).await {
            Ok(reservation) => {
                info!(
                    "Reservation created: {} booking(s){} for tenant {}",
                    reservation.bookings.len(),
                    reservation.group.as_ref().map(|g| format!(" in group {}", g.id)).unwrap_or_default(),
                    tenant.slug
                );
                Ok(reservation)
            }
            Err(e) => {
                // A concurrent request with the same key may have won.
                if let Some(key) = &idempotency_key
                    && let Some(existing) = self.booking_repo.find_reservation_by_key(&tenant.id, key).await?
                {
                    return Ok(existing);
                }
                if matches!(e, AppError::SlotTaken(_)) {
                    warn!("Reservation lost the race for tenant {}: {}", tenant.slug, e);
                }
                Err(e)
            }
        }
    }

    async fn plan(
        &self,
        tenant: &Tenant,
        request: &ReservationRequest,
        idempotency_key: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ReservationPlan, AppError> {
        let mut group = (request.items.len() > 1).then(|| {
            BookingGroup::new(tenant.id.clone(), tenant.currency.clone(), idempotency_key.clone(), now)
        });

        let mut items = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let planned = self.plan_item(tenant, request, item, group.as_ref().map(|g| g.id.clone()), now).await?;
            if let Some(group) = group.as_mut() {
                group.price_total += planned.params.price;
                group.deposit_target += planned.params.deposit.amount;
            }
            items.push(planned);
        }

        if let Some(group) = group.as_mut()
            && let Some(first) = items.first()
        {
            group.currency = first.params.currency.clone();
        }

        // Grouped bookings carry no key of their own; the group holds it.
        let booking_key = if group.is_some() { None } else { idempotency_key };
        for item in items.iter_mut() {
            item.params.idempotency_key = booking_key.clone();
        }

        Ok(ReservationPlan { group, items, requested_at: now })
    }

    async fn plan_item(
        &self,
        tenant: &Tenant,
        request: &ReservationRequest,
        item: &ReservationItem,
        group_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<PlannedBooking, AppError> {
        let offering = self.catalog
            .resolve_offering(tenant, &item.service_id, item.branch_id.as_deref(), &item.professional)
            .await?;

        let tz = tenant.tz();
        let start = local_to_utc(tz, item.day, item.hour).ok_or_else(|| {
            AppError::Validation(format!("{} {} does not exist in {}", item.day, item.hour.format("%H:%M"), tenant.timezone))
        })?;

        if let Some(client_start) = item.start_iso
            && client_start != start
        {
            return Err(AppError::Validation("startISO does not match day and hour".into()));
        }

        let today = now.with_timezone(&tz).date_naive();
        if !is_within_horizon(item.day, today, tenant.max_horizon_days) {
            return Err(AppError::Validation(format!("{} is outside the booking window", item.day)));
        }

        let rules = SlotRules::for_service(tenant, &offering.service, now);
        if start <= rules.not_before {
            return Err(AppError::Validation("The requested time is too soon to book".into()));
        }

        let slots = self.availability.slots_by_professional(tenant, &offering, item.day, now).await?;
        if !slots.iter().any(|p| p.open.contains(&item.hour)) {
            return Err(AppError::Validation(format!("{} is not a bookable time", item.hour.format("%H:%M"))));
        }

        let candidates: Vec<String> = slots.into_iter()
            .filter(|p| p.free.contains(&item.hour))
            .map(|p| p.professional_id)
            .collect();
        if candidates.is_empty() {
            return Err(AppError::SlotTaken(format!(
                "{} {} is no longer available", item.day, item.hour.format("%H:%M")
            )));
        }

        let service = &offering.service;
        Ok(PlannedBooking {
            params: NewBookingParams {
                tenant_id: tenant.id.clone(),
                group_id,
                service_id: service.id.clone(),
                branch_id: offering.branch.id.clone(),
                start,
                duration_min: service.session_duration_min,
                timezone: tenant.timezone.clone(),
                client: request.client.clone(),
                notes: request.notes.clone(),
                price: service.price,
                currency: service.currency.clone(),
                deposit: compute_deposit(tenant, service, now),
                idempotency_key: None,
            },
            candidates,
        })
    }
}

fn validate_client(client: &ClientInfo) -> Result<(), AppError> {
    if client.name.trim().is_empty() {
        return Err(AppError::Validation("Client name is required".into()));
    }
    let email = client.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("A valid client email is required".into()));
    }
    Ok(())
}

use serde::Serialize;
use std::sync::Arc;
use crate::domain::models::{
    booking::{Booking, BookingStatus},
    group::BookingGroup,
    payment::{DepositTotals, Payment, PaymentTarget},
};
use crate::domain::ports::{BookingRepository, PaymentRepository};
use crate::domain::services::deposit::DepositService;
use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct BookingDetail {
    pub booking: Booking,
    pub deposit: DepositTotals,
    pub payments: Vec<Payment>,
}

#[derive(Debug, Serialize)]
pub struct GroupDetail {
    pub group: BookingGroup,
    pub bookings: Vec<Booking>,
    /// Confirmed only when every member is; canceled when any member is.
    pub status: BookingStatus,
    pub deposit: DepositTotals,
    pub payments: Vec<Payment>,
}

/// Read side polled by the tracking page after checkout.
pub struct BookingQueryService {
    booking_repo: Arc<dyn BookingRepository>,
    payment_repo: Arc<dyn PaymentRepository>,
    deposits: Arc<DepositService>,
}

impl BookingQueryService {
    pub fn new(booking_repo: Arc<dyn BookingRepository>, payment_repo: Arc<dyn PaymentRepository>, deposits: Arc<DepositService>) -> Self {
        Self { booking_repo, payment_repo, deposits }
    }

    pub async fn get_booking(&self, id: &str) -> Result<BookingDetail, AppError> {
        let booking = self.booking_repo.find_by_id(id).await?
            .ok_or(AppError::NotFound("Booking not found".into()))?;
        let target = booking.payment_target();
        let deposit = self.deposits.totals(&target).await?;
        let payments = self.payment_repo.list_by_target(&target).await?;
        Ok(BookingDetail { booking, deposit, payments })
    }

    /// Accepts either a group id or the id of one of its bookings.
    pub async fn get_group(&self, id: &str) -> Result<GroupDetail, AppError> {
        let group = match self.booking_repo.find_group(id).await? {
            Some(group) => group,
            None => {
                let group_id = self.booking_repo.find_by_id(id).await?
                    .and_then(|b| b.group_id)
                    .ok_or(AppError::NotFound("Group not found".into()))?;
                self.booking_repo.find_group(&group_id).await?
                    .ok_or(AppError::NotFound("Group not found".into()))?
            }
        };

        let bookings = self.booking_repo.list_by_group(&group.id).await?;
        let target = PaymentTarget::Group(group.id.clone());
        let deposit = self.deposits.totals(&target).await?;
        let payments = self.payment_repo.list_by_target(&target).await?;
        let status = aggregate_status(&bookings);

        Ok(GroupDetail { group, bookings, status, deposit, payments })
    }
}

fn aggregate_status(bookings: &[Booking]) -> BookingStatus {
    if bookings.iter().any(|b| b.status == BookingStatus::Canceled) {
        BookingStatus::Canceled
    } else if !bookings.is_empty() && bookings.iter().all(|b| b.status == BookingStatus::Confirmed) {
        BookingStatus::Confirmed
    } else {
        BookingStatus::Pending
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use crate::domain::models::{booking::{Booking, NewBookingParams}, group::BookingGroup};

/// One booking to place. `candidates` are professional ids in tie-break
/// order; the transaction takes the first one still free.
#[derive(Debug, Clone)]
pub struct PlannedBooking {
    pub params: NewBookingParams,
    pub candidates: Vec<String>,
}

/// Everything the reservation transaction commits or rolls back as a unit.
#[derive(Debug, Clone)]
pub struct ReservationPlan {
    pub group: Option<BookingGroup>,
    pub items: Vec<PlannedBooking>,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reservation {
    pub group: Option<BookingGroup>,
    pub bookings: Vec<Booking>,
}

impl Reservation {
    pub fn primary(&self) -> Option<&Booking> {
        self.bookings.first()
    }
}

use serde::Serialize;
use crate::domain::models::{booking::Booking, group::BookingGroup, payment::PaymentIntent};

#[derive(Serialize)]
pub struct AvailableDaysResponse {
    pub days: Vec<String>,
}

#[derive(Serialize)]
pub struct SlotsResponse {
    pub date: String,
    pub slots: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLinksResponse {
    pub preference_id: String,
    pub init_point: String,
    pub sandbox_init_point: Option<String>,
}

impl From<PaymentIntent> for PaymentLinksResponse {
    fn from(intent: PaymentIntent) -> Self {
        Self {
            preference_id: intent.preference_id,
            init_point: intent.init_point,
            sandbox_init_point: intent.sandbox_init_point,
        }
    }
}

#[derive(Serialize)]
pub struct CreateBookingResponse {
    pub booking: Option<Booking>,
    pub group: Option<BookingGroup>,
    pub bookings: Vec<Booking>,
    pub payment: Option<PaymentLinksResponse>,
}

#[derive(Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
pub struct AvailableDaysQuery {
    pub service: String,
    pub professional: Option<String>,
    pub branch: Option<String>,
    pub month: String,
    #[serde(default)]
    pub indistint: bool,
}

#[derive(Deserialize)]
pub struct DaySlotsQuery {
    pub service: String,
    pub professional: Option<String>,
    pub branch: Option<String>,
    pub date: String,
    #[serde(default)]
    pub indistint: bool,
}

#[derive(Deserialize)]
pub struct ClientPayload {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub dni: Option<String>,
}

/// A further session booked together with the main one. Fields left out
/// fall back to the main session's values.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalSession {
    pub service: Option<String>,
    pub professional: Option<String>,
    pub branch: Option<String>,
    pub day: String,
    pub hour: String,
    #[serde(rename = "startISO")]
    pub start_iso: Option<String>,
    pub indistint: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub service: String,
    pub professional: Option<String>,
    pub branch: Option<String>,
    pub day: String,
    pub hour: String,
    #[serde(rename = "startISO")]
    pub start_iso: Option<String>,
    pub timezone: Option<String>,
    pub client: ClientPayload,
    pub notes: Option<String>,
    #[serde(default)]
    pub indistint: bool,
    #[serde(default)]
    pub additional: Vec<AdditionalSession>,
    pub idempotency_key: Option<String>,
}

#[derive(Deserialize)]
pub struct BookingLookupQuery {
    #[serde(rename = "groupMode", default)]
    pub group_mode: bool,
}

#[derive(Deserialize)]
pub struct WebhookData {
    pub id: Value,
}

/// Provider notification body: `{"type": "payment", "data": {"id": ...}}`.
#[derive(Deserialize)]
pub struct PaymentWebhookPayload {
    #[serde(rename = "type", alias = "topic")]
    pub kind: Option<String>,
    pub data: Option<WebhookData>,
}

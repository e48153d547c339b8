use crate::domain::models::payment::{PaymentIntent, PaymentStatus, PreferenceRequest, ProviderPayment};
use crate::domain::ports::PaymentProvider;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::time::Duration;
use tracing::{debug, error};

/// Stored amounts are in cents; the provider prices in major units.
const MINOR_UNIT_SCALE: u32 = 2;

pub fn to_major_units(minor: i64) -> Decimal {
    Decimal::new(minor, MINOR_UNIT_SCALE)
}

/// Exact conversion back to cents. Fractions of a cent are rejected.
pub fn to_minor_units(major: Decimal) -> Option<i64> {
    let minor = major.checked_mul(Decimal::ONE_HUNDRED)?;
    if !minor.fract().is_zero() {
        return None;
    }
    minor.to_i64()
}

/// Checkout-preference client for a MercadoPago-style API.
pub struct HttpPaymentProvider {
    client: Client,
    api_url: String,
    access_token: String,
}

impl HttpPaymentProvider {
    pub fn new(api_url: String, access_token: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    async fn check(res: reqwest::Response, action: &str) -> Result<reqwest::Response, AppError> {
        if res.status().is_success() {
            return Ok(res);
        }
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        let msg = format!("{} failed. Status: {}, Body: {}", action, status, text);
        error!("{}", msg);
        Err(AppError::PaymentProvider(msg))
    }
}

#[derive(Serialize)]
struct PreferenceItem<'a> {
    title: &'a str,
    quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    unit_price: Decimal,
    currency_id: &'a str,
}

#[derive(Serialize)]
struct Payer<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct BackUrls<'a> {
    success: &'a str,
    pending: &'a str,
    failure: &'a str,
}

#[derive(Serialize)]
struct PreferencePayload<'a> {
    items: Vec<PreferenceItem<'a>>,
    payer: Payer<'a>,
    external_reference: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    back_urls: Option<BackUrls<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    auto_return: Option<&'a str>,
    expires: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    expiration_date_to: Option<String>,
}

#[derive(Deserialize)]
struct PreferenceResponse {
    id: String,
    init_point: String,
    sandbox_init_point: Option<String>,
}

#[derive(Deserialize)]
struct PaymentResponse {
    id: Value,
    status: String,
    transaction_amount: Number,
    currency_id: Option<String>,
    external_reference: Option<String>,
}

#[async_trait]
impl PaymentProvider for HttpPaymentProvider {
    async fn create_preference(&self, request: &PreferenceRequest) -> Result<PaymentIntent, AppError> {
        let payload = PreferencePayload {
            items: vec![PreferenceItem {
                title: &request.title,
                quantity: 1,
                unit_price: to_major_units(request.amount),
                currency_id: &request.currency,
            }],
            payer: Payer { email: &request.payer_email },
            external_reference: &request.external_reference,
            notification_url: request.notification_url.as_deref(),
            back_urls: request.back_url.as_deref().map(|url| BackUrls { success: url, pending: url, failure: url }),
            auto_return: request.back_url.as_ref().map(|_| "approved"),
            expires: request.expires_at.is_some(),
            expiration_date_to: request.expires_at.map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        };

        let res = self.client.post(format!("{}/checkout/preferences", self.api_url))
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Payment provider connection error: {}", e);
                error!("{}", msg);
                AppError::PaymentProvider(msg)
            })?;

        let preference: PreferenceResponse = Self::check(res, "Create preference").await?
            .json()
            .await
            .map_err(|e| AppError::PaymentProvider(format!("Unreadable preference response: {}", e)))?;

        debug!("Preference {} created for {}", preference.id, request.external_reference);
        Ok(PaymentIntent {
            preference_id: preference.id,
            init_point: preference.init_point,
            sandbox_init_point: preference.sandbox_init_point,
        })
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<ProviderPayment, AppError> {
        let res = self.client.get(format!("{}/v1/payments/{}", self.api_url, payment_id))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Payment provider connection error: {}", e);
                error!("{}", msg);
                AppError::PaymentProvider(msg)
            })?;

        let payment: PaymentResponse = Self::check(res, "Fetch payment").await?
            .json()
            .await
            .map_err(|e| AppError::PaymentProvider(format!("Unreadable payment response: {}", e)))?;

        let id = match payment.id {
            Value::String(s) => s,
            other => other.to_string(),
        };

        let amount = Decimal::from_str_exact(&payment.transaction_amount.to_string())
            .ok()
            .and_then(to_minor_units)
            .ok_or_else(|| {
                let msg = format!("Payment {} has an unusable amount {}", id, payment.transaction_amount);
                error!("{}", msg);
                AppError::PaymentProvider(msg)
            })?;

        Ok(ProviderPayment {
            id,
            status: PaymentStatus::from_provider(&payment.status),
            amount,
            currency: payment.currency_id.unwrap_or_default(),
            external_reference: payment.external_reference,
        })
    }
}

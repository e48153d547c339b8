use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub payment_api_url: String,
    pub payment_access_token: String,
    /// Webhook URL handed to the provider with every preference.
    pub payment_notification_url: Option<String>,
    /// Base of the public tracking page the provider redirects back to.
    pub public_base_url: String,
    pub expiry_sweep_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            payment_api_url: env::var("PAYMENT_API_URL").unwrap_or_else(|_| "https://api.mercadopago.com".to_string()),
            payment_access_token: env::var("PAYMENT_ACCESS_TOKEN").unwrap_or_default(),
            payment_notification_url: env::var("PAYMENT_NOTIFICATION_URL").ok().filter(|v| !v.is_empty()),
            public_base_url: env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string()),
            expiry_sweep_interval_secs: env::var("EXPIRY_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(60),
        }
    }
}

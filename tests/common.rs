#![allow(dead_code)]

use clinic_scheduler::{
    api::router::create_router,
    config::Config,
    domain::models::payment::{PaymentIntent, PaymentStatus, PreferenceRequest, ProviderPayment},
    domain::ports::PaymentProvider,
    error::AppError,
    infra::repositories::{
        sqlite_booking_repo::SqliteBookingRepo, sqlite_catalog_repo::SqliteCatalogRepo,
        sqlite_payment_repo::SqlitePaymentRepo, sqlite_tenant_repo::SqliteTenantRepo,
    },
    state::AppState,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::Value;
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

/// Working hours 09:00-12:00 on every weekday.
pub const MORNINGS: &str = r#"{
    "monday": [{"start": "09:00", "end": "12:00"}],
    "tuesday": [{"start": "09:00", "end": "12:00"}],
    "wednesday": [{"start": "09:00", "end": "12:00"}],
    "thursday": [{"start": "09:00", "end": "12:00"}],
    "friday": [{"start": "09:00", "end": "12:00"}],
    "saturday": [{"start": "09:00", "end": "12:00"}],
    "sunday": [{"start": "09:00", "end": "12:00"}]
}"#;

#[derive(Default)]
pub struct MockPaymentProvider {
    pub payments: Mutex<HashMap<String, ProviderPayment>>,
    pub preferences: Mutex<Vec<PreferenceRequest>>,
    pub fail_preferences: AtomicBool,
    counter: AtomicUsize,
}

impl MockPaymentProvider {
    pub fn set_payment(&self, id: &str, status: PaymentStatus, amount: i64, reference: &str) {
        self.payments.lock().unwrap().insert(id.to_string(), ProviderPayment {
            id: id.to_string(),
            status,
            amount,
            currency: "ARS".to_string(),
            external_reference: Some(reference.to_string()),
        });
    }

    pub fn preference_count(&self) -> usize {
        self.preferences.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_preference(&self, request: &PreferenceRequest) -> Result<PaymentIntent, AppError> {
        if self.fail_preferences.load(Ordering::SeqCst) {
            return Err(AppError::PaymentProvider("mock provider is down".into()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.preferences.lock().unwrap().push(request.clone());
        Ok(PaymentIntent {
            preference_id: format!("pref-{}", n),
            init_point: format!("https://pay.example/checkout/pref-{}", n),
            sandbox_init_point: Some(format!("https://sandbox.pay.example/checkout/pref-{}", n)),
        })
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<ProviderPayment, AppError> {
        self.payments.lock().unwrap().get(payment_id).cloned()
            .ok_or(AppError::PaymentProvider(format!("unknown payment {}", payment_id)))
    }
}

/// Service row fields a test may want to vary.
#[derive(Clone)]
pub struct ServiceSeed {
    pub duration_min: i32,
    pub price: i64,
    pub deposit_required: bool,
    pub deposit_type: &'static str,
    pub deposit_value: i64,
    pub uses_global_deposit_config: bool,
}

impl Default for ServiceSeed {
    fn default() -> Self {
        Self {
            duration_min: 30,
            price: 10000,
            deposit_required: false,
            deposit_type: "PERCENT",
            deposit_value: 0,
            uses_global_deposit_config: false,
        }
    }
}

/// One tenant with one service at one default branch and two professionals
/// ("pro-a" and "pro-b") working mornings.
pub struct Clinic {
    pub slug: String,
    pub tenant_id: String,
    pub service_id: String,
    pub branch_id: String,
    pub professionals: Vec<String>,
}

pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub provider: Arc<MockPaymentProvider>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            payment_api_url: "http://localhost".to_string(),
            payment_access_token: "test-token".to_string(),
            payment_notification_url: Some("http://localhost/api/v1/payments/webhook".to_string()),
            public_base_url: "http://localhost:3001".to_string(),
            expiry_sweep_interval_secs: 60,
        };

        let provider = Arc::new(MockPaymentProvider::default());

        let state = Arc::new(AppState::new(
            config,
            Arc::new(SqliteTenantRepo::new(pool.clone())),
            Arc::new(SqliteCatalogRepo::new(pool.clone())),
            Arc::new(SqliteBookingRepo::new(pool.clone())),
            Arc::new(SqlitePaymentRepo::new(pool.clone())),
            provider.clone(),
        ));

        let router = create_router(state.clone());

        Self { router, pool, db_filename, state, provider }
    }

    pub async fn seed_tenant(&self, slug: &str, timezone: &str) -> String {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO tenants (id, slug, name, timezone, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(&id).bind(slug).bind(format!("Clinic {}", slug)).bind(timezone).bind(Utc::now())
            .execute(&self.pool).await.unwrap();
        id
    }

    pub async fn seed_service(&self, tenant_id: &str, name: &str, seed: &ServiceSeed) -> String {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO services (id, tenant_id, name, category, session_duration_min, price, currency, deposit_required, deposit_type, deposit_value, uses_global_deposit_config, created_at)
             VALUES (?, ?, ?, 'General', ?, ?, 'ARS', ?, ?, ?, ?, ?)"
        )
            .bind(&id).bind(tenant_id).bind(name).bind(seed.duration_min).bind(seed.price)
            .bind(seed.deposit_required).bind(seed.deposit_type).bind(seed.deposit_value)
            .bind(seed.uses_global_deposit_config).bind(Utc::now())
            .execute(&self.pool).await.unwrap();
        id
    }

    pub async fn seed_branch(&self, tenant_id: &str, name: &str, is_default: bool, opening_hours: Option<&str>) -> String {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO branches (id, tenant_id, name, location, is_default, opening_hours_json, created_at) VALUES (?, ?, ?, 'Main St 1', ?, ?, ?)")
            .bind(&id).bind(tenant_id).bind(name).bind(is_default).bind(opening_hours).bind(Utc::now())
            .execute(&self.pool).await.unwrap();
        id
    }

    pub async fn offer_service_at(&self, service_id: &str, branch_id: &str) {
        sqlx::query("INSERT INTO service_branches (service_id, branch_id) VALUES (?, ?)")
            .bind(service_id).bind(branch_id)
            .execute(&self.pool).await.unwrap();
    }

    pub async fn seed_professional(&self, tenant_id: &str, id: &str, working_hours: &str) {
        sqlx::query("INSERT INTO professionals (id, tenant_id, name, working_hours_json, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(id).bind(tenant_id).bind(format!("Dr. {}", id)).bind(working_hours).bind(Utc::now())
            .execute(&self.pool).await.unwrap();
    }

    pub async fn assign(&self, professional_id: &str, service_id: &str, branch_id: &str) {
        sqlx::query("INSERT INTO professional_offerings (professional_id, service_id, branch_id) VALUES (?, ?, ?)")
            .bind(professional_id).bind(service_id).bind(branch_id)
            .execute(&self.pool).await.unwrap();
    }

    pub async fn seed_blackout(
        &self,
        tenant_id: &str,
        branch_id: Option<&str>,
        professional_id: Option<&str>,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) {
        sqlx::query("INSERT INTO blackouts (id, tenant_id, branch_id, professional_id, starts_at, ends_at, reason) VALUES (?, ?, ?, ?, ?, ?, 'Holiday')")
            .bind(Uuid::new_v4().to_string()).bind(tenant_id).bind(branch_id).bind(professional_id)
            .bind(starts_at).bind(ends_at)
            .execute(&self.pool).await.unwrap();
    }

    /// Tenant in UTC with the standard two-professional morning setup.
    pub async fn seed_clinic(&self, slug: &str, service: ServiceSeed) -> Clinic {
        let tenant_id = self.seed_tenant(slug, "UTC").await;
        let service_id = self.seed_service(&tenant_id, "Consulta", &service).await;
        let branch_id = self.seed_branch(&tenant_id, "Centro", true, None).await;
        self.offer_service_at(&service_id, &branch_id).await;

        let professionals = vec![format!("{}-pro-a", slug), format!("{}-pro-b", slug)];
        for professional in &professionals {
            self.seed_professional(&tenant_id, professional, MORNINGS).await;
            self.assign(professional, &service_id, &branch_id).await;
        }

        Clinic { slug: slug.to_string(), tenant_id, service_id, branch_id, professionals }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(
            Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
        ).await.unwrap();
        let status = response.status();
        (status, parse_body(response).await)
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap()
        ).await.unwrap();
        let status = response.status();
        (status, parse_body(response).await)
    }

    pub async fn count_bookings(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM bookings").fetch_one(&self.pool).await.unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}

pub async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// A date a few days ahead in UTC, inside the default booking horizon.
pub fn days_ahead(days: i64) -> NaiveDate {
    (Utc::now() + Duration::days(days)).date_naive()
}

pub fn booking_request(service_id: &str, professional: Option<&str>, day: NaiveDate, hour: &str) -> Value {
    serde_json::json!({
        "service": service_id,
        "professional": professional,
        "day": day.format("%Y-%m-%d").to_string(),
        "hour": hour,
        "timezone": "UTC",
        "client": {
            "name": "Ana Pérez",
            "email": "ana@example.com",
            "phone": "+54 11 5555-0000",
            "dni": "30111222"
        },
        "notes": "Primera consulta",
        "indistint": professional.is_none()
    })
}

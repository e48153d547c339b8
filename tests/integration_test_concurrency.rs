mod common;

use chrono::{NaiveDate, NaiveTime, Utc};
use clinic_scheduler::domain::models::booking::ClientInfo;
use clinic_scheduler::domain::models::tenant::Tenant;
use clinic_scheduler::domain::ports::TenantRepository;
use clinic_scheduler::domain::services::availability::ProfessionalSelector;
use clinic_scheduler::domain::services::reservation::{ReservationItem, ReservationRequest};
use clinic_scheduler::error::AppError;
use common::{days_ahead, ServiceSeed, TestApp};
use tokio::task::JoinSet;

fn request(service_id: &str, professional: ProfessionalSelector, day: NaiveDate, hour: &str, client: &str) -> ReservationRequest {
    ReservationRequest {
        items: vec![ReservationItem {
            service_id: service_id.to_string(),
            branch_id: None,
            professional,
            day,
            hour: NaiveTime::parse_from_str(hour, "%H:%M").unwrap(),
            start_iso: None,
        }],
        client: ClientInfo {
            name: client.to_string(),
            email: format!("{}@example.com", client.to_lowercase()),
            phone: None,
            dni: None,
        },
        notes: None,
        idempotency_key: None,
    }
}

async fn tenant(app: &TestApp, slug: &str) -> Tenant {
    app.state.tenant_repo.find_by_slug(slug).await.unwrap().unwrap()
}

async fn overlapping_pairs(app: &TestApp) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM bookings a JOIN bookings b
           ON a.professional_id = b.professional_id AND a.id < b.id
          AND a.start_time < b.end_time AND b.start_time < a.end_time
         WHERE a.status IN ('pending', 'confirmed') AND b.status IN ('pending', 'confirmed')"
    )
        .fetch_one(&app.pool).await.unwrap()
}

#[tokio::test]
async fn test_two_clients_race_for_one_slot() {
    let app = TestApp::new().await;
    let clinic = app.seed_clinic("salud", ServiceSeed::default()).await;
    let tenant = tenant(&app, "salud").await;
    let day = days_ahead(3);
    let specific = ProfessionalSelector::Specific("salud-pro-a".into());

    let (first, second) = tokio::join!(
        app.state.reservations.create_booking(&tenant, request(&clinic.service_id, specific.clone(), day, "10:00", "Ana"), Utc::now()),
        app.state.reservations.create_booking(&tenant, request(&clinic.service_id, specific.clone(), day, "10:00", "Luis"), Utc::now()),
    );

    let results = [first, second];
    let won = results.iter().filter(|r| r.is_ok()).count();
    let lost = results.iter().filter(|r| matches!(r, Err(AppError::SlotTaken(_)))).count();
    assert_eq!(won, 1);
    assert_eq!(lost, 1);
    assert_eq!(app.count_bookings().await, 1);
    assert_eq!(overlapping_pairs(&app).await, 0);
}

#[tokio::test]
async fn test_racing_any_requests_get_different_professionals() {
    let app = TestApp::new().await;
    let clinic = app.seed_clinic("salud", ServiceSeed::default()).await;
    let tenant = tenant(&app, "salud").await;
    let day = days_ahead(3);

    let (first, second) = tokio::join!(
        app.state.reservations.create_booking(&tenant, request(&clinic.service_id, ProfessionalSelector::Any, day, "10:00", "Ana"), Utc::now()),
        app.state.reservations.create_booking(&tenant, request(&clinic.service_id, ProfessionalSelector::Any, day, "10:00", "Luis"), Utc::now()),
    );

    let mut assigned = vec![
        first.unwrap().bookings[0].professional_id.clone(),
        second.unwrap().bookings[0].professional_id.clone(),
    ];
    assigned.sort();
    assert_eq!(assigned, vec!["salud-pro-a", "salud-pro-b"]);
}

#[tokio::test]
async fn test_many_clients_race_for_one_slot() {
    let app = TestApp::new().await;
    let clinic = app.seed_clinic("salud", ServiceSeed::default()).await;
    let tenant = tenant(&app, "salud").await;
    let day = days_ahead(3);

    let mut tasks = JoinSet::new();
    for i in 0..8 {
        let state = app.state.clone();
        let tenant = tenant.clone();
        let req = request(&clinic.service_id, ProfessionalSelector::Specific("salud-pro-b".into()), day, "11:30", &format!("Client{}", i));
        tasks.spawn(async move { state.reservations.create_booking(&tenant, req, Utc::now()).await });
    }

    let mut won = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Ok(_) => won += 1,
            Err(AppError::SlotTaken(_)) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(won, 1);
    assert_eq!(app.count_bookings().await, 1);
    assert_eq!(overlapping_pairs(&app).await, 0);
}

#[tokio::test]
async fn test_store_rejects_overlapping_insert() {
    let app = TestApp::new().await;
    let clinic = app.seed_clinic("salud", ServiceSeed::default()).await;
    let start = days_ahead(3).and_hms_opt(9, 0, 0).unwrap().and_utc();
    let end = start + chrono::Duration::minutes(30);

    let insert = |id: &'static str, status: &'static str, offset_min: i64| {
        sqlx::query(
            "INSERT INTO bookings (id, tenant_id, service_id, professional_id, branch_id, client_name, client_email,
                start_time, end_time, timezone, status, price, currency, deposit_required, deposit_type,
                deposit_value_applied, deposit_amount, deposit_currency, deposit_status, created_at, updated_at)
             VALUES (?, ?, ?, 'salud-pro-a', ?, 'Ana', 'ana@example.com', ?, ?, 'UTC', ?, 10000, 'ARS', 0, 'PERCENT', 0, 0, 'ARS', 'not_required', ?, ?)"
        )
            .bind(id).bind(&clinic.tenant_id).bind(&clinic.service_id).bind(&clinic.branch_id)
            .bind(start + chrono::Duration::minutes(offset_min)).bind(end + chrono::Duration::minutes(offset_min))
            .bind(status).bind(Utc::now()).bind(Utc::now())
            .execute(&app.pool)
    };

    insert("b1", "confirmed", 0).await.unwrap();

    let err = insert("b2", "pending", 15).await.unwrap_err();
    assert!(err.to_string().contains("booking_overlap"));

    // Canceled rows and back-to-back intervals are allowed.
    insert("b3", "canceled", 0).await.unwrap();
    insert("b4", "confirmed", 30).await.unwrap();
    assert_eq!(app.count_bookings().await, 3);
}

mod common;

use axum::http::StatusCode;
use common::{booking_request, days_ahead, ServiceSeed, TestApp};
use serde_json::json;
use std::sync::atomic::Ordering;

fn deposit_service(deposit_type: &'static str, deposit_value: i64) -> ServiceSeed {
    ServiceSeed {
        deposit_required: true,
        deposit_type,
        deposit_value,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_booking_without_deposit_is_confirmed() {
    let app = TestApp::new().await;
    let clinic = app.seed_clinic("salud", ServiceSeed::default()).await;

    let (status, body) = app.post_json(
        "/api/v1/salud/create-booking",
        booking_request(&clinic.service_id, Some("salud-pro-a"), days_ahead(3), "09:30"),
    ).await;

    assert_eq!(status, StatusCode::CREATED);
    let booking = &body["booking"];
    assert_eq!(booking["status"], "confirmed");
    assert_eq!(booking["deposit_status"], "not_required");
    assert_eq!(booking["deposit_required"], false);
    assert_eq!(booking["deposit_amount"], 0);
    assert_eq!(booking["professional_id"], "salud-pro-a");
    assert_eq!(booking["client_name"], "Ana Pérez");
    assert_eq!(booking["price"], 10000);
    assert!(booking["deposit_deadline_at"].is_null());
    assert!(body["group"].is_null());
    assert!(body["payment"].is_null());
    assert_eq!(body["bookings"].as_array().unwrap().len(), 1);
    assert_eq!(app.provider.preference_count(), 0);

    let expected_start = format!("{}T09:30:00Z", days_ahead(3).format("%Y-%m-%d"));
    assert_eq!(booking["start_time"], expected_start.as_str());
}

#[tokio::test]
async fn test_booking_with_percent_deposit_creates_checkout() {
    let app = TestApp::new().await;
    let clinic = app.seed_clinic("salud", deposit_service("PERCENT", 30)).await;

    let (status, body) = app.post_json(
        "/api/v1/salud/create-booking",
        booking_request(&clinic.service_id, Some("salud-pro-a"), days_ahead(3), "09:00"),
    ).await;

    assert_eq!(status, StatusCode::CREATED);
    let booking = &body["booking"];
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["deposit_status"], "unpaid");
    assert_eq!(booking["deposit_type"], "PERCENT");
    assert_eq!(booking["deposit_value_applied"], 3000);
    assert_eq!(booking["deposit_amount"], 3000);
    assert!(booking["deposit_deadline_at"].is_string());

    assert_eq!(body["payment"]["preferenceId"], "pref-1");
    assert_eq!(body["payment"]["initPoint"], "https://pay.example/checkout/pref-1");

    let id = booking["id"].as_str().unwrap();
    let preferences = app.provider.preferences.lock().unwrap();
    assert_eq!(preferences.len(), 1);
    assert_eq!(preferences[0].amount, 3000);
    assert_eq!(preferences[0].external_reference, format!("booking:{}", id));
    assert_eq!(preferences[0].back_url.as_deref(), Some(format!("http://localhost:3001/booking/{}", id).as_str()));
}

#[tokio::test]
async fn test_any_professional_is_assigned_in_id_order() {
    let app = TestApp::new().await;
    let clinic = app.seed_clinic("salud", ServiceSeed::default()).await;
    let day = days_ahead(3);

    let (status, body) = app.post_json("/api/v1/salud/create-booking", booking_request(&clinic.service_id, None, day, "11:00")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["booking"]["professional_id"], "salud-pro-a");

    let (status, body) = app.post_json("/api/v1/salud/create-booking", booking_request(&clinic.service_id, None, day, "11:00")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["booking"]["professional_id"], "salud-pro-b");

    let (status, body) = app.post_json("/api/v1/salud/create-booking", booking_request(&clinic.service_id, None, day, "11:00")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["retryable"], true);
    assert_eq!(app.count_bookings().await, 2);
}

#[tokio::test]
async fn test_specific_professional_slot_taken() {
    let app = TestApp::new().await;
    let clinic = app.seed_clinic("salud", ServiceSeed::default()).await;
    let day = days_ahead(3);

    let request = booking_request(&clinic.service_id, Some("salud-pro-b"), day, "10:00");
    let (status, _) = app.post_json("/api/v1/salud/create-booking", request.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.post_json("/api/v1/salud/create-booking", request).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["retryable"], true);
}

#[tokio::test]
async fn test_idempotency_key_replays_reservation() {
    let app = TestApp::new().await;
    let clinic = app.seed_clinic("salud", deposit_service("PERCENT", 30)).await;

    let mut request = booking_request(&clinic.service_id, Some("salud-pro-a"), days_ahead(3), "09:00");
    request["idempotencyKey"] = json!("checkout-123");

    let (status, first) = app.post_json("/api/v1/salud/create-booking", request.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, second) = app.post_json("/api/v1/salud/create-booking", request).await;
    assert_eq!(status, StatusCode::CREATED);

    assert_eq!(first["booking"]["id"], second["booking"]["id"]);
    assert_eq!(first["payment"]["preferenceId"], second["payment"]["preferenceId"]);
    assert_eq!(app.count_bookings().await, 1);
    assert_eq!(app.provider.preference_count(), 1);
}

#[tokio::test]
async fn test_invalid_requests_are_rejected() {
    let app = TestApp::new().await;
    let clinic = app.seed_clinic("salud", ServiceSeed::default()).await;
    let day = days_ahead(3);

    let mut bad_email = booking_request(&clinic.service_id, None, day, "09:00");
    bad_email["client"]["email"] = json!("not-an-email");
    let (status, _) = app.post_json("/api/v1/salud/create-booking", bad_email).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut no_name = booking_request(&clinic.service_id, None, day, "09:00");
    no_name["client"]["name"] = json!("   ");
    let (status, _) = app.post_json("/api/v1/salud/create-booking", no_name).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.post_json("/api/v1/salud/create-booking", booking_request(&clinic.service_id, None, day, "09:10")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["retryable"], false);

    let (status, _) = app.post_json("/api/v1/salud/create-booking", booking_request(&clinic.service_id, None, day, "13:00")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post_json("/api/v1/salud/create-booking", booking_request(&clinic.service_id, None, day, "nine")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post_json("/api/v1/salud/create-booking", booking_request(&clinic.service_id, None, days_ahead(-2), "09:00")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post_json("/api/v1/salud/create-booking", booking_request(&clinic.service_id, None, days_ahead(90), "09:00")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post_json("/api/v1/salud/create-booking", booking_request("missing", None, day, "09:00")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(app.count_bookings().await, 0);
}

#[tokio::test]
async fn test_start_iso_must_match_day_and_hour() {
    let app = TestApp::new().await;
    let clinic = app.seed_clinic("salud", ServiceSeed::default()).await;
    let day = days_ahead(3);

    let mut mismatched = booking_request(&clinic.service_id, None, day, "09:00");
    mismatched["startISO"] = json!(format!("{}T10:00:00Z", day.format("%Y-%m-%d")));
    let (status, _) = app.post_json("/api/v1/salud/create-booking", mismatched).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut matching = booking_request(&clinic.service_id, None, day, "09:00");
    matching["startISO"] = json!(format!("{}T09:00:00.000Z", day.format("%Y-%m-%d")));
    let (status, _) = app.post_json("/api/v1/salud/create-booking", matching).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_hour_may_be_an_iso_instant() {
    let app = TestApp::new().await;
    let clinic = app.seed_clinic("salud", ServiceSeed::default()).await;
    let day = days_ahead(3);

    let hour = format!("{}T10:30:00Z", day.format("%Y-%m-%d"));
    let (status, body) = app.post_json("/api/v1/salud/create-booking", booking_request(&clinic.service_id, None, day, &hour)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["booking"]["start_time"], hour.as_str());
}

#[tokio::test]
async fn test_booking_is_placed_in_tenant_timezone() {
    let app = TestApp::new().await;
    let tenant_id = app.seed_tenant("sur", "America/Argentina/Buenos_Aires").await;
    let service_id = app.seed_service(&tenant_id, "Consulta", &ServiceSeed::default()).await;
    let branch_id = app.seed_branch(&tenant_id, "Centro", true, None).await;
    app.offer_service_at(&service_id, &branch_id).await;
    app.seed_professional(&tenant_id, "sur-pro-a", common::MORNINGS).await;
    app.assign("sur-pro-a", &service_id, &branch_id).await;

    let day = days_ahead(3);
    let (status, body) = app.post_json("/api/v1/sur/create-booking", booking_request(&service_id, None, day, "09:00")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["booking"]["timezone"], "America/Argentina/Buenos_Aires");
    assert_eq!(body["booking"]["start_time"], format!("{}T12:00:00Z", day.format("%Y-%m-%d")).as_str());
}

#[tokio::test]
async fn test_ineligible_professional_is_rejected() {
    let app = TestApp::new().await;
    let clinic = app.seed_clinic("salud", ServiceSeed::default()).await;
    app.seed_professional(&clinic.tenant_id, "salud-pro-x", common::MORNINGS).await;

    let (status, _) = app.post_json(
        "/api/v1/salud/create-booking",
        booking_request(&clinic.service_id, Some("salud-pro-x"), days_ahead(3), "09:00"),
    ).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.count_bookings().await, 0);
}

#[tokio::test]
async fn test_fixed_deposit_is_capped_at_price() {
    let app = TestApp::new().await;
    let clinic = app.seed_clinic("salud", deposit_service("FIXED", 20000)).await;

    let (status, body) = app.post_json(
        "/api/v1/salud/create-booking",
        booking_request(&clinic.service_id, None, days_ahead(3), "09:00"),
    ).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["booking"]["deposit_type"], "FIXED");
    assert_eq!(body["booking"]["deposit_value_applied"], 20000);
    assert_eq!(body["booking"]["deposit_amount"], 10000);
}

#[tokio::test]
async fn test_zero_deposit_means_not_required() {
    let app = TestApp::new().await;
    let clinic = app.seed_clinic("salud", deposit_service("PERCENT", 0)).await;

    let (status, body) = app.post_json(
        "/api/v1/salud/create-booking",
        booking_request(&clinic.service_id, None, days_ahead(3), "09:00"),
    ).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["booking"]["status"], "confirmed");
    assert_eq!(body["booking"]["deposit_status"], "not_required");
}

#[tokio::test]
async fn test_global_deposit_config_overrides_service() {
    let app = TestApp::new().await;
    let clinic = app.seed_clinic("salud", ServiceSeed {
        deposit_required: true,
        deposit_type: "PERCENT",
        deposit_value: 50,
        uses_global_deposit_config: true,
        ..Default::default()
    }).await;

    sqlx::query("UPDATE tenants SET deposit_type = 'FIXED', deposit_value = 2500 WHERE id = ?")
        .bind(&clinic.tenant_id)
        .execute(&app.pool).await.unwrap();

    let (status, body) = app.post_json(
        "/api/v1/salud/create-booking",
        booking_request(&clinic.service_id, None, days_ahead(3), "09:00"),
    ).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["booking"]["deposit_type"], "FIXED");
    assert_eq!(body["booking"]["deposit_amount"], 2500);
}

#[tokio::test]
async fn test_provider_failure_keeps_booking() {
    let app = TestApp::new().await;
    let clinic = app.seed_clinic("salud", deposit_service("PERCENT", 30)).await;
    app.provider.fail_preferences.store(true, Ordering::SeqCst);

    let (status, body) = app.post_json(
        "/api/v1/salud/create-booking",
        booking_request(&clinic.service_id, None, days_ahead(3), "09:00"),
    ).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["payment"].is_null());
    assert_eq!(body["booking"]["status"], "pending");
    assert_eq!(body["booking"]["deposit_status"], "unpaid");
    assert!(body["booking"]["deposit_init_point"].is_null());
    assert_eq!(app.count_bookings().await, 1);
}

#[tokio::test]
async fn test_minimum_notice_is_enforced() {
    let app = TestApp::new().await;
    let clinic = app.seed_clinic("salud", ServiceSeed::default()).await;

    // Ten days of notice pushes every slot in the next few days out of reach.
    sqlx::query("UPDATE tenants SET min_notice_min = 14400 WHERE id = ?")
        .bind(&clinic.tenant_id)
        .execute(&app.pool).await.unwrap();

    let (status, _) = app.post_json(
        "/api/v1/salud/create-booking",
        booking_request(&clinic.service_id, None, days_ahead(3), "09:00"),
    ).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get(&format!(
        "/api/v1/salud/day-slots?service={}&date={}&indistint=true",
        clinic.service_id, days_ahead(3).format("%Y-%m-%d")
    )).await;
    assert!(body["slots"].as_array().unwrap().is_empty());

    let (status, _) = app.post_json(
        "/api/v1/salud/create-booking",
        booking_request(&clinic.service_id, None, days_ahead(12), "09:00"),
    ).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_booking_tracking_view() {
    let app = TestApp::new().await;
    let clinic = app.seed_clinic("salud", deposit_service("PERCENT", 30)).await;

    let (_, created) = app.post_json(
        "/api/v1/salud/create-booking",
        booking_request(&clinic.service_id, None, days_ahead(3), "09:00"),
    ).await;
    let id = created["booking"]["id"].as_str().unwrap();

    let (status, body) = app.get(&format!("/api/v1/booking/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["booking"]["id"], id);
    assert_eq!(body["deposit"]["target"], 3000);
    assert_eq!(body["deposit"]["collected"], 0);
    assert_eq!(body["deposit"]["remaining"], 3000);
    assert_eq!(body["deposit"]["fully_paid"], false);
    assert!(body["payments"].as_array().unwrap().is_empty());
    assert!(body["booking"].get("idempotency_key").is_none());

    let (status, _) = app.get("/api/v1/booking/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get("/api/v1/booking/does-not-exist?groupMode=true").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

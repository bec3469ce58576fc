use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use core_types::{GridPoint, TimeBandRecord};
use database::{MemoryRepository, RiskRepository};
use engine::RiskService;
use rust_decimal_macros::dec;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use web_server::{AppState, router};

async fn app() -> (axum::Router, Arc<MemoryRepository>) {
    let repo = Arc::new(MemoryRepository::new());
    repo.replace_grid(
        "SOLUSDT",
        &[
            GridPoint::new("SOLUSDT", dec!(20.61), dec!(0)),
            GridPoint::new("SOLUSDT", dec!(933.79), dec!(1)),
        ],
    )
    .await
    .unwrap();

    let state = Arc::new(AppState {
        service: RiskService::new(repo.clone()),
    });
    (router(state), repo)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn health_is_ok() {
    let (app, _) = app().await;
    let response = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn risk_and_price_conversions() {
    let (app, _) = app().await;

    let (status, body) = get(app.clone(), "/api/price/SOLUSDT?risk=0.5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "SOLUSDT");
    let price: rust_decimal::Decimal = body["price"].as_str().unwrap().parse().unwrap();
    assert_eq!(price, dec!(477.2));

    let (status, body) = get(app, "/api/risk/SOLUSDT?price=477.2").await;
    assert_eq!(status, StatusCode::OK);
    let risk: rust_decimal::Decimal = body["risk"].as_str().unwrap().parse().unwrap();
    assert_eq!(risk, dec!(0.5));
}

#[tokio::test]
async fn errors_map_to_status_codes() {
    let (app, _) = app().await;

    let (status, body) = get(app.clone(), "/api/risk/DOGEUSDT?price=1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("DOGEUSDT"));

    let (status, _) = get(app.clone(), "/api/risk/SOLUSDT?price=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(app.clone(), "/api/price/SOLUSDT?risk=2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(app, "/api/score/SOLUSDT").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn score_and_symbols_for_a_tracked_asset() {
    let (app, repo) = app().await;
    repo.ensure_tracked("SOLUSDT", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        .await
        .unwrap();

    // Seed a record that sits in its rarest band at risk 0.05.
    let mut record: TimeBandRecord = repo.get_band_record("SOLUSDT").await.unwrap().unwrap();
    record.band_counts = [5, 0, 0, 0, 0, 100, 0, 0, 0, 0];
    record.total_days = 105;
    record.band_coefficients[0] = dec!(1.6);
    repo.save_band_counts(&record).await.unwrap();
    let tick = analytics::TimeBandTracker::new().observe(
        "SOLUSDT",
        dec!(0.05),
        dec!(66.27),
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        uuid::Uuid::nil(),
        chrono::Utc::now(),
    );
    repo.record_daily_tick(&tick).await.unwrap();

    let (status, body) = get(app.clone(), "/api/symbols").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!(["SOLUSDT"]));

    let (status, body) = get(app, "/api/score/SOLUSDT").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["band"], 0);
    assert_eq!(body["signal_type"], "LONG");
    assert_eq!(body["signal_strength"], "STRONGEST");
    assert_eq!(body["target"]["kind"], "already_optimal");
}

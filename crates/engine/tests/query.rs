mod common;

use common::{StubPrices, config, day, linear_grid, shared};
use core_types::{GridPoint, SignalStrength, SignalType, TargetSuggestion};
use database::{MemoryRepository, RiskRepository};
use engine::{DailyUpdater, EngineError, RiskService};
use rust_decimal_macros::dec;
use std::sync::Arc;

fn sol_grid() -> Vec<GridPoint> {
    vec![
        GridPoint::new("SOLUSDT", dec!(20.61), dec!(0.0)),
        GridPoint::new("SOLUSDT", dec!(933.79), dec!(1.0)),
    ]
}

#[tokio::test]
async fn risk_and_price_are_inverse_on_the_grid() {
    let service = RiskService::new(Arc::new(MemoryRepository::new()));
    service.import_grid("SOLUSDT", sol_grid()).await.unwrap();

    let risk = service.risk_of("SOLUSDT", dec!(477.2)).await.unwrap();
    assert!((risk - dec!(0.5)).abs() < dec!(0.0001), "risk {risk}");

    let price = service.price_of("SOLUSDT", dec!(0.5)).await.unwrap();
    assert_eq!(price, dec!(477.2));

    // Outside the grid the answer clamps to the endpoints.
    assert_eq!(service.risk_of("SOLUSDT", dec!(5)).await.unwrap(), dec!(0));
    assert_eq!(service.risk_of("SOLUSDT", dec!(5000)).await.unwrap(), dec!(1));
}

#[tokio::test]
async fn bad_inputs_are_rejected() {
    let service = RiskService::new(Arc::new(MemoryRepository::new()));
    service.import_grid("SOLUSDT", sol_grid()).await.unwrap();

    assert!(matches!(
        service.price_of("SOLUSDT", dec!(1.5)).await,
        Err(EngineError::InvalidInput(_))
    ));
    assert!(matches!(
        service.risk_of("SOLUSDT", dec!(-1)).await,
        Err(EngineError::InvalidInput(_))
    ));

    let err = service.risk_of("DOGEUSDT", dec!(0.1)).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn invalid_import_keeps_the_previous_grid() {
    let repo = Arc::new(MemoryRepository::new());
    let service = RiskService::new(repo.clone());
    service.import_grid("SOLUSDT", sol_grid()).await.unwrap();

    // Price falls while risk rises.
    let broken = vec![
        GridPoint::new("SOLUSDT", dec!(100), dec!(0)),
        GridPoint::new("SOLUSDT", dec!(50), dec!(1)),
    ];
    assert!(matches!(
        service.import_grid("SOLUSDT", broken).await,
        Err(EngineError::Risk(_))
    ));
    assert_eq!(repo.load_grid("SOLUSDT").await.unwrap(), sol_grid());
}

#[tokio::test]
async fn score_of_untracked_or_unticked_symbols() {
    let repo = MemoryRepository::new();
    linear_grid(&repo, "BTCUSDT", dec!(20000), dec!(120000)).await;
    let repo = Arc::new(repo);
    let service = RiskService::new(repo.clone());

    let err = service.score_of("BTCUSDT").await.unwrap_err();
    assert!(matches!(err, EngineError::NotTracked(_)));

    repo.ensure_tracked("BTCUSDT", day(2024, 1, 1)).await.unwrap();
    let err = service.score_of("BTCUSDT").await.unwrap_err();
    assert!(matches!(err, EngineError::Analytics(_)));
}

#[tokio::test]
async fn score_of_reflects_the_last_run() {
    let repo = MemoryRepository::new();
    linear_grid(&repo, "BTCUSDT", dec!(20000), dec!(120000)).await;
    let (repo, prices) = shared(repo, StubPrices::default());
    let updater = DailyUpdater::new(repo.clone(), prices.clone(), &config(&["BTCUSDT"]));
    let service = RiskService::new(repo.clone());

    updater
        .seed(
            "BTCUSDT",
            [9, 0, 0, 0, 0, 0, 0, 0, 0, 300],
            day(2024, 1, 1),
        )
        .await
        .unwrap();
    // risk 0.08: band 0, rarest, long zone.
    prices.set_price("BTCUSDT", dec!(28000));
    updater.run(day(2024, 1, 2)).await.unwrap();

    let report = service.score_of("BTCUSDT").await.unwrap();
    assert_eq!(report.band, 0);
    assert_eq!(report.coefficient, dec!(1.6));
    assert_eq!(report.total_score, dec!(160));
    assert_eq!(report.signal_type, SignalType::Long);
    assert_eq!(report.signal_strength, SignalStrength::Strongest);
    assert_eq!(report.target, TargetSuggestion::AlreadyOptimal);

    let status = service.status().await.unwrap();
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].record.total_days, 310);
    assert_eq!(
        status[0].score.as_ref().map(|s| s.total_score),
        Some(dec!(160))
    );
}

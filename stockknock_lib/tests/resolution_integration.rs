use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;
use stockknock_lib::{
    ManualClock, PriceDb, PriceUpdater, ProviderConfig, ProviderId, Quote, QuoteConfig,
    QuoteResolver, Resolution,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 16:00 KST, after the close.
fn after_close() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 7, 0, 0).unwrap()
}

/// 10:00 KST, mid-session.
fn mid_session() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 1, 0, 0).unwrap()
}

/// Yahoo then Twelve Data, both pointed at `server`.
fn config_for(server: &MockServer) -> QuoteConfig {
    let mut yahoo = ProviderConfig::new(ProviderId::Yahoo);
    yahoo.base_url = Some(server.uri());
    let mut twelve = ProviderConfig::new(ProviderId::TwelveData);
    twelve.base_url = Some(server.uri());
    twelve.api_key = Some("test-key".to_string());

    QuoteConfig {
        providers: vec![yahoo, twelve],
        request_timeout_secs: 5,
        ..QuoteConfig::default()
    }
}

fn resolver_at(config: &QuoteConfig, at: DateTime<Utc>) -> (QuoteResolver, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(at));
    let resolver = QuoteResolver::from_config(config)
        .unwrap()
        .with_clock(clock.clone());
    (resolver, clock)
}

#[tokio::test]
async fn krx_code_falls_back_to_kosdaq_suffix() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/035720.KS"))
        .respond_with(
            ResponseTemplate::new(404).set_body_string(include_str!("fixtures/yahoo_not_found.json")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/035720.KQ"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(include_str!("fixtures/yahoo_chart_kosdaq.json")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/price"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (resolver, _) = resolver_at(&config_for(&server), after_close());
    let resolution = resolver.resolve_detailed("035720").await;
    assert_eq!(
        resolution,
        Resolution::Resolved {
            quote: Quote {
                price: dec!(48250),
                open: Some(dec!(47900)),
                high: Some(dec!(48600)),
                low: Some(dec!(47750)),
                volume: Some(912044),
            },
            provider: ProviderId::Yahoo
        }
    );
}

#[tokio::test]
async fn falls_back_to_twelve_data_with_plain_symbol() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/AAPL"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/price"))
        .and(query_param("symbol", "AAPL"))
        .and(query_param("apikey", "test-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(include_str!("fixtures/twelve_data_price.json")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (resolver, _) = resolver_at(&config_for(&server), after_close());
    assert_eq!(resolver.resolve("AAPL").await, Some(dec!(189.84000)));
    assert!(resolver.failure_cache().is_empty());
}

#[tokio::test]
async fn market_hours_make_no_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (resolver, _) = resolver_at(&config_for(&server), mid_session());
    for symbol in ["AAPL", "005930", "035720"] {
        assert_eq!(resolver.resolve_detailed(symbol).await, Resolution::Blackout);
    }
}

#[tokio::test]
async fn failed_symbol_is_suppressed_until_ttl() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/ZZZZ"))
        .respond_with(
            ResponseTemplate::new(404).set_body_string(include_str!("fixtures/yahoo_not_found.json")),
        )
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/price"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"code": 400, "message": "symbol not found", "status": "error"}"#),
        )
        .expect(2)
        .mount(&server)
        .await;

    let (resolver, clock) = resolver_at(&config_for(&server), after_close());

    assert!(matches!(
        resolver.resolve_detailed("ZZZZ").await,
        Resolution::Exhausted { attempts } if attempts.len() == 2
    ));
    assert_eq!(resolver.failure_cache().failed_at("ZZZZ"), Some(after_close()));

    clock.advance(chrono::Duration::minutes(4));
    assert!(matches!(
        resolver.resolve_detailed("ZZZZ").await,
        Resolution::Suppressed { .. }
    ));

    clock.advance(chrono::Duration::minutes(2));
    assert!(matches!(
        resolver.resolve_detailed("ZZZZ").await,
        Resolution::Exhausted { .. }
    ));
    assert_eq!(
        resolver.failure_cache().failed_at("ZZZZ"),
        Some(after_close() + chrono::Duration::minutes(6))
    );
}

#[tokio::test]
async fn updater_persists_resolved_prices() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/035720.KS"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/035720.KQ"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(include_str!("fixtures/yahoo_chart_kosdaq.json")),
        )
        .mount(&server)
        .await;

    let db = PriceDb::open_in_memory().unwrap();
    db.init().unwrap();
    db.add_stock("035720", Some("Kakao"), after_close()).unwrap();

    let (resolver, _) = resolver_at(&config_for(&server), after_close());
    let updater = PriceUpdater::new(resolver, &db).with_delay(Duration::ZERO);

    let symbols: Vec<String> = db.list_stocks().unwrap().into_iter().map(|s| s.symbol).collect();
    let summary = updater.update_all(&symbols, |_| {}).await;
    assert_eq!(summary.updated, 1);

    let stored = db.latest_price("035720").unwrap().unwrap();
    assert_eq!(stored.price, dec!(48250));
    assert_eq!(stored.provider, Some(ProviderId::Yahoo));
    assert_eq!(stored.recorded_at, after_close());
    assert_eq!(stored.open, Some(dec!(47900)));
    assert_eq!(stored.volume, Some(912044));
}

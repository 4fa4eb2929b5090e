use goldbot::api::{ExchangeRateClient, GoldApiClient};
use goldbot::backtest::{BacktestRunner, MarketScenario, SyntheticPriceGenerator};
use goldbot::execution::price_feed::usd_per_ounce_to_vnd_per_chi;
use goldbot::execution::{
    ExecutionAction, GoldSource, PositionManager, PriceFeedManager, TradingSession,
};
use goldbot::report::render_dashboard;
use goldbot::*;
use std::time::Duration;

fn feed_for(server: &mockito::ServerGuard) -> PriceFeedManager {
    let gold = GoldApiClient::with_base_url(server.url(), Duration::from_secs(2))
        .unwrap()
        .with_retry(1, Duration::ZERO);
    let fx = ExchangeRateClient::with_base_url(server.url(), Duration::from_secs(2)).unwrap();
    PriceFeedManager::new(GoldSource::GoldApi(gold), fx, 24_500.0)
}

#[tokio::test]
async fn test_live_flow_against_mock_feeds() {
    let _ = tracing_subscriber::fmt::try_init();

    let mut server = mockito::Server::new_async().await;
    let _fx = server
        .mock("GET", "/v4/latest/USD")
        .with_status(200)
        .with_body(r#"{"rates":{"VND":25000}}"#)
        .create_async()
        .await;

    let mut feed = feed_for(&server);
    let mut session = TradingSession::new(50, PositionManager::default());

    // 1. Rising spot price, one refresh per mock swap
    for i in 0..25 {
        let usd = 2000.0 + i as f64;
        let gold = server
            .mock("GET", "/price/XAU")
            .with_status(200)
            .with_body(format!(r#"{{"price":{}}}"#, usd))
            .create_async()
            .await;

        let tick = feed.fetch_tick().await.unwrap();
        assert!(tick.exchange_rate.is_fresh());
        session.record_tick(&tick);
        gold.remove_async().await;
    }

    assert_eq!(session.history().len(), 25);
    assert_eq!(
        session.current_price(),
        Some(usd_per_ounce_to_vnd_per_chi(2024.0, 25_000.0))
    );
    assert_eq!(session.latest_analysis().signal, Signal::Long);

    // 2. Trade tick opens, next one closes
    let decision = session.on_trade_tick();
    assert!(matches!(
        decision.action,
        ExecutionAction::Open { side: Side::Long, .. }
    ));

    let gold = server
        .mock("GET", "/price/XAU")
        .with_status(200)
        .with_body(r#"{"price":2030.0,"price_gram_24k":65.27}"#)
        .create_async()
        .await;
    let tick = feed.fetch_tick().await.unwrap();
    session.record_tick(&tick);
    gold.remove_async().await;

    let decision = session.on_trade_tick();
    assert!(matches!(decision.action, ExecutionAction::Close { .. }));

    let summary = session.summary();
    assert_eq!(summary.total_trades, 1);
    assert_eq!(summary.winning_trades, 1);
    assert!(summary.final_capital > summary.initial_capital);

    // 3. Gold outage: last data kept, marked stale on snapshot and dashboard
    let before = session.snapshot();
    assert!(before.price_fresh);
    assert_eq!(before.usd_per_gram_24k, Some(65.27));
    assert!(render_dashboard(&before).contains("Gold 24K (USD/g):    $65.27"));

    let _down = server
        .mock("GET", "/price/XAU")
        .with_status(503)
        .create_async()
        .await;
    match feed.fetch_tick_within(Duration::from_secs(5)).await {
        Ok(_) => panic!("gold outage should fail the refresh"),
        Err(e) => session.record_feed_error(&e),
    }

    assert_eq!(session.history().len(), 26);
    let after = session.snapshot();
    assert!(!after.price_fresh);
    assert_eq!(after.price_per_chi, before.price_per_chi);
    assert!(after.feed_error.as_deref().unwrap().contains("503"));

    let dashboard = render_dashboard(&after);
    assert!(dashboard.contains("CONNECTION ERROR"));
    assert!(dashboard.contains("(stale)"));
    assert!(dashboard.contains("RECENT TRADES"));
    assert!(dashboard.contains("USD/VND"));
}

#[test]
fn test_backtest_scenarios_through_public_api() {
    let runner = BacktestRunner::default();

    for scenario in MarketScenario::ALL {
        let prices = SyntheticPriceGenerator::new(42).generate(scenario, 720);
        let result = runner.run(&prices);

        assert_eq!(result.samples, 720);
        assert_eq!(result.trade_ticks, 60);
        assert!(
            result.summary.winning_trades + result.summary.losing_trades
                <= result.summary.total_trades
        );
        // Capital only moves by realized P&L
        let realized: f64 = result.trades.iter().map(|t| t.profit_loss).sum();
        approx::assert_relative_eq!(
            result.summary.final_capital,
            result.summary.initial_capital + realized,
            max_relative = 1e-9
        );
    }
}

#[test]
fn test_uptrend_replay_profits() {
    let prices = SyntheticPriceGenerator::new(3).generate(MarketScenario::Uptrend, 360);
    let result = BacktestRunner::default().run(&prices);

    assert!(!result.trades.is_empty());
    assert!(result.trades.iter().all(|t| t.side == Side::Long));
    assert!(result.summary.total_pnl > 0.0);
}

#[test]
fn test_feed_outage_with_blocking_runtime() {
    // Unreachable host: the tick fails and nothing is recorded
    let session = tokio_test::block_on(async {
        let gold = GoldApiClient::with_base_url("http://127.0.0.1:9", Duration::from_millis(200))
            .unwrap()
            .with_retry(1, Duration::ZERO);
        let fx = ExchangeRateClient::with_base_url("http://127.0.0.1:9", Duration::from_millis(200))
            .unwrap();
        let mut feed = PriceFeedManager::new(GoldSource::GoldApi(gold), fx, 24_500.0);

        let mut session = TradingSession::new(50, PositionManager::default());
        match feed.fetch_tick().await {
            Ok(tick) => {
                session.record_tick(&tick);
            }
            Err(e) => session.record_feed_error(&e),
        }
        assert_eq!(feed.last_exchange_rate(), 24_500.0);
        session
    });

    let mut session = session;
    assert!(session.history().is_empty());
    assert!(!session.price_fresh());
    assert!(session.last_feed_error().is_some());
    assert_eq!(session.on_trade_tick().action, ExecutionAction::Skip);
}

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use goldbot::api::{ExchangeRateClient, GoldApiClient, MetalPriceClient};
use goldbot::config::AppConfig;
use goldbot::execution::{GoldSource, PositionManager, PriceFeedManager, TradingSession};
use goldbot::report::{render_dashboard, render_summary};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "goldbot", about = "Gold futures signal tracker and paper-trading simulator")]
struct Cli {
    /// Config file (defaults to config/default + config/local if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Gold spot price source
    #[arg(long, value_enum, default_value_t = SourceArg::GoldApi)]
    source: SourceArg,
    /// Print one JSON snapshot per refresh instead of the dashboard
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceArg {
    GoldApi,
    MetalPrice,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging();

    let config = AppConfig::load(cli.config.as_deref())?;
    tracing::info!("🚀 Goldbot starting ({})", config);

    let mut feed = build_feed(&config, cli.source)?;
    let mut session = TradingSession::new(
        config.trading.history_capacity,
        PositionManager::new(config.trading.initial_capital, config.trading.margin_fraction),
    );

    // First refresh fires immediately, first trade tick one interval later
    let refresh_period = config.schedule.price_refresh();
    let mut price_ticker = interval(refresh_period);
    price_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let trade_period = config.schedule.trade_interval();
    let mut trade_ticker = interval_at(Instant::now() + trade_period, trade_period);
    trade_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        "  🔄 Price refresh: every {}s",
        config.schedule.price_refresh_secs
    );
    tracing::info!(
        "  💹 Trading: every {}s",
        config.schedule.trade_interval_secs
    );
    tracing::info!("Press Ctrl+C to stop...");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    tracing::error!("Failed to listen for Ctrl+C: {}", e);
                }
                tracing::info!("⚠️  Received Ctrl+C, shutting down...");
                break;
            }
            _ = price_ticker.tick() => {
                // Bounded so Ctrl+C and the trade timer wait at most one refresh
                match feed.fetch_tick_within(refresh_period).await {
                    Ok(tick) => {
                        session.record_tick(&tick);
                    }
                    Err(e) => session.record_feed_error(&e),
                }
                display(&session, cli.json)?;
            }
            _ = trade_ticker.tick() => {
                session.on_trade_tick();
            }
        }
    }

    println!("\n{}", render_summary(&session.summary()));
    tracing::info!("👋 Goldbot stopped");
    Ok(())
}

fn setup_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("goldbot=info"));

    // stdout belongs to the dashboard / JSON stream
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_feed(config: &AppConfig, source: SourceArg) -> Result<PriceFeedManager> {
    let feed = &config.feed;
    let timeout = feed.request_timeout();

    let gold = match source {
        // The next refresh is the retry
        SourceArg::GoldApi => GoldSource::GoldApi(
            GoldApiClient::with_base_url(&feed.gold_api_url, timeout)
                .context("Failed to build gold-api client")?
                .with_retry(1, Duration::ZERO),
        ),
        SourceArg::MetalPrice => {
            let key = feed
                .metal_price_api_key
                .as_deref()
                .context("metal-price source needs GOLDBOT__FEED__METAL_PRICE_API_KEY")?;
            GoldSource::MetalPrice(
                MetalPriceClient::with_base_url(&feed.metal_price_url, key, timeout)
                    .context("Failed to build metalpriceapi client")?,
            )
        }
    };

    let fx = ExchangeRateClient::with_base_url(&feed.exchange_rate_url, timeout)
        .context("Failed to build exchange rate client")?;

    Ok(PriceFeedManager::new(gold, fx, feed.fallback_exchange_rate))
}

fn display(session: &TradingSession, json: bool) -> Result<()> {
    let snapshot = session.snapshot();

    if json {
        println!(
            "{}",
            serde_json::to_string(&snapshot).context("Failed to encode snapshot")?
        );
    } else {
        // Clear screen, cursor home
        print!("\x1B[2J\x1B[1;1H");
        println!("{}", render_dashboard(&snapshot));
    }

    Ok(())
}

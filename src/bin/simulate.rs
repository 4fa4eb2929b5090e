use anyhow::Result;
use clap::Parser;
use goldbot::backtest::{BacktestResult, BacktestRunner, MarketScenario, SyntheticPriceGenerator};
use goldbot::config::AppConfig;
use goldbot::report::{format_vnd, render_summary};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "simulate", about = "Replay synthetic gold prices through the trading loop")]
struct Cli {
    /// RNG seed for the price generator
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Price samples per scenario (one per refresh interval)
    #[arg(long, default_value_t = 720)]
    samples: usize,
    /// Run a single scenario instead of all of them
    #[arg(long, value_enum)]
    scenario: Option<MarketScenario>,
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter("goldbot=warn")
        .init();

    let config = AppConfig::load(cli.config.as_deref())?;
    let runner = BacktestRunner::from_config(&config);

    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║          GOLDBOT SCENARIO SIMULATOR                   ║");
    println!("╚═══════════════════════════════════════════════════════╝");
    println!(
        "  seed={} samples={} refresh={}s trade={}s",
        cli.seed, cli.samples, config.schedule.price_refresh_secs, config.schedule.trade_interval_secs
    );

    let scenarios: Vec<MarketScenario> = match cli.scenario {
        Some(s) => vec![s],
        None => MarketScenario::ALL.to_vec(),
    };

    let mut results = Vec::new();
    for scenario in scenarios {
        let prices = SyntheticPriceGenerator::new(cli.seed).generate(scenario, cli.samples);
        let result = runner.run(&prices);
        results.push((scenario, result));
    }

    if let [(scenario, result)] = results.as_slice() {
        println!("\n  Scenario: {}", scenario.name());
        println!("{}", render_summary(&result.summary));
    } else {
        print_summary_comparison(&results);
    }

    Ok(())
}

fn print_summary_comparison(results: &[(MarketScenario, BacktestResult)]) {
    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║              SCENARIO COMPARISON                      ║");
    println!("╚═══════════════════════════════════════════════════════╝\n");

    println!(
        "{:<12} {:>16} {:>10} {:>8} {:>8} {:>7}",
        "Scenario", "P&L (VND)", "Return%", "Trades", "Win%", "Halted"
    );
    println!("{}", "─".repeat(66));

    for (scenario, result) in results {
        let s = &result.summary;
        println!(
            "{:<12} {:>16} {:>10.2} {:>8} {:>8.1} {:>7}",
            scenario.name(),
            format_vnd(s.total_pnl),
            s.return_pct,
            s.total_trades,
            s.win_rate,
            if result.halted { "yes" } else { "no" }
        );
    }

    println!();
}

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Roughly 2024 spot gold in VND per chỉ
pub const DEFAULT_BASE_PRICE: f64 = 8_000_000.0;

/// Market scenario types for synthetic price series
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MarketScenario {
    /// Steady climb, noise smaller than drift
    Uptrend,
    /// Steady decline, noise smaller than drift
    Downtrend,
    /// Mean-reverting chop around the base price
    Sideways,
    /// Large random swings (±0.5% per sample)
    Volatile,
    /// Constant price
    Flat,
}

impl MarketScenario {
    pub const ALL: [MarketScenario; 5] = [
        MarketScenario::Uptrend,
        MarketScenario::Downtrend,
        MarketScenario::Sideways,
        MarketScenario::Volatile,
        MarketScenario::Flat,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MarketScenario::Uptrend => "Uptrend",
            MarketScenario::Downtrend => "Downtrend",
            MarketScenario::Sideways => "Sideways",
            MarketScenario::Volatile => "Volatile",
            MarketScenario::Flat => "Flat",
        }
    }
}

/// Generates synthetic VND/chỉ price samples, one per refresh
pub struct SyntheticPriceGenerator {
    rng: StdRng,
    base_price: f64,
}

impl SyntheticPriceGenerator {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self::with_base_price(seed, DEFAULT_BASE_PRICE)
    }

    pub fn with_base_price(seed: u64, base_price: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_price,
        }
    }

    pub fn base_price(&self) -> f64 {
        self.base_price
    }

    /// Generate `num_samples` whole-VND prices for `scenario`
    pub fn generate(&mut self, scenario: MarketScenario, num_samples: usize) -> Vec<f64> {
        let mut prices = Vec::with_capacity(num_samples);
        let mut current = self.base_price;
        let floor = self.base_price * 0.5;

        for _ in 0..num_samples {
            current += match scenario {
                // +0.02% per sample, ±0.01% noise
                MarketScenario::Uptrend => current * (0.0002 + self.rng.gen_range(-0.0001..0.0001)),
                MarketScenario::Downtrend => {
                    current * (-0.0002 + self.rng.gen_range(-0.0001..0.0001))
                }
                MarketScenario::Sideways => {
                    // 10% pull to mean + noise
                    let reversion = (self.base_price - current) * 0.1;
                    reversion + current * self.rng.gen_range(-0.001..0.001)
                }
                MarketScenario::Volatile => current * self.rng.gen_range(-0.005..0.005),
                MarketScenario::Flat => 0.0,
            };

            current = current.max(floor);
            prices.push(current.round());
        }

        prices
    }
}

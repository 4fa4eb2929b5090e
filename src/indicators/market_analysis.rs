//! Momentum and volatility over the tail of a price series
//!
//! Momentum compares the latest price with the price `lookback` positions
//! from the end (the latest price is position 1). Volatility is the
//! high-low range over a trailing window.

/// Momentum as (absolute change, percent change)
///
/// Returns `None` if the series is shorter than `lookback`.
pub fn calculate_momentum(prices: &[f64], lookback: usize) -> Option<(f64, f64)> {
    if lookback == 0 || prices.len() < lookback {
        return None;
    }

    let current = *prices.last()?;
    let reference = prices[prices.len() - lookback];
    let momentum = current - reference;

    Some((momentum, momentum / reference * 100.0))
}

/// Volatility as (max - min, range as percent of the latest price)
///
/// Returns `None` for an empty series. A shorter series than `window` uses
/// every sample available.
pub fn calculate_volatility(prices: &[f64], window: usize) -> Option<(f64, f64)> {
    let current = *prices.last()?;
    let start = prices.len().saturating_sub(window);
    let recent = &prices[start..];

    let high = recent.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let low = recent.iter().copied().fold(f64::INFINITY, f64::min);
    let range = high - low;

    Some((range, range / current * 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_momentum_six_back() {
        // Position 6 from the end is 100.0
        let prices = vec![90.0, 100.0, 101.0, 102.0, 103.0, 104.0, 110.0];
        let (momentum, pct) = calculate_momentum(&prices, 6).unwrap();
        assert_eq!(momentum, 10.0);
        assert_relative_eq!(pct, 10.0);
    }

    #[test]
    fn test_momentum_negative() {
        let prices = vec![200.0, 190.0, 180.0, 170.0, 160.0, 150.0];
        let (momentum, pct) = calculate_momentum(&prices, 6).unwrap();
        assert_eq!(momentum, -50.0);
        assert_relative_eq!(pct, -25.0);
    }

    #[test]
    fn test_momentum_insufficient_data() {
        assert!(calculate_momentum(&[1.0, 2.0], 6).is_none());
    }

    #[test]
    fn test_volatility_window() {
        // Only the last 3 samples count: 98, 105, 100
        let prices = vec![50.0, 98.0, 105.0, 100.0];
        let (range, pct) = calculate_volatility(&prices, 3).unwrap();
        assert_eq!(range, 7.0);
        assert_relative_eq!(pct, 7.0);
    }

    #[test]
    fn test_volatility_flat() {
        let prices = vec![100.0; 10];
        let (range, pct) = calculate_volatility(&prices, 10).unwrap();
        assert_eq!(range, 0.0);
        assert_eq!(pct, 0.0);
    }

    #[test]
    fn test_volatility_empty() {
        assert!(calculate_volatility(&[], 10).is_none());
    }
}

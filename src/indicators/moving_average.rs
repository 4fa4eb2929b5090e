/// Calculate Simple Moving Average (SMA) over the last `period` prices
///
/// With fewer than `period` prices this falls back to the most recent price,
/// or 0.0 when `prices` is empty.
pub fn calculate_sma(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period {
        return prices.last().copied().unwrap_or(0.0);
    }

    let sum: f64 = prices.iter().rev().take(period).sum();
    sum / period as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma() {
        let prices = vec![100.0, 102.0, 104.0, 106.0, 108.0];
        assert_eq!(calculate_sma(&prices, 5), 104.0);
    }

    #[test]
    fn test_sma_uses_most_recent_window() {
        let prices = vec![1.0, 1.0, 10.0, 20.0];
        assert_eq!(calculate_sma(&prices, 2), 15.0);
    }

    #[test]
    fn test_sma_insufficient_data_returns_latest() {
        let prices = vec![100.0, 102.0];
        assert_eq!(calculate_sma(&prices, 5), 102.0);
    }

    #[test]
    fn test_sma_empty() {
        assert_eq!(calculate_sma(&[], 5), 0.0);
    }

    #[test]
    fn test_sma_identical_values() {
        let prices = vec![42.5; 20];
        assert_eq!(calculate_sma(&prices, 20), 42.5);
    }
}

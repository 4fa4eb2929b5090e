use crate::indicators::calculate_sma;
use std::collections::VecDeque;

/// Default number of samples kept for analysis
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// In-memory sliding window of recent price samples
///
/// Maintains a rolling window of prices, oldest first. Pushing past
/// capacity evicts the oldest sample.
#[derive(Debug, Clone)]
pub struct PriceHistoryBuffer {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl PriceHistoryBuffer {
    /// Create a new price buffer
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of samples to keep (at least 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Add a sample, returning the evicted sample if the buffer was full
    pub fn push(&mut self, price: f64) -> Option<f64> {
        self.samples.push_back(price);

        if self.samples.len() > self.capacity {
            self.samples.pop_front()
        } else {
            None
        }
    }

    /// Mean of the last `period` samples
    ///
    /// Falls back to the latest sample (0.0 when empty) if fewer than
    /// `period` samples are held.
    pub fn moving_average(&self, period: usize) -> f64 {
        calculate_sma(&self.values(), period)
    }

    /// Most recent sample
    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    /// All samples, oldest first
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }

    /// The N most recent samples, oldest first
    pub fn recent(&self, n: usize) -> Vec<f64> {
        let skip = self.samples.len().saturating_sub(n);
        self.samples.iter().skip(skip).copied().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clear all data
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for PriceHistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

//! Simple Moving Average (SMA).
//!
//! Rolling mean over a fixed window. First valid value at index period-1.

use super::Indicator;
use crate::domain::{PriceBar, PriceField};

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    field: PriceField,
    name: String,
}

impl Sma {
    /// # Panics
    ///
    /// Panics if `period` is 0. The engine rejects zero windows before
    /// building indicators.
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            field: PriceField::Close,
            name: format!("MA{period}"),
        }
    }

    /// Average a different price column.
    pub fn on(mut self, field: PriceField) -> Self {
        self.field = field;
        self
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let prices: Vec<f64> = bars.iter().map(|b| b.price(self.field)).collect();
        rolling_mean(&prices, self.period)
    }
}

/// Rolling mean of `values` over `period`. Windows containing NaN yield NaN.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let mut sum = 0.0;
    let mut nan_count = 0usize;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            nan_count += 1;
        } else {
            sum += v;
        }
        if i >= period {
            let leaving = values[i - period];
            if leaving.is_nan() {
                nan_count -= 1;
            } else {
                sum -= leaving;
            }
        }
        if i + 1 >= period && nan_count == 0 {
            result[i] = sum / period as f64;
        }
    }
    result
}

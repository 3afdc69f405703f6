//! Exponential Moving Average (EMA).
//!
//! EMA[t] = alpha * price[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (span + 1).
//! Seeded with the first price, without warm-up bias correction, so the
//! column is defined from the first bar.

use super::Indicator;
use crate::domain::{PriceBar, PriceField};

#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    field: PriceField,
    name: String,
}

impl Ema {
    /// # Panics
    ///
    /// Panics if `span` is 0. The engine rejects zero windows before
    /// building indicators.
    pub fn new(span: usize) -> Self {
        assert!(span >= 1, "EMA span must be >= 1");
        Self {
            span,
            field: PriceField::Close,
            name: format!("EMA{span}"),
        }
    }

    pub fn on(mut self, field: PriceField) -> Self {
        self.field = field;
        self
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let prices: Vec<f64> = bars.iter().map(|b| b.price(self.field)).collect();
        ema_of_series(&prices, self.span)
    }
}

/// EMA of an arbitrary series, seeded by its first value.
///
/// A NaN input taints every later value.
pub fn ema_of_series(values: &[f64], span: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    let Some(&first) = values.first() else {
        return result;
    };
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev = first;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() || prev.is_nan() {
            return result;
        }
        let ema = if i == 0 { v } else { alpha * v + (1.0 - alpha) * prev };
        result[i] = ema;
        prev = ema;
    }
    result
}

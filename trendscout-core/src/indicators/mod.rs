//! Indicator computations over a raw price series.
//!
//! Every function here is a pure transform: bars (or a numeric column) in,
//! a column of the same length out. Warm-up positions are `f64::NAN` and
//! NaN inputs poison every window they fall into, so downstream stages can
//! treat NaN as "not enough history" rather than as zero.

pub mod atr;
pub mod ema;
pub mod engine;
pub mod momentum;
pub mod sma;
pub mod structure;
pub mod volume;

pub use atr::Atr;
pub use ema::Ema;
pub use engine::IndicatorEngine;
pub use sma::Sma;

use crate::domain::PriceBar;

/// Trait for single-column indicators computed from bars.
///
/// Output has the same length as the input; the first `lookback()` values
/// are `f64::NAN`. No value at bar t may depend on bars after t.
pub trait Indicator: Send + Sync {
    /// Column name (e.g., "MA20", "ATR14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire series.
    fn compute(&self, bars: &[PriceBar]) -> Vec<f64>;
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev close, high/low = max/min(open, close) ± 1% of close,
/// volume = 1000, consecutive calendar days from 2024-01-02.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let pad = close.abs() * 0.01;
            PriceBar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + pad,
                low: open.min(close) - pad,
                close,
                volume: 1000.0,
                amount: 1000.0 * close,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-9;

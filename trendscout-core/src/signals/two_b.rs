//! 2B reversal: price breaks a prior extreme, then crosses back over it.
//!
//! A short-term reversal signal only; it says nothing about the trend.

use serde::Serialize;

use crate::config::SignalConfig;

/// Bars that must precede the recent extreme in the look-back window.
const MIN_PRIOR_BARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TwoBKind {
    Bullish,
    Bearish,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TwoBStructure {
    pub kind: TwoBKind,
    /// The earlier low (bullish) or high (bearish).
    pub prior_extreme: f64,
    /// The extreme that broke through it.
    pub recent_extreme: f64,
    pub current_price: f64,
    /// How far the recent extreme overshot the prior one, in percent.
    pub break_pct: f64,
    /// Move from the recent extreme to the current price, in percent.
    pub reversal_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TwoBReport {
    pub bullish: Option<TwoBStructure>,
    pub bearish: Option<TwoBStructure>,
}

impl TwoBReport {
    pub fn found(&self) -> bool {
        self.bullish.is_some() || self.bearish.is_some()
    }
}

/// Look for bullish and bearish 2B structures in the last
/// `two_b_lookback` prices.
pub fn detect_two_b(prices: &[f64], config: &SignalConfig) -> TwoBReport {
    if prices.len() < config.two_b_lookback {
        return TwoBReport::default();
    }
    let window = &prices[prices.len() - config.two_b_lookback..];
    TwoBReport {
        bullish: bullish(window, config),
        bearish: bearish(window, config),
    }
}

fn bullish(prices: &[f64], config: &SignalConfig) -> Option<TwoBStructure> {
    let (recent_idx, recent_low) = extreme_in_tail(prices, config.two_b_window, |a, b| a < b)?;
    let prior = prior_slice(prices, recent_idx, config)?;
    let prior_low = prior.iter().copied().fold(f64::INFINITY, f64::min);
    let current = *prices.last()?;
    let tol = config.two_b_tolerance;

    let broke_below = recent_low < prior_low * (1.0 - tol);
    let recovered = current > prior_low * (1.0 + tol);
    (broke_below && recovered).then(|| TwoBStructure {
        kind: TwoBKind::Bullish,
        prior_extreme: prior_low,
        recent_extreme: recent_low,
        current_price: current,
        break_pct: (prior_low - recent_low) / prior_low * 100.0,
        reversal_pct: (current - recent_low) / recent_low * 100.0,
    })
}

fn bearish(prices: &[f64], config: &SignalConfig) -> Option<TwoBStructure> {
    let (recent_idx, recent_high) = extreme_in_tail(prices, config.two_b_window, |a, b| a > b)?;
    let prior = prior_slice(prices, recent_idx, config)?;
    let prior_high = prior.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let current = *prices.last()?;
    let tol = config.two_b_tolerance;

    let broke_above = recent_high > prior_high * (1.0 + tol);
    let fell_back = current < prior_high * (1.0 - tol);
    (broke_above && fell_back).then(|| TwoBStructure {
        kind: TwoBKind::Bearish,
        prior_extreme: prior_high,
        recent_extreme: recent_high,
        current_price: current,
        break_pct: (recent_high - prior_high) / prior_high * 100.0,
        reversal_pct: (recent_high - current) / recent_high * 100.0,
    })
}

/// First index (in `prices`) of the extreme of the last `tail` values.
fn extreme_in_tail(
    prices: &[f64],
    tail: usize,
    better: impl Fn(f64, f64) -> bool,
) -> Option<(usize, f64)> {
    let start = prices.len().saturating_sub(tail);
    let mut best: Option<(usize, f64)> = None;
    for (i, &p) in prices.iter().enumerate().skip(start) {
        match best {
            Some((_, b)) if !better(p, b) => {}
            _ => best = Some((i, p)),
        }
    }
    best
}

/// Prices at least `two_b_min_separation` bars before the recent extreme.
fn prior_slice<'a>(prices: &'a [f64], recent_idx: usize, config: &SignalConfig) -> Option<&'a [f64]> {
    if recent_idx < MIN_PRIOR_BARS.max(config.two_b_min_separation + 1) {
        return None;
    }
    Some(&prices[..recent_idx - config.two_b_min_separation])
}

//! TrendClassifier: labels the latest bar from the enriched series.

use std::collections::BTreeMap;

use tracing::{debug, Span};

use super::zones::{find_dense_zones, targets_from_zones};
use super::{
    MaTurn, StopLoss, TrendClassification, TrendPhase, TrendType, TurnDirection,
};
use crate::config::{StopLossMethod, TrendConfig};
use crate::series::{Column, EnrichedSeries, MaAlignment};

/// Fallback ATR as a fraction of price when ATR is undefined.
const DEFAULT_ATR_FRACTION: f64 = 0.02;
const FIXED_STOP_FRACTION: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct TrendClassifier {
    config: TrendConfig,
    span: Span,
}

impl TrendClassifier {
    pub fn new(config: TrendConfig) -> Self {
        Self {
            config,
            span: Span::none(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &TrendConfig {
        &self.config
    }

    /// Classify using the configured stop-loss method.
    pub fn classify(&self, series: &EnrichedSeries) -> TrendClassification {
        self.classify_with(series, self.config.stop_loss_method)
    }

    /// Classify the latest bar, placing the stop with `method`.
    ///
    /// Series shorter than `min_bars` (or the longest MA period) yield an
    /// undefined classification.
    pub fn classify_with(
        &self,
        series: &EnrichedSeries,
        method: StopLossMethod,
    ) -> TrendClassification {
        let as_of = series.last_date();
        let current_price = series.current_price().unwrap_or(0.0);
        let required = self
            .config
            .min_bars
            .max(series.longest_period().unwrap_or(0));

        if series.len() < required {
            debug!(
                parent: &self.span,
                bars = series.len(),
                required,
                "insufficient data for trend classification"
            );
            return TrendClassification::undefined(as_of, current_price);
        }

        let ma_density = series.latest(Column::MaDensity);
        let ma_alignment = series.latest_alignment();
        let annual_return = self.effective_return(series);
        let trend_type = self.trend_type(series, ma_density, annual_return, ma_alignment);
        let trend_phase = self.identify_phase(series);

        let bias: BTreeMap<usize, f64> = series
            .periods()
            .iter()
            .filter_map(|&p| series.latest(Column::Bias(p)).map(|b| (p, b)))
            .collect();
        let ma_turns: Vec<MaTurn> = series
            .periods()
            .iter()
            .filter_map(|&p| check_ma_turning(series, p))
            .collect();

        let zones = find_dense_zones(series, &self.config);
        let targets = targets_from_zones(&zones, current_price, self.config.max_targets);
        let stop_loss = stop_loss(series, current_price, method);
        let risk_reward_ratios = match &stop_loss {
            Some(stop) if stop.pct > 0.0 => {
                targets.iter().map(|t| t.gain_pct / stop.pct).collect()
            }
            _ => Vec::new(),
        };
        let trend_strength = match annual_return {
            Some(r) => (r / self.config.accelerate_threshold).clamp(0.0, 1.0),
            None => 0.5,
        };

        debug!(
            parent: &self.span,
            %trend_type,
            %trend_phase,
            %ma_alignment,
            density = ?ma_density,
            annual_return = ?annual_return,
            zones = zones.len(),
            "trend classified"
        );

        TrendClassification {
            as_of,
            current_price,
            trend_type,
            trend_phase,
            ma_alignment,
            ma_density,
            is_dense: series.len().checked_sub(1).is_some_and(|i| series.is_dense(i)),
            annual_return,
            bias,
            ma_turns,
            targets,
            stop_loss,
            risk_reward_ratios,
            trend_strength,
        }
    }

    /// Annual return on the latest bar; with less than a year of history,
    /// the return over all available bars.
    fn effective_return(&self, series: &EnrichedSeries) -> Option<f64> {
        if let Some(r) = series.latest(Column::AnnualReturn) {
            return Some(r);
        }
        let first = series.price(0)?;
        let last = series.current_price()?;
        (first > 0.0).then(|| last / first - 1.0)
    }

    fn trend_type(
        &self,
        series: &EnrichedSeries,
        density: Option<f64>,
        annual_return: Option<f64>,
        alignment: MaAlignment,
    ) -> TrendType {
        let c = &self.config;

        let dense = density.is_some_and(|d| d < series.thresholds().dense_threshold_pct);
        if dense && self.range_fraction(series) < c.range_limit {
            return TrendType::DenseZone;
        }

        let Some(r) = annual_return else {
            return TrendType::Undefined;
        };
        let bull = alignment == MaAlignment::Bull;
        let bear = alignment == MaAlignment::Bear;

        if r > c.accelerate_threshold && bull {
            TrendType::AccelerateUp
        } else if r > c.stable_min && r <= c.stable_max && bull {
            TrendType::StableUp
        } else if r < -c.accelerate_threshold && bear {
            TrendType::AccelerateDown
        } else if r >= -c.stable_max && r < -c.stable_min && bear {
            TrendType::StableDown
        } else {
            TrendType::Undefined
        }
    }

    /// (max - min) / min of the price over the last `min_bars` bars.
    fn range_fraction(&self, series: &EnrichedSeries) -> f64 {
        let prices = series.prices();
        let window = &prices[prices.len().saturating_sub(self.config.min_bars)..];
        let hi = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lo = window.iter().copied().fold(f64::INFINITY, f64::min);
        if lo > 0.0 {
            (hi - lo) / lo
        } else {
            f64::INFINITY
        }
    }

    /// Trend phase from the middle-period MA slope against its recent
    /// distribution.
    pub fn identify_phase(&self, series: &EnrichedSeries) -> TrendPhase {
        let Some(period) = series.middle_period() else {
            return TrendPhase::Undefined;
        };
        if series.len() < self.config.phase_lookback {
            return TrendPhase::Undefined;
        }
        let Ok(slope) = series.column(Column::Slope(period)) else {
            return TrendPhase::Undefined;
        };
        let window: Vec<f64> = slope[slope.len() - self.config.phase_lookback..]
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .collect();
        let Some(latest) = series.latest(Column::Slope(period)) else {
            return TrendPhase::Undefined;
        };
        if window.len() < self.config.phase_min_samples.max(2) {
            return TrendPhase::Undefined;
        }

        let mean = window.iter().sum::<f64>() / window.len() as f64;
        let var = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
            / (window.len() - 1) as f64;
        let std = var.sqrt();

        if latest.abs() > mean.abs() + 2.0 * std {
            TrendPhase::Extreme
        } else if (latest - mean).abs() < std {
            TrendPhase::Develop
        } else if latest.abs() < mean.abs() {
            TrendPhase::Start
        } else {
            TrendPhase::Turning
        }
    }
}

/// Compare the current price with the discount price of `period`.
///
/// Retrospective: only the latest bar's price is used, no projection of the
/// next close. `None` while the discount price is undefined.
pub fn check_ma_turning(series: &EnrichedSeries, period: usize) -> Option<MaTurn> {
    let current_price = series.current_price()?;
    let discount = series.discount(period);
    let discount_price = discount.last().copied().filter(|v| !v.is_nan())?;
    let price_diff = current_price - discount_price;
    Some(MaTurn {
        period,
        current_price,
        discount_price,
        price_diff,
        price_diff_pct: price_diff / discount_price * 100.0,
        direction: if current_price > discount_price {
            TurnDirection::Up
        } else {
            TurnDirection::Down
        },
    })
}

fn stop_loss(
    series: &EnrichedSeries,
    current_price: f64,
    method: StopLossMethod,
) -> Option<StopLoss> {
    if current_price <= 0.0 {
        return None;
    }
    let price = match method {
        StopLossMethod::Ma => series
            .periods()
            .iter()
            .filter_map(|&p| series.latest(Column::Ma(p)))
            .find(|&ma| ma < current_price)
            .unwrap_or(current_price * (1.0 - FIXED_STOP_FRACTION)),
        StopLossMethod::Atr => {
            let atr = series
                .latest_atr()
                .unwrap_or(current_price * DEFAULT_ATR_FRACTION);
            current_price - 2.0 * atr
        }
        StopLossMethod::Percentage | StopLossMethod::Structure => {
            current_price * (1.0 - FIXED_STOP_FRACTION)
        }
    };
    Some(StopLoss {
        price,
        pct: (current_price - price) / current_price * 100.0,
        method,
    })
}

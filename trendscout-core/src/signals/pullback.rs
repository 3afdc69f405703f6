//! Trend pullback: in a bull alignment, price returns to a key MA that is
//! not about to turn down.

use serde::{Serialize, Serializer};

use super::EXTRA_BARS;
use crate::config::SignalConfig;
use crate::series::{Column, EnrichedSeries, MaAlignment};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PullbackSignal {
    pub has_signal: bool,
    pub strength: u32,
    /// Period of the MA the price pulled back to.
    #[serde(serialize_with = "ma_label")]
    pub pullback_to: Option<usize>,
    /// Distance to that MA, in percent.
    pub pullback_pct: Option<f64>,
    pub is_first_pullback: bool,
    pub safe_from_turn: bool,
}

impl PullbackSignal {
    /// "MA60" style label of the touched MA.
    pub fn label(&self) -> Option<String> {
        self.pullback_to.map(|p| format!("MA{p}"))
    }
}

fn ma_label<S: Serializer>(period: &Option<usize>, s: S) -> Result<S::Ok, S::Error> {
    match period {
        Some(p) => s.serialize_some(&format!("MA{p}")),
        None => s.serialize_none(),
    }
}

pub fn detect_pullback(series: &EnrichedSeries, config: &SignalConfig) -> PullbackSignal {
    let longest = series.longest_period().unwrap_or(0);
    if series.len() < longest + EXTRA_BARS {
        return PullbackSignal::default();
    }
    let Some(last) = series.len().checked_sub(1) else {
        return PullbackSignal::default();
    };
    if series.alignment(last) != MaAlignment::Bull {
        return PullbackSignal::default();
    }
    let Some(price) = series.current_price() else {
        return PullbackSignal::default();
    };

    // nearest MA inside the band; strict comparison keeps the first on ties
    let mut nearest: Option<(usize, usize, f64)> = None;
    for (rank, &p) in series.periods().iter().enumerate() {
        let Some(ma) = series.value(Column::Ma(p), last) else {
            continue;
        };
        let distance = (price - ma).abs() / ma * 100.0;
        if distance < config.pullback_band_pct && nearest.map_or(true, |(_, _, d)| distance < d) {
            nearest = Some((rank, p, distance));
        }
    }
    let Some((rank, period, distance)) = nearest else {
        return PullbackSignal::default();
    };

    let safe_from_turn = match series.discount(period).last() {
        Some(&d) if !d.is_nan() => price > d,
        _ => true,
    };
    let is_first_pullback = is_first_pullback(series, period, config);

    let mut strength = 30 + 10 * rank as u32;
    if is_first_pullback {
        strength += 30;
    }
    if safe_from_turn {
        strength += 20;
    }

    PullbackSignal {
        has_signal: safe_from_turn,
        strength,
        pullback_to: Some(period),
        pullback_pct: Some(distance),
        is_first_pullback,
        safe_from_turn,
    }
}

/// At most `max_first_touches` bars of the last `touch_lookback` within
/// `touch_band_pct` of the MA.
fn is_first_pullback(series: &EnrichedSeries, period: usize, config: &SignalConfig) -> bool {
    if series.len() < config.touch_lookback {
        return false;
    }
    let ma = series.ma(period);
    let start = series.len() - config.touch_lookback;
    let touches = (start..series.len())
        .filter(|&i| match series.price(i) {
            Some(price) if !ma[i].is_nan() => {
                (price - ma[i]).abs() / ma[i] * 100.0 < config.touch_band_pct
            }
            _ => false,
        })
        .count();
    touches <= config.max_first_touches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndicatorConfig;
    use crate::indicators::{make_bars, IndicatorEngine};

    /// Linear rise, then a last close placed 2% above its own MA60.
    fn pullback_to_ma60() -> EnrichedSeries {
        let mut closes: Vec<f64> = (0..199).map(|i| 100.0 + 0.5 * i as f64).collect();
        let s59: f64 = closes[closes.len() - 59..].iter().sum();
        closes.push(1.02 * s59 / (60.0 - 1.02));
        IndicatorEngine::new(IndicatorConfig::default())
            .enrich(&make_bars(&closes))
            .unwrap()
    }

    #[test]
    fn first_pullback_to_ma60() {
        let s = detect_pullback(&pullback_to_ma60(), &SignalConfig::default());
        assert!(s.has_signal);
        assert_eq!(s.label().as_deref(), Some("MA60"));
        assert!(s.is_first_pullback);
        assert!(s.safe_from_turn);
        assert!((s.pullback_pct.unwrap() - 2.0).abs() < 1e-6);
        assert_eq!(s.strength, 90);
    }

    #[test]
    fn too_short_for_longest_ma_is_no_signal() {
        // same shape as the MA60 pullback, cut to 125 bars
        let mut closes: Vec<f64> = (0..124).map(|i| 100.0 + 0.5 * i as f64).collect();
        let s59: f64 = closes[closes.len() - 59..].iter().sum();
        closes.push(1.02 * s59 / (60.0 - 1.02));
        let series = IndicatorEngine::new(IndicatorConfig::default())
            .enrich(&make_bars(&closes))
            .unwrap();
        assert_eq!(series.latest_alignment(), MaAlignment::Bull);
        assert_eq!(
            detect_pullback(&series, &SignalConfig::default()),
            PullbackSignal::default()
        );
    }

    #[test]
    fn serializes_ma_label() {
        let s = detect_pullback(&pullback_to_ma60(), &SignalConfig::default());
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["pullback_to"], "MA60");
    }

    #[test]
    fn requires_bull_alignment() {
        let closes: Vec<f64> = (0..200).map(|i| 300.0 - 0.5 * i as f64).collect();
        let series = IndicatorEngine::new(IndicatorConfig::default())
            .enrich(&make_bars(&closes))
            .unwrap();
        let s = detect_pullback(&series, &SignalConfig::default());
        assert!(!s.has_signal);
        assert_eq!(s.pullback_to, None);
    }

    #[test]
    fn far_from_every_ma_is_no_pullback() {
        let closes: Vec<f64> = (0..200).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let series = IndicatorEngine::new(IndicatorConfig::default())
            .enrich(&make_bars(&closes))
            .unwrap();
        assert_eq!(
            detect_pullback(&series, &SignalConfig::default()).pullback_to,
            None
        );
    }
}

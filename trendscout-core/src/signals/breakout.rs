//! Density breakout: tight MAs fanning out into a bull alignment.

use serde::Serialize;

use super::EXTRA_BARS;
use crate::config::SignalConfig;
use crate::series::{Column, EnrichedSeries, MaAlignment};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BreakoutSignal {
    pub has_signal: bool,
    /// 0 to 100, additive.
    pub strength: u32,
    pub is_bull_aligned: bool,
    /// Bull on this bar, not bull on the previous one.
    pub just_aligned: bool,
    pub is_dense: bool,
    pub price_above_ma20: bool,
    pub volume_surge: bool,
    pub ma_density: Option<f64>,
}

/// Fires only when alignment is bull, MAs are dense and the price is above
/// the shortest MA. Volume and a freshly formed alignment add strength but
/// never gate the signal.
pub fn detect_breakout(series: &EnrichedSeries, config: &SignalConfig) -> BreakoutSignal {
    let longest = series.longest_period().unwrap_or(0);
    if series.len() < longest + EXTRA_BARS || series.len() < 2 {
        return BreakoutSignal::default();
    }
    let last = series.len() - 1;

    let is_bull_aligned = series.alignment(last) == MaAlignment::Bull;
    let just_aligned = is_bull_aligned && series.alignment(last - 1) != MaAlignment::Bull;
    let is_dense = series.is_dense(last);
    let price_above_ma20 = match (
        series.current_price(),
        series
            .shortest_period()
            .and_then(|p| series.value(Column::Ma(p), last)),
    ) {
        (Some(price), Some(ma)) => price > ma,
        _ => false,
    };
    let volume_surge = series
        .value(Column::VolRatio, last)
        .is_some_and(|r| r > config.breakout_volume_ratio);

    let mut strength = 0;
    if is_bull_aligned {
        strength += 30;
    }
    if just_aligned {
        strength += 20;
    }
    if is_dense {
        strength += 20;
    }
    if price_above_ma20 {
        strength += 20;
    }
    if volume_surge {
        strength += 10;
    }

    BreakoutSignal {
        has_signal: is_bull_aligned && is_dense && price_above_ma20,
        strength,
        is_bull_aligned,
        just_aligned,
        is_dense,
        price_above_ma20,
        volume_surge,
        ma_density: series.value(Column::MaDensity, last),
    }
}

//! Historical dense zones, used as resistance targets above the price.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::TargetLevel;
use crate::config::TrendConfig;
use crate::series::{Column, EnrichedSeries};

/// A run of dense bars merged across short gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseZone {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub bars: usize,
    /// Middle-period MA at the zone's first bar.
    pub price_center: f64,
}

/// Dense zones within the last `zone_lookback` bars.
///
/// Dense bars whose date is within `zone_gap_days` calendar days of the
/// current zone's end extend it; otherwise a new zone starts. Zones with
/// fewer than `zone_min_bars` dense bars are dropped.
pub fn find_dense_zones(series: &EnrichedSeries, config: &TrendConfig) -> Vec<DenseZone> {
    let n = series.len();
    let start = n.saturating_sub(config.zone_lookback);
    let center_period = series.middle_period();

    let mut zones = Vec::new();
    let mut current: Option<DenseZone> = None;

    for i in start..n {
        if !series.is_dense(i) {
            continue;
        }
        let date = series.bars()[i].date;

        if let Some(zone) = current.as_mut() {
            if (date - zone.end).num_days() <= config.zone_gap_days {
                zone.end = date;
                zone.bars += 1;
                continue;
            }
        }
        if let Some(done) = current.take() {
            if done.bars >= config.zone_min_bars {
                zones.push(done);
            }
        }
        let price_center = center_period
            .and_then(|p| series.value(Column::Ma(p), i))
            .or_else(|| series.price(i))
            .unwrap_or(f64::NAN);
        current = Some(DenseZone {
            start: date,
            end: date,
            bars: 1,
            price_center,
        });
    }
    if let Some(done) = current {
        if done.bars >= config.zone_min_bars {
            zones.push(done);
        }
    }
    zones
}

/// Nearest zones above `current_price`, ascending, as numbered targets.
pub fn targets_from_zones(
    zones: &[DenseZone],
    current_price: f64,
    max_targets: usize,
) -> Vec<TargetLevel> {
    let mut above: Vec<f64> = zones
        .iter()
        .map(|z| z.price_center)
        .filter(|&p| p > current_price)
        .collect();
    above.sort_by(|a, b| a.total_cmp(b));
    above
        .into_iter()
        .take(max_targets)
        .enumerate()
        .map(|(i, price)| TargetLevel {
            level: i + 1,
            price,
            gain_pct: (price - current_price) / current_price * 100.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceField;
    use crate::indicators::make_bars;
    use crate::series::SeriesThresholds;

    fn series_with_density(density: Vec<f64>, ma60: Vec<f64>) -> EnrichedSeries {
        let closes = vec![100.0; density.len()];
        EnrichedSeries::new(
            make_bars(&closes),
            PriceField::Close,
            vec![20, 60, 120],
            SeriesThresholds::default(),
        )
        .with_column(Column::MaDensity, density)
        .unwrap()
        .with_column(Column::Ma(60), ma60)
        .unwrap()
    }

    #[test]
    fn merges_runs_and_drops_short_zones() {
        // 25 dense, 5 loose (gap of 6 days, merged), 10 dense,
        // 30 loose, 15 dense (too short)
        let mut density = Vec::new();
        density.extend(vec![1.0; 25]);
        density.extend(vec![9.0; 5]);
        density.extend(vec![1.0; 10]);
        density.extend(vec![9.0; 30]);
        density.extend(vec![1.0; 15]);
        let n = density.len();
        let ma60: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();

        let zones = find_dense_zones(&series_with_density(density, ma60), &TrendConfig::default());
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].bars, 35);
        assert_eq!(zones[0].price_center, 100.0);
    }

    #[test]
    fn long_gap_splits_zones() {
        let mut density = Vec::new();
        density.extend(vec![1.0; 20]);
        density.extend(vec![9.0; 11]);
        density.extend(vec![1.0; 20]);
        let n = density.len();
        let ma60: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();

        let zones = find_dense_zones(&series_with_density(density, ma60), &TrendConfig::default());
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[1].price_center, 131.0);
    }

    #[test]
    fn nan_density_never_dense() {
        let density = vec![f64::NAN; 40];
        let ma60 = vec![100.0; 40];
        let zones = find_dense_zones(&series_with_density(density, ma60), &TrendConfig::default());
        assert!(zones.is_empty());
    }

    #[test]
    fn targets_above_price_ascending() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let zone = |c: f64| DenseZone {
            start: d,
            end: d,
            bars: 20,
            price_center: c,
        };
        let zones = vec![zone(130.0), zone(90.0), zone(110.0), zone(150.0), zone(120.0)];
        let targets = targets_from_zones(&zones, 100.0, 3);
        let prices: Vec<f64> = targets.iter().map(|t| t.price).collect();
        assert_eq!(prices, vec![110.0, 120.0, 130.0]);
        assert_eq!(targets[0].level, 1);
        assert!((targets[2].gain_pct - 30.0).abs() < 1e-9);
    }
}

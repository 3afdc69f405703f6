//! IndicatorEngine: raw bars in, EnrichedSeries out.

use tracing::{debug, warn, Span};

use super::atr::Atr;
use super::ema::Ema;
use super::momentum::{bias, discount, pct_change, trailing_return};
use super::sma::Sma;
use super::structure::{ma_alignment, ma_density};
use super::volume::{volume_averages, volume_ratio};
use super::Indicator;
use crate::config::IndicatorConfig;
use crate::domain::PriceBar;
use crate::series::{Column, EnrichedSeries, SeriesError, SeriesThresholds};

/// Computes every configured column for a bar series.
///
/// Pure apart from logging: the same bars and config always produce the
/// same series.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    config: IndicatorConfig,
    span: Span,
}

impl IndicatorEngine {
    pub fn new(config: IndicatorConfig) -> Self {
        Self {
            config,
            span: Span::none(),
        }
    }

    /// Attach the span events are recorded under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    /// Validate `bars` and compute all indicator columns.
    ///
    /// Empty input yields an empty series (with a warning). Bars out of
    /// date order, duplicated, or with non-finite / non-positive prices are
    /// rejected. Bars whose OHLC values disagree (open above high, say) are
    /// dropped with a warning and the rest are analyzed.
    pub fn enrich(&self, bars: &[PriceBar]) -> Result<EnrichedSeries, SeriesError> {
        let periods = self.checked_periods()?;
        self.checked_windows()?;
        validate_bars(bars)?;
        let kept = self.drop_inconsistent(bars);
        let bars = kept.as_slice();

        let thresholds = SeriesThresholds {
            atr_period: self.config.atr_period,
            volume_long: self.config.volume_long,
            dense_threshold_pct: self.config.dense_threshold_pct,
            high_volume_ratio: self.config.high_volume_ratio,
            low_volume_ratio: self.config.low_volume_ratio,
        };
        let mut series = EnrichedSeries::new(
            bars.to_vec(),
            self.config.price_field,
            periods.clone(),
            thresholds,
        );

        if bars.is_empty() {
            warn!(parent: &self.span, "empty bar series, nothing to compute");
            return Ok(series);
        }

        let prices: Vec<f64> = bars.iter().map(|b| b.price(self.config.price_field)).collect();

        let mut mas = Vec::with_capacity(periods.len());
        for &p in &periods {
            let ma = Sma::new(p).on(self.config.price_field).compute(bars);
            let ema = Ema::new(p).on(self.config.price_field).compute(bars);
            series.insert(Column::Discount(p), discount(&prices, p))?;
            series.insert(Column::Bias(p), bias(&prices, &ma))?;
            series.insert(Column::Slope(p), pct_change(&ma, self.config.slope_window))?;
            series.insert(Column::Ema(p), ema)?;
            mas.push(ma);
        }

        let ma_refs: Vec<&[f64]> = mas.iter().map(Vec::as_slice).collect();
        series.insert(Column::MaDensity, ma_density(&ma_refs))?;
        series.set_alignment(ma_alignment(&ma_refs));
        for (&p, ma) in periods.iter().zip(mas) {
            series.insert(Column::Ma(p), ma)?;
        }

        let atr = Atr::new(self.config.atr_period);
        series.insert(Column::Atr(self.config.atr_period), atr.compute(bars))?;

        let volumes: Vec<f64> = bars
            .iter()
            .map(|b| b.volume_of(self.config.volume_field))
            .collect();
        let (vol_short, vol_long) =
            volume_averages(&volumes, self.config.volume_short, self.config.volume_long);
        series.insert(Column::VolRatio, volume_ratio(&volumes, &vol_long))?;
        series.insert(Column::VolMa(self.config.volume_short), vol_short)?;
        series.insert(Column::VolMa(self.config.volume_long), vol_long)?;

        series.insert(
            Column::AnnualReturn,
            trailing_return(&prices, self.config.annual_period),
        )?;

        debug!(
            parent: &self.span,
            bars = bars.len(),
            periods = ?periods,
            first = %bars[0].date,
            last = %bars[bars.len() - 1].date,
            "indicators computed"
        );
        Ok(series)
    }

    fn checked_periods(&self) -> Result<Vec<usize>, SeriesError> {
        let periods = &self.config.ma_periods;
        if periods.is_empty() || periods.contains(&0) {
            return Err(SeriesError::InvalidPeriods(format!(
                "expected non-empty positive periods, got {periods:?}"
            )));
        }
        if periods.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SeriesError::InvalidPeriods(format!(
                "periods must be strictly ascending, got {periods:?}"
            )));
        }
        Ok(periods.clone())
    }

    fn checked_windows(&self) -> Result<(), SeriesError> {
        let c = &self.config;
        let windows = [
            ("atr_period", c.atr_period),
            ("slope_window", c.slope_window),
            ("volume_short", c.volume_short),
            ("volume_long", c.volume_long),
            ("annual_period", c.annual_period),
        ];
        match windows.iter().find(|(_, w)| *w == 0) {
            Some((name, _)) => Err(SeriesError::InvalidPeriods(format!("{name} must be >= 1"))),
            None => Ok(()),
        }
    }

    fn drop_inconsistent(&self, bars: &[PriceBar]) -> Vec<PriceBar> {
        let mut kept = Vec::with_capacity(bars.len());
        for (index, bar) in bars.iter().enumerate() {
            if bar.is_sane() {
                kept.push(bar.clone());
            } else {
                warn!(
                    parent: &self.span,
                    index,
                    date = %bar.date,
                    open = bar.open,
                    high = bar.high,
                    low = bar.low,
                    close = bar.close,
                    "inconsistent OHLC, bar skipped"
                );
            }
        }
        kept
    }
}

fn validate_bars(bars: &[PriceBar]) -> Result<(), SeriesError> {
    for (index, bar) in bars.iter().enumerate() {
        if !bar.has_valid_prices() {
            return Err(SeriesError::InvalidBar {
                index,
                date: bar.date,
            });
        }
        if index > 0 {
            let prev = bars[index - 1].date;
            if bar.date == prev {
                return Err(SeriesError::DuplicateDate(bar.date));
            }
            if bar.date < prev {
                return Err(SeriesError::Unsorted {
                    index,
                    date: bar.date,
                });
            }
        }
    }
    Ok(())
}

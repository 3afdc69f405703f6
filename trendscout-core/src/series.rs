//! EnrichedSeries: price bars plus the indicator columns derived from them.
//!
//! Columns are addressed by [`Column`] and stored at full series length,
//! NaN where history is insufficient. Readers go through `value()` /
//! `latest()`, which fold NaN and missing columns into `None`.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{PriceBar, PriceField};
use crate::indicators::sma::rolling_mean;

/// Ordering of the moving averages on one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaAlignment {
    /// Shorter MAs strictly above longer ones.
    Bull,
    /// Shorter MAs strictly below longer ones.
    Bear,
    #[default]
    Mixed,
}

impl fmt::Display for MaAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MaAlignment::Bull => "bull",
            MaAlignment::Bear => "bear",
            MaAlignment::Mixed => "mixed",
        };
        f.write_str(label)
    }
}

/// Name of a derived column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Ma(usize),
    Ema(usize),
    Discount(usize),
    Bias(usize),
    Slope(usize),
    Atr(usize),
    MaDensity,
    VolMa(usize),
    VolRatio,
    AnnualReturn,
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Column::Ma(p) => write!(f, "MA{p}"),
            Column::Ema(p) => write!(f, "EMA{p}"),
            Column::Discount(p) => write!(f, "Discount_{p}"),
            Column::Bias(p) => write!(f, "Bias_{p}"),
            Column::Slope(p) => write!(f, "MA{p}_Slope"),
            Column::Atr(p) => write!(f, "ATR_{p}"),
            Column::MaDensity => f.write_str("MA_Density"),
            Column::VolMa(p) => write!(f, "Vol_MA_{p}"),
            Column::VolRatio => f.write_str("Vol_Ratio"),
            Column::AnnualReturn => f.write_str("Annual_Return"),
        }
    }
}

/// Errors raised while building or reading an enriched series.
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("missing column {0}")]
    MissingColumn(Column),

    #[error("column {column} has {actual} values, series has {expected} bars")]
    LengthMismatch {
        column: Column,
        expected: usize,
        actual: usize,
    },

    #[error("bars out of order at index {index} ({date})")]
    Unsorted { index: usize, date: NaiveDate },

    #[error("duplicate bar for {0}")]
    DuplicateDate(NaiveDate),

    #[error("invalid bar at index {index} ({date}): non-finite or inconsistent OHLCV")]
    InvalidBar { index: usize, date: NaiveDate },

    #[error("invalid periods: {0}")]
    InvalidPeriods(String),
}

/// Thresholds that turn raw columns into flags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesThresholds {
    pub atr_period: usize,
    pub volume_long: usize,
    pub dense_threshold_pct: f64,
    pub high_volume_ratio: f64,
    pub low_volume_ratio: f64,
}

impl Default for SeriesThresholds {
    fn default() -> Self {
        Self {
            atr_period: 14,
            volume_long: 60,
            dense_threshold_pct: 5.0,
            high_volume_ratio: 1.5,
            low_volume_ratio: 0.5,
        }
    }
}

/// Price bars augmented with indicator columns.
#[derive(Debug, Clone)]
pub struct EnrichedSeries {
    bars: Vec<PriceBar>,
    price_field: PriceField,
    periods: Vec<usize>,
    thresholds: SeriesThresholds,
    columns: BTreeMap<Column, Vec<f64>>,
    alignment: Vec<MaAlignment>,
}

impl EnrichedSeries {
    /// A series with bars only. Columns are attached with [`with_column`].
    ///
    /// [`with_column`]: EnrichedSeries::with_column
    pub fn new(
        bars: Vec<PriceBar>,
        price_field: PriceField,
        periods: Vec<usize>,
        thresholds: SeriesThresholds,
    ) -> Self {
        let n = bars.len();
        Self {
            bars,
            price_field,
            periods,
            thresholds,
            columns: BTreeMap::new(),
            alignment: vec![MaAlignment::Mixed; n],
        }
    }

    /// Attach (or replace) a column. Its length must match the bar count.
    pub fn with_column(mut self, column: Column, values: Vec<f64>) -> Result<Self, SeriesError> {
        self.insert(column, values)?;
        Ok(self)
    }

    pub(crate) fn insert(&mut self, column: Column, values: Vec<f64>) -> Result<(), SeriesError> {
        if values.len() != self.bars.len() {
            return Err(SeriesError::LengthMismatch {
                column,
                expected: self.bars.len(),
                actual: values.len(),
            });
        }
        self.columns.insert(column, values);
        Ok(())
    }

    pub(crate) fn set_alignment(&mut self, alignment: Vec<MaAlignment>) {
        debug_assert_eq!(alignment.len(), self.bars.len());
        self.alignment = alignment;
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn last_bar(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Configured MA periods, ascending.
    pub fn periods(&self) -> &[usize] {
        &self.periods
    }

    pub fn shortest_period(&self) -> Option<usize> {
        self.periods.first().copied()
    }

    /// The middle period (MA60 with the default set).
    pub fn middle_period(&self) -> Option<usize> {
        self.periods.get(self.periods.len() / 2).copied()
    }

    pub fn longest_period(&self) -> Option<usize> {
        self.periods.last().copied()
    }

    pub fn thresholds(&self) -> &SeriesThresholds {
        &self.thresholds
    }

    /// Selected price column at bar `i`.
    pub fn price(&self, i: usize) -> Option<f64> {
        self.bars.get(i).map(|b| b.price(self.price_field))
    }

    /// Selected price column for the whole series.
    pub fn prices(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.price(self.price_field)).collect()
    }

    pub fn current_price(&self) -> Option<f64> {
        self.bars.last().map(|b| b.price(self.price_field))
    }

    /// Full column, or `MissingColumn` if it was never computed.
    pub fn column(&self, column: Column) -> Result<&[f64], SeriesError> {
        self.columns
            .get(&column)
            .map(Vec::as_slice)
            .ok_or(SeriesError::MissingColumn(column))
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains_key(&column)
    }

    /// Value at bar `i`; `None` if missing, out of range, or NaN.
    pub fn value(&self, column: Column, i: usize) -> Option<f64> {
        self.columns
            .get(&column)
            .and_then(|c| c.get(i))
            .copied()
            .filter(|v| !v.is_nan())
    }

    /// Value on the latest bar.
    pub fn latest(&self, column: Column) -> Option<f64> {
        self.len().checked_sub(1).and_then(|i| self.value(column, i))
    }

    /// MA column for `period`, computed from the price column if it was not
    /// part of the configured set.
    pub fn ma(&self, period: usize) -> Cow<'_, [f64]> {
        match self.columns.get(&Column::Ma(period)) {
            Some(c) => Cow::Borrowed(c.as_slice()),
            None => Cow::Owned(rolling_mean(&self.prices(), period)),
        }
    }

    /// Discount column for `period`, computed on demand when absent.
    pub fn discount(&self, period: usize) -> Cow<'_, [f64]> {
        match self.columns.get(&Column::Discount(period)) {
            Some(c) => Cow::Borrowed(c.as_slice()),
            None => Cow::Owned(crate::indicators::momentum::discount(&self.prices(), period)),
        }
    }

    pub fn alignment(&self, i: usize) -> MaAlignment {
        self.alignment.get(i).copied().unwrap_or_default()
    }

    pub fn latest_alignment(&self) -> MaAlignment {
        self.len()
            .checked_sub(1)
            .map_or(MaAlignment::Mixed, |i| self.alignment(i))
    }

    /// Density below the dense threshold. NaN density is not dense.
    pub fn is_dense(&self, i: usize) -> bool {
        self.value(Column::MaDensity, i)
            .is_some_and(|d| d < self.thresholds.dense_threshold_pct)
    }

    pub fn is_high_volume(&self, i: usize) -> bool {
        self.value(Column::VolRatio, i)
            .is_some_and(|r| r > self.thresholds.high_volume_ratio)
    }

    pub fn is_low_volume(&self, i: usize) -> bool {
        self.value(Column::VolRatio, i)
            .is_some_and(|r| r < self.thresholds.low_volume_ratio)
    }

    /// ATR on the latest bar.
    pub fn latest_atr(&self) -> Option<f64> {
        self.latest(Column::Atr(self.thresholds.atr_period))
    }
}

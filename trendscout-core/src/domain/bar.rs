//! PriceBar: one trading day of market data for a single symbol.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar as delivered by the data-fetch collaborator.
///
/// Series are ordered ascending by date with one bar per trading day.
/// `amount` is the traded value (price × volume) where the vendor reports it,
/// zero otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default)]
    pub amount: f64,
}

impl PriceBar {
    /// Returns true if any price or volume field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite())
    }

    /// Finite, strictly positive prices and a non-negative volume. Says
    /// nothing about how the four prices relate to each other.
    pub fn has_valid_prices(&self) -> bool {
        !self.is_void()
            && self.open > 0.0
            && self.high > 0.0
            && self.low > 0.0
            && self.close > 0.0
            && self.volume >= 0.0
    }

    /// Basic OHLC sanity check: valid prices, high >= low, and open/close
    /// inside the high/low range.
    pub fn is_sane(&self) -> bool {
        self.has_valid_prices()
            && self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }

    /// Read the price column selected by `field`.
    pub fn price(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
        }
    }

    /// Read the volume column selected by `field`.
    pub fn volume_of(&self, field: VolumeField) -> f64 {
        match field {
            VolumeField::Volume => self.volume,
            VolumeField::Amount => self.amount,
        }
    }
}

/// Which price column the moving-average family is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    Open,
    High,
    Low,
    #[default]
    Close,
}

/// Which activity column the volume indicators are computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeField {
    #[default]
    Volume,
    Amount,
}

//! Trend classification of the latest bar: type, phase, MA-turn checks,
//! dense-zone targets and the protective stop.

pub mod classifier;
pub mod zones;

pub use classifier::{check_ma_turning, TrendClassifier};
pub use zones::{find_dense_zones, DenseZone};

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::StopLossMethod;
use crate::series::MaAlignment;

/// Trend label of the latest bar. Rules are evaluated in declaration
/// order (after `DenseZone`), first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendType {
    DenseZone,
    AccelerateUp,
    StableUp,
    StableDown,
    AccelerateDown,
    #[default]
    Undefined,
}

impl fmt::Display for TrendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrendType::DenseZone => "dense_zone",
            TrendType::AccelerateUp => "accelerate_up",
            TrendType::StableUp => "stable_up",
            TrendType::StableDown => "stable_down",
            TrendType::AccelerateDown => "accelerate_down",
            TrendType::Undefined => "undefined",
        };
        f.write_str(label)
    }
}

/// Where the trend sits in its life cycle, judged from MA slope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendPhase {
    Turning,
    Start,
    Develop,
    Extreme,
    #[default]
    Undefined,
}

impl fmt::Display for TrendPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrendPhase::Turning => "turning",
            TrendPhase::Start => "start",
            TrendPhase::Develop => "develop",
            TrendPhase::Extreme => "extreme",
            TrendPhase::Undefined => "undefined",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnDirection {
    Up,
    Down,
}

/// Current price against the discount price of one MA period.
///
/// `Up` means the price already exceeds the value about to leave the
/// window, so the MA cannot fall on the next bar at an unchanged price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaTurn {
    pub period: usize,
    pub current_price: f64,
    pub discount_price: f64,
    pub price_diff: f64,
    pub price_diff_pct: f64,
    pub direction: TurnDirection,
}

/// A resistance level above the current price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetLevel {
    /// 1-based tier.
    pub level: usize,
    pub price: f64,
    pub gain_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopLoss {
    pub price: f64,
    /// Distance below the current price, in percent.
    pub pct: f64,
    pub method: StopLossMethod,
}

/// Output of [`TrendClassifier::classify`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendClassification {
    pub as_of: Option<NaiveDate>,
    pub current_price: f64,
    pub trend_type: TrendType,
    pub trend_phase: TrendPhase,
    pub ma_alignment: MaAlignment,
    pub ma_density: Option<f64>,
    pub is_dense: bool,
    /// Trailing return as a fraction.
    pub annual_return: Option<f64>,
    /// Bias (%) keyed by MA period.
    pub bias: BTreeMap<usize, f64>,
    pub ma_turns: Vec<MaTurn>,
    pub targets: Vec<TargetLevel>,
    pub stop_loss: Option<StopLoss>,
    pub risk_reward_ratios: Vec<f64>,
    /// 0 (no trend) to 1 (at the acceleration threshold or beyond).
    pub trend_strength: f64,
}

impl TrendClassification {
    /// Result for a series too short to classify.
    pub fn undefined(as_of: Option<NaiveDate>, current_price: f64) -> Self {
        Self {
            as_of,
            current_price,
            trend_type: TrendType::Undefined,
            trend_phase: TrendPhase::Undefined,
            ma_alignment: MaAlignment::Mixed,
            ma_density: None,
            is_dense: false,
            annual_return: None,
            bias: BTreeMap::new(),
            ma_turns: Vec::new(),
            targets: Vec::new(),
            stop_loss: None,
            risk_reward_ratios: Vec::new(),
            trend_strength: 0.5,
        }
    }

    pub fn bias(&self, period: usize) -> Option<f64> {
        self.bias.get(&period).copied()
    }

    pub fn ma_turn(&self, period: usize) -> Option<&MaTurn> {
        self.ma_turns.iter().find(|t| t.period == period)
    }

    pub fn stop_loss_pct(&self) -> Option<f64> {
        self.stop_loss.as_ref().map(|s| s.pct)
    }

    /// Replace the stop with one under a structure low at `price` and
    /// recompute the zone-target ratios. A price that is not strictly
    /// between zero and the current price leaves the classification as is.
    pub fn with_structure_stop(mut self, price: f64) -> Self {
        if !(price > 0.0 && price < self.current_price) {
            return self;
        }
        let pct = (self.current_price - price) / self.current_price * 100.0;
        self.stop_loss = Some(StopLoss {
            price,
            pct,
            method: StopLossMethod::Structure,
        });
        self.risk_reward_ratios = self.targets.iter().map(|t| t.gain_pct / pct).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structure_stop_recomputes_ratios() {
        let mut c = TrendClassification::undefined(None, 100.0);
        c.targets = vec![TargetLevel {
            level: 1,
            price: 112.0,
            gain_pct: 12.0,
        }];
        let c = c.with_structure_stop(96.0);
        let stop = c.stop_loss.as_ref().unwrap();
        assert_eq!(stop.method, StopLossMethod::Structure);
        assert!((stop.pct - 4.0).abs() < 1e-9);
        assert!((c.risk_reward_ratios[0] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn structure_stop_above_price_is_ignored() {
        let c = TrendClassification::undefined(None, 100.0).with_structure_stop(101.0);
        assert!(c.stop_loss.is_none());
        assert!(c.risk_reward_ratios.is_empty());
    }
}

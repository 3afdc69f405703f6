//! Strategies: turn a trend classification plus signals into a scored
//! assessment.
//!
//! Each trend type that supports a trade maps to exactly one strategy, and
//! the 2B reversal playbook is consulted when that one does not qualify.
//! [`SelectedStrategy`] is the tagged dispatch over them.

pub mod breakout;
pub mod hold;
pub mod pullback;
pub mod recommendation;
pub mod reversal;

pub use breakout::BreakoutStrategy;
pub use hold::AccelerateHoldStrategy;
pub use pullback::PullbackStrategy;
pub use recommendation::Recommendation;
pub use reversal::ReversalStrategy;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::StrategyConfig;
use crate::series::EnrichedSeries;
use crate::signals::SignalReport;
use crate::trend::{TrendClassification, TrendType};

/// Which playbook a recommendation follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Breakout,
    Pullback,
    AccelerateHold,
    AccelerateWarning,
    ReversalLong,
    ReversalShort,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StrategyKind::Breakout => "dense-zone breakout",
            StrategyKind::Pullback => "stable-trend pullback",
            StrategyKind::AccelerateHold => "accelerating trend, hold",
            StrategyKind::AccelerateWarning => "accelerating trend, caution",
            StrategyKind::ReversalLong => "2B reversal, rebound",
            StrategyKind::ReversalShort => "2B reversal, caution",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
    Warning,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::High => "***",
            Priority::Medium => "**",
            Priority::Low => "*",
            Priority::Warning => "(!)",
        };
        f.write_str(label)
    }
}

/// Everything a strategy may look at for one symbol.
#[derive(Debug, Clone, Copy)]
pub struct StrategyContext<'a> {
    pub series: &'a EnrichedSeries,
    pub trend: &'a TrendClassification,
    pub signals: &'a SignalReport,
    pub config: &'a StrategyConfig,
}

/// A strategy's verdict before profit prediction is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub kind: StrategyKind,
    pub priority: Priority,
    /// 0 to 100, additive.
    pub score: u32,
    pub entry_signal: String,
    pub hold_signal: Option<String>,
    pub exit_signal: Option<String>,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
    pub signal_strength: u32,
    /// Stop placed by the strategy itself, replacing the trend stop.
    pub stop_loss: Option<f64>,
}

/// A playbook for one trend type.
///
/// `assess` returns `None` when the setup does not qualify, including when
/// a gated strategy scores below `min_score`.
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn assess(&self, ctx: &StrategyContext<'_>) -> Option<Assessment>;
}

/// Strategy chosen by trend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectedStrategy {
    Breakout(BreakoutStrategy),
    Pullback(PullbackStrategy),
    AccelerateHold(AccelerateHoldStrategy),
    Reversal(ReversalStrategy),
}

impl SelectedStrategy {
    /// `None` for trend types with no playbook.
    pub fn for_trend(trend_type: TrendType) -> Option<Self> {
        match trend_type {
            TrendType::DenseZone => Some(Self::Breakout(BreakoutStrategy)),
            TrendType::StableUp => Some(Self::Pullback(PullbackStrategy)),
            TrendType::AccelerateUp => Some(Self::AccelerateHold(AccelerateHoldStrategy)),
            TrendType::StableDown | TrendType::AccelerateDown | TrendType::Undefined => None,
        }
    }

    /// Strategies to try in order: the trend playbook, then the 2B reversal.
    pub fn candidates(trend_type: TrendType) -> impl Iterator<Item = Self> {
        Self::for_trend(trend_type)
            .into_iter()
            .chain(std::iter::once(Self::Reversal(ReversalStrategy)))
    }
}

impl Strategy for SelectedStrategy {
    fn name(&self) -> &'static str {
        match self {
            Self::Breakout(s) => s.name(),
            Self::Pullback(s) => s.name(),
            Self::AccelerateHold(s) => s.name(),
            Self::Reversal(s) => s.name(),
        }
    }

    fn assess(&self, ctx: &StrategyContext<'_>) -> Option<Assessment> {
        match self {
            Self::Breakout(s) => s.assess(ctx),
            Self::Pullback(s) => s.assess(ctx),
            Self::AccelerateHold(s) => s.assess(ctx),
            Self::Reversal(s) => s.assess(ctx),
        }
    }
}

/// Shared fixtures for strategy tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use crate::config::{EngineConfig, IndicatorConfig, SignalConfig, TrendConfig};
    use crate::indicators::{make_bars, IndicatorEngine};
    use crate::series::EnrichedSeries;
    use crate::signals::{SignalDetector, SignalReport};
    use crate::trend::{TrendClassification, TrendClassifier};

    pub struct Fixture {
        pub series: EnrichedSeries,
        pub trend: TrendClassification,
        pub signals: SignalReport,
        pub config: EngineConfig,
    }

    pub fn analyze(closes: &[f64]) -> Fixture {
        let series = IndicatorEngine::new(IndicatorConfig::default())
            .enrich(&make_bars(closes))
            .unwrap();
        let trend = TrendClassifier::new(TrendConfig::default()).classify(&series);
        let signals = SignalDetector::new(SignalConfig::default()).detect_all(&series);
        Fixture {
            series,
            trend,
            signals,
            config: EngineConfig::default(),
        }
    }

    /// Flat base, steady climb, then a close 2% above its own MA60.
    pub fn pullback_closes() -> Vec<f64> {
        let mut closes = vec![100.0; 120];
        closes.extend((1..140).map(|i| 100.0 + 0.5 * i as f64));
        let s59: f64 = closes[closes.len() - 59..].iter().sum();
        closes.push(1.02 * s59 / (60.0 - 1.02));
        closes
    }

    impl Fixture {
        pub fn ctx(&self) -> super::StrategyContext<'_> {
            super::StrategyContext {
                series: &self.series,
                trend: &self.trend,
                signals: &self.signals,
                config: &self.config.strategy,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_by_trend_type() {
        assert!(matches!(
            SelectedStrategy::for_trend(TrendType::DenseZone),
            Some(SelectedStrategy::Breakout(_))
        ));
        assert!(matches!(
            SelectedStrategy::for_trend(TrendType::StableUp),
            Some(SelectedStrategy::Pullback(_))
        ));
        assert!(matches!(
            SelectedStrategy::for_trend(TrendType::AccelerateUp),
            Some(SelectedStrategy::AccelerateHold(_))
        ));
        assert!(SelectedStrategy::for_trend(TrendType::StableDown).is_none());
        assert!(SelectedStrategy::for_trend(TrendType::AccelerateDown).is_none());
        assert!(SelectedStrategy::for_trend(TrendType::Undefined).is_none());
    }

    #[test]
    fn reversal_is_tried_last() {
        let names: Vec<&str> = SelectedStrategy::candidates(TrendType::StableUp)
            .map(|s| s.name())
            .collect();
        assert_eq!(names, ["pullback", "reversal"]);
        let names: Vec<&str> = SelectedStrategy::candidates(TrendType::StableDown)
            .map(|s| s.name())
            .collect();
        assert_eq!(names, ["reversal"]);
    }

    #[test]
    fn kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&StrategyKind::AccelerateWarning).unwrap(),
            "\"accelerate_warning\""
        );
    }
}

//! Signal families evaluated independently over an enriched series.
//!
//! Each detector is a pure check returning found/not-found plus the
//! metrics behind the decision. None of them raise: short or incomplete
//! series simply produce "no signal".

pub mod breakout;
pub mod pullback;
pub mod top_bottom;
pub mod two_b;

pub use breakout::{detect_breakout, BreakoutSignal};
pub use pullback::{detect_pullback, PullbackSignal};
pub use top_bottom::{detect_top_bottom, find_peaks, DoubleStructure, PatternKind, TopBottomReport};
pub use two_b::{detect_two_b, TwoBKind, TwoBReport, TwoBStructure};

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, Span};

use crate::config::SignalConfig;
use crate::series::EnrichedSeries;

/// Bars required beyond the longest MA period before an MA-based detector
/// looks at the series.
pub(crate) const EXTRA_BARS: usize = 10;

/// Name of a signal family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    #[serde(rename = "2b_structure")]
    TwoB,
    #[serde(rename = "breakout")]
    Breakout,
    #[serde(rename = "pullback")]
    Pullback,
    #[serde(rename = "top_bottom")]
    TopBottom,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SignalKind::TwoB => "2b_structure",
            SignalKind::Breakout => "breakout",
            SignalKind::Pullback => "pullback",
            SignalKind::TopBottom => "top_bottom",
        };
        f.write_str(label)
    }
}

/// All four signal families for one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalReport {
    pub two_b: TwoBReport,
    pub breakout: BreakoutSignal,
    pub pullback: PullbackSignal,
    pub top_bottom: TopBottomReport,
    /// Families that fired, in the order above.
    pub active: Vec<SignalKind>,
}

impl SignalReport {
    pub fn is_active(&self, kind: SignalKind) -> bool {
        self.active.contains(&kind)
    }
}

#[derive(Debug, Clone)]
pub struct SignalDetector {
    config: SignalConfig,
    span: Span,
}

impl SignalDetector {
    pub fn new(config: SignalConfig) -> Self {
        Self {
            config,
            span: Span::none(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn detect_two_b(&self, series: &EnrichedSeries) -> TwoBReport {
        detect_two_b(&series.prices(), &self.config)
    }

    pub fn detect_breakout(&self, series: &EnrichedSeries) -> BreakoutSignal {
        detect_breakout(series, &self.config)
    }

    pub fn detect_pullback(&self, series: &EnrichedSeries) -> PullbackSignal {
        detect_pullback(series, &self.config)
    }

    pub fn detect_top_bottom(&self, series: &EnrichedSeries) -> TopBottomReport {
        detect_top_bottom(&series.prices(), &self.config)
    }

    /// Run every detector and list the ones that fired.
    pub fn detect_all(&self, series: &EnrichedSeries) -> SignalReport {
        let two_b = self.detect_two_b(series);
        let breakout = self.detect_breakout(series);
        let pullback = self.detect_pullback(series);
        let top_bottom = self.detect_top_bottom(series);

        let mut active = Vec::new();
        if two_b.found() {
            active.push(SignalKind::TwoB);
        }
        if breakout.has_signal {
            active.push(SignalKind::Breakout);
        }
        if pullback.has_signal {
            active.push(SignalKind::Pullback);
        }
        if top_bottom.has_structure() {
            active.push(SignalKind::TopBottom);
        }

        debug!(
            parent: &self.span,
            active = ?active,
            breakout_strength = breakout.strength,
            pullback_strength = pullback.strength,
            "signals detected"
        );

        SignalReport {
            two_b,
            breakout,
            pullback,
            top_bottom,
            active,
        }
    }
}

/// Series with hand-set columns for detector tests.
#[cfg(test)]
pub(crate) fn manual_series(closes: &[f64]) -> EnrichedSeries {
    use crate::domain::PriceField;
    use crate::indicators::make_bars;
    use crate::series::SeriesThresholds;

    EnrichedSeries::new(
        make_bars(closes),
        PriceField::Close,
        vec![20, 60, 120],
        SeriesThresholds::default(),
    )
}

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Assessment, Priority, StrategyKind};
use crate::domain::Symbol;
use crate::profit::ProfitPrediction;
use crate::series::MaAlignment;
use crate::trend::{TargetLevel, TrendClassification, TrendPhase, TrendType};

/// Final per-symbol output. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub symbol: Symbol,
    pub strategy: StrategyKind,
    pub priority: Priority,
    pub score: u32,
    pub current_price: f64,
    pub trend_type: TrendType,
    pub trend_phase: TrendPhase,
    pub ma_alignment: MaAlignment,
    pub entry_signal: String,
    pub hold_signal: Option<String>,
    pub exit_signal: Option<String>,
    pub stop_loss: Option<f64>,
    pub stop_loss_pct: Option<f64>,
    pub targets: Vec<TargetLevel>,
    /// Best zone-target risk/reward ratio, 0 when none.
    pub risk_reward: f64,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
    pub signal_strength: u32,
    pub as_of: Option<NaiveDate>,
    pub profit_prediction: ProfitPrediction,
}

impl Recommendation {
    pub fn assemble(
        symbol: impl Into<Symbol>,
        trend: &TrendClassification,
        assessment: Assessment,
        profit_prediction: ProfitPrediction,
    ) -> Self {
        let risk_reward = trend
            .risk_reward_ratios
            .iter()
            .copied()
            .fold(0.0, f64::max);
        Self {
            symbol: symbol.into(),
            strategy: assessment.kind,
            priority: assessment.priority,
            score: assessment.score,
            current_price: trend.current_price,
            trend_type: trend.trend_type,
            trend_phase: trend.trend_phase,
            ma_alignment: trend.ma_alignment,
            entry_signal: assessment.entry_signal,
            hold_signal: assessment.hold_signal,
            exit_signal: assessment.exit_signal,
            stop_loss: trend.stop_loss.as_ref().map(|s| s.price),
            stop_loss_pct: trend.stop_loss_pct(),
            targets: trend.targets.clone(),
            risk_reward,
            reasons: assessment.reasons,
            warnings: assessment.warnings,
            signal_strength: assessment.signal_strength,
            as_of: trend.as_of,
            profit_prediction,
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {} [{}] score {}",
            self.priority, self.symbol, self.strategy, self.score
        )?;
        if let Some(date) = self.as_of {
            writeln!(f, "  as of:     {date}")?;
        }
        writeln!(f, "  price:     {:.2}", self.current_price)?;
        writeln!(
            f,
            "  trend:     {} / {} / {}",
            self.trend_type, self.trend_phase, self.ma_alignment
        )?;
        writeln!(f, "  entry:     {}", self.entry_signal)?;
        if let Some(hold) = &self.hold_signal {
            writeln!(f, "  hold:      {hold}")?;
        }
        if let Some(exit) = &self.exit_signal {
            writeln!(f, "  exit:      {exit}")?;
        }
        if let (Some(price), Some(pct)) = (self.stop_loss, self.stop_loss_pct) {
            writeln!(f, "  stop:      {price:.2} (-{pct:.1}%)")?;
        }
        for t in &self.profit_prediction.targets {
            writeln!(
                f,
                "  target {}:  {:.2} (+{:.1}%, p={:.0}%)",
                t.level,
                t.price,
                t.gain_pct,
                t.probability * 100.0
            )?;
        }
        if self.risk_reward > 0.0 {
            writeln!(f, "  r/r:       {:.1}:1", self.risk_reward)?;
        }
        for reason in &self.reasons {
            writeln!(f, "  + {reason}")?;
        }
        for warning in &self.warnings {
            writeln!(f, "  ! {warning}")?;
        }
        let holding = &self.profit_prediction.holding_period;
        write!(
            f,
            "  holding:   {}-{} days (target {}), success {:.0}%",
            holding.min_days,
            holding.max_days,
            holding.target_days,
            self.profit_prediction.success_probability * 100.0
        )
    }
}

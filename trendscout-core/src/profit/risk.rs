//! Holding period, risk/reward and success probability.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::targets::ProfitTarget;
use crate::config::StrategyProfile;
use crate::strategy::StrategyKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingPeriod {
    pub min_days: u32,
    pub target_days: u32,
    pub max_days: u32,
    pub description: String,
}

/// Profile holding days scaled by 0.8 + 0.4 * trend_strength.
pub fn holding_period(
    kind: StrategyKind,
    profile: &StrategyProfile,
    trend_strength: f64,
) -> HoldingPeriod {
    let multiplier = 0.8 + 0.4 * trend_strength.clamp(0.0, 1.0);
    let scale = |days: u32| (f64::from(days) * multiplier).floor() as u32;
    let description = match kind {
        StrategyKind::Breakout => {
            "breakouts usually run 5 to 20 days before consolidating"
        }
        StrategyKind::Pullback => "stable trends can last months; hold until the death cross",
        StrategyKind::AccelerateHold | StrategyKind::AccelerateWarning => {
            "accelerations usually top out within 3 to 10 days; do not get greedy"
        }
        StrategyKind::ReversalLong | StrategyKind::ReversalShort => {
            "2B rebounds are short-lived; take profits within days"
        }
    };
    HoldingPeriod {
        min_days: scale(profile.min_days),
        target_days: scale(profile.target_days),
        max_days: scale(profile.max_days),
        description: description.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Evaluation {
    Excellent,
    Good,
    Acceptable,
    Poor,
    InsufficientData,
}

impl Evaluation {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 3.0 {
            Evaluation::Excellent
        } else if ratio >= 2.0 {
            Evaluation::Good
        } else if ratio >= 1.5 {
            Evaluation::Acceptable
        } else {
            Evaluation::Poor
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Evaluation::Excellent => "excellent",
            Evaluation::Good => "good",
            Evaluation::Acceptable => "acceptable",
            Evaluation::Poor => "poor",
            Evaluation::InsufficientData => "insufficient data",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRatio {
    pub level: usize,
    pub gain_pct: f64,
    pub loss_pct: f64,
    pub ratio: f64,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReward {
    /// Tier-1 gain over stop-loss distance.
    pub overall_ratio: f64,
    pub ratios_by_target: Vec<TargetRatio>,
    /// Sum of gain * probability, in percent.
    pub expected_value: f64,
    /// Stop distance times the tier-1 miss probability.
    pub expected_loss: f64,
    pub evaluation: Evaluation,
}

impl RiskReward {
    pub fn insufficient() -> Self {
        Self {
            overall_ratio: 0.0,
            ratios_by_target: Vec::new(),
            expected_value: 0.0,
            expected_loss: 0.0,
            evaluation: Evaluation::InsufficientData,
        }
    }
}

pub fn assess_risk_reward(targets: &[ProfitTarget], stop_loss_pct: Option<f64>) -> RiskReward {
    let (Some(first), Some(stop)) = (targets.first(), stop_loss_pct) else {
        return RiskReward::insufficient();
    };
    let ratios_by_target: Vec<TargetRatio> = targets
        .iter()
        .map(|t| TargetRatio {
            level: t.level,
            gain_pct: t.gain_pct,
            loss_pct: stop,
            ratio: if stop > 0.0 { t.gain_pct / stop } else { 0.0 },
            probability: t.probability,
        })
        .collect();
    let expected_value = ratios_by_target
        .iter()
        .map(|r| r.gain_pct * r.probability / 100.0)
        .sum();
    let overall_ratio = ratios_by_target[0].ratio;
    RiskReward {
        overall_ratio,
        expected_value,
        expected_loss: stop * (1.0 - first.probability),
        evaluation: Evaluation::from_ratio(overall_ratio),
        ratios_by_target,
    }
}

/// Facts about the setup that adjust the base success rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetupQuality {
    pub ma_density: Option<f64>,
    pub bull_aligned: bool,
    pub trend_strength: f64,
    pub volume_surge: bool,
}

/// Base rate plus additive adjustments, clamped to [0.10, 0.95].
pub fn success_probability(base_rate: f64, quality: &SetupQuality) -> f64 {
    let mut p = base_rate;
    if quality.ma_density.is_some_and(|d| d < 2.0) {
        p += 0.10;
    }
    if quality.bull_aligned {
        p += 0.05;
    }
    if quality.trend_strength > 0.7 {
        p += 0.08;
    } else if quality.trend_strength < 0.3 {
        p -= 0.10;
    }
    if quality.volume_surge {
        p += 0.05;
    }
    p.clamp(0.10, 0.95)
}

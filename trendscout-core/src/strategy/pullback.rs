//! Stable-trend pullback: buy a bull trend's return to a key MA.

use super::{Assessment, Priority, Strategy, StrategyContext, StrategyKind};
use crate::series::MaAlignment;

/// Upper bound of the additive score.
const MAX_SCORE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullbackStrategy;

impl Strategy for PullbackStrategy {
    fn name(&self) -> &'static str {
        "pullback"
    }

    fn assess(&self, ctx: &StrategyContext<'_>) -> Option<Assessment> {
        let signal = &ctx.signals.pullback;
        if !signal.has_signal {
            return None;
        }
        let period = signal.pullback_to?;
        let label = format!("MA{period}");

        let mut score = 0;
        let mut reasons = Vec::new();

        if ctx.trend.ma_alignment == MaAlignment::Bull {
            score += 20;
            reasons.push("clean bull alignment".to_string());
        }
        // 30 for the shortest MA, +10 per longer level
        if let Some(rank) = ctx.series.periods().iter().position(|&p| p == period) {
            score += 30 + 10 * rank as u32;
            reasons.push(format!("pullback to {label}"));
        }
        if signal.is_first_pullback {
            score += 15;
            reasons.push("first pullback to this MA".to_string());
        }
        if signal.safe_from_turn {
            score += 10;
            reasons.push(format!("price above the {label} discount price"));
        }
        if ctx.signals.top_bottom.double_bottom.is_some() {
            score += 15;
            reasons.push("double bottom".to_string());
        }
        let score = score.min(MAX_SCORE);

        if score < ctx.config.min_score {
            return None;
        }
        Some(Assessment {
            kind: StrategyKind::Pullback,
            priority: Priority::High,
            score,
            entry_signal: format!("pullback to {label}"),
            hold_signal: None,
            exit_signal: None,
            reasons,
            warnings: Vec::new(),
            signal_strength: signal.strength,
            stop_loss: None,
        })
    }
}

//! Accelerating uptrend: hold an existing position, never chase.
//!
//! Advisory only, so it is not gated by `min_score`: a clean trend yields a
//! hold (score 50), a double top or extreme bias yields a warning (score 0).

use super::{Assessment, Priority, Strategy, StrategyContext, StrategyKind};

const HOLD_SCORE: u32 = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccelerateHoldStrategy;

impl Strategy for AccelerateHoldStrategy {
    fn name(&self) -> &'static str {
        "accelerate_hold"
    }

    fn assess(&self, ctx: &StrategyContext<'_>) -> Option<Assessment> {
        let has_top = ctx.signals.top_bottom.double_top.is_some();
        let bias = ctx
            .series
            .longest_period()
            .and_then(|p| ctx.trend.bias(p))
            .unwrap_or(0.0);
        let extreme_bias = bias.abs() > ctx.config.extreme_bias_pct;
        let long_label = ctx
            .series
            .longest_period()
            .map_or_else(|| "long-term".to_string(), |p| format!("{p}-bar"));

        if has_top || extreme_bias {
            let mut warnings = Vec::new();
            if has_top {
                warnings.push("double top formed".to_string());
            }
            if extreme_bias {
                warnings.push(format!("{long_label} bias {bias:.1}%, severely stretched"));
            }
            return Some(Assessment {
                kind: StrategyKind::AccelerateWarning,
                priority: Priority::Warning,
                score: 0,
                entry_signal: "do not chase".to_string(),
                hold_signal: None,
                exit_signal: Some("watch for top structures and the death cross".to_string()),
                reasons: Vec::new(),
                warnings,
                signal_strength: 0,
                stop_loss: None,
            });
        }

        Some(Assessment {
            kind: StrategyKind::AccelerateHold,
            priority: Priority::Low,
            score: HOLD_SCORE,
            entry_signal: "do not chase".to_string(),
            hold_signal: Some("keep existing positions".to_string()),
            exit_signal: Some("wait for the death cross or a top structure".to_string()),
            reasons: vec![
                "accelerating advance".to_string(),
                "no top structure yet".to_string(),
                format!("{long_label} bias {bias:.1}%, not extreme"),
            ],
            warnings: Vec::new(),
            signal_strength: 0,
            stop_loss: None,
        })
    }
}

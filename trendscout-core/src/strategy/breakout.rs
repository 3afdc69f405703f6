//! Dense-zone breakout: buy the first bull fan-out of tight MAs.

use super::{Assessment, Priority, Strategy, StrategyContext, StrategyKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BreakoutStrategy;

impl Strategy for BreakoutStrategy {
    fn name(&self) -> &'static str {
        "breakout"
    }

    fn assess(&self, ctx: &StrategyContext<'_>) -> Option<Assessment> {
        let signal = &ctx.signals.breakout;
        if !signal.has_signal {
            return None;
        }

        let mut score = 0;
        let mut reasons = Vec::new();

        if signal.is_dense {
            score += 30;
            let density = ctx.trend.ma_density.unwrap_or(f64::NAN);
            reasons.push(format!("MA density {density:.2}%"));
        }
        if signal.is_bull_aligned {
            score += 25;
            if signal.just_aligned {
                score += 10;
                reasons.push("bull alignment just formed".to_string());
            } else {
                reasons.push("bull alignment".to_string());
            }
        }
        if signal.price_above_ma20 {
            score += 15;
            reasons.push("price above MA20".to_string());
        }
        if signal.volume_surge {
            score += 10;
            reasons.push("volume expanding".to_string());
        }
        let best_ratio = ctx
            .trend
            .risk_reward_ratios
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        if best_ratio > ctx.config.rr_bonus_ratio {
            score += 20;
            reasons.push(format!("risk/reward {best_ratio:.1}:1"));
        }

        if score < ctx.config.min_score {
            return None;
        }
        Some(Assessment {
            kind: StrategyKind::Breakout,
            priority: Priority::High,
            score,
            entry_signal: "price above MA20 with dense MAs".to_string(),
            hold_signal: None,
            exit_signal: None,
            reasons,
            warnings: Vec::new(),
            signal_strength: signal.strength,
            stop_loss: None,
        })
    }
}

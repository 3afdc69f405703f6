//! 2B reversal: trade the snap-back after a failed break of a prior extreme.
//!
//! Short-term only, and consulted after the trend-type playbook. A bullish
//! 2B is scored and gated by `min_score`, with the stop under the 2B low.
//! A bearish 2B is an ungated warning to lighten longs.

use super::{Assessment, Priority, Strategy, StrategyContext, StrategyKind};
use crate::series::MaAlignment;
use crate::signals::TwoBStructure;

const BASE_SCORE: u32 = 40;
/// Overshoot (%) of the prior extreme that earns the depth bonus.
const DEEP_BREAK_PCT: f64 = 3.0;
/// Rebound (%) off the recent extreme that earns the recovery bonus.
const STRONG_RECOVERY_PCT: f64 = 3.0;
/// |Bias| (%) on the longest MA beyond which the price counts as stretched.
const STRETCHED_BIAS_PCT: f64 = 10.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReversalStrategy;

impl Strategy for ReversalStrategy {
    fn name(&self) -> &'static str {
        "reversal"
    }

    fn assess(&self, ctx: &StrategyContext<'_>) -> Option<Assessment> {
        let report = &ctx.signals.two_b;
        if let Some(long) = report.bullish.as_ref().and_then(|b| bullish(ctx, b)) {
            return Some(long);
        }
        report.bearish.as_ref().map(|b| bearish(ctx, b))
    }
}

fn longest_bias(ctx: &StrategyContext<'_>) -> Option<(usize, f64)> {
    let period = ctx.series.longest_period()?;
    ctx.trend.bias(period).map(|b| (period, b))
}

fn bullish(ctx: &StrategyContext<'_>, two_b: &TwoBStructure) -> Option<Assessment> {
    let mut score = BASE_SCORE;
    let mut reasons = vec![format!(
        "bullish 2B: undercut {:.2} to {:.2} and closed back above it",
        two_b.prior_extreme, two_b.recent_extreme
    )];

    if two_b.break_pct > DEEP_BREAK_PCT {
        score += 10;
        reasons.push(format!("undercut of {:.1}% flushed the prior low", two_b.break_pct));
    }
    if two_b.reversal_pct > STRONG_RECOVERY_PCT {
        score += 10;
        reasons.push(format!("rebounded {:.1}% off the low", two_b.reversal_pct));
    }
    if let Some((period, bias)) = longest_bias(ctx).filter(|(_, b)| *b < -STRETCHED_BIAS_PCT) {
        score += 20;
        reasons.push(format!("MA{period} bias {bias:.1}%, stretched to the downside"));
    }
    let last = ctx.series.len().checked_sub(1);
    if last.is_some_and(|i| ctx.series.is_high_volume(i)) {
        score += 10;
        reasons.push("rebound on expanding volume".to_string());
    }
    if ctx.trend.ma_alignment != MaAlignment::Bear {
        score += 10;
        reasons.push("MAs not in bear alignment".to_string());
    }

    if score < ctx.config.min_score {
        return None;
    }
    Some(Assessment {
        kind: StrategyKind::ReversalLong,
        priority: Priority::Medium,
        score,
        entry_signal: "after the 2B is confirmed".to_string(),
        hold_signal: None,
        exit_signal: Some(format!("close below the 2B low {:.2}", two_b.recent_extreme)),
        reasons,
        warnings: vec!["short-term rebound only, not a trend reversal".to_string()],
        signal_strength: score,
        stop_loss: Some(two_b.recent_extreme),
    })
}

fn bearish(ctx: &StrategyContext<'_>, two_b: &TwoBStructure) -> Assessment {
    let mut reasons = vec![format!(
        "bearish 2B: pushed above {:.2} to {:.2} and fell back below it",
        two_b.prior_extreme, two_b.recent_extreme
    )];
    if let Some((period, bias)) = longest_bias(ctx).filter(|(_, b)| *b > STRETCHED_BIAS_PCT) {
        reasons.push(format!("MA{period} bias {bias:.1}%, stretched to the upside"));
    }
    Assessment {
        kind: StrategyKind::ReversalShort,
        priority: Priority::Warning,
        score: 0,
        entry_signal: "do not buy".to_string(),
        hold_signal: None,
        exit_signal: Some(format!(
            "lighten longs; a close back above {:.2} negates the signal",
            two_b.recent_extreme
        )),
        reasons,
        warnings: vec!["short-term pullback only, not a trend reversal".to_string()],
        signal_strength: 0,
        stop_loss: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategyConfig;
    use crate::signals::{TwoBKind, TwoBReport};
    use crate::strategy::fixtures::analyze;

    fn structure(kind: TwoBKind, prior: f64, recent: f64, current: f64) -> TwoBStructure {
        let (break_pct, reversal_pct) = match kind {
            TwoBKind::Bullish => (
                (prior - recent) / prior * 100.0,
                (current - recent) / recent * 100.0,
            ),
            TwoBKind::Bearish => (
                (recent - prior) / prior * 100.0,
                (recent - current) / recent * 100.0,
            ),
        };
        TwoBStructure {
            kind,
            prior_extreme: prior,
            recent_extreme: recent,
            current_price: current,
            break_pct,
            reversal_pct,
        }
    }

    #[test]
    fn no_two_b_no_assessment() {
        let f = analyze(&[50.0; 260]);
        assert!(!f.signals.two_b.found());
        assert!(ReversalStrategy.assess(&f.ctx()).is_none());
    }

    #[test]
    fn bullish_two_b_scores_additively() {
        let mut f = analyze(&[50.0; 260]);
        f.signals.two_b = TwoBReport {
            bullish: Some(structure(TwoBKind::Bullish, 98.0, 94.0, 99.0)),
            bearish: None,
        };
        f.config.strategy = StrategyConfig {
            min_score: 0,
            ..StrategyConfig::default()
        };
        // base 40 + deep undercut 10 + rebound 10 + flat MAs are not bear 10
        let a = ReversalStrategy.assess(&f.ctx()).unwrap();
        assert_eq!(a.kind, StrategyKind::ReversalLong);
        assert_eq!(a.priority, Priority::Medium);
        assert_eq!(a.score, 70);
        assert_eq!(a.stop_loss, Some(94.0));
        assert_eq!(a.reasons.len(), 4);
        assert!(a.warnings[0].starts_with("short-term rebound only"));

        // shallow undercut and rebound only earn the base and alignment
        f.signals.two_b.bullish = Some(structure(TwoBKind::Bullish, 98.0, 96.5, 98.5));
        assert_eq!(ReversalStrategy.assess(&f.ctx()).unwrap().score, 50);
    }

    #[test]
    fn bullish_below_min_score_is_dropped() {
        let mut f = analyze(&[50.0; 260]);
        f.signals.two_b.bullish = Some(structure(TwoBKind::Bullish, 98.0, 96.5, 98.5));
        assert!(ReversalStrategy.assess(&f.ctx()).is_none());
    }

    #[test]
    fn bearish_two_b_is_an_ungated_warning() {
        let mut f = analyze(&[50.0; 260]);
        f.signals.two_b.bearish = Some(structure(TwoBKind::Bearish, 110.0, 116.0, 105.0));
        f.config.strategy = StrategyConfig {
            min_score: 100,
            ..StrategyConfig::default()
        };
        let a = ReversalStrategy.assess(&f.ctx()).unwrap();
        assert_eq!(a.kind, StrategyKind::ReversalShort);
        assert_eq!(a.priority, Priority::Warning);
        assert_eq!(a.score, 0);
        assert_eq!(a.stop_loss, None);
    }
}

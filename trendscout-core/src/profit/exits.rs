//! Exit-signal catalog per strategy, with live trigger status from the
//! latest bar.

use serde::{Deserialize, Serialize};

use crate::config::SignalConfig;
use crate::series::{Column, EnrichedSeries};
use crate::signals::detect_top_bottom;
use crate::strategy::StrategyKind;
use crate::trend::TrendClassification;

/// MA20 within this factor of MA60 after being above it counts as an
/// approaching death cross.
const APPROACHING_CROSS: f64 = 1.02;

/// Bars a breakout may go without a higher close before it stalls.
const STALL_BARS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitSignalKind {
    StopLoss,
    FalseBreakout,
    DeathCross,
    Stall,
    TargetHit,
    MaTurnDown,
    DiscountBreak,
    ThreeStepConfirm,
    TopPattern,
    KeyReversal,
    Ma20TurnDown,
    ExtremeBias,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    #[default]
    Normal,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExitStatus {
    pub triggered: bool,
    pub urgency: Urgency,
}

impl ExitStatus {
    fn when(triggered: bool, urgency: Urgency) -> Self {
        Self {
            triggered,
            urgency: if triggered { urgency } else { Urgency::Normal },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitSignal {
    pub kind: ExitSignalKind,
    pub trigger: String,
    pub condition: String,
    pub priority: String,
    pub action: String,
    pub status: ExitStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExitSignals {
    pub signals: Vec<ExitSignal>,
    pub active_warnings: Vec<ExitSignalKind>,
}

impl ExitSignals {
    pub fn get(&self, kind: ExitSignalKind) -> Option<&ExitSignal> {
        self.signals.iter().find(|s| s.kind == kind)
    }

    pub fn is_triggered(&self, kind: ExitSignalKind) -> bool {
        self.get(kind).is_some_and(|s| s.status.triggered)
    }
}

/// Exit conditions that apply to `kind`, stop-loss first.
pub fn catalog(kind: StrategyKind) -> Vec<ExitSignalKind> {
    use ExitSignalKind::*;
    let specific: &[ExitSignalKind] = match kind {
        StrategyKind::Breakout => &[FalseBreakout, DeathCross, Stall, TargetHit],
        StrategyKind::Pullback => &[
            MaTurnDown,
            DeathCross,
            DiscountBreak,
            ThreeStepConfirm,
            TargetHit,
        ],
        StrategyKind::AccelerateHold | StrategyKind::AccelerateWarning => &[
            TopPattern,
            KeyReversal,
            Ma20TurnDown,
            DeathCross,
            ExtremeBias,
        ],
        StrategyKind::ReversalLong | StrategyKind::ReversalShort => {
            &[TargetHit, Stall, KeyReversal]
        }
    };
    std::iter::once(StopLoss).chain(specific.iter().copied()).collect()
}

/// Inputs the trigger rules read, gathered once.
pub(crate) struct ExitContext<'a> {
    pub series: &'a EnrichedSeries,
    pub trend: &'a TrendClassification,
    pub first_target: Option<f64>,
    pub extreme_bias_pct: f64,
    pub pattern: &'a SignalConfig,
}

/// Catalog for `kind` with each entry's status evaluated.
pub(crate) fn generate(kind: StrategyKind, ctx: &ExitContext<'_>) -> ExitSignals {
    let signals: Vec<ExitSignal> = catalog(kind)
        .into_iter()
        .map(|k| {
            let (trigger, condition, priority, action) = describe(k, kind, ctx);
            ExitSignal {
                kind: k,
                trigger: trigger.to_string(),
                condition,
                priority: priority.to_string(),
                action: action.to_string(),
                status: evaluate(k, ctx),
            }
        })
        .collect();
    let active_warnings = signals
        .iter()
        .filter(|s| s.status.triggered)
        .map(|s| s.kind)
        .collect();
    ExitSignals {
        signals,
        active_warnings,
    }
}

fn describe(
    k: ExitSignalKind,
    strategy: StrategyKind,
    ctx: &ExitContext<'_>,
) -> (&'static str, String, &'static str, &'static str) {
    use ExitSignalKind::*;
    match k {
        StopLoss => {
            let stop = ctx.trend.stop_loss.as_ref().map_or(0.0, |s| s.price);
            (
                "stop loss",
                format!("price closes below {stop:.2}"),
                "mandatory",
                "exit immediately",
            )
        }
        FalseBreakout => (
            "false breakout",
            "price falls back into the dense zone and below MA20".into(),
            "exit immediately",
            "cut the position, the breakout failed",
        ),
        DeathCross => (
            "death cross",
            "MA20 crosses below MA60".into(),
            "must exit",
            if matches!(strategy, StrategyKind::AccelerateHold | StrategyKind::AccelerateWarning) {
                "the acceleration is over, close everything"
            } else {
                "bull alignment broken, close the position"
            },
        ),
        Stall => (
            "stall",
            format!("no higher close within {STALL_BARS} bars of the breakout"),
            "exit proactively",
            "the breakout did not follow through",
        ),
        TargetHit => (
            "target reached",
            "price reaches a target level".into(),
            "scale out",
            if strategy == StrategyKind::Pullback {
                "sell 20% at target 1, 30% at target 2, hold the rest"
            } else {
                "sell 30% at target 1, 40% at target 2, the rest at target 3"
            },
        ),
        MaTurnDown => (
            "MA turning down",
            "MA60 or MA120 starts to turn down".into(),
            "watch",
            "the trend may be changing, prepare to exit",
        ),
        DiscountBreak => (
            "discount price broken",
            "price falls below the MA120 discount price".into(),
            "exit immediately",
            "MA120 is about to change direction",
        ),
        ThreeStepConfirm => (
            "three-step confirmation",
            "break of the key MA, MA turns down, then the cross".into(),
            "highest certainty",
            "reversal confirmed, close the position",
        ),
        TopPattern => (
            "top pattern",
            "double top or similar top structure".into(),
            "high alert",
            "be ready to exit at any time",
        ),
        KeyReversal => (
            "key reversal",
            "price breaks below MA20 from above".into(),
            "prepare to exit",
            "watch whether MA20 turns down",
        ),
        Ma20TurnDown => (
            "MA20 turning down",
            "price below the MA20 discount price".into(),
            "exit now",
            "short-term trend changed, cut half",
        ),
        ExtremeBias => (
            "extreme bias",
            format!("|Bias120| above {:.0}%", ctx.extreme_bias_pct),
            "reduce now",
            "sentiment at an extreme, reduce by at least 70%",
        ),
    }
}

fn evaluate(k: ExitSignalKind, ctx: &ExitContext<'_>) -> ExitStatus {
    use ExitSignalKind::*;
    let series = ctx.series;
    let Some(last) = series.len().checked_sub(1) else {
        return ExitStatus::default();
    };
    let Some(price) = series.current_price() else {
        return ExitStatus::default();
    };
    let short = series.shortest_period().unwrap_or(20);
    let mid = series.middle_period().unwrap_or(60);
    let long = series.longest_period().unwrap_or(120);
    let ma = |p: usize, i: usize| series.value(Column::Ma(p), i);
    let discount = |p: usize| series.discount(p).last().copied().filter(|v| !v.is_nan());
    let below = |level: Option<f64>| level.is_some_and(|l| price < l);

    match k {
        StopLoss => {
            let hit = ctx.trend.stop_loss.as_ref().is_some_and(|s| price < s.price);
            ExitStatus::when(hit, Urgency::Critical)
        }
        DeathCross => {
            let (Some(fast), Some(slow)) = (ma(short, last), ma(mid, last)) else {
                return ExitStatus::default();
            };
            let dead = fast < slow;
            let approaching = last > 0
                && matches!((ma(short, last - 1), ma(mid, last - 1)), (Some(pf), Some(ps)) if pf > ps)
                && fast < slow * APPROACHING_CROSS;
            let urgency = if dead { Urgency::Critical } else { Urgency::High };
            ExitStatus::when(dead || approaching, urgency)
        }
        FalseBreakout => {
            let hit = below(ma(short, last)) && series.is_dense(last);
            ExitStatus::when(hit, Urgency::Critical)
        }
        Stall => {
            let hit = last >= STALL_BARS
                && matches!(series.price(last - STALL_BARS), Some(before) if price <= before);
            ExitStatus::when(hit, Urgency::High)
        }
        TargetHit => {
            let hit = ctx.first_target.is_some_and(|t| price >= t);
            ExitStatus::when(hit, Urgency::High)
        }
        MaTurnDown => {
            let hit = below(discount(mid)) || below(discount(long));
            ExitStatus::when(hit, Urgency::High)
        }
        DiscountBreak => ExitStatus::when(below(discount(long)), Urgency::Critical),
        ThreeStepConfirm => {
            let crossed = matches!((ma(short, last), ma(mid, last)), (Some(a), Some(b)) if a < b);
            let hit = below(ma(short, last)) && below(discount(short)) && crossed;
            ExitStatus::when(hit, Urgency::Critical)
        }
        TopPattern => {
            let hit = detect_top_bottom(&series.prices(), ctx.pattern)
                .double_top
                .is_some();
            ExitStatus::when(hit, Urgency::High)
        }
        KeyReversal => {
            let was_above = last > 0
                && matches!(
                    (series.price(last - 1), ma(short, last - 1)),
                    (Some(p), Some(m)) if p >= m
                );
            ExitStatus::when(below(ma(short, last)) && was_above, Urgency::High)
        }
        Ma20TurnDown => ExitStatus::when(below(discount(short)), Urgency::Critical),
        ExtremeBias => {
            let hit = series
                .latest(Column::Bias(long))
                .or_else(|| ctx.trend.bias(long))
                .is_some_and(|b| b.abs() > ctx.extreme_bias_pct);
            ExitStatus::when(hit, Urgency::High)
        }
    }
}

//! ProfitPredictor: targets, exits, holding period, risk/reward and success
//! probability for a chosen strategy.

pub mod exits;
pub mod risk;
pub mod targets;

pub use exits::{catalog, ExitSignal, ExitSignalKind, ExitSignals, ExitStatus, Urgency};
pub use risk::{Evaluation, HoldingPeriod, RiskReward, SetupQuality, TargetRatio};
pub use targets::ProfitTarget;

use serde::{Deserialize, Serialize};
use tracing::{debug, Span};

use crate::config::{ProfitConfig, SignalConfig};
use crate::series::{EnrichedSeries, MaAlignment};
use crate::strategy::StrategyKind;
use crate::trend::TrendClassification;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitPrediction {
    pub strategy: StrategyKind,
    pub current_price: f64,
    pub targets: Vec<ProfitTarget>,
    /// Gain of the last tier, in percent.
    pub expected_total_gain: f64,
    pub exit_signals: ExitSignals,
    pub holding_period: HoldingPeriod,
    pub risk_reward: RiskReward,
    pub success_probability: f64,
    pub recommendation_text: String,
}

#[derive(Debug, Clone)]
pub struct ProfitPredictor {
    config: ProfitConfig,
    patterns: SignalConfig,
    span: Span,
}

impl ProfitPredictor {
    pub fn new(config: ProfitConfig) -> Self {
        Self {
            config,
            patterns: SignalConfig::default(),
            span: Span::none(),
        }
    }

    /// Pattern settings used by the top-pattern exit check.
    pub fn with_patterns(mut self, patterns: SignalConfig) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &ProfitConfig {
        &self.config
    }

    pub fn predict(
        &self,
        kind: StrategyKind,
        current_price: f64,
        series: &EnrichedSeries,
        trend: &TrendClassification,
    ) -> ProfitPrediction {
        let profile = self.config.profile(kind);

        let targets = targets::calculate_targets(
            profile,
            &self.config,
            current_price,
            series.latest_atr(),
            &trend.targets,
        );

        let ctx = exits::ExitContext {
            series,
            trend,
            first_target: targets.first().map(|t| t.price),
            extreme_bias_pct: self.config.exit_extreme_bias_pct,
            pattern: &self.patterns,
        };
        let exit_signals = exits::generate(kind, &ctx);

        let holding_period = risk::holding_period(kind, profile, trend.trend_strength);
        let risk_reward = risk::assess_risk_reward(&targets, trend.stop_loss_pct());

        let quality = SetupQuality {
            ma_density: trend.ma_density,
            bull_aligned: trend.ma_alignment == MaAlignment::Bull,
            trend_strength: trend.trend_strength,
            volume_surge: series
                .len()
                .checked_sub(1)
                .is_some_and(|i| series.is_high_volume(i)),
        };
        let success_probability = risk::success_probability(profile.success_rate, &quality);

        let expected_total_gain = targets.last().map_or(0.0, |t| t.gain_pct);
        let recommendation_text =
            recommendation_text(&targets, &exit_signals, &risk_reward, success_probability);

        debug!(
            parent: &self.span,
            strategy = %kind,
            expected_total_gain,
            success_probability,
            active_exits = exit_signals.active_warnings.len(),
            "profit predicted"
        );

        ProfitPrediction {
            strategy: kind,
            current_price,
            targets,
            expected_total_gain,
            exit_signals,
            holding_period,
            risk_reward,
            success_probability,
            recommendation_text,
        }
    }
}

fn recommendation_text(
    targets: &[ProfitTarget],
    exits: &ExitSignals,
    risk_reward: &RiskReward,
    success_probability: f64,
) -> String {
    let mut lines = Vec::with_capacity(4);
    if risk_reward.overall_ratio >= 2.0 {
        lines.push("Risk/reward is attractive, participation is reasonable.".to_string());
    } else {
        lines.push("Risk/reward is mediocre, participate with caution.".to_string());
    }

    let pct = success_probability * 100.0;
    lines.push(if success_probability >= 0.7 {
        format!("High success probability ({pct:.0}%), standard position size.")
    } else if success_probability >= 0.5 {
        format!("Moderate success probability ({pct:.0}%), half position.")
    } else {
        format!("Low success probability ({pct:.0}%), light position or stay out.")
    });

    if exits.active_warnings.is_empty() {
        lines.push("No exit signal active, the position can be held.".to_string());
    } else {
        let names: Vec<String> = exits
            .active_warnings
            .iter()
            .filter_map(|k| exits.get(*k).map(|s| s.trigger.clone()))
            .collect();
        lines.push(format!("Exit signals active: {}.", names.join(", ")));
    }

    if let [first, second, ..] = targets {
        lines.push(format!(
            "Scale out: reduce 30% at target 1 ({:.1}%), 50% at target 2 ({:.1}%).",
            first.gain_pct, second.gain_pct
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IndicatorConfig, TrendConfig};
    use crate::indicators::{make_bars, IndicatorEngine};
    use crate::trend::TrendClassifier;

    fn predict(kind: StrategyKind, closes: &[f64]) -> ProfitPrediction {
        let series = IndicatorEngine::new(IndicatorConfig::default())
            .enrich(&make_bars(closes))
            .unwrap();
        let trend = TrendClassifier::new(TrendConfig::default()).classify(&series);
        ProfitPredictor::new(ProfitConfig::default()).predict(
            kind,
            trend.current_price,
            &series,
            &trend,
        )
    }

    #[test]
    fn pullback_prediction_is_complete() {
        let closes: Vec<f64> = (0..260).map(|i| 100.0 + 0.25 * i as f64).collect();
        let p = predict(StrategyKind::Pullback, &closes);
        assert_eq!(p.targets.len(), 3);
        assert!(p.targets.windows(2).all(|w| w[0].price < w[1].price));
        assert!(p.targets.windows(2).all(|w| w[0].probability > w[1].probability));
        assert_eq!(p.expected_total_gain, p.targets[2].gain_pct);
        assert_eq!(p.exit_signals.signals.len(), 6);
        assert!(p.holding_period.min_days <= p.holding_period.max_days);
        assert!((0.10..=0.95).contains(&p.success_probability));
        assert_ne!(p.risk_reward.evaluation, Evaluation::InsufficientData);
        assert!(p.recommendation_text.contains("Scale out"));
    }

    #[test]
    fn prediction_serializes() {
        let closes: Vec<f64> = (0..260).map(|i| 100.0 + 0.25 * i as f64).collect();
        let p = predict(StrategyKind::Breakout, &closes);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["strategy"], "breakout");
        assert!(json["exit_signals"]["signals"].is_array());
        assert!(json["exit_signals"]["active_warnings"].is_array());
        assert!(json["holding_period"]["target_days"].is_u64());
    }

    #[test]
    fn active_exits_named_in_text() {
        let mut closes: Vec<f64> = (0..200).map(|i| 100.0 + 0.5 * i as f64).collect();
        closes.extend((1..=60).map(|i| 199.5 - 1.5 * i as f64));
        let p = predict(StrategyKind::Pullback, &closes);
        assert!(!p.exit_signals.active_warnings.is_empty());
        assert!(p.recommendation_text.contains("death cross"));
    }
}

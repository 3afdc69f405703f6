//! TrendScout Core: technical-analysis signal engine.
//!
//! One symbol's daily bars flow through:
//! - IndicatorEngine: moving averages, discount prices, bias, slope, ATR,
//!   volume ratios and MA structure, collected in an [`EnrichedSeries`]
//! - TrendClassifier: trend type and phase, dense-zone targets, stop loss
//! - SignalDetector: 2B reversals, dense-zone breakouts, MA pullbacks,
//!   double tops and bottoms
//! - Strategy: one playbook per tradable trend type, scored 0 to 100
//! - ProfitPredictor: tiered targets, exit rules, holding period,
//!   risk/reward and success probability
//!
//! [`StrategyOrchestrator`] wires the stages together and ranks results.
//! The crate does no I/O and spawns no threads.

pub mod config;
pub mod domain;
pub mod indicators;
pub mod orchestrator;
pub mod profit;
pub mod series;
pub mod signals;
pub mod strategy;
pub mod trend;

pub use config::{ConfigError, EngineConfig};
pub use domain::{PriceBar, Symbol};
pub use orchestrator::{rank, AnalysisError, AnalysisSummary, StrategyOrchestrator, SymbolAnalysis};
pub use series::{EnrichedSeries, SeriesError};
pub use strategy::{Recommendation, StrategyKind};

#[cfg(test)]
mod tests {
    use super::*;

    /// The runner analyzes symbols on a rayon pool, so every stage and
    /// every output must cross threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<PriceBar>();
        require_sync::<PriceBar>();
        require_send::<EnrichedSeries>();
        require_sync::<EnrichedSeries>();
        require_send::<EngineConfig>();
        require_sync::<EngineConfig>();

        require_send::<indicators::IndicatorEngine>();
        require_sync::<indicators::IndicatorEngine>();
        require_send::<trend::TrendClassifier>();
        require_sync::<trend::TrendClassifier>();
        require_send::<signals::SignalDetector>();
        require_sync::<signals::SignalDetector>();
        require_send::<profit::ProfitPredictor>();
        require_sync::<profit::ProfitPredictor>();
        require_send::<StrategyOrchestrator>();
        require_sync::<StrategyOrchestrator>();

        require_send::<trend::TrendClassification>();
        require_sync::<trend::TrendClassification>();
        require_send::<signals::SignalReport>();
        require_sync::<signals::SignalReport>();
        require_send::<profit::ProfitPrediction>();
        require_sync::<profit::ProfitPrediction>();
        require_send::<Recommendation>();
        require_sync::<Recommendation>();
        require_send::<AnalysisError>();
        require_sync::<AnalysisError>();
    }

    /// Strategies take an immutable context and return a fresh assessment;
    /// they never see another symbol's data.
    #[test]
    fn strategy_trait_is_object_safe() {
        fn _assess(
            s: &dyn strategy::Strategy,
            ctx: &strategy::StrategyContext<'_>,
        ) -> Option<strategy::Assessment> {
            s.assess(ctx)
        }
    }
}

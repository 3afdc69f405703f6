//! StrategyOrchestrator: the single-symbol pipeline.
//!
//! bars -> IndicatorEngine -> {TrendClassifier, SignalDetector} -> Strategy
//! -> ProfitPredictor -> Recommendation. Pure computation; batch fan-out
//! lives in the runner crate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Span};

use crate::config::EngineConfig;
use crate::domain::{PriceBar, Symbol};
use crate::indicators::IndicatorEngine;
use crate::profit::ProfitPredictor;
use crate::series::SeriesError;
use crate::signals::{SignalDetector, SignalKind};
use crate::strategy::{Recommendation, SelectedStrategy, Strategy, StrategyContext};
use crate::trend::{TrendClassifier, TrendPhase, TrendType};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{symbol}: {source}")]
    Series {
        symbol: Symbol,
        #[source]
        source: SeriesError,
    },
}

impl AnalysisError {
    pub fn symbol(&self) -> &str {
        match self {
            AnalysisError::Series { symbol, .. } => symbol,
        }
    }
}

/// What the pipeline saw for one symbol, recommendation or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub symbol: Symbol,
    pub bars: usize,
    pub as_of: Option<NaiveDate>,
    pub trend_type: TrendType,
    pub trend_phase: TrendPhase,
    pub active_signals: Vec<SignalKind>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolAnalysis {
    pub summary: AnalysisSummary,
    pub recommendation: Option<Recommendation>,
}

#[derive(Debug, Clone)]
pub struct StrategyOrchestrator {
    config: EngineConfig,
    engine: IndicatorEngine,
    classifier: TrendClassifier,
    detector: SignalDetector,
    predictor: ProfitPredictor,
    span: Span,
}

impl StrategyOrchestrator {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            engine: IndicatorEngine::new(config.indicators.clone()),
            classifier: TrendClassifier::new(config.trend.clone()),
            detector: SignalDetector::new(config.signals.clone()),
            predictor: ProfitPredictor::new(config.profit.clone())
                .with_patterns(config.signals.clone()),
            config,
            span: Span::none(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Recommendation for one symbol, `Ok(None)` when the data is too short
    /// or the setup does not qualify.
    pub fn analyze_symbol(
        &self,
        symbol: &str,
        bars: &[PriceBar],
    ) -> Result<Option<Recommendation>, AnalysisError> {
        self.analyze(symbol, bars).map(|a| a.recommendation)
    }

    /// Full pipeline for one symbol, keeping the summary even when no
    /// recommendation comes out.
    pub fn analyze(&self, symbol: &str, bars: &[PriceBar]) -> Result<SymbolAnalysis, AnalysisError> {
        let span = info_span!(parent: &self.span, "analyze", symbol = %symbol);
        let mut summary = AnalysisSummary {
            symbol: symbol.to_string(),
            bars: bars.len(),
            as_of: bars.last().map(|b| b.date),
            trend_type: TrendType::Undefined,
            trend_phase: TrendPhase::Undefined,
            active_signals: Vec::new(),
        };

        let required = self.config.strategy.min_data_points;
        if bars.len() < required {
            warn!(parent: &span, bars = bars.len(), required, "insufficient data, skipped");
            return Ok(SymbolAnalysis {
                summary,
                recommendation: None,
            });
        }

        let series = self
            .engine
            .clone()
            .with_span(span.clone())
            .enrich(bars)
            .map_err(|source| AnalysisError::Series {
                symbol: symbol.to_string(),
                source,
            })?;
        let trend = self.classifier.clone().with_span(span.clone()).classify(&series);
        let signals = self.detector.clone().with_span(span.clone()).detect_all(&series);

        summary.trend_type = trend.trend_type;
        summary.trend_phase = trend.trend_phase;
        summary.active_signals = signals.active.clone();
        info!(
            parent: &span,
            trend_type = %trend.trend_type,
            trend_phase = %trend.trend_phase,
            signals = ?signals.active,
            "analysis complete"
        );

        let ctx = StrategyContext {
            series: &series,
            trend: &trend,
            signals: &signals,
            config: &self.config.strategy,
        };
        let assessment = SelectedStrategy::candidates(trend.trend_type).find_map(|strategy| {
            let assessment = strategy.assess(&ctx);
            if assessment.is_none() {
                debug!(parent: &span, strategy = strategy.name(), "setup did not qualify");
            }
            assessment
        });
        let Some(assessment) = assessment else {
            return Ok(SymbolAnalysis {
                summary,
                recommendation: None,
            });
        };
        let trend = match assessment.stop_loss {
            Some(price) => trend.with_structure_stop(price),
            None => trend,
        };

        let prediction = self.predictor.clone().with_span(span.clone()).predict(
            assessment.kind,
            trend.current_price,
            &series,
            &trend,
        );
        let recommendation = Recommendation::assemble(symbol, &trend, assessment, prediction);
        info!(
            parent: &span,
            strategy = %recommendation.strategy,
            score = recommendation.score,
            "recommendation produced"
        );

        Ok(SymbolAnalysis {
            summary,
            recommendation: Some(recommendation),
        })
    }

    /// Sort by score descending (ties by symbol) and keep the configured
    /// maximum.
    pub fn rank(&self, recommendations: Vec<Recommendation>) -> Vec<Recommendation> {
        rank(recommendations, self.config.strategy.max_recommendations)
    }
}

pub fn rank(mut recommendations: Vec<Recommendation>, max: usize) -> Vec<Recommendation> {
    recommendations.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.symbol.cmp(&b.symbol)));
    recommendations.truncate(max);
    recommendations
}

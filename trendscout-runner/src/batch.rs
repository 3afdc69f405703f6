//! Batch ranking: one independent pipeline per symbol, fanned out on rayon.
//!
//! A symbol that fails to load or analyze is logged and excluded; the rest
//! of the batch is unaffected, including when its analysis panics.
//! Survivors are ranked by score.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, info_span, warn, Span};

use trendscout_core::orchestrator::rank;
use trendscout_core::{
    AnalysisError, AnalysisSummary, EngineConfig, Recommendation, StrategyOrchestrator, Symbol,
    SymbolAnalysis,
};

use crate::config::{ConfigError, RunConfig};
use crate::data_loader::{load_directory, LoadError, LoadedUniverse, SymbolSeries};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Load,
    Analysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub symbol: Symbol,
    pub stage: FailureStage,
    pub error: String,
}

/// Per-symbol result of the fan-out.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolOutcome {
    Analyzed {
        summary: AnalysisSummary,
        recommendation: Option<Recommendation>,
    },
    Failed {
        symbol: Symbol,
        error: String,
    },
}

impl From<Result<SymbolAnalysis, AnalysisError>> for SymbolOutcome {
    fn from(result: Result<SymbolAnalysis, AnalysisError>) -> Self {
        match result {
            Ok(a) => SymbolOutcome::Analyzed {
                summary: a.summary,
                recommendation: a.recommendation,
            },
            Err(e) => SymbolOutcome::Failed {
                symbol: e.symbol().to_string(),
                error: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub generated_at: DateTime<Utc>,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    /// Every symbol that went through the pipeline, in symbol order.
    pub analyzed: Vec<AnalysisSummary>,
    pub failures: Vec<BatchFailure>,
    /// Ranked, truncated to `max_recommendations`.
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone)]
pub struct BatchRunner {
    orchestrator: StrategyOrchestrator,
    threads: usize,
    span: Span,
}

impl BatchRunner {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            orchestrator: StrategyOrchestrator::new(config),
            threads: 0,
            span: Span::none(),
        }
    }

    /// Run in a dedicated pool of `threads` workers; 0 uses the global pool.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Analyze every loaded series and rank the recommendations.
    pub fn run(&self, universe: &LoadedUniverse) -> Result<BatchReport, RunError> {
        let span = info_span!(parent: &self.span, "batch", symbols = universe.series.len());
        let orchestrator = self.orchestrator.clone().with_span(span.clone());

        let analyze_all = || -> Vec<SymbolOutcome> {
            universe
                .series
                .par_iter()
                .map(|s: &SymbolSeries| {
                    isolated(&s.symbol, || orchestrator.analyze(&s.symbol, &s.bars))
                })
                .collect()
        };
        let outcomes = if self.threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(self.threads)
                .build()?
                .install(analyze_all)
        } else {
            analyze_all()
        };

        let mut failures: Vec<BatchFailure> = universe
            .failures
            .iter()
            .map(|f| BatchFailure {
                symbol: f.symbol.clone(),
                stage: FailureStage::Load,
                error: f.error.to_string(),
            })
            .collect();
        let mut analyzed = Vec::with_capacity(outcomes.len());
        let mut recommendations = Vec::new();
        for outcome in outcomes {
            match outcome {
                SymbolOutcome::Analyzed {
                    summary,
                    recommendation,
                } => {
                    analyzed.push(summary);
                    recommendations.extend(recommendation);
                }
                SymbolOutcome::Failed { symbol, error } => {
                    warn!(parent: &span, symbol = %symbol, %error, "analysis failed, symbol skipped");
                    failures.push(BatchFailure {
                        symbol,
                        stage: FailureStage::Analysis,
                        error,
                    });
                }
            }
        }
        analyzed.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        failures.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        let candidates = recommendations.len();
        let recommendations = rank(
            recommendations,
            self.orchestrator.config().strategy.max_recommendations,
        );
        info!(
            parent: &span,
            analyzed = analyzed.len(),
            failed = failures.len(),
            candidates,
            kept = recommendations.len(),
            "batch complete"
        );

        Ok(BatchReport {
            generated_at: Utc::now(),
            dataset_hash: universe.dataset_hash.clone(),
            has_synthetic: universe.has_synthetic,
            analyzed,
            failures,
            recommendations,
        })
    }
}

/// Run one symbol's analysis, turning a panic into a failed outcome.
fn isolated(
    symbol: &str,
    analyze: impl FnOnce() -> Result<SymbolAnalysis, AnalysisError>,
) -> SymbolOutcome {
    match panic::catch_unwind(AssertUnwindSafe(analyze)) {
        Ok(result) => result.into(),
        Err(payload) => SymbolOutcome::Failed {
            symbol: symbol.to_string(),
            error: format!("analysis panicked: {}", panic_message(payload.as_ref())),
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Load `config.data_dir` and rank it with `config.engine`.
pub fn run_from_config(config: &RunConfig, span: Span) -> Result<BatchReport, RunError> {
    let universe = load_directory(&config.data_dir, &config.columns, config.symbols.as_deref())?;
    BatchRunner::new(config.engine.clone())
        .with_threads(config.threads)
        .with_span(span)
        .run(&universe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::synthetic_universe;

    #[test]
    fn every_symbol_accounted_for() {
        let universe = synthetic_universe(8, 300, 42);
        let report = BatchRunner::new(EngineConfig::default()).run(&universe).unwrap();
        assert_eq!(report.analyzed.len(), 8);
        assert!(report.failures.is_empty());
        assert!(report.has_synthetic);
        assert_eq!(report.dataset_hash, universe.dataset_hash);
        assert!(report
            .recommendations
            .windows(2)
            .all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn dedicated_pool_matches_global_pool() {
        let universe = synthetic_universe(6, 300, 3);
        let a = BatchRunner::new(EngineConfig::default()).run(&universe).unwrap();
        let b = BatchRunner::new(EngineConfig::default())
            .with_threads(2)
            .run(&universe)
            .unwrap();
        assert_eq!(a.analyzed, b.analyzed);
        let ranked = |r: &BatchReport| -> Vec<(String, u32)> {
            r.recommendations
                .iter()
                .map(|x| (x.symbol.clone(), x.score))
                .collect()
        };
        assert_eq!(ranked(&a), ranked(&b));
    }

    #[test]
    fn analysis_error_becomes_failure() {
        let mut universe = synthetic_universe(3, 300, 1);
        universe.series[1].bars[50].high = -1.0;
        let report = BatchRunner::new(EngineConfig::default()).run(&universe).unwrap();
        assert_eq!(report.analyzed.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].symbol, "SYN001");
        assert_eq!(report.failures[0].stage, FailureStage::Analysis);
    }

    #[test]
    fn zero_atr_period_fails_every_symbol_not_the_batch() {
        let universe = synthetic_universe(4, 300, 7);
        let mut config = EngineConfig::default();
        config.indicators.atr_period = 0;
        let report = BatchRunner::new(config).run(&universe).unwrap();
        assert!(report.analyzed.is_empty());
        assert!(report.recommendations.is_empty());
        assert_eq!(report.failures.len(), 4);
        assert!(report
            .failures
            .iter()
            .all(|f| f.stage == FailureStage::Analysis && f.error.contains("atr_period")));
    }

    #[test]
    fn panicking_analysis_becomes_failure() {
        let outcome = isolated("BOOM", || panic!("index out of range"));
        assert_eq!(
            outcome,
            SymbolOutcome::Failed {
                symbol: "BOOM".to_string(),
                error: "analysis panicked: index out of range".to_string(),
            }
        );

        let owned = isolated("FMT", || panic!("period {} too short", 3));
        assert!(matches!(
            owned,
            SymbolOutcome::Failed { ref error, .. } if error.ends_with("period 3 too short")
        ));
    }

    #[test]
    fn panic_in_parallel_batch_is_contained() {
        let universe = synthetic_universe(4, 300, 7);
        let orchestrator = StrategyOrchestrator::new(EngineConfig::default());
        let outcomes: Vec<SymbolOutcome> = universe
            .series
            .par_iter()
            .map(|s| {
                isolated(&s.symbol, || {
                    if s.symbol == "SYN002" {
                        panic!("bad symbol");
                    }
                    orchestrator.analyze(&s.symbol, &s.bars)
                })
            })
            .collect();
        let failed: Vec<&SymbolOutcome> = outcomes
            .iter()
            .filter(|o| matches!(o, SymbolOutcome::Failed { .. }))
            .collect();
        assert_eq!(failed.len(), 1);
        assert!(matches!(failed[0], SymbolOutcome::Failed { symbol, .. } if symbol == "SYN002"));
    }
}

//! End-to-end scenarios through the public API.
//!
//! Covers:
//! 1. Trend classification of flat, linear and tripling series
//! 2. 2B reversal and MA60 pullback detection
//! 3. Orchestrator routing: pullback, accelerate hold, 2B rebound, no playbook
//! 4. Config overrides from TOML reaching the pipeline

use chrono::NaiveDate;
use trendscout_core::config::{EngineConfig, SignalConfig, StopLossMethod, TrendConfig};
use trendscout_core::indicators::IndicatorEngine;
use trendscout_core::series::MaAlignment;
use trendscout_core::signals::{detect_two_b, SignalDetector};
use trendscout_core::strategy::{Priority, StrategyKind};
use trendscout_core::trend::{TrendClassifier, TrendType};
use trendscout_core::{PriceBar, StrategyOrchestrator};

// ── Helpers ──────────────────────────────────────────────────────────

fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    let base = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                date: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) * 1.01,
                low: open.min(close) * 0.99,
                close,
                volume: 50_000.0,
                amount: 50_000.0 * close,
            }
        })
        .collect()
}

fn classify(closes: &[f64]) -> trendscout_core::trend::TrendClassification {
    let config = EngineConfig::default();
    let series = IndicatorEngine::new(config.indicators)
        .enrich(&bars_from_closes(closes))
        .unwrap();
    TrendClassifier::new(TrendConfig::default()).classify(&series)
}

/// Flat base, a steady climb, then a close 2% above its own MA60.
fn pullback_closes() -> Vec<f64> {
    let mut closes = vec![100.0; 120];
    closes.extend((1..140).map(|i| 100.0 + 0.5 * i as f64));
    let s59: f64 = closes[closes.len() - 59..].iter().sum();
    closes.push(1.02 * s59 / (60.0 - 1.02));
    closes
}

/// Flat base, then a 120-bar run from 100 to 190.
fn acceleration_closes() -> Vec<f64> {
    let mut closes = vec![100.0; 140];
    closes.extend((1..=120).map(|i| 100.0 + 90.0 * i as f64 / 120.0));
    closes
}

/// Long slide from 200 to 105, then a flat base that undercuts its 98 low
/// at 94 and closes back at 99.
fn two_b_rebound_closes() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..200).map(|i| 200.0 - 95.0 * i as f64 / 199.0).collect();
    let mut base = vec![105.0; 60];
    base[15] = 98.0;
    base[55] = 94.0;
    base[59] = 99.0;
    closes.extend(base);
    closes
}

/// Flat base, then a 6% drift up over 60 bars: MA density near 3.5%.
fn drifting_base_closes() -> Vec<f64> {
    let mut closes = vec![100.0; 200];
    closes.extend((1..=60).map(|i| 100.0 + 6.0 * i as f64 / 60.0));
    closes
}

// ── 1. Trend classification ──────────────────────────────────────────

#[test]
fn flat_year_is_dense_zone() {
    let c = classify(&[42.0; 200]);
    assert_eq!(c.trend_type, TrendType::DenseZone);
    assert!(c.is_dense);
    assert!(c.ma_density.unwrap().abs() < 1e-9);
    assert!(c.annual_return.unwrap().abs() < 1e-12);
}

#[test]
fn linear_thirty_percent_is_stable_up() {
    let closes: Vec<f64> = (0..130).map(|i| 100.0 + 30.0 * i as f64 / 129.0).collect();
    let c = classify(&closes);
    assert_eq!(c.ma_alignment, MaAlignment::Bull);
    assert_eq!(c.trend_type, TrendType::StableUp);
}

#[test]
fn tripling_in_sixty_days_is_accelerate_up() {
    let mut closes = vec![100.0; 70];
    closes.extend((1..=60).map(|i| 100.0 + 200.0 * i as f64 / 60.0));
    let c = classify(&closes);
    assert_eq!(c.trend_type, TrendType::AccelerateUp);
}

#[test]
fn under_min_bars_is_undefined() {
    let closes: Vec<f64> = (0..119).map(|i| 100.0 * 1.01f64.powi(i)).collect();
    assert_eq!(classify(&closes).trend_type, TrendType::Undefined);
}

// ── 2. Signals ───────────────────────────────────────────────────────

#[test]
fn bullish_two_b_on_undercut_low() {
    let mut prices = vec![105.0; 60];
    prices[15] = 98.0;
    prices[55] = 94.0;
    prices[59] = 99.0;
    let report = detect_two_b(&prices, &SignalConfig::default());
    assert!(report.bullish.is_some());
}

#[test]
fn first_pullback_to_ma60() {
    let config = EngineConfig::default();
    let series = IndicatorEngine::new(config.indicators)
        .enrich(&bars_from_closes(&pullback_closes()))
        .unwrap();
    let signal = SignalDetector::new(config.signals).detect_pullback(&series);
    assert!(signal.has_signal);
    assert_eq!(signal.pullback_to, Some(60));
    assert!(signal.is_first_pullback);
    assert!(signal.safe_from_turn);
    assert_eq!(signal.label().as_deref(), Some("MA60"));
}

// ── 3. Orchestrator routing ──────────────────────────────────────────

#[test]
fn pullback_recommendation_end_to_end() {
    let orchestrator = StrategyOrchestrator::new(EngineConfig::default());
    let rec = orchestrator
        .analyze_symbol("PB", &bars_from_closes(&pullback_closes()))
        .unwrap()
        .expect("recommendation");
    assert_eq!(rec.strategy, StrategyKind::Pullback);
    assert_eq!(rec.priority, Priority::High);
    assert!(rec.score >= 60 && rec.score <= 100);
    assert!(!rec.profit_prediction.targets.is_empty());
    assert!(rec.profit_prediction.success_probability <= 0.95);
}

#[test]
fn acceleration_recommends_holding() {
    let orchestrator = StrategyOrchestrator::new(EngineConfig::default());
    let rec = orchestrator
        .analyze_symbol("ACC", &bars_from_closes(&acceleration_closes()))
        .unwrap()
        .expect("recommendation");
    assert_eq!(rec.strategy, StrategyKind::AccelerateHold);
    assert_eq!(rec.score, 50);
    assert_eq!(rec.hold_signal.as_deref(), Some("keep existing positions"));
}

#[test]
fn undercut_low_after_slide_recommends_2b_rebound() {
    let orchestrator = StrategyOrchestrator::new(EngineConfig::default());
    let analysis = orchestrator
        .analyze("REV", &bars_from_closes(&two_b_rebound_closes()))
        .unwrap();
    assert!(matches!(
        analysis.summary.trend_type,
        TrendType::StableDown | TrendType::AccelerateDown | TrendType::Undefined
    ));
    let rec = analysis.recommendation.expect("2B rebound");
    assert_eq!(rec.strategy, StrategyKind::ReversalLong);
    assert_eq!(rec.priority, Priority::Medium);
    // base 40 + undercut 4.1% + rebound 5.3% + MA120 bias -11.5%
    assert_eq!(rec.score, 80);
    assert_eq!(rec.stop_loss, Some(94.0));
    let pct = rec.stop_loss_pct.unwrap();
    assert!((pct - 5.0 / 99.0 * 100.0).abs() < 1e-9);
    assert_eq!(rec.profit_prediction.strategy, StrategyKind::ReversalLong);
}

#[test]
fn structure_stop_replaces_trend_stop_for_2b() {
    let config = EngineConfig::default();
    let series = IndicatorEngine::new(config.indicators.clone())
        .enrich(&bars_from_closes(&two_b_rebound_closes()))
        .unwrap();
    let trend = TrendClassifier::new(config.trend).classify(&series);
    assert_ne!(
        trend.stop_loss.as_ref().map(|s| s.method),
        Some(StopLossMethod::Structure)
    );
    let moved = trend.with_structure_stop(94.0);
    assert_eq!(moved.stop_loss.unwrap().method, StopLossMethod::Structure);
}

#[test]
fn two_b_below_min_score_is_not_recommended() {
    let config = EngineConfig::from_toml("[strategy]\nmin_score = 85\n").unwrap();
    let orchestrator = StrategyOrchestrator::new(config);
    assert!(orchestrator
        .analyze_symbol("REV", &bars_from_closes(&two_b_rebound_closes()))
        .unwrap()
        .is_none());
}

#[test]
fn downtrend_yields_nothing() {
    let closes: Vec<f64> = (0..300).map(|i| 300.0 - 0.4 * i as f64).collect();
    let orchestrator = StrategyOrchestrator::new(EngineConfig::default());
    assert!(orchestrator
        .analyze_symbol("DOWN", &bars_from_closes(&closes))
        .unwrap()
        .is_none());
}

// ── 4. Config overrides ──────────────────────────────────────────────

#[test]
fn raised_min_score_suppresses_pullback() {
    let config = EngineConfig::from_toml("[strategy]\nmin_score = 95\n").unwrap();
    let orchestrator = StrategyOrchestrator::new(config);
    assert!(orchestrator
        .analyze_symbol("PB", &bars_from_closes(&pullback_closes()))
        .unwrap()
        .is_none());
}

#[test]
fn tightened_dense_threshold_reaches_trend_and_breakout() {
    let bars = bars_from_closes(&drifting_base_closes());
    let run = |config: EngineConfig| {
        let series = IndicatorEngine::new(config.indicators).enrich(&bars).unwrap();
        let trend = TrendClassifier::new(config.trend).classify(&series);
        let breakout = SignalDetector::new(config.signals).detect_breakout(&series);
        (trend, breakout)
    };

    let (trend, breakout) = run(EngineConfig::default());
    assert_eq!(trend.trend_type, TrendType::DenseZone);
    assert!(trend.is_dense);
    assert!(breakout.is_dense);
    assert!(breakout.has_signal);

    let tight = EngineConfig::from_toml("[indicators]\ndense_threshold_pct = 2.0\n").unwrap();
    let (trend, breakout) = run(tight);
    assert_ne!(trend.trend_type, TrendType::DenseZone);
    assert!(!trend.is_dense);
    assert!(!breakout.is_dense);
    assert!(!breakout.has_signal);
}

//! Integration tests for batch ranking.
//!
//! Tests:
//! 1. 50 symbols, 3 corrupted: exactly 47 analyzed, 3 failures reported
//! 2. Ranking is sorted and truncated to max_recommendations
//! 3. A CSV directory with one broken file still ranks the rest, and a
//!    file with one inconsistent bar is still analyzed
//! 4. run_from_config loads, ranks and exports end to end

use std::fs;
use std::path::Path;

use trendscout_core::{EngineConfig, PriceBar};
use trendscout_runner::{
    load_directory, run_from_config, save_report, synthetic_series, synthetic_universe,
    BatchRunner, ColumnMap, FailureStage, RunConfig,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn write_csv(dir: &Path, symbol: &str, bars: usize, seed: u64) {
    write_bars(dir, symbol, &synthetic_series(symbol, bars, seed));
}

fn write_bars(dir: &Path, symbol: &str, bars: &[PriceBar]) {
    let mut out = String::from("date,open,high,low,close,volume,amount\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume, b.amount
        ));
    }
    fs::write(dir.join(format!("{symbol}.csv")), out).unwrap();
}

// ── 1. Failure isolation ─────────────────────────────────────────────

#[test]
fn three_bad_symbols_out_of_fifty() {
    let mut universe = synthetic_universe(50, 300, 2024);
    universe.series[4].bars[10].close = f64::NAN;
    universe.series[17].bars[200].low = -5.0;
    // duplicate date
    let dup = universe.series[33].bars[99].date;
    universe.series[33].bars[100].date = dup;

    let report = BatchRunner::new(EngineConfig::default())
        .with_threads(4)
        .run(&universe)
        .unwrap();

    assert_eq!(report.analyzed.len(), 47);
    assert_eq!(report.failures.len(), 3);
    let failed: Vec<&str> = report.failures.iter().map(|f| f.symbol.as_str()).collect();
    assert_eq!(failed, ["SYN004", "SYN017", "SYN033"]);
    assert!(report
        .failures
        .iter()
        .all(|f| f.stage == FailureStage::Analysis));
    assert!(report
        .recommendations
        .iter()
        .all(|r| !failed.contains(&r.symbol.as_str())));
}

// ── 2. Ranking ───────────────────────────────────────────────────────

#[test]
fn ranking_sorted_and_truncated() {
    let universe = synthetic_universe(60, 320, 11);
    let mut config = EngineConfig::default();
    config.strategy.max_recommendations = 3;
    config.strategy.min_score = 0;

    let report = BatchRunner::new(config).run(&universe).unwrap();
    assert!(report.recommendations.len() <= 3);
    assert!(report.recommendations.windows(2).all(|w| {
        w[0].score > w[1].score || (w[0].score == w[1].score && w[0].symbol < w[1].symbol)
    }));
}

// ── 3. CSV directory ─────────────────────────────────────────────────

#[test]
fn broken_csv_is_a_load_failure() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(dir.path(), "AAA", 300, 1);
    write_csv(dir.path(), "BBB", 300, 2);
    fs::write(
        dir.path().join("CCC.csv"),
        "date,open,high,low,volume\n2024-01-02,1,1,1,1\n",
    )
    .unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let universe = load_directory(dir.path(), &ColumnMap::default(), None).unwrap();
    assert_eq!(universe.series.len(), 2);
    assert_eq!(universe.failures.len(), 1);
    assert_eq!(universe.failures[0].symbol, "CCC");
    assert!(!universe.has_synthetic);

    let report = BatchRunner::new(EngineConfig::default()).run(&universe).unwrap();
    assert_eq!(report.analyzed.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].stage, FailureStage::Load);
}

#[test]
fn open_above_high_skips_the_bar_not_the_symbol() {
    let dir = tempfile::tempdir().unwrap();
    let mut bars = synthetic_series("AAA", 300, 5);
    bars[150].open = bars[150].high + 0.01;
    write_bars(dir.path(), "AAA", &bars);
    write_csv(dir.path(), "BBB", 300, 6);

    let universe = load_directory(dir.path(), &ColumnMap::default(), None).unwrap();
    assert_eq!(universe.series.len(), 2);

    let report = BatchRunner::new(EngineConfig::default()).run(&universe).unwrap();
    assert!(report.failures.is_empty());
    let symbols: Vec<&str> = report.analyzed.iter().map(|a| a.symbol.as_str()).collect();
    assert_eq!(symbols, ["AAA", "BBB"]);
    assert_eq!(report.analyzed[0].as_of, Some(bars[299].date));
}

#[test]
fn symbol_filter_reports_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(dir.path(), "AAA", 260, 1);
    write_csv(dir.path(), "BBB", 260, 2);

    let wanted = vec!["BBB".to_string(), "ZZZ".to_string()];
    let universe = load_directory(dir.path(), &ColumnMap::default(), Some(&wanted)).unwrap();
    assert_eq!(universe.series.len(), 1);
    assert_eq!(universe.series[0].symbol, "BBB");
    assert_eq!(universe.failures.len(), 1);
    assert_eq!(universe.failures[0].symbol, "ZZZ");
}

#[test]
fn missing_directory_is_an_error() {
    let err = load_directory(Path::new("/nonexistent/trendscout"), &ColumnMap::default(), None);
    assert!(err.is_err());
}

// ── 4. End to end ────────────────────────────────────────────────────

#[test]
fn run_from_config_and_export() {
    let data = tempfile::tempdir().unwrap();
    for (i, symbol) in ["AAA", "BBB", "CCC", "DDD"].iter().enumerate() {
        write_csv(data.path(), symbol, 300, i as u64);
    }
    let out = tempfile::tempdir().unwrap();

    let config = RunConfig {
        data_dir: data.path().to_path_buf(),
        output_dir: out.path().to_path_buf(),
        threads: 2,
        ..RunConfig::default()
    };
    let report = run_from_config(&config, tracing::Span::none()).unwrap();
    assert_eq!(report.analyzed.len(), 4);
    assert!(report.failures.is_empty());
    assert_eq!(report.dataset_hash.len(), 64);

    save_report(&report, &config.output_dir).unwrap();
    let json = fs::read_to_string(out.path().join("recommendations.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["analyzed"].as_array().unwrap().len(), 4);
    assert!(out.path().join("summary.md").is_file());
}

//! Series loading for batch runs.
//!
//! One file per symbol, symbol = file stem:
//! - `*.csv` with header-driven column mapping (English or Chinese vendor
//!   headers out of the box)
//! - `*.json` holding a `Vec<PriceBar>`
//!
//! A bad file becomes a per-symbol failure; only an unreadable directory
//! aborts the load. Synthetic random-walk series are available for demos
//! and tests and are tagged as such.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use trendscout_core::{PriceBar, Symbol};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("malformed JSON in '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("'{path}' has no '{column}' column")]
    MissingColumn { path: String, column: &'static str },

    #[error("'{path}' line {line}: cannot parse {column} value '{value}'")]
    Parse {
        path: String,
        line: usize,
        column: &'static str,
        value: String,
    },

    #[error("'{path}' contains no bars")]
    Empty { path: String },

    #[error("no data file for symbol '{0}'")]
    SymbolNotFound(Symbol),
}

/// Accepted header names per field, matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub date: Vec<String>,
    pub open: Vec<String>,
    pub high: Vec<String>,
    pub low: Vec<String>,
    pub close: Vec<String>,
    pub volume: Vec<String>,
    /// Optional; missing amounts load as 0.
    pub amount: Vec<String>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        fn names(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }
        Self {
            date: names(&["date", "trade_date", "日期"]),
            open: names(&["open", "开盘"]),
            high: names(&["high", "最高"]),
            low: names(&["low", "最低"]),
            close: names(&["close", "收盘"]),
            volume: names(&["volume", "vol", "成交量"]),
            amount: names(&["amount", "成交额"]),
        }
    }
}

impl ColumnMap {
    fn find(aliases: &[String], headers: &csv::StringRecord) -> Option<usize> {
        headers.iter().position(|h| {
            let h = h.trim_start_matches('\u{feff}').trim();
            aliases.iter().any(|a| a.eq_ignore_ascii_case(h))
        })
    }
}

/// One symbol's bars, ready for analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSeries {
    pub symbol: Symbol,
    pub bars: Vec<PriceBar>,
    pub synthetic: bool,
}

#[derive(Debug)]
pub struct LoadFailure {
    pub symbol: Symbol,
    pub error: LoadError,
}

/// Everything a batch run needs, with provenance.
#[derive(Debug, Default)]
pub struct LoadedUniverse {
    pub series: Vec<SymbolSeries>,
    pub failures: Vec<LoadFailure>,
    /// BLAKE3 over all loaded bars.
    pub dataset_hash: String,
    pub has_synthetic: bool,
}

impl LoadedUniverse {
    pub fn from_series(series: Vec<SymbolSeries>, failures: Vec<LoadFailure>) -> Self {
        let dataset_hash = dataset_hash(&series);
        let has_synthetic = series.iter().any(|s| s.synthetic);
        Self {
            series,
            failures,
            dataset_hash,
            has_synthetic,
        }
    }
}

/// Parse CSV bars from any reader. `origin` names the source in errors.
///
/// Rows are returned in ascending date order regardless of file order.
pub fn read_csv<R: Read>(reader: R, map: &ColumnMap, origin: &str) -> Result<Vec<PriceBar>, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: origin.to_string(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers().map_err(csv_err)?.clone();

    let required = |aliases: &[String], column: &'static str| {
        ColumnMap::find(aliases, &headers).ok_or_else(|| LoadError::MissingColumn {
            path: origin.to_string(),
            column,
        })
    };
    let date_idx = required(map.date.as_slice(), "date")?;
    let open_idx = required(map.open.as_slice(), "open")?;
    let high_idx = required(map.high.as_slice(), "high")?;
    let low_idx = required(map.low.as_slice(), "low")?;
    let close_idx = required(map.close.as_slice(), "close")?;
    let volume_idx = required(map.volume.as_slice(), "volume")?;
    let amount_idx = ColumnMap::find(&map.amount, &headers);

    let mut bars = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record.map_err(csv_err)?;
        // header is line 1
        let line = row + 2;
        let field = |idx: usize| record.get(idx).unwrap_or("");
        let number = |idx: usize, column: &'static str| parse_number(field(idx), origin, line, column);

        let raw_date = field(date_idx);
        let date = parse_date(raw_date).ok_or_else(|| LoadError::Parse {
            path: origin.to_string(),
            line,
            column: "date",
            value: raw_date.to_string(),
        })?;
        bars.push(PriceBar {
            date,
            open: number(open_idx, "open")?,
            high: number(high_idx, "high")?,
            low: number(low_idx, "low")?,
            close: number(close_idx, "close")?,
            volume: number(volume_idx, "volume")?,
            amount: match amount_idx {
                Some(idx) if !field(idx).is_empty() => number(idx, "amount")?,
                _ => 0.0,
            },
        });
    }

    if bars.is_empty() {
        return Err(LoadError::Empty {
            path: origin.to_string(),
        });
    }
    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    ["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn parse_number(s: &str, origin: &str, line: usize, column: &'static str) -> Result<f64, LoadError> {
    s.replace(',', "").parse::<f64>().map_err(|_| LoadError::Parse {
        path: origin.to_string(),
        line,
        column,
        value: s.to_string(),
    })
}

/// Load one symbol's bars from a `.csv` or `.json` file.
pub fn load_series(path: &Path, map: &ColumnMap) -> Result<Vec<PriceBar>, LoadError> {
    let origin = path.display().to_string();
    let io_err = |source| LoadError::Io {
        path: origin.clone(),
        source,
    };
    let is_json = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        let content = std::fs::read_to_string(path).map_err(io_err)?;
        let mut bars: Vec<PriceBar> =
            serde_json::from_str(&content).map_err(|source| LoadError::Json {
                path: origin.clone(),
                source,
            })?;
        if bars.is_empty() {
            return Err(LoadError::Empty { path: origin });
        }
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    } else {
        let file = std::fs::File::open(path).map_err(io_err)?;
        read_csv(file, map, &origin)
    }
}

/// Load every `*.csv` / `*.json` in `dir`, optionally restricted to
/// `filter`. Symbols named in the filter without a file are failures.
pub fn load_directory(
    dir: &Path,
    map: &ColumnMap,
    filter: Option<&[Symbol]>,
) -> Result<LoadedUniverse, LoadError> {
    let entries = std::fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let mut files: Vec<(Symbol, PathBuf)> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv") || e.eq_ignore_ascii_case("json"))
        })
        .filter_map(|p| {
            let stem = p.file_stem()?.to_str()?.to_string();
            Some((stem, p))
        })
        .collect();
    files.sort();

    let mut failures = Vec::new();
    if let Some(wanted) = filter {
        let wanted: BTreeSet<&str> = wanted.iter().map(String::as_str).collect();
        let present: BTreeSet<&str> = files.iter().map(|(s, _)| s.as_str()).collect();
        for missing in wanted.difference(&present) {
            failures.push(LoadFailure {
                symbol: missing.to_string(),
                error: LoadError::SymbolNotFound(missing.to_string()),
            });
        }
        files.retain(|(s, _)| wanted.contains(s.as_str()));
    }

    let mut series = Vec::with_capacity(files.len());
    for (symbol, path) in files {
        match load_series(&path, map) {
            Ok(bars) => {
                debug!(symbol = %symbol, bars = bars.len(), "series loaded");
                series.push(SymbolSeries {
                    symbol,
                    bars,
                    synthetic: false,
                });
            }
            Err(error) => {
                warn!(symbol = %symbol, %error, "failed to load series");
                failures.push(LoadFailure { symbol, error });
            }
        }
    }
    Ok(LoadedUniverse::from_series(series, failures))
}

/// Deterministic BLAKE3 hash over all bars, in symbol order.
pub fn dataset_hash(series: &[SymbolSeries]) -> String {
    let mut ordered: Vec<&SymbolSeries> = series.iter().collect();
    ordered.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    let mut hasher = blake3::Hasher::new();
    for s in ordered {
        hasher.update(s.symbol.as_bytes());
        for bar in &s.bars {
            hasher.update(bar.date.to_string().as_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
            hasher.update(&bar.amount.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// Random-walk daily bars on weekdays from 2020-01-01.
///
/// Deterministic in `(symbol, seed)`.
pub fn synthetic_series(symbol: &str, bars: usize, seed: u64) -> Vec<PriceBar> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(symbol.as_bytes());
    hasher.update(&seed.to_le_bytes());
    let mut rng = StdRng::from_seed(*hasher.finalize().as_bytes());

    let mut out = Vec::with_capacity(bars);
    let mut price = 100.0_f64;
    let mut date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN);
    while out.len() < bars {
        if matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun) {
            date += chrono::Duration::days(1);
            continue;
        }
        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000.0..5_000_000.0_f64).round();
        out.push(PriceBar {
            date,
            open,
            high,
            low,
            close,
            volume,
            amount: volume * close,
        });
        price = close;
        date += chrono::Duration::days(1);
    }
    out
}

/// `count` synthetic symbols named `SYN000`, `SYN001`, ...
pub fn synthetic_universe(count: usize, bars: usize, seed: u64) -> LoadedUniverse {
    let series = (0..count)
        .map(|i| {
            let symbol = format!("SYN{i:03}");
            SymbolSeries {
                bars: synthetic_series(&symbol, bars, seed),
                symbol,
                synthetic: true,
            }
        })
        .collect();
    LoadedUniverse::from_series(series, Vec::new())
}

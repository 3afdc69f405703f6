//! TrendScout CLI: rank a universe, analyze one symbol, manage config.
//!
//! Commands:
//! - `rank`: analyze every series in a directory (or a synthetic universe)
//!   and write the ranked report
//! - `analyze`: run the pipeline on a single CSV/JSON file and print the result
//! - `config`: print the default run config, or validate a config file

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use trendscout_core::StrategyOrchestrator;
use trendscout_runner::{
    load_directory, load_series, save_report, synthetic_series, synthetic_universe, BatchReport,
    BatchRunner, RunConfig,
};

#[derive(Parser)]
#[command(
    name = "trendscout",
    about = "TrendScout CLI: technical-analysis stock screener"
)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a directory of series and write the ranked report.
    Rank {
        /// Run config TOML. Command-line flags override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory with one <symbol>.csv / <symbol>.json per symbol.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Output directory for recommendations.json and summary.md.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Worker threads (0 = one per core).
        #[arg(long)]
        threads: Option<usize>,

        /// Rank N synthetic random-walk symbols instead of reading data_dir.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Seed for --synthetic.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Print the report as JSON instead of the text summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Run the pipeline on one symbol and print the recommendation.
    Analyze {
        /// CSV or JSON series file. Omit with --synthetic.
        file: Option<PathBuf>,

        /// Symbol name. Defaults to the file stem.
        #[arg(long)]
        symbol: Option<String>,

        /// Run config TOML supplying the [engine] settings.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Use a synthetic series of this many bars.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Seed for --synthetic.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Print JSON instead of text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the default run config, or validate one.
    Config {
        /// Validate this file instead of printing defaults.
        #[arg(long)]
        check: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Rank {
            config,
            data_dir,
            output_dir,
            threads,
            synthetic,
            seed,
            json,
        } => {
            let mut run_config = load_run_config(config.as_deref())?;
            if let Some(dir) = data_dir {
                run_config.data_dir = dir;
            }
            if let Some(dir) = output_dir {
                run_config.output_dir = dir;
            }
            if let Some(n) = threads {
                run_config.threads = n;
            }
            run_rank(&run_config, synthetic, seed, json)
        }
        Commands::Analyze {
            file,
            symbol,
            config,
            synthetic,
            seed,
            json,
        } => run_analyze(file, symbol, config.as_deref(), synthetic, seed, json),
        Commands::Config { check } => run_config_cmd(check.as_deref()),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "trendscout=debug,trendscout_core=debug,trendscout_runner=debug"
    } else {
        "trendscout=info,trendscout_core=info,trendscout_runner=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_run_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(p) => RunConfig::from_file(p).with_context(|| format!("loading {}", p.display())),
        None => Ok(RunConfig::default()),
    }
}

fn run_rank(config: &RunConfig, synthetic: Option<usize>, seed: u64, json: bool) -> Result<()> {
    let universe = match synthetic {
        Some(n) => {
            eprintln!("WARNING: ranking {n} synthetic symbols, results are tagged as synthetic");
            synthetic_universe(n, 400, seed)
        }
        None => load_directory(&config.data_dir, &config.columns, config.symbols.as_deref())
            .with_context(|| format!("loading {}", config.data_dir.display()))?,
    };
    info!(
        symbols = universe.series.len(),
        load_failures = universe.failures.len(),
        "universe loaded"
    );

    let report = BatchRunner::new(config.engine.clone())
        .with_threads(config.threads)
        .with_span(tracing::info_span!("rank"))
        .run(&universe)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    let dir = save_report(&report, &config.output_dir)?;
    println!("Report saved to: {}", dir.display());
    Ok(())
}

fn run_analyze(
    file: Option<PathBuf>,
    symbol: Option<String>,
    config: Option<&Path>,
    synthetic: Option<usize>,
    seed: u64,
    json: bool,
) -> Result<()> {
    let run_config = load_run_config(config)?;

    let (symbol, bars) = match (file, synthetic) {
        (Some(_), Some(_)) => bail!("a file and --synthetic are mutually exclusive"),
        (None, None) => bail!("one of FILE or --synthetic is required"),
        (Some(path), None) => {
            let symbol = symbol
                .or_else(|| path.file_stem().and_then(|s| s.to_str()).map(String::from))
                .unwrap_or_else(|| "UNKNOWN".to_string());
            let bars = load_series(&path, &run_config.columns)
                .with_context(|| format!("loading {}", path.display()))?;
            (symbol, bars)
        }
        (None, Some(n)) => {
            let symbol = symbol.unwrap_or_else(|| "SYNTHETIC".to_string());
            let bars = synthetic_series(&symbol, n, seed);
            (symbol, bars)
        }
    };

    let orchestrator =
        StrategyOrchestrator::new(run_config.engine).with_span(tracing::info_span!("cli"));
    let analysis = orchestrator.analyze(&symbol, &bars)?;

    if json {
        let value = serde_json::json!({
            "summary": analysis.summary,
            "recommendation": analysis.recommendation,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let s = &analysis.summary;
    println!("{}: {} bars", s.symbol, s.bars);
    if let Some(date) = s.as_of {
        println!("  as of:   {date}");
    }
    println!("  trend:   {} ({})", s.trend_type, s.trend_phase);
    let signals: Vec<String> = s.active_signals.iter().map(ToString::to_string).collect();
    println!(
        "  signals: {}",
        if signals.is_empty() {
            "none".to_string()
        } else {
            signals.join(", ")
        }
    );
    match &analysis.recommendation {
        Some(rec) => {
            println!();
            println!("{rec}");
            println!();
            println!("{}", rec.profit_prediction.recommendation_text);
        }
        None => println!("  no recommendation"),
    }
    Ok(())
}

fn run_config_cmd(check: Option<&Path>) -> Result<()> {
    match check {
        Some(path) => {
            RunConfig::from_file(path).with_context(|| format!("checking {}", path.display()))?;
            println!("{}: ok", path.display());
        }
        None => {
            let rendered = toml::to_string_pretty(&RunConfig::default())
                .context("failed to render default config")?;
            print!("{rendered}");
        }
    }
    Ok(())
}

fn print_report(report: &BatchReport) {
    println!(
        "Analyzed {} symbols, {} failures, {} recommendations",
        report.analyzed.len(),
        report.failures.len(),
        report.recommendations.len()
    );
    println!("Dataset hash: {}", report.dataset_hash);
    if report.has_synthetic {
        println!("Data: SYNTHETIC");
    }
    for (i, rec) in report.recommendations.iter().enumerate() {
        println!();
        println!("#{}", i + 1);
        println!("{rec}");
    }
    if !report.failures.is_empty() {
        println!();
        println!("Failures:");
        for f in &report.failures {
            println!("  {}: {}", f.symbol, f.error);
        }
    }
}

//! Report export: JSON and Markdown artifacts for a batch run.
//!
//! - **recommendations.json**: the full `BatchReport`
//! - **summary.md**: ranked table plus failures

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::batch::BatchReport;

pub const REPORT_JSON: &str = "recommendations.json";
pub const SUMMARY_MD: &str = "summary.md";

pub fn export_json(report: &BatchReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize BatchReport to JSON")
}

pub fn import_json(json: &str) -> Result<BatchReport> {
    serde_json::from_str(json).context("failed to deserialize BatchReport from JSON")
}

/// Write both artifacts into `output_dir` (created if missing) and return
/// the directory.
pub fn save_report(report: &BatchReport, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    let json_path = output_dir.join(REPORT_JSON);
    std::fs::write(&json_path, export_json(report)?)
        .with_context(|| format!("failed to write {}", json_path.display()))?;

    let md_path = output_dir.join(SUMMARY_MD);
    std::fs::write(&md_path, summary_markdown(report))
        .with_context(|| format!("failed to write {}", md_path.display()))?;

    Ok(output_dir.to_path_buf())
}

pub fn summary_markdown(report: &BatchReport) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str("# Ranking Summary\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!(
        "| Generated | {} |\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!("| Symbols analyzed | {} |\n", report.analyzed.len()));
    md.push_str(&format!("| Failures | {} |\n", report.failures.len()));
    md.push_str(&format!(
        "| Recommendations | {} |\n",
        report.recommendations.len()
    ));
    md.push_str(&format!("| Dataset Hash | {} |\n", report.dataset_hash));
    if report.has_synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    md.push_str("## Recommendations\n\n");
    if report.recommendations.is_empty() {
        md.push_str("No symbol qualified.\n\n");
    } else {
        md.push_str("| # | Symbol | Strategy | Priority | Score | Price | Stop | Target 1 | Success |\n");
        md.push_str("| --- | --- | --- | --- | --- | --- | --- | --- | --- |\n");
        for (i, r) in report.recommendations.iter().enumerate() {
            let stop = r
                .stop_loss
                .map_or_else(|| "-".to_string(), |s| format!("{s:.2}"));
            let target = r
                .profit_prediction
                .targets
                .first()
                .map_or_else(|| "-".to_string(), |t| format!("{:.2} (+{:.1}%)", t.price, t.gain_pct));
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {:.2} | {} | {} | {:.0}% |\n",
                i + 1,
                r.symbol,
                r.strategy,
                r.priority,
                r.score,
                r.current_price,
                stop,
                target,
                r.profit_prediction.success_probability * 100.0
            ));
        }
        md.push('\n');
    }

    if !report.failures.is_empty() {
        md.push_str("## Failures\n\n");
        md.push_str("| Symbol | Stage | Error |\n");
        md.push_str("| --- | --- | --- |\n");
        for f in &report.failures {
            let stage = match f.stage {
                crate::batch::FailureStage::Load => "load",
                crate::batch::FailureStage::Analysis => "analysis",
            };
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                f.symbol,
                stage,
                f.error.replace('|', "\\|")
            ));
        }
        md.push('\n');
    }

    md
}

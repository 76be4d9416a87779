//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - pipeline code stays free of layout details
//! - output changes are localized and covered by string tests

use crate::domain::{EpochLog, EvaluationResult, ForecastRecord};
use crate::fit::TrainReport;
use crate::report::dataset::{AnalysisReport, CheckReport};

/// Dataset/window bookkeeping shown before training output.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub rows: usize,
    pub diseases: usize,
    pub series_points: usize,
    pub windows: usize,
    pub train: usize,
    pub test: usize,
    pub seq_len: usize,
    pub excluded: Vec<String>,
}

pub fn format_run_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str("=== incidence - Stacked LSTM disease forecast ===\n");
    out.push_str(&format!(
        "Rows: {} | diseases: {} | seasonal points: {}\n",
        summary.rows, summary.diseases, summary.series_points
    ));
    out.push_str(&format!(
        "Windows: {} (seq_len={}) | train: {} | test: {}\n",
        summary.windows, summary.seq_len, summary.train, summary.test
    ));
    if !summary.excluded.is_empty() {
        out.push_str(&format!(
            "Excluded (fewer than {} seasons): {}\n",
            summary.seq_len + 1,
            summary.excluded.join(", ")
        ));
    }
    out
}

/// One line of per-epoch progress, 1-based like the training log viewers show it.
pub fn format_epoch_line(log: &EpochLog) -> String {
    let val = match log.val_loss {
        Some(v) => format!("{v:.4}"),
        None => "n/a".to_string(),
    };
    format!("Epoch {:3} | loss={:.4} | val_loss={val}", log.epoch + 1, log.loss)
}

pub fn format_training_outcome(report: &TrainReport) -> String {
    let mut out = format!(
        "Trained {} epochs; kept epoch {} (monitored loss {:.4})",
        report.history.len(),
        report.best_epoch + 1,
        report.best_loss
    );
    if report.stopped_early {
        out.push_str(", stopped early");
    }
    out.push('\n');
    out
}

pub fn format_evaluation(metrics: &EvaluationResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("\nEvaluation (test split, n={}):\n", metrics.n));
    out.push_str(&format!("- MAE: {:.2}\n", metrics.mae));
    out.push_str(&format!("- RMSE: {:.2}\n", metrics.rmse));
    out.push_str(&format!("- R2 Score: {:.4}\n", metrics.r2));
    out.push_str(&format!("- Accuracy Rate: {:.2}%\n", metrics.accuracy_pct));
    out
}

/// Top-N forecast table.
pub fn format_forecasts(forecasts: &[ForecastRecord], skipped: &[String], top_n: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("\nTop {} forecasted diseases for next season:\n", top_n.min(forecasts.len())));
    out.push_str(format!("{:<4} {:<24} {:>14}", "rank", "disease", "predicted").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<4} {:-<24} {:-<14}", "", "", "").trim_end());
    out.push('\n');
    for (i, f) in forecasts.iter().take(top_n).enumerate() {
        out.push_str(&format!(
            "{:<4} {:<24} {:>14.2}\n",
            i + 1,
            truncate(&f.disease, 24),
            f.predicted_count
        ));
    }
    if !skipped.is_empty() {
        out.push_str(&format!("Skipped (not enough history): {}\n", skipped.join(", ")));
    }
    out
}

pub fn format_check_report(report: &CheckReport) -> String {
    let mut out = String::new();
    out.push_str("=== incidence - dataset check ===\n");
    out.push_str("All required columns present.\n");
    out.push_str(&format!(
        "Rows: {} | years: {}-{}\n",
        report.rows, report.year_min, report.year_max
    ));

    out.push_str("\nRows per year:\n");
    for (year, n) in &report.rows_per_year {
        out.push_str(&format!("  {year}: {n}\n"));
    }

    out.push_str(&format!(
        "\n(state, disease) pairs with at least {} years: {} of {}\n",
        super::dataset::MIN_YEARS_PER_PAIR,
        report.qualified_pairs.len(),
        report.total_pairs
    ));

    let s = &report.count_summary;
    out.push_str("\nDisease_Count:\n");
    out.push_str(&format!(
        "  count={} mean={:.3} std={:.3} min={:.0} 25%={:.2} 50%={:.2} 75%={:.2} max={:.0}\n",
        s.n, s.mean, s.std, s.min, s.q25, s.median, s.q75, s.max
    ));
    out
}

pub fn format_analysis_report(report: &AnalysisReport, top_n: usize) -> String {
    let mut out = String::new();
    out.push_str("=== incidence - dataset analysis ===\n");

    out.push_str("\nTotal cases per disease:\n");
    for (disease, total) in report.disease_totals.iter().take(top_n) {
        out.push_str(&format!("  {:<24} {total:>10}\n", truncate(disease, 24)));
    }

    out.push_str("\nCases per season:\n");
    out.push_str(format!(
        "  {:<8} {:>6} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "season", "n", "mean", "min", "25%", "50%", "75%", "max"
    )
    .trim_end());
    out.push('\n');
    for (season, s) in &report.seasonal {
        out.push_str(&format!(
            "  {:<8} {:>6} {:>8.2} {:>8.0} {:>8.2} {:>8.2} {:>8.2} {:>8.0}\n",
            season.name(),
            s.n,
            s.mean,
            s.min,
            s.q25,
            s.median,
            s.q75,
            s.max
        ));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_line_is_one_based() {
        let line = format_epoch_line(&EpochLog {
            epoch: 0,
            loss: 0.12345,
            val_loss: Some(0.2),
        });
        assert_eq!(line, "Epoch   1 | loss=0.1235 | val_loss=0.2000");

        let line = format_epoch_line(&EpochLog {
            epoch: 41,
            loss: 1.0,
            val_loss: None,
        });
        assert_eq!(line, "Epoch  42 | loss=1.0000 | val_loss=n/a");
    }

    #[test]
    fn forecast_table_respects_top_n() {
        let rows = vec![
            ForecastRecord { disease: "Fever".to_string(), predicted_count: 512.4 },
            ForecastRecord { disease: "Cold".to_string(), predicted_count: 300.0 },
            ForecastRecord { disease: "Eye Infection".to_string(), predicted_count: 12.0 },
        ];
        let text = format_forecasts(&rows, &["Dengue".to_string()], 2);
        assert!(text.contains("Top 2 forecasted"));
        assert!(text.contains("Fever"));
        assert!(text.contains("512.40"));
        assert!(!text.contains("Eye Infection"));
        assert!(text.contains("Skipped (not enough history): Dengue"));
    }

    #[test]
    fn evaluation_block_lists_all_metrics() {
        let text = format_evaluation(&EvaluationResult {
            mae: 1.5,
            rmse: 2.0,
            r2: 0.75,
            accuracy_pct: 93.25,
            n: 8,
        });
        assert!(text.contains("MAE: 1.50"));
        assert!(text.contains("RMSE: 2.00"));
        assert!(text.contains("R2 Score: 0.7500"));
        assert!(text.contains("Accuracy Rate: 93.25%"));
    }

    #[test]
    fn truncate_marks_cut_names() {
        assert_eq!(truncate("Malaria", 10), "Malaria");
        assert_eq!(truncate("Eye Infection", 5), "Eye .");
    }
}

//! Shared pipeline logic behind the CLI subcommands.
//!
//! Keeping this in one place avoids mixing the core workflow with printing:
//! ingest -> aggregate -> window -> scale -> split -> train -> evaluate -> forecast
//!
//! Every function here takes a resolved config and returns plain data; the
//! caller decides what to print. Output files are only written after the
//! input has been read and validated in full.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::data::generate_records;
use crate::domain::{GenerateConfig, PredictConfig, SeriesPoint, TrainConfig};
use crate::error::AppError;
use crate::fit::{EpochObserver, TrainReport, fit_stacked_lstm};
use crate::io::{
    OutputLayout, TrainedArtifacts, load_artifacts, load_incidence_records, metric_rows, save_artifacts,
    write_dataset_csv, write_forecast_csv, write_metrics_csv, write_train_log_csv,
};
use crate::math::{FittedScalers, Summary};
use crate::models::training_arrays;
use crate::plot::{write_bar_chart, write_box_chart, write_heatmap, write_line_chart};
use crate::report::{
    AnalysisReport, CheckReport, Evaluation, NextSeason, RunSummary, analyze_dataset, check_dataset, evaluate,
    forecast_next,
};
use crate::series::{DiseaseEncoder, aggregate, build_windows, chronological_split};

/// All computed outputs of a single `incidence train` run.
#[derive(Debug, Clone)]
pub struct TrainOutput {
    pub summary: RunSummary,
    pub report: TrainReport,
    pub evaluation: Evaluation,
    pub next_season: NextSeason,
    pub artifacts: TrainedArtifacts,
}

/// Write the synthetic dataset; returns the number of rows written.
pub fn run_generate(config: &GenerateConfig) -> Result<usize, AppError> {
    let records = generate_records(config)?;
    write_dataset_csv(&config.output_path, &records)?;
    log::info!("Generated {} rows (seed {})", records.len(), config.seed);
    Ok(records.len())
}

pub fn run_check(dataset: &Path, out_dir: &Path, charts: bool) -> Result<CheckReport, AppError> {
    let ingest = load_incidence_records(dataset)?;
    let report = check_dataset(&ingest.records)?;

    if charts {
        let dir = OutputLayout::new(out_dir).analysis_dir();
        write_coverage_chart(&dir.join("year_coverage.svg"), &report)?;

        let per_year: Vec<(String, f64)> = report
            .rows_per_year
            .iter()
            .map(|(year, n)| (year.to_string(), *n as f64))
            .collect();
        write_bar_chart(&dir.join("rows_per_year.svg"), "Rows per year", "Rows", &per_year)?;
        log::info!("Wrote coverage charts to {}", dir.display());
    }

    Ok(report)
}

/// States down, diseases across, distinct years observed in each cell.
fn write_coverage_chart(path: &Path, report: &CheckReport) -> Result<(), AppError> {
    let states: Vec<String> = report
        .pair_coverage
        .iter()
        .map(|(state, _, _)| state.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let diseases: Vec<String> = report
        .pair_coverage
        .iter()
        .map(|(_, disease, _)| disease.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let cells: Vec<(usize, usize, f64)> = report
        .pair_coverage
        .iter()
        .filter_map(|(state, disease, years)| {
            let row = states.binary_search(state).ok()?;
            let col = diseases.binary_search(disease).ok()?;
            Some((row, col, *years as f64))
        })
        .collect();
    write_heatmap(path, "Years covered per state and disease", &states, &diseases, &cells)
}

pub fn run_analyze(dataset: &Path, out_dir: &Path, charts: bool) -> Result<AnalysisReport, AppError> {
    let ingest = load_incidence_records(dataset)?;
    let report = analyze_dataset(&ingest.records)?;

    if charts {
        let dir = OutputLayout::new(out_dir).analysis_dir();
        let totals: Vec<(String, f64)> = report
            .disease_totals
            .iter()
            .map(|(d, t)| (d.clone(), *t as f64))
            .collect();
        write_bar_chart(&dir.join("disease_totals.svg"), "Total cases per disease", "Cases", &totals)?;

        let seasonal: Vec<(String, Summary)> = report
            .seasonal
            .iter()
            .map(|(season, s)| (season.name().to_string(), *s))
            .collect();
        write_box_chart(&dir.join("seasonal_distribution.svg"), "Cases per row by season", "Cases", &seasonal)?;

        let mut by_disease: BTreeMap<&str, Vec<(f64, f64)>> = BTreeMap::new();
        for (disease, year, total) in &report.yearly_totals {
            by_disease
                .entry(disease.as_str())
                .or_default()
                .push((f64::from(*year), *total as f64));
        }
        let yearly: Vec<(String, Vec<(f64, f64)>)> =
            by_disease.into_iter().map(|(d, pts)| (d.to_string(), pts)).collect();
        write_line_chart(&dir.join("yearly_trends.svg"), "Yearly cases per disease", "Year", "Cases", &yearly)?;
        log::info!("Wrote analysis charts to {}", dir.display());
    }

    Ok(report)
}

/// Execute the full training pipeline and write every artifact.
pub fn run_train(config: &TrainConfig, observer: &mut dyn EpochObserver) -> Result<TrainOutput, AppError> {
    let seq_len = config.model.seq_len;

    // 1) Ingest and aggregate.
    let ingest = load_incidence_records(&config.dataset_path)?;
    let encoder = DiseaseEncoder::from_records(&ingest.records);
    let points = aggregate(&ingest.records, &encoder)?;

    // 2) Window; diseases with too little history drop out here.
    let windowed = build_windows(&points, seq_len);
    let excluded = disease_names(&encoder, &windowed.excluded);
    for name in &excluded {
        log::info!("Excluding '{name}' from training: fewer than {} seasons of history.", seq_len + 1);
    }
    if windowed.windows.is_empty() {
        return Err(AppError::data(format!(
            "No disease has more than {seq_len} seasons of history; nothing to train on."
        )));
    }

    // 3) Scale over all windows, then split chronologically.
    let scalers = FittedScalers::fit(&windowed.windows)?;
    let n_windows = windowed.windows.len();
    let split = chronological_split(scalers.scale_windows(&windowed.windows), config.train_fraction);
    if split.train.is_empty() {
        return Err(AppError::data(format!("Train split is empty ({n_windows} windows).")));
    }
    if split.test.is_empty() {
        return Err(AppError::data(format!("Test split is empty ({n_windows} windows).")));
    }
    log::info!(
        "{} windows from {} diseases: {} train / {} test",
        n_windows,
        encoder.len() - excluded.len(),
        split.train.len(),
        split.test.len()
    );

    // 4) Fit with the test split as validation data.
    let (x_train, y_train) = training_arrays(&split.train, seq_len)?;
    let (x_test, y_test) = training_arrays(&split.test, seq_len)?;
    let (model, report) = fit_stacked_lstm(
        &config.model,
        &config.training,
        &x_train,
        &y_train,
        Some((&x_test, &y_test)),
        observer,
    )?;

    // 5) Evaluate and forecast with the fitted scalers.
    let evaluation = evaluate(&model, &split.test, &scalers)?;
    let next_season = forecast_next(&model, &points, &encoder, &scalers)?;

    // 6) Persist.
    let layout = OutputLayout::new(&config.out_dir);
    let artifacts = TrainedArtifacts {
        model,
        scalers,
        encoder,
    };
    save_artifacts(&layout, &artifacts)?;
    write_train_log_csv(&layout.train_log_path(), &report.history)?;
    write_metrics_csv(&layout.metrics_csv_path(), &evaluation.metrics)?;
    write_forecast_csv(&layout.forecast_csv_path(), &next_season.forecasts)?;
    if config.charts {
        write_training_charts(&layout, &report, &evaluation, &next_season)?;
    }

    let summary = RunSummary {
        rows: ingest.rows_read,
        diseases: artifacts.encoder.len(),
        series_points: points.len(),
        windows: n_windows,
        train: split.train.len(),
        test: split.test.len(),
        seq_len,
        excluded,
    };

    Ok(TrainOutput {
        summary,
        report,
        evaluation,
        next_season,
        artifacts,
    })
}

/// Forecast the next season with artifacts from a previous `train` run.
pub fn run_predict(config: &PredictConfig) -> Result<NextSeason, AppError> {
    let ingest = load_incidence_records(&config.dataset_path)?;
    let layout = OutputLayout::new(&config.out_dir);
    let artifacts = load_artifacts(&layout)?;

    let points: Vec<SeriesPoint> = aggregate(&ingest.records, &artifacts.encoder)?;
    let next = forecast_next(&artifacts.model, &points, &artifacts.encoder, &artifacts.scalers)?;
    write_forecast_csv(&layout.forecast_csv_path(), &next.forecasts)?;
    log::info!("Forecast {} diseases, skipped {}", next.forecasts.len(), next.skipped.len());
    Ok(next)
}

fn disease_names(encoder: &DiseaseEncoder, ids: &[usize]) -> Vec<String> {
    ids.iter()
        .map(|&id| encoder.decode(id).map(str::to_string).unwrap_or_else(|| format!("#{id}")))
        .collect()
}

fn write_training_charts(
    layout: &OutputLayout,
    report: &TrainReport,
    evaluation: &Evaluation,
    next: &NextSeason,
) -> Result<(), AppError> {
    let dir = layout.visualization_dir();

    let metrics: Vec<(String, f64)> = metric_rows(&evaluation.metrics)
        .into_iter()
        .map(|(name, v)| (name.to_string(), v))
        .collect();
    write_bar_chart(&dir.join("metrics_plot.svg"), "Evaluation metrics (test split)", "Value", &metrics)?;

    let forecasts: Vec<(String, f64)> = next
        .forecasts
        .iter()
        .map(|f| (f.disease.clone(), f.predicted_count))
        .collect();
    write_bar_chart(
        &dir.join("forecasted_counts_plot.svg"),
        "Forecasted cases, next season",
        "Predicted count",
        &forecasts,
    )?;

    let loss: Vec<(f64, f64)> = report.history.iter().map(|e| (e.epoch as f64 + 1.0, e.loss)).collect();
    let val: Vec<(f64, f64)> = report
        .history
        .iter()
        .filter_map(|e| e.val_loss.map(|v| (e.epoch as f64 + 1.0, v)))
        .collect();
    write_line_chart(
        &dir.join("loss_curve.svg"),
        "Training loss",
        "Epoch",
        "MSE (scaled)",
        &[("loss".to_string(), loss), ("val_loss".to_string(), val)],
    )?;
    Ok(())
}

//! CSV exports: the synthetic dataset, evaluation metrics, next-season
//! forecasts and the per-epoch training log.
//!
//! All files are plain CSV with a header row, meant to be easy to consume in
//! spreadsheets or downstream scripts. Existing files are overwritten.

use std::fs;
use std::path::Path;

use crate::domain::{EpochLog, EvaluationResult, ForecastRecord, IncidenceRecord};
use crate::error::AppError;
use crate::io::ingest::REQUIRED_COLUMNS;

/// Create the parent directory of `path` if it does not exist.
pub fn ensure_parent_dir(path: &Path) -> Result<(), AppError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)
            .map_err(|e| AppError::io(format!("Failed to create directory '{}': {e}", dir.display()))),
        _ => Ok(()),
    }
}

fn create_writer(path: &Path) -> Result<csv::Writer<fs::File>, AppError> {
    ensure_parent_dir(path)?;
    csv::Writer::from_path(path).map_err(|e| AppError::io(format!("Failed to create CSV '{}': {e}", path.display())))
}

fn write_row<I, T>(wtr: &mut csv::Writer<fs::File>, path: &Path, row: I) -> Result<(), AppError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    wtr.write_record(row)
        .map_err(|e| AppError::io(format!("Failed to write CSV row to '{}': {e}", path.display())))
}

fn finish(mut wtr: csv::Writer<fs::File>, path: &Path) -> Result<(), AppError> {
    wtr.flush()
        .map_err(|e| AppError::io(format!("Failed to flush CSV '{}': {e}", path.display())))
}

/// Write incidence rows with the same header the ingest expects.
pub fn write_dataset_csv(path: &Path, records: &[IncidenceRecord]) -> Result<(), AppError> {
    let mut wtr = create_writer(path)?;
    write_row(&mut wtr, path, REQUIRED_COLUMNS)?;
    for r in records {
        write_row(
            &mut wtr,
            path,
            [
                r.date.format("%Y-%m-%d").to_string(),
                r.state.clone(),
                r.disease.clone(),
                r.count.to_string(),
                r.year.to_string(),
                r.month.to_string(),
                r.season.name().to_string(),
            ],
        )?;
    }
    finish(wtr, path)
}

/// `Metric,Value` rows.
pub fn write_metrics_csv(path: &Path, metrics: &EvaluationResult) -> Result<(), AppError> {
    let mut wtr = create_writer(path)?;
    write_row(&mut wtr, path, ["Metric", "Value"])?;
    for (name, value) in metric_rows(metrics) {
        write_row(&mut wtr, path, [name.to_string(), value.to_string()])?;
    }
    finish(wtr, path)
}

/// Metric names and values in report order.
pub fn metric_rows(metrics: &EvaluationResult) -> [(&'static str, f64); 4] {
    [
        ("MAE", metrics.mae),
        ("RMSE", metrics.rmse),
        ("R2 Score", metrics.r2),
        ("Accuracy Rate (%)", metrics.accuracy_pct),
    ]
}

/// `Disease,Predicted_Count` rows in the given (already sorted) order.
pub fn write_forecast_csv(path: &Path, forecasts: &[ForecastRecord]) -> Result<(), AppError> {
    let mut wtr = create_writer(path)?;
    write_row(&mut wtr, path, ["Disease", "Predicted_Count"])?;
    for f in forecasts {
        write_row(&mut wtr, path, [f.disease.clone(), f.predicted_count.to_string()])?;
    }
    finish(wtr, path)
}

/// `epoch,loss,val_loss` rows with 0-based epochs; `val_loss` is empty when absent.
pub fn write_train_log_csv(path: &Path, history: &[EpochLog]) -> Result<(), AppError> {
    let mut wtr = create_writer(path)?;
    write_row(&mut wtr, path, ["epoch", "loss", "val_loss"])?;
    for e in history {
        write_row(
            &mut wtr,
            path,
            [
                e.epoch.to_string(),
                e.loss.to_string(),
                e.val_loss.map(|v| v.to_string()).unwrap_or_default(),
            ],
        )?;
    }
    finish(wtr, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Season;
    use crate::io::ingest::load_incidence_records;
    use chrono::NaiveDate;

    #[test]
    fn dataset_csv_round_trips_through_ingest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dataset.csv");
        let records = vec![
            IncidenceRecord {
                date: NaiveDate::from_ymd_opt(2019, 7, 14).unwrap(),
                state: "Andhra Pradesh".to_string(),
                disease: "Eye Infection".to_string(),
                count: 23,
                year: 2019,
                month: 7,
                season: Season::Summer,
            },
            IncidenceRecord {
                date: NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
                state: "Delhi".to_string(),
                disease: "Fever".to_string(),
                count: 0,
                year: 2020,
                month: 1,
                season: Season::Winter,
            },
        ];
        write_dataset_csv(&path, &records).unwrap();
        let back = load_incidence_records(&path).unwrap();
        assert_eq!(back.records, records);
    }

    #[test]
    fn metrics_and_forecast_layout() {
        let dir = tempfile::tempdir().unwrap();
        let metrics_path = dir.path().join("evaluation_metrics.csv");
        write_metrics_csv(
            &metrics_path,
            &EvaluationResult { mae: 1.5, rmse: 2.0, r2: 0.5, accuracy_pct: 90.0, n: 3 },
        )
        .unwrap();
        let text = fs::read_to_string(&metrics_path).unwrap();
        assert_eq!(text, "Metric,Value\nMAE,1.5\nRMSE,2\nR2 Score,0.5\nAccuracy Rate (%),90\n");

        let forecast_path = dir.path().join("forecast.csv");
        write_forecast_csv(
            &forecast_path,
            &[ForecastRecord { disease: "Cold".to_string(), predicted_count: 12.25 }],
        )
        .unwrap();
        let text = fs::read_to_string(&forecast_path).unwrap();
        assert_eq!(text, "Disease,Predicted_Count\nCold,12.25\n");
    }

    #[test]
    fn train_log_leaves_missing_val_loss_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train_log.csv");
        write_train_log_csv(
            &path,
            &[
                EpochLog { epoch: 0, loss: 0.5, val_loss: Some(0.25) },
                EpochLog { epoch: 1, loss: 0.375, val_loss: None },
            ],
        )
        .unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "epoch,loss,val_loss\n0,0.5,0.25\n1,0.375,\n");
    }
}

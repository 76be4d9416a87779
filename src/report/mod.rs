//! Reporting: test-split evaluation, next-season forecasts, dataset
//! summaries and formatted terminal output.

use crate::domain::{EvaluationResult, ForecastRecord, ScaledWindow, SeriesPoint};
use crate::error::AppError;
use crate::math::FittedScalers;
use crate::models::{Forecaster, input_matrix};
use crate::series::{DiseaseEncoder, latest_windows};

pub mod dataset;
pub mod format;
pub mod metrics;

pub use dataset::*;
pub use format::*;
pub use metrics::*;

/// Test-split metrics plus the inverse-scaled series they were computed on.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub metrics: EvaluationResult,
    pub actual: Vec<f64>,
    pub predicted: Vec<f64>,
}

/// Next-season forecasts, sorted descending, plus diseases without enough history.
#[derive(Debug, Clone, PartialEq)]
pub struct NextSeason {
    pub forecasts: Vec<ForecastRecord>,
    pub skipped: Vec<String>,
}

/// Predict the test windows and score them in raw count units.
pub fn evaluate(
    model: &dyn Forecaster,
    test: &[ScaledWindow],
    scalers: &FittedScalers,
) -> Result<Evaluation, AppError> {
    if test.is_empty() {
        return Err(AppError::data("Test split is empty; nothing to evaluate."));
    }
    let x = input_matrix(test.iter().map(|w| w.history.as_slice()), model.seq_len())?;
    let scaled_pred = model.predict(&x)?;
    if scaled_pred.iter().any(|v| !v.is_finite()) {
        return Err(AppError::model("Model produced non-finite predictions on the test split."));
    }

    let predicted = scalers.y().inverse_all(scaled_pred.as_slice());
    let actual: Vec<f64> = test.iter().map(|w| scalers.y().inverse(w.target)).collect();
    let metrics = regression_metrics(&actual, &predicted)?;

    log::info!(
        "Evaluated {} test windows: MAE={:.3} RMSE={:.3} R2={:.3}",
        metrics.n,
        metrics.mae,
        metrics.rmse,
        metrics.r2
    );
    Ok(Evaluation {
        metrics,
        actual,
        predicted,
    })
}

/// Forecast the season after the last observed one, for every disease that
/// has at least `seq_len` points.
///
/// Inputs always come from the tail of each full series, whether or not those
/// points were part of the training split.
pub fn forecast_next(
    model: &dyn Forecaster,
    points: &[SeriesPoint],
    encoder: &DiseaseEncoder,
    scalers: &FittedScalers,
) -> Result<NextSeason, AppError> {
    let seq_len = model.seq_len();
    let mut ids = Vec::new();
    let mut inputs = Vec::new();
    let mut skipped = Vec::new();

    for (disease_id, tail) in latest_windows(points, seq_len) {
        let name = encoder
            .decode(disease_id)
            .ok_or_else(|| AppError::model(format!("Disease id {disease_id} is not in the label encoder.")))?;
        match tail {
            Some(tail) => {
                ids.push(disease_id);
                inputs.push(scalers.x().transform_all(&tail));
            }
            None => {
                log::info!("Skipping forecast for '{name}': fewer than {seq_len} seasons of history.");
                skipped.push(name.to_string());
            }
        }
    }

    if inputs.is_empty() {
        return Ok(NextSeason {
            forecasts: Vec::new(),
            skipped,
        });
    }

    let x = input_matrix(inputs.iter().map(Vec::as_slice), seq_len)?;
    let scaled_pred = model.predict(&x)?;
    if scaled_pred.iter().any(|v| !v.is_finite()) {
        return Err(AppError::model("Model produced non-finite next-season predictions."));
    }

    let mut rows: Vec<(usize, f64)> = ids
        .into_iter()
        .zip(scaled_pred.iter().map(|&v| scalers.y().inverse(v)))
        .collect();
    // Stable sort: ties keep ascending disease id order.
    rows.sort_by_key(|&(id, _)| id);
    rows.sort_by(|a, b| b.1.total_cmp(&a.1));

    let forecasts = rows
        .into_iter()
        .map(|(id, predicted_count)| ForecastRecord {
            disease: encoder.decode(id).unwrap_or_default().to_string(),
            predicted_count,
        })
        .collect();

    Ok(NextSeason { forecasts, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Window;
    use crate::math::MinMaxScaler;
    use nalgebra::{DMatrix, DVector};

    /// Predicts the last step of each row unchanged.
    struct Persistence {
        seq_len: usize,
    }

    impl Forecaster for Persistence {
        fn seq_len(&self) -> usize {
            self.seq_len
        }

        fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, AppError> {
            Ok(DVector::from_iterator(x.nrows(), x.row_iter().map(|r| r[r.len() - 1])))
        }
    }

    fn points(disease_id: usize, counts: &[u64]) -> Vec<SeriesPoint> {
        counts
            .iter()
            .enumerate()
            .map(|(i, &c)| SeriesPoint {
                disease_id,
                year: 2016 + (i / 4) as i32,
                season_order: (i % 4) as u8,
                summed_count: c,
            })
            .collect()
    }

    fn identity_scalers() -> FittedScalers {
        let unit = MinMaxScaler::fit(&[0.0, 1.0]).unwrap();
        FittedScalers::from_parts(unit, unit).unwrap()
    }

    #[test]
    fn perfect_predictor_scores_perfectly() {
        let windows = [
            Window { disease_id: 0, history: vec![2.0, 2.0], target: 2.0 },
            Window { disease_id: 0, history: vec![2.0, 5.0], target: 5.0 },
        ];
        let scalers = FittedScalers::fit(&windows).unwrap();
        // Targets equal the last history value and x/y bounds coincide, so
        // persistence is exact.
        let test = scalers.scale_windows(&windows);
        let model = Persistence { seq_len: 2 };
        let eval = evaluate(&model, &test, &scalers).unwrap();

        assert_eq!(eval.actual, vec![2.0, 5.0]);
        assert_eq!(eval.metrics.mae, 0.0);
        assert_eq!(eval.metrics.rmse, 0.0);
        assert_eq!(eval.metrics.r2, 1.0);
        assert_eq!(eval.metrics.accuracy_pct, 100.0);
    }

    #[test]
    fn empty_test_split_is_data_error() {
        let model = Persistence { seq_len: 4 };
        let err = evaluate(&model, &[], &identity_scalers()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Data);
    }

    #[test]
    fn forecasts_use_latest_points_and_skip_short_series() {
        let encoder = DiseaseEncoder::fit(["Cold", "Dengue", "Fever"]);
        let mut all = points(0, &[10, 12, 11, 13, 14, 15]);
        all.extend(points(1, &[1, 2, 3]));
        all.extend(points(2, &[7, 7, 7, 7]));

        let model = Persistence { seq_len: 4 };
        let out = forecast_next(&model, &all, &encoder, &identity_scalers()).unwrap();

        assert_eq!(out.skipped, vec!["Dengue".to_string()]);
        assert_eq!(
            out.forecasts,
            vec![
                ForecastRecord { disease: "Cold".to_string(), predicted_count: 15.0 },
                ForecastRecord { disease: "Fever".to_string(), predicted_count: 7.0 },
            ]
        );
    }

    #[test]
    fn ties_keep_disease_id_order() {
        let encoder = DiseaseEncoder::fit(["A", "B", "C"]);
        let mut all = points(2, &[5, 5]);
        all.extend(points(0, &[5, 5]));
        all.extend(points(1, &[9, 9]));

        let model = Persistence { seq_len: 2 };
        let out = forecast_next(&model, &all, &encoder, &identity_scalers()).unwrap();
        let names: Vec<&str> = out.forecasts.iter().map(|f| f.disease.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }
}

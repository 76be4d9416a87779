//! Regression metrics in raw count units.

use crate::domain::EvaluationResult;
use crate::error::AppError;

/// Guard added to the truth mean in the accuracy heuristic.
pub const ACCURACY_EPSILON: f64 = 1e-6;

pub fn mae(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let n = y_true.len().min(y_pred.len());
    if n == 0 {
        return f64::NAN;
    }
    y_true.iter().zip(y_pred).map(|(t, p)| (t - p).abs()).sum::<f64>() / n as f64
}

pub fn rmse(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let n = y_true.len().min(y_pred.len());
    if n == 0 {
        return f64::NAN;
    }
    (y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum::<f64>() / n as f64).sqrt()
}

/// Coefficient of determination against the mean of `y_true`.
///
/// Constant truth gives 1 for an exact fit and 0 otherwise; fewer than two
/// samples give NaN.
pub fn r2(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let n = y_true.len().min(y_pred.len());
    if n < 2 {
        return f64::NAN;
    }
    let mean = y_true[..n].iter().sum::<f64>() / n as f64;
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    let ss_tot: f64 = y_true[..n].iter().map(|t| (t - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// `100 - MAE / (mean(y_true) + ε) * 100`, left unclamped.
pub fn accuracy_pct(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return f64::NAN;
    }
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    100.0 - (mae(y_true, y_pred) / (mean + ACCURACY_EPSILON)) * 100.0
}

/// All four metrics at once.
pub fn regression_metrics(y_true: &[f64], y_pred: &[f64]) -> Result<EvaluationResult, AppError> {
    if y_true.len() != y_pred.len() {
        return Err(AppError::model(format!(
            "Metric inputs differ in length ({} truths, {} predictions).",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(AppError::data("Cannot evaluate on an empty test split."));
    }
    Ok(EvaluationResult {
        mae: mae(y_true, y_pred),
        rmse: rmse(y_true, y_pred),
        r2: r2(y_true, y_pred),
        accuracy_pct: accuracy_pct(y_true, y_pred),
        n: y_true.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictor() {
        let y = [10.0, 20.0, 35.0, 5.0];
        let m = regression_metrics(&y, &y).unwrap();
        assert_eq!(m.mae, 0.0);
        assert_eq!(m.rmse, 0.0);
        assert_eq!(m.r2, 1.0);
        assert_eq!(m.accuracy_pct, 100.0);
        assert_eq!(m.n, 4);
    }

    #[test]
    fn hand_computed_values() {
        let t = [1.0, 2.0, 3.0, 4.0];
        let p = [2.0, 2.0, 2.0, 2.0];
        assert!((mae(&t, &p) - 1.0).abs() < 1e-12);
        assert!((rmse(&t, &p) - 1.5f64.sqrt()).abs() < 1e-12);
        // ss_res = 1+0+1+4 = 6, ss_tot = 5
        assert!((r2(&t, &p) - (1.0 - 6.0 / 5.0)).abs() < 1e-12);
        assert!((accuracy_pct(&t, &p) - (100.0 - 100.0 / (2.5 + ACCURACY_EPSILON))).abs() < 1e-9);
    }

    #[test]
    fn degenerate_r2_cases() {
        assert_eq!(r2(&[3.0, 3.0], &[3.0, 3.0]), 1.0);
        assert_eq!(r2(&[3.0, 3.0], &[2.0, 3.0]), 0.0);
        assert!(r2(&[3.0], &[3.0]).is_nan());
    }

    #[test]
    fn accuracy_is_not_clamped() {
        let t = [1.0, 1.0];
        let p = [5.0, 5.0];
        assert!(accuracy_pct(&t, &p) < -200.0);
    }

    #[test]
    fn empty_and_mismatched_inputs_are_errors() {
        assert!(regression_metrics(&[], &[]).is_err());
        assert!(regression_metrics(&[1.0], &[1.0, 2.0]).is_err());
    }
}

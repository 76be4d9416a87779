//! Sequence regressors.
//!
//! The pipeline only depends on the `Forecaster` contract: a batch of scaled
//! history windows in, one scaled value per window out. With a single feature
//! per time step the `(batch, seq_len, 1)` input tensor is carried as a
//! `batch × seq_len` matrix and only becomes a burn tensor inside `lstm`.

use nalgebra::{DMatrix, DVector};

use crate::domain::ScaledWindow;
use crate::error::AppError;

pub mod lstm;

pub use lstm::*;

/// A fitted one-step-ahead regressor over scaled windows.
pub trait Forecaster {
    /// Number of time steps each input row must carry.
    fn seq_len(&self) -> usize;

    /// Predict one scaled value per row of `x` (`m × seq_len`).
    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, AppError>;
}

/// Stack histories row-wise into an `n × seq_len` input matrix.
pub fn input_matrix<'a>(
    histories: impl ExactSizeIterator<Item = &'a [f64]>,
    seq_len: usize,
) -> Result<DMatrix<f64>, AppError> {
    let n = histories.len();
    let mut x = DMatrix::zeros(n, seq_len);
    for (row, history) in histories.enumerate() {
        if history.len() != seq_len {
            return Err(AppError::model(format!(
                "Input window has {} steps, model expects {seq_len}.",
                history.len()
            )));
        }
        for (col, &v) in history.iter().enumerate() {
            x[(row, col)] = v;
        }
    }
    Ok(x)
}

/// Inputs and targets of scaled windows, in window order.
pub fn training_arrays(windows: &[ScaledWindow], seq_len: usize) -> Result<(DMatrix<f64>, DVector<f64>), AppError> {
    let x = input_matrix(windows.iter().map(|w| w.history.as_slice()), seq_len)?;
    let y = DVector::from_iterator(windows.len(), windows.iter().map(|w| w.target));
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_matrix_is_row_per_window() {
        let rows = [vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let x = input_matrix(rows.iter().map(Vec::as_slice), 2).unwrap();
        assert_eq!(x.shape(), (3, 2));
        assert_eq!(x[(1, 0)], 3.0);
        assert_eq!(x[(2, 1)], 6.0);
    }

    #[test]
    fn input_matrix_rejects_wrong_length() {
        let rows = [vec![1.0, 2.0, 3.0]];
        assert!(input_matrix(rows.iter().map(Vec::as_slice), 4).is_err());
    }
}

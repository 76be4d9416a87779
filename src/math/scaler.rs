//! Min-max scaling of counts into the unit range.
//!
//! A fitted scaler is a pair of bounds and nothing else. Fields are private
//! and the only ways to obtain one are `fit` (during training) and
//! deserializing a persisted artifact, so inference code cannot quietly refit
//! on the data it is predicting.

use serde::{Deserialize, Serialize};

use crate::domain::{ScaledWindow, Window};
use crate::error::AppError;

/// Linear map from `[min, max]` onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: f64,
    max: f64,
}

impl MinMaxScaler {
    /// Fit the bounds on a non-empty set of finite values.
    pub fn fit(values: &[f64]) -> Result<Self, AppError> {
        if values.is_empty() {
            return Err(AppError::data("Cannot fit a scaler on an empty set of values."));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(AppError::data("Cannot fit a scaler on non-finite values."));
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// True when the bounds are finite and ordered (checked after loading from disk).
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }

    fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Forward map. A zero-width range sends every value to 0.
    pub fn transform(&self, x: f64) -> f64 {
        let range = self.range();
        if range == 0.0 {
            return 0.0;
        }
        (x - self.min) / range
    }

    /// Inverse map. A zero-width range sends every value back to `min`.
    pub fn inverse(&self, x: f64) -> f64 {
        x * self.range() + self.min
    }

    pub fn transform_all(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.transform(x)).collect()
    }

    pub fn inverse_all(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.inverse(x)).collect()
    }
}

/// The two scalers of one training run: history values (`x`) and targets (`y`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedScalers {
    x: MinMaxScaler,
    y: MinMaxScaler,
}

impl FittedScalers {
    /// Fit the X-scaler on every history value (flattened across windows and
    /// positions) and the y-scaler on every target.
    pub fn fit(windows: &[Window]) -> Result<Self, AppError> {
        let history: Vec<f64> = windows.iter().flat_map(|w| w.history.iter().copied()).collect();
        let targets: Vec<f64> = windows.iter().map(|w| w.target).collect();
        Ok(Self {
            x: MinMaxScaler::fit(&history)?,
            y: MinMaxScaler::fit(&targets)?,
        })
    }

    /// Reassemble a pair loaded from separate artifacts.
    pub fn from_parts(x: MinMaxScaler, y: MinMaxScaler) -> Result<Self, AppError> {
        if !(x.is_valid() && y.is_valid()) {
            return Err(AppError::model("Loaded scaler bounds are invalid (non-finite or min > max)."));
        }
        Ok(Self { x, y })
    }

    pub fn x(&self) -> &MinMaxScaler {
        &self.x
    }

    pub fn y(&self) -> &MinMaxScaler {
        &self.y
    }

    pub fn scale_window(&self, window: &Window) -> ScaledWindow {
        ScaledWindow {
            disease_id: window.disease_id,
            history: self.x.transform_all(&window.history),
            target: self.y.transform(window.target),
        }
    }

    pub fn scale_windows(&self, windows: &[Window]) -> Vec<ScaledWindow> {
        windows.iter().map(|w| self.scale_window(w)).collect()
    }
}

//! Records, series and configs passed between pipeline stages.
//!
//! Rows flow as `IncidenceRecord` -> `SeriesPoint` -> `Window` -> `ScaledWindow`.
//! Types that end up in artifacts or CSV files derive serde.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of past seasons fed to the model.
pub const DEFAULT_SEQ_LEN: usize = 4;

/// Number of seasons predicted per window. Only one-step-ahead is supported.
pub const HORIZON: usize = 1;

/// Fraction of windows (chronological prefix) used for training.
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.8;

/// Meteorological season of an incidence row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    /// Seasons in the order rows are generated (calendar order within a year).
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Autumn];

    /// Position of the season on the time axis used for windowing.
    ///
    /// This is not calendar order: Winter sorts last within a year.
    pub fn order(self) -> u8 {
        match self {
            Season::Spring => 0,
            Season::Summer => 1,
            Season::Autumn => 2,
            Season::Winter => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
        }
    }

    /// Parse a season name (exact, case-sensitive match on the canonical names).
    pub fn from_name(s: &str) -> Option<Self> {
        Season::ALL.into_iter().find(|season| season.name() == s)
    }

    /// Representative month written by the synthetic generator.
    pub fn month(self) -> u32 {
        match self {
            Season::Winter => 1,
            Season::Spring => 4,
            Season::Summer => 7,
            Season::Autumn => 10,
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the input dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidenceRecord {
    pub date: NaiveDate,
    pub state: String,
    pub disease: String,
    pub count: u32,
    pub year: i32,
    pub month: u32,
    pub season: Season,
}

/// Summed incidence of one disease in one (year, season).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesPoint {
    pub disease_id: usize,
    pub year: i32,
    pub season_order: u8,
    pub summed_count: u64,
}

/// A history window and the count that immediately follows it.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub disease_id: usize,
    pub history: Vec<f64>,
    pub target: f64,
}

/// A `Window` mapped into the unit range by the fitted scalers.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledWindow {
    pub disease_id: usize,
    pub history: Vec<f64>,
    pub target: f64,
}

/// Chronological train/test partition.
#[derive(Debug, Clone, PartialEq)]
pub struct Split<T> {
    pub train: Vec<T>,
    pub test: Vec<T>,
}

/// Test-split metrics in raw count units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
    /// `100 - MAE / mean(y_true) * 100`. Unbounded on both sides.
    pub accuracy_pct: f64,
    pub n: usize,
}

/// Next-season forecast for one disease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub disease: String,
    pub predicted_count: f64,
}

/// Losses observed at the end of one training epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochLog {
    /// Zero-based epoch index.
    pub epoch: usize,
    pub loss: f64,
    /// `None` when training ran without validation rows.
    pub val_loss: Option<f64>,
}

/// Shape of the stacked recurrent model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub seq_len: usize,
    /// Hidden size of each LSTM layer, input side first.
    pub hidden_sizes: Vec<usize>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            seq_len: DEFAULT_SEQ_LEN,
            hidden_sizes: vec![64, 32],
        }
    }
}

/// Optimizer and early-stopping settings.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOptions {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Epochs without validation improvement before training stops.
    pub patience: usize,
    /// Rescale the batch gradient when its global L2 norm exceeds this value.
    pub clip_norm: Option<f64>,
    pub shuffle: bool,
    pub seed: u64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            epochs: 100,
            batch_size: 32,
            learning_rate: 1e-3,
            patience: 10,
            clip_norm: Some(1.0),
            shuffle: true,
            seed: 42,
        }
    }
}

/// A full `incidence train` run as understood by the pipeline.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub dataset_path: PathBuf,
    pub out_dir: PathBuf,
    pub train_fraction: f64,
    pub model: ModelConfig,
    pub training: TrainingOptions,
    pub top_n: usize,
    pub charts: bool,
}

/// A full `incidence predict` run.
#[derive(Debug, Clone)]
pub struct PredictConfig {
    pub dataset_path: PathBuf,
    pub out_dir: PathBuf,
    pub top_n: usize,
}

/// Synthetic dataset settings.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub output_path: PathBuf,
    pub seed: u64,
    pub entries_per_combo: usize,
    pub first_year: i32,
    pub last_year: i32,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("dataset/dataset.csv"),
            seed: 42,
            entries_per_combo: 60,
            first_year: 2016,
            last_year: 2024,
        }
    }
}

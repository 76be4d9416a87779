//! `incidence` command-line definition.
//!
//! Only clap structs live here. `crate::app` turns them into the config structs
//! of `crate::domain` and validates ranges clap cannot express.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{DEFAULT_SEQ_LEN, DEFAULT_TRAIN_FRACTION};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "incidence",
    version,
    about = "Seasonal disease incidence forecasting with a stacked LSTM"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write a reproducible synthetic incidence dataset.
    Generate(GenerateArgs),
    /// Validate the dataset schema, print coverage statistics and write coverage charts.
    Check(CheckArgs),
    /// Print descriptive statistics and write analysis charts.
    Analyze(AnalyzeArgs),
    /// Run the full pipeline: aggregate, window, scale, split, train, evaluate, forecast.
    Train(TrainArgs),
    /// Forecast the next season with previously trained artifacts.
    Predict(PredictArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct GenerateArgs {
    /// Output CSV path.
    #[arg(long, short = 'o', default_value = "dataset/dataset.csv")]
    pub output: PathBuf,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Rows per (state, disease, year, season) combination.
    #[arg(long, default_value_t = 60)]
    pub entries_per_combo: usize,
}

/// Options shared by every command that reads the dataset.
#[derive(Debug, Parser, Clone)]
pub struct DatasetArgs {
    /// Incidence CSV (Date, State, Disease, Disease_Count, Year, Month, Season).
    #[arg(long, short = 'd', env = "INCIDENCE_DATASET", default_value = "dataset/dataset.csv")]
    pub dataset: PathBuf,
}

#[derive(Debug, Parser, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub data: DatasetArgs,

    /// Root directory for run outputs.
    #[arg(long, env = "INCIDENCE_OUT_DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Skip writing SVG charts.
    #[arg(long)]
    pub no_charts: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub data: DatasetArgs,

    /// Root directory for run outputs.
    #[arg(long, env = "INCIDENCE_OUT_DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Show top-N diseases by total count.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Skip writing SVG charts.
    #[arg(long)]
    pub no_charts: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct TrainArgs {
    #[command(flatten)]
    pub data: DatasetArgs,

    /// Root directory for run outputs.
    #[arg(long, env = "INCIDENCE_OUT_DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Past seasons per training window.
    #[arg(long, default_value_t = DEFAULT_SEQ_LEN)]
    pub seq_len: usize,

    /// Chronological fraction of windows used for training.
    #[arg(long, default_value_t = DEFAULT_TRAIN_FRACTION)]
    pub train_fraction: f64,

    /// Hidden sizes of the stacked LSTM layers, input side first.
    #[arg(long, value_delimiter = ',', default_values_t = [64usize, 32])]
    pub hidden: Vec<usize>,

    /// Maximum number of epochs.
    #[arg(long, default_value_t = 100)]
    pub epochs: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub learning_rate: f64,

    /// Epochs without validation improvement before stopping.
    #[arg(long, default_value_t = 10)]
    pub patience: usize,

    /// Gradient-norm clip applied to each parameter tensor (0 disables clipping).
    #[arg(long, default_value_t = 1.0)]
    pub clip_norm: f64,

    /// Seed for weight init and batch shuffling.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Show top-N forecasts.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Skip writing SVG charts.
    #[arg(long)]
    pub no_charts: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub data: DatasetArgs,

    /// Root directory holding `trained_models/` from a previous `train`.
    #[arg(long, env = "INCIDENCE_OUT_DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Show top-N forecasts.
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

//! Output directory layout and persisted training artifacts.
//!
//! A training run leaves the model weights behind as a burn binary record,
//! plus JSON for the layer sizes, the X- and y-scalers and the disease label
//! encoder. `predict` reloads exactly these files and never refits anything.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::io::export::ensure_parent_dir;
use crate::math::{FittedScalers, MinMaxScaler};
use crate::domain::ModelConfig;
use crate::models::StackedLstm;
use crate::series::DiseaseEncoder;

const MODEL_NAME: &str = "stacked_lstm";

/// Where every run output lives under `--out-dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn model_dir(&self) -> PathBuf {
        self.root.join("trained_models").join(MODEL_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join("logs").join(MODEL_NAME)
    }

    pub fn visualization_dir(&self) -> PathBuf {
        self.root.join("visualization").join(MODEL_NAME)
    }

    pub fn analysis_dir(&self) -> PathBuf {
        self.root.join("visualization").join("data_analysis")
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_dir().join("model.bin")
    }

    pub fn model_config_path(&self) -> PathBuf {
        self.model_dir().join("model_config.json")
    }

    pub fn scaler_x_path(&self) -> PathBuf {
        self.model_dir().join("scaler_x.json")
    }

    pub fn scaler_y_path(&self) -> PathBuf {
        self.model_dir().join("scaler_y.json")
    }

    pub fn encoder_path(&self) -> PathBuf {
        self.model_dir().join("label_encoder.json")
    }

    pub fn train_log_path(&self) -> PathBuf {
        self.log_dir().join("train_log.csv")
    }

    pub fn metrics_csv_path(&self) -> PathBuf {
        self.visualization_dir().join("evaluation_metrics.csv")
    }

    pub fn forecast_csv_path(&self) -> PathBuf {
        self.visualization_dir().join("forecasted_diseases_next_season.csv")
    }
}

/// Everything `predict` needs from a training run.
#[derive(Debug, Clone)]
pub struct TrainedArtifacts {
    pub model: StackedLstm,
    pub scalers: FittedScalers,
    pub encoder: DiseaseEncoder,
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    ensure_parent_dir(path)?;
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", path.display())))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))?;
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::io(format!(
            "Failed to open artifact '{}': {e} (run `incidence train` first?)",
            path.display()
        ))
    })?;
    serde_json::from_reader(std::io::BufReader::new(file))
        .map_err(|e| AppError::io(format!("Invalid artifact JSON '{}': {e}", path.display())))
}

pub fn save_artifacts(layout: &OutputLayout, artifacts: &TrainedArtifacts) -> Result<(), AppError> {
    write_json(&layout.model_config_path(), artifacts.model.config())?;
    artifacts.model.save(&layout.model_path())?;
    write_json(&layout.scaler_x_path(), artifacts.scalers.x())?;
    write_json(&layout.scaler_y_path(), artifacts.scalers.y())?;
    write_json(&layout.encoder_path(), &artifacts.encoder)?;
    log::info!("Saved model artifacts to {}", layout.model_dir().display());
    Ok(())
}

/// Load and cross-check the artifacts of a previous training run.
pub fn load_artifacts(layout: &OutputLayout) -> Result<TrainedArtifacts, AppError> {
    let config: ModelConfig = read_json(&layout.model_config_path())?;
    let model = StackedLstm::load(config, &layout.model_path())?;
    let x: MinMaxScaler = read_json(&layout.scaler_x_path())?;
    let y: MinMaxScaler = read_json(&layout.scaler_y_path())?;
    let scalers = FittedScalers::from_parts(x, y)?;
    let encoder: DiseaseEncoder = read_json(&layout.encoder_path())?;
    if encoder.is_empty() {
        return Err(AppError::model("Label encoder artifact lists no diseases."));
    }
    log::info!(
        "Loaded model artifacts from {} ({} diseases)",
        layout.model_dir().display(),
        encoder.len()
    );
    Ok(TrainedArtifacts {
        model,
        scalers,
        encoder,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Window;
    use crate::models::Forecaster;
    use nalgebra::DMatrix;

    fn artifacts() -> TrainedArtifacts {
        let config = ModelConfig {
            seq_len: 2,
            hidden_sizes: vec![3, 2],
        };
        let scalers = FittedScalers::fit(&[Window {
            disease_id: 0,
            history: vec![1.0, 9.0],
            target: 4.0,
        }])
        .unwrap();
        TrainedArtifacts {
            model: StackedLstm::new(config, 3).unwrap(),
            scalers,
            encoder: DiseaseEncoder::fit(["Cold", "Fever"]),
        }
    }

    #[test]
    fn artifacts_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        let saved = artifacts();
        save_artifacts(&layout, &saved).unwrap();

        assert!(layout.model_path().is_file());
        assert!(layout.model_config_path().is_file());
        assert!(layout.encoder_path().is_file());
        let loaded = load_artifacts(&layout).unwrap();
        assert_eq!(loaded.scalers, saved.scalers);
        assert_eq!(loaded.encoder, saved.encoder);
        assert_eq!(loaded.model.config(), saved.model.config());
        let x = DMatrix::from_row_slice(1, 2, &[0.25, 0.75]);
        assert_eq!(loaded.model.predict(&x).unwrap(), saved.model.predict(&x).unwrap());
    }

    #[test]
    fn unflushed_json_is_an_io_error() {
        let full = Path::new("/dev/full");
        if !full.exists() {
            return;
        }
        let err = write_json(full, &ModelConfig::default()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }

    #[test]
    fn layer_sizes_must_match_the_weights() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        save_artifacts(&layout, &artifacts()).unwrap();
        std::fs::write(layout.model_config_path(), r#"{"seq_len": 2, "hidden_sizes": []}"#).unwrap();
        let err = load_artifacts(&layout).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Model);
    }

    #[test]
    fn missing_artifacts_are_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_artifacts(&OutputLayout::new(dir.path())).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }

    #[test]
    fn corrupt_scaler_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        save_artifacts(&layout, &artifacts()).unwrap();
        std::fs::write(layout.scaler_y_path(), r#"{"min": 5.0, "max": 1.0}"#).unwrap();
        let err = load_artifacts(&layout).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Model);
    }
}

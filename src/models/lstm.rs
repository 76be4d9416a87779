//! Stacked LSTM regressor built from `burn` layers.
//!
//! `LstmStack` is the network itself: each `nn::Lstm` consumes the full
//! hidden-state sequence of the layer below, and the final time step of the
//! top layer feeds a `Linear` head with one output. It is generic over the
//! backend so the trainer can run it on `TrainingBackend` (autodiff) and hand
//! back a `StackedLstm` on the plain `InferenceBackend`.
//!
//! Weights are persisted with burn's `BinFileRecorder`; the layer sizes live
//! next to them as JSON so a reload can rebuild the same shape first.

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use burn::backend::ndarray::{NdArray, NdArrayDevice};
use burn::backend::Autodiff;
use burn::module::Module;
use burn::nn::{Linear, LinearConfig, Lstm, LstmConfig};
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use nalgebra::{DMatrix, DVector};

use crate::domain::ModelConfig;
use crate::error::AppError;
use crate::models::Forecaster;

pub type InferenceBackend = NdArray<f32>;
pub type TrainingBackend = Autodiff<InferenceBackend>;

/// Every model in this crate runs on the CPU.
pub fn cpu() -> NdArrayDevice {
    NdArrayDevice::Cpu
}

fn recorder() -> BinFileRecorder<FullPrecisionSettings> {
    BinFileRecorder::<FullPrecisionSettings>::new()
}

/// Backend RNG state is process-wide. Seeding and drawing the initial weights
/// happen under this lock so concurrent builds cannot interleave draws.
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Recurrent layers plus the dense head.
#[derive(Module, Debug)]
pub struct LstmStack<B: Backend> {
    layers: Vec<Lstm<B>>,
    head: Linear<B>,
}

impl<B: Backend> LstmStack<B> {
    fn new(config: &ModelConfig, device: &B::Device) -> Self {
        let mut d_input = 1;
        let mut layers = Vec::with_capacity(config.hidden_sizes.len());
        for &d_hidden in &config.hidden_sizes {
            layers.push(LstmConfig::new(d_input, d_hidden, true).init(device));
            d_input = d_hidden;
        }
        let head = LinearConfig::new(d_input, 1).init(device);
        Self { layers, head }
    }

    /// Build with weights drawn from `seed`.
    pub fn seeded(config: &ModelConfig, seed: u64, device: &B::Device) -> Self {
        let _guard = INIT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        B::seed(seed);
        let net = Self::new(config, device);
        // Parameters are initialised lazily; one pass draws all of them now.
        let _ = net.forward(Tensor::zeros([1, config.seq_len, 1], device));
        net
    }

    /// `x` is `[batch, seq_len, 1]`; the result is `[batch, 1]`.
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        let mut seq = x;
        for layer in &self.layers {
            let (hidden, _state) = layer.forward(seq, None);
            seq = hidden;
        }
        let [batch, steps, d_hidden] = seq.dims();
        let last = seq
            .slice([0..batch, steps - 1..steps, 0..d_hidden])
            .reshape([batch, d_hidden]);
        self.head.forward(last)
    }
}

/// Rows of `x` (optionally a subset) as a `[rows, seq_len, 1]` tensor.
pub fn input_tensor<B: Backend>(x: &DMatrix<f64>, rows: &[usize], device: &B::Device) -> Tensor<B, 3> {
    let steps = x.ncols();
    let mut data = Vec::with_capacity(rows.len() * steps);
    for &r in rows {
        data.extend(x.row(r).iter().map(|&v| v as f32));
    }
    Tensor::from_data(TensorData::new(data, [rows.len(), steps, 1]), device)
}

/// Selected entries of `y` as a `[rows, 1]` tensor.
pub fn target_tensor<B: Backend>(y: &DVector<f64>, rows: &[usize], device: &B::Device) -> Tensor<B, 2> {
    let data: Vec<f32> = rows.iter().map(|&r| y[r] as f32).collect();
    Tensor::from_data(TensorData::new(data, [rows.len(), 1]), device)
}

/// One scaled prediction per row of `x`.
pub fn predict_rows<B: Backend>(
    net: &LstmStack<B>,
    x: &DMatrix<f64>,
    device: &B::Device,
) -> Result<DVector<f64>, AppError> {
    if x.nrows() == 0 {
        return Ok(DVector::zeros(0));
    }
    let rows: Vec<usize> = (0..x.nrows()).collect();
    let out = net.forward(input_tensor(x, &rows, device));
    let values = out
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| AppError::model(format!("Unreadable model output: {e:?}")))?;
    if values.len() != x.nrows() {
        return Err(AppError::model(format!(
            "Model returned {} values for {} rows.",
            values.len(),
            x.nrows()
        )));
    }
    Ok(DVector::from_iterator(values.len(), values.into_iter().map(f64::from)))
}

pub fn validate_config(config: &ModelConfig) -> Result<(), AppError> {
    if config.seq_len == 0 {
        return Err(AppError::model("Model sequence length must be at least 1."));
    }
    if config.hidden_sizes.is_empty() || config.hidden_sizes.contains(&0) {
        return Err(AppError::model("Model needs one or more non-empty LSTM layers."));
    }
    Ok(())
}

/// A fitted stacked LSTM ready for inference.
#[derive(Debug, Clone)]
pub struct StackedLstm {
    config: ModelConfig,
    net: LstmStack<InferenceBackend>,
}

impl StackedLstm {
    /// Untrained model with weights drawn from `seed`.
    pub fn new(config: ModelConfig, seed: u64) -> Result<Self, AppError> {
        validate_config(&config)?;
        let net = LstmStack::seeded(&config, seed, &cpu());
        Ok(Self { config, net })
    }

    pub(crate) fn from_parts(config: ModelConfig, net: LstmStack<InferenceBackend>) -> Self {
        Self { config, net }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn parameter_count(&self) -> usize {
        self.net.num_params()
    }

    /// Write the weights to `path` (burn binary record).
    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        self.net
            .clone()
            .save_file(path.to_path_buf(), &recorder())
            .map_err(|e| AppError::io(format!("Failed to write model weights '{}': {e:?}", path.display())))
    }

    /// Rebuild a model of shape `config` and load its weights from `path`.
    ///
    /// A record that does not fit `config`, or weights that do not produce a
    /// finite output, are rejected.
    pub fn load(config: ModelConfig, path: &Path) -> Result<Self, AppError> {
        validate_config(&config)?;
        if !path.is_file() {
            return Err(AppError::io(format!(
                "Model weights '{}' not found (run `incidence train` first?)",
                path.display()
            )));
        }

        let device = cpu();
        let shell = LstmStack::<InferenceBackend>::seeded(&config, 0, &device);
        let expected = shell.num_params();
        let net = shell
            .load_file(path.to_path_buf(), &recorder(), &device)
            .map_err(|e| AppError::model(format!("Invalid model weights '{}': {e:?}", path.display())))?;
        if net.num_params() != expected {
            return Err(AppError::model(format!(
                "Model weights hold {} parameters, layers {:?} need {expected}.",
                net.num_params(),
                config.hidden_sizes
            )));
        }

        let model = Self { config, net };
        let zeros = DMatrix::zeros(1, model.config.seq_len);
        if model.predict(&zeros)?.iter().any(|v| !v.is_finite()) {
            return Err(AppError::model("Model weights produce non-finite output."));
        }
        Ok(model)
    }
}

impl Forecaster for StackedLstm {
    fn seq_len(&self) -> usize {
        self.config.seq_len
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, AppError> {
        if x.ncols() != self.config.seq_len {
            return Err(AppError::model(format!(
                "Input has {} steps, model expects {}.",
                x.ncols(),
                self.config.seq_len
            )));
        }
        predict_rows(&self.net, x, &cpu())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ModelConfig {
        ModelConfig {
            seq_len: 3,
            hidden_sizes: vec![5, 2],
        }
    }

    fn inputs() -> DMatrix<f64> {
        DMatrix::from_row_slice(2, 3, &[0.1, 0.2, 0.3, 0.9, 0.5, 0.0])
    }

    #[test]
    fn one_prediction_per_row() {
        let model = StackedLstm::new(config(), 7).unwrap();
        let out = model.predict(&inputs()).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|v| v.is_finite()));
        assert_eq!(model.predict(&DMatrix::zeros(0, 3)).unwrap().len(), 0);
    }

    #[test]
    fn same_seed_same_weights() {
        let a = StackedLstm::new(config(), 11).unwrap();
        let b = StackedLstm::new(config(), 11).unwrap();
        let c = StackedLstm::new(config(), 12).unwrap();
        let pa = a.predict(&inputs()).unwrap();
        assert_eq!(pa, b.predict(&inputs()).unwrap());
        assert_ne!(pa, c.predict(&inputs()).unwrap());
        assert_eq!(a.parameter_count(), b.parameter_count());
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let mut bad = config();
        bad.seq_len = 0;
        assert!(StackedLstm::new(bad, 1).is_err());
        let mut bad = config();
        bad.hidden_sizes = vec![4, 0];
        assert!(StackedLstm::new(bad, 1).is_err());
        let mut bad = config();
        bad.hidden_sizes.clear();
        assert!(StackedLstm::new(bad, 1).is_err());
    }

    #[test]
    fn wrong_input_width_is_model_error() {
        let model = StackedLstm::new(config(), 1).unwrap();
        let err = model.predict(&DMatrix::zeros(1, 4)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Model);
    }

    #[test]
    fn weights_survive_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let model = StackedLstm::new(config(), 5).unwrap();
        model.save(&path).unwrap();

        let loaded = StackedLstm::load(config(), &path).unwrap();
        assert_eq!(loaded.predict(&inputs()).unwrap(), model.predict(&inputs()).unwrap());
    }

    #[test]
    fn missing_weights_are_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = StackedLstm::load(config(), &dir.path().join("model.bin")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }
}

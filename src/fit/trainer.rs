//! Mini-batch training of the stacked LSTM.
//!
//! Per epoch:
//! - shuffle the training rows (seeded)
//! - for each batch, take the MSE of the autodiff forward pass and apply one
//!   Adam step with gradient-norm clipping
//! - record the mean training loss seen during the epoch and the loss on the
//!   validation rows after it
//!
//! Early stopping watches the validation loss (training loss when there are
//! no validation rows) and hands back the best parameters seen.

use burn::grad_clipping::GradientClippingConfig;
use burn::module::{AutodiffModule, Module};
use burn::nn::loss::{MseLoss, Reduction};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::ElementConversion;
use nalgebra::{DMatrix, DVector};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::domain::{EpochLog, ModelConfig, TrainingOptions};
use crate::error::AppError;
use crate::models::{
    InferenceBackend, LstmStack, StackedLstm, TrainingBackend, cpu, input_tensor, predict_rows, target_tensor,
    validate_config,
};

/// Adam moment decay rates and denominator epsilon.
pub const ADAM_BETA1: f32 = 0.9;
pub const ADAM_BETA2: f32 = 0.999;
pub const ADAM_EPSILON: f32 = 1e-7;

/// Receives one `EpochLog` at the end of every epoch.
pub trait EpochObserver {
    fn on_epoch_end(&mut self, log: &EpochLog);
}

impl<F: FnMut(&EpochLog)> EpochObserver for F {
    fn on_epoch_end(&mut self, log: &EpochLog) {
        self(log)
    }
}

/// Observer that ignores every epoch.
pub struct Silent;

impl EpochObserver for Silent {
    fn on_epoch_end(&mut self, _log: &EpochLog) {}
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    pub history: Vec<EpochLog>,
    /// Zero-based epoch whose parameters were kept.
    pub best_epoch: usize,
    /// Monitored loss at `best_epoch`.
    pub best_loss: f64,
    pub stopped_early: bool,
}

/// Mean squared error between predictions and targets.
pub fn mse(pred: &DVector<f64>, y: &DVector<f64>) -> f64 {
    if y.is_empty() {
        return f64::NAN;
    }
    (pred - y).norm_squared() / y.len() as f64
}

fn check_inputs(
    config: &ModelConfig,
    options: &TrainingOptions,
    x: &DMatrix<f64>,
    y: &DVector<f64>,
) -> Result<(), AppError> {
    if x.nrows() == 0 {
        return Err(AppError::data("No training windows to fit on."));
    }
    if x.nrows() != y.len() {
        return Err(AppError::model(format!(
            "Training inputs have {} rows but {} targets.",
            x.nrows(),
            y.len()
        )));
    }
    if x.ncols() != config.seq_len {
        return Err(AppError::model(format!(
            "Training inputs have {} steps, model expects {}.",
            x.ncols(),
            config.seq_len
        )));
    }
    if options.epochs == 0 || options.batch_size == 0 {
        return Err(AppError::model("Epochs and batch size must be at least 1."));
    }
    if !(options.learning_rate.is_finite() && options.learning_rate > 0.0) {
        return Err(AppError::model("Learning rate must be a positive number."));
    }
    if let Some(c) = options.clip_norm {
        if !(c.is_finite() && c > 0.0) {
            return Err(AppError::model("Gradient clip norm must be a positive number."));
        }
    }
    Ok(())
}

/// Fit a fresh `StackedLstm` on scaled windows.
///
/// `validation` rows are only evaluated, never trained on.
pub fn fit_stacked_lstm(
    config: &ModelConfig,
    options: &TrainingOptions,
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    validation: Option<(&DMatrix<f64>, &DVector<f64>)>,
    observer: &mut dyn EpochObserver,
) -> Result<(StackedLstm, TrainReport), AppError> {
    validate_config(config)?;
    check_inputs(config, options, x, y)?;
    let validation = match validation {
        Some((vx, vy)) if vx.nrows() > 0 => {
            if vx.nrows() != vy.len() || vx.ncols() != config.seq_len {
                return Err(AppError::model("Validation inputs do not match the training layout."));
            }
            Some((vx, vy))
        }
        _ => None,
    };

    let device = cpu();
    let mut net = LstmStack::<TrainingBackend>::seeded(config, options.seed, &device);
    let mut optim = AdamConfig::new()
        .with_beta_1(ADAM_BETA1)
        .with_beta_2(ADAM_BETA2)
        .with_epsilon(ADAM_EPSILON)
        .with_grad_clipping(options.clip_norm.map(|c| GradientClippingConfig::Norm(c as f32)))
        .init();
    let loss_fn = MseLoss::new();
    let mut rng = StdRng::seed_from_u64(options.seed.wrapping_add(1));

    log::info!(
        "Training stacked LSTM {:?} ({} parameters) on {} windows, {} validation.",
        config.hidden_sizes,
        net.num_params(),
        x.nrows(),
        validation.map(|(vx, _)| vx.nrows()).unwrap_or(0)
    );

    let n = x.nrows();
    let mut order: Vec<usize> = (0..n).collect();

    let mut history = Vec::with_capacity(options.epochs);
    let mut best: Option<(usize, f64, LstmStack<InferenceBackend>)> = None;
    let mut wait = 0usize;
    let mut stopped_early = false;

    for epoch in 0..options.epochs {
        if options.shuffle {
            order.shuffle(&mut rng);
        }

        let mut sq_sum = 0.0;
        for batch in order.chunks(options.batch_size) {
            let pred = net.forward(input_tensor(x, batch, &device));
            let loss = loss_fn.forward(pred, target_tensor(y, batch, &device), Reduction::Mean);
            sq_sum += loss.clone().into_scalar().elem::<f64>() * batch.len() as f64;

            let grads = GradientsParams::from_grads(loss.backward(), &net);
            net = optim.step(options.learning_rate, net, grads);
        }

        let snapshot = net.valid();
        let loss = sq_sum / n as f64;
        let val_loss = match validation {
            Some((vx, vy)) => Some(mse(&predict_rows(&snapshot, vx, &device)?, vy)),
            None => None,
        };
        let log = EpochLog { epoch, loss, val_loss };
        log::debug!("epoch {epoch}: loss={loss:.6} val_loss={val_loss:?}");
        observer.on_epoch_end(&log);
        history.push(log);

        let monitored = val_loss.unwrap_or(loss);
        let improved = monitored.is_finite() && best.as_ref().is_none_or(|(_, b, _)| monitored < *b);
        if improved {
            best = Some((epoch, monitored, snapshot));
            wait = 0;
        } else {
            wait += 1;
            if wait >= options.patience {
                stopped_early = true;
                log::info!("Early stopping after epoch {} (no improvement for {wait} epochs).", epoch + 1);
                break;
            }
        }
    }

    let (best_epoch, best_loss, best_net) =
        best.ok_or_else(|| AppError::model("Training diverged: loss was never finite."))?;
    log::info!("Keeping parameters from epoch {} (monitored loss {best_loss:.6}).", best_epoch + 1);

    Ok((
        StackedLstm::from_parts(config.clone(), best_net),
        TrainReport {
            history,
            best_epoch,
            best_loss,
            stopped_early,
        },
    ))
}

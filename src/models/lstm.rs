//! Recurrent neural forecaster ("LSTM").
//!
//! Prices are min-max scaled over the whole series, cut into `lookback`-long
//! windows, and fed to a stacked LSTM trained with Adam on mean squared error.
//! Training stops early once the epoch loss has not improved for `patience`
//! epochs; by default the best weights seen are restored.

pub mod adam;
pub mod network;

use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::{ForecastResult, ModelKind};
use crate::error::ModelError;
use crate::features::{Windows, windows};
use crate::math::{MinMaxScaler, split_index};
use crate::models::rollout::rollout;
use crate::models::{Forecaster, MIN_WINDOWS, holdout_scores};

use self::adam::Adam;
use self::network::LstmNetwork;

#[derive(Debug, Clone, PartialEq)]
pub struct LstmConfig {
    pub lookback: usize,
    /// Hidden width of each recurrent layer, bottom to top.
    pub layers: Vec<usize>,
    pub dropout: f64,
    pub epochs: usize,
    pub batch_size: usize,
    pub patience: usize,
    pub learning_rate: f64,
    pub seed: u64,
    /// Return the lowest-loss epoch's weights instead of the last epoch's.
    pub restore_best: bool,
}

impl Default for LstmConfig {
    fn default() -> Self {
        Self {
            lookback: 60,
            layers: vec![50, 50, 25],
            dropout: 0.2,
            epochs: 50,
            batch_size: 32,
            patience: 5,
            learning_rate: 0.001,
            seed: 42,
            restore_best: true,
        }
    }
}

impl LstmConfig {
    fn validate(&self) -> Result<(), ModelError> {
        if self.lookback == 0 || self.layers.is_empty() || self.layers.contains(&0) {
            return Err(ModelError::FitFailure("network shape must be non-empty".into()));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            let msg = format!("dropout {} outside [0, 1)", self.dropout);
            return Err(ModelError::FitFailure(msg));
        }
        if self.batch_size == 0 || self.epochs == 0 {
            return Err(ModelError::FitFailure("epochs and batch size must be positive".into()));
        }
        Ok(())
    }
}

/// Summary of a training run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingReport {
    pub epochs_run: usize,
    pub best_epoch: usize,
    pub best_loss: f64,
}

/// Train a fresh network on `data` (inputs already scaled).
pub fn train(
    data: &Windows,
    config: &LstmConfig,
) -> Result<(LstmNetwork, TrainingReport), ModelError> {
    config.validate()?;
    if data.is_empty() {
        return Err(ModelError::insufficient(1, 0));
    }

    let mut net = LstmNetwork::new(&config.layers, config.seed);
    let mut adam = Adam::new(&net, config.learning_rate);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut order: Vec<usize> = (0..data.len()).collect();

    let mut best = (net.clone(), f64::INFINITY, 0);
    let mut stale = 0;
    let mut epochs_run = 0;

    for epoch in 0..config.epochs {
        order.shuffle(&mut rng);
        let mut loss_sum = 0.0;
        let mut batches = 0usize;

        for batch in order.chunks(config.batch_size) {
            let mask_seeds: Vec<u64> = batch.iter().map(|_| rng.r#gen()).collect();
            let scale = 1.0 / batch.len() as f64;

            let samples: Vec<(f64, LstmNetwork)> = batch
                .par_iter()
                .zip(mask_seeds.par_iter())
                .map(|(&idx, &mask_seed)| {
                    let window = &data.inputs[idx];
                    let masks = (config.dropout > 0.0).then(|| {
                        let mut mask_rng = StdRng::seed_from_u64(mask_seed);
                        net.sample_masks(config.dropout, window.len(), &mut mask_rng)
                    });
                    net.sample_gradient(window, data.targets[idx], masks.as_ref(), scale)
                })
                .collect();

            // Reduce in batch order so results do not depend on thread scheduling.
            let mut grad = net.zeros_like();
            let mut batch_loss = 0.0;
            for (loss, g) in &samples {
                batch_loss += loss;
                grad.accumulate(g);
            }
            batch_loss *= scale;

            if !batch_loss.is_finite() {
                let msg = format!("loss diverged in epoch {}", epoch + 1);
                return Err(ModelError::FitFailure(msg));
            }

            adam.step(&mut net, &grad);
            loss_sum += batch_loss;
            batches += 1;
        }

        epochs_run = epoch + 1;
        let epoch_loss = loss_sum / batches as f64;
        debug!(epoch = epochs_run, loss = epoch_loss, "lstm epoch");

        if epoch_loss < best.1 {
            best = (net.clone(), epoch_loss, epochs_run);
            stale = 0;
        } else {
            stale += 1;
            if stale >= config.patience {
                debug!(epoch = epochs_run, "early stopping");
                break;
            }
        }
    }

    let (best_net, best_loss, best_epoch) = best;
    let net = if config.restore_best { best_net } else { net };
    Ok((
        net,
        TrainingReport {
            epochs_run,
            best_epoch,
            best_loss,
        },
    ))
}

/// A network trained on one series, with the scaler fitted to that series.
#[derive(Debug, Clone)]
pub struct FittedLstm {
    pub net: LstmNetwork,
    pub scaler: MinMaxScaler,
    pub report: TrainingReport,
    /// Hold-out errors in price units.
    pub rmse: f64,
    pub mae: f64,
    /// Last `lookback` scaled closes; the rollout starts here.
    tail: Vec<f64>,
}

impl FittedLstm {
    /// Recursive forecast of `horizon` prices past the end of the series.
    pub fn project(&self, horizon: usize) -> Result<Vec<f64>, ModelError> {
        let scaled = rollout(&self.tail, horizon, |window| Ok(self.net.predict(window)))?;
        Ok(self.scaler.inverse_all(&scaled))
    }
}

#[derive(Debug, Clone, Default)]
pub struct LstmForecaster {
    pub config: LstmConfig,
}

impl LstmForecaster {
    pub fn new(config: LstmConfig) -> Self {
        Self { config }
    }

    /// Scale, window, train on the first 80% of windows and score the rest.
    pub fn fit(&self, series: &[f64]) -> Result<FittedLstm, ModelError> {
        let lookback = self.config.lookback;
        if series.is_empty() {
            return Err(ModelError::insufficient(MIN_WINDOWS, 0));
        }
        let scaler = MinMaxScaler::fit(series)
            .ok_or_else(|| ModelError::FitFailure("non-finite input".into()))?;
        let scaled = scaler.transform_all(series);

        let data = windows(&scaled, lookback);
        if data.len() < MIN_WINDOWS {
            return Err(ModelError::insufficient(MIN_WINDOWS, data.len()));
        }

        let (train_set, test_set) = data.split_at(split_index(data.len()));
        let (net, report) = train(&train_set, &self.config)?;
        info!(
            epochs = report.epochs_run,
            best_epoch = report.best_epoch,
            loss = report.best_loss,
            "lstm trained"
        );

        let fitted: Vec<f64> = test_set
            .inputs
            .iter()
            .map(|w| scaler.inverse(net.predict(w)))
            .collect();
        let actual = scaler.inverse_all(&test_set.targets);
        let (rmse, mae) = holdout_scores(&actual, &fitted, MIN_WINDOWS, data.len())?;

        Ok(FittedLstm {
            net,
            scaler,
            report,
            rmse,
            mae,
            tail: scaled[scaled.len() - lookback..].to_vec(),
        })
    }
}

impl Forecaster for LstmForecaster {
    fn kind(&self) -> ModelKind {
        ModelKind::Lstm
    }

    fn forecast(&self, series: &[f64], horizon: usize) -> Result<ForecastResult, ModelError> {
        let fitted = self.fit(series)?;
        Ok(ForecastResult {
            predictions: fitted.project(horizon)?,
            rmse: fitted.rmse,
            mae: fitted.mae,
        })
    }
}

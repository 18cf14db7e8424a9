//! Simple exponential smoothing, reported under the "ARIMA" name.
//!
//! This is not an autoregressive model. The projection blends the last observed
//! price with the decaying smoothed level and converges toward that price.

use crate::domain::{ForecastResult, ModelKind};
use crate::error::ModelError;
use crate::math::split_index;
use crate::models::{Forecaster, holdout_scores};

pub const DEFAULT_ALPHA: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialSmoothing {
    pub alpha: f64,
}

impl Default for ExponentialSmoothing {
    fn default() -> Self {
        Self { alpha: DEFAULT_ALPHA }
    }
}

impl ExponentialSmoothing {
    /// `s[0] = p[0]`, `s[i] = α·p[i] + (1−α)·s[i−1]`.
    pub fn smooth(&self, series: &[f64]) -> Vec<f64> {
        let mut out = Vec::with_capacity(series.len());
        for (i, &p) in series.iter().enumerate() {
            let s = if i == 0 {
                p
            } else {
                self.alpha * p + (1.0 - self.alpha) * out[i - 1]
            };
            out.push(s);
        }
        out
    }

    /// Repeatedly blend the last actual price with the previous value,
    /// starting from the last smoothed level.
    pub fn project(&self, last_price: f64, last_smoothed: f64, horizon: usize) -> Vec<f64> {
        let mut last = last_smoothed;
        (0..horizon)
            .map(|_| {
                last = self.alpha * last_price + (1.0 - self.alpha) * last;
                last
            })
            .collect()
    }
}

impl Forecaster for ExponentialSmoothing {
    fn kind(&self) -> ModelKind {
        ModelKind::Arima
    }

    fn forecast(&self, series: &[f64], horizon: usize) -> Result<ForecastResult, ModelError> {
        let split = split_index(series.len());
        if series.len() < 2 || split >= series.len() {
            return Err(ModelError::insufficient(2, series.len()));
        }

        let smoothed = self.smooth(series);
        let actual = &series[split..];
        let fitted = &smoothed[split..];
        let (rmse, mae) = holdout_scores(actual, fitted, 2, series.len())?;

        let (Some(&last_price), Some(&last_smoothed)) = (series.last(), smoothed.last()) else {
            return Err(ModelError::insufficient(2, series.len()));
        };

        Ok(ForecastResult {
            predictions: self.project(last_price, last_smoothed, horizon),
            rmse,
            mae,
        })
    }
}

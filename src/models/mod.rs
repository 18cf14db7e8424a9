//! Forecasting model implementations.
//!
//! Every model consumes a chronological close series, evaluates itself on the
//! trailing 20% hold-out, and projects `horizon` future steps.

pub mod forest;
pub mod linear;
pub mod lstm;
pub mod rollout;
pub mod smoothing;
pub mod tree;

pub use forest::{ForestConfig, ForestForecaster, RandomForest};
pub use linear::{LinearTrend, LinearTrendForecaster};
pub use lstm::{LstmConfig, LstmForecaster};
pub use smoothing::ExponentialSmoothing;

use crate::domain::{ForecastResult, ModelKind};
use crate::error::ModelError;
use crate::math::{mae, rmse};

/// Fewest supervised windows a windowed model will train on.
pub const MIN_WINDOWS: usize = 10;

/// One forecasting model.
pub trait Forecaster {
    fn kind(&self) -> ModelKind;

    /// Fit on `series`, report hold-out error, and predict `horizon` steps ahead.
    fn forecast(&self, series: &[f64], horizon: usize) -> Result<ForecastResult, ModelError>;
}

/// RMSE and MAE of a hold-out tail.
///
/// Empty or mismatched tails are insufficient data (`required` vs `available`);
/// a non-finite score means a prediction or observation was not finite.
pub fn holdout_scores(
    actual: &[f64],
    fitted: &[f64],
    required: usize,
    available: usize,
) -> Result<(f64, f64), ModelError> {
    let (Some(rmse), Some(mae)) = (rmse(actual, fitted), mae(actual, fitted)) else {
        return Err(ModelError::insufficient(required, available));
    };
    if !(rmse.is_finite() && mae.is_finite()) {
        return Err(ModelError::FitFailure("non-finite value in hold-out tail".into()));
    }
    Ok((rmse, mae))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holdout_scores_match_metrics() {
        let (rmse, mae) = holdout_scores(&[1.0, 2.0], &[1.0, 4.0], 2, 2).unwrap();
        assert!((rmse - 2.0f64.sqrt()).abs() < 1e-12);
        assert!((mae - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_tail_is_insufficient() {
        let err = holdout_scores(&[], &[], 3, 2).unwrap_err();
        assert_eq!(err, ModelError::insufficient(3, 2));
    }

    #[test]
    fn non_finite_prediction_is_a_fit_failure() {
        let err = holdout_scores(&[1.0, 2.0], &[1.0, f64::NAN], 2, 2).unwrap_err();
        assert!(matches!(err, ModelError::FitFailure(_)));
        let err = holdout_scores(&[1.0, f64::INFINITY], &[1.0, 2.0], 2, 2).unwrap_err();
        assert!(matches!(err, ModelError::FitFailure(_)));
    }
}

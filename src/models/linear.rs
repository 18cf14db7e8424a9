//! Linear trend on the day index.
//!
//! A single closed-form fit: no windows and no recursive feedback.

use nalgebra::{DMatrix, DVector};

use crate::domain::{ForecastResult, ModelKind};
use crate::error::ModelError;
use crate::math::{solve_least_squares, split_index};
use crate::models::{Forecaster, holdout_scores};

/// Fitted line `y = intercept + slope * t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrend {
    pub intercept: f64,
    pub slope: f64,
}

impl LinearTrend {
    /// Ordinary least squares of `values[t]` on `t = 0..values.len()`.
    ///
    /// A single point is underdetermined; the minimum-norm solution is the
    /// flat line through it.
    pub fn fit(values: &[f64]) -> Result<Self, ModelError> {
        let n = values.len();
        if n == 0 {
            return Err(ModelError::insufficient(1, n));
        }

        let mut design = Vec::with_capacity(n * 2);
        for t in 0..n {
            design.push(1.0);
            design.push(t as f64);
        }
        let x = DMatrix::from_row_slice(n, 2, &design);
        let y = DVector::from_row_slice(values);

        let beta = solve_least_squares(&x, &y)
            .ok_or_else(|| ModelError::FitFailure("least squares did not converge".into()))?;

        Ok(Self {
            intercept: beta[0],
            slope: beta[1],
        })
    }

    pub fn predict(&self, t: usize) -> f64 {
        self.intercept + self.slope * t as f64
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LinearTrendForecaster;

impl Forecaster for LinearTrendForecaster {
    fn kind(&self) -> ModelKind {
        ModelKind::Linear
    }

    fn forecast(&self, series: &[f64], horizon: usize) -> Result<ForecastResult, ModelError> {
        let n = series.len();
        let split = split_index(n);
        if split < 1 || split >= n {
            return Err(ModelError::insufficient(2, n));
        }

        let trend = LinearTrend::fit(&series[..split])?;

        let fitted: Vec<f64> = (split..n).map(|t| trend.predict(t)).collect();
        let actual = &series[split..];
        let (rmse, mae) = holdout_scores(actual, &fitted, 2, n)?;

        let predictions = (n..n + horizon).map(|t| trend.predict(t)).collect();

        Ok(ForecastResult {
            predictions,
            rmse,
            mae,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_line() {
        let series: Vec<f64> = (0..100).map(|i| 10.0 + 2.0 * i as f64).collect();
        let trend = LinearTrend::fit(&series[..80]).unwrap();
        assert!((trend.slope - 2.0).abs() < 1e-8, "slope {}", trend.slope);
        assert!((trend.intercept - 10.0).abs() < 1e-6, "intercept {}", trend.intercept);

        let result = LinearTrendForecaster.forecast(&series, 3).unwrap();
        assert!(result.rmse < 1e-6 && result.mae < 1e-6);
        for (k, p) in result.predictions.iter().enumerate() {
            let expected = 10.0 + 2.0 * (100 + k) as f64;
            assert!((p - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn constant_series_has_flat_forecast() {
        let series = vec![100.0; 60];
        let result = LinearTrendForecaster.forecast(&series, 5).unwrap();
        assert_eq!(result.predictions.len(), 5);
        assert!(result.predictions.iter().all(|p| (p - 100.0).abs() < 1e-6));
        assert!(result.rmse < 1e-6 && result.mae < 1e-6);
    }

    #[test]
    fn single_point_is_insufficient() {
        let err = LinearTrendForecaster.forecast(&[1.0], 1).unwrap_err();
        assert_eq!(err, ModelError::insufficient(2, 1));
        let err = LinearTrendForecaster.forecast(&[], 1).unwrap_err();
        assert_eq!(err, ModelError::insufficient(2, 0));
    }

    #[test]
    fn two_points_fit_a_flat_line_through_the_first() {
        let trend = LinearTrend::fit(&[7.0]).unwrap();
        assert!((trend.intercept - 7.0).abs() < 1e-9);
        assert!(trend.slope.abs() < 1e-9);

        let result = LinearTrendForecaster.forecast(&[7.0, 9.0], 3).unwrap();
        assert_eq!(result.predictions.len(), 3);
        assert!(result.predictions.iter().all(|p| (p - 7.0).abs() < 1e-9));
        assert!((result.rmse - 2.0).abs() < 1e-9);
        assert!((result.mae - 2.0).abs() < 1e-9);
    }

    #[test]
    fn non_finite_tail_is_a_fit_failure() {
        let mut series: Vec<f64> = (0..20).map(|i| i as f64).collect();
        series[19] = f64::NAN;
        let err = LinearTrendForecaster.forecast(&series, 1).unwrap_err();
        assert!(matches!(err, ModelError::FitFailure(_)));
    }
}

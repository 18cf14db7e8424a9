//! Min-max scaling to `[0, 1]`.

/// Per-call scaler; fit it on a series and discard it with the model that used it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxScaler {
    min: f64,
    range: f64,
}

impl MinMaxScaler {
    /// Fit on all of `values`.
    ///
    /// A zero range (constant series) is treated as 1 so every value maps to 0.
    /// Returns `None` for empty input or non-finite values.
    pub fn fit(values: &[f64]) -> Option<Self> {
        if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = if max - min > 0.0 { max - min } else { 1.0 };
        Some(Self { min, range })
    }

    pub fn transform(&self, value: f64) -> f64 {
        (value - self.min) / self.range
    }

    pub fn inverse(&self, value: f64) -> f64 {
        value * self.range + self.min
    }

    pub fn transform_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.transform(v)).collect()
    }

    pub fn inverse_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.inverse(v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_to_unit_interval_and_back() {
        let values = [10.0, 15.0, 20.0];
        let scaler = MinMaxScaler::fit(&values).unwrap();
        assert_eq!(scaler.transform_all(&values), vec![0.0, 0.5, 1.0]);
        assert!((scaler.inverse(0.25) - 12.5).abs() < 1e-12);
    }

    #[test]
    fn constant_series_maps_to_zero() {
        let scaler = MinMaxScaler::fit(&[100.0; 5]).unwrap();
        assert_eq!(scaler.transform(100.0), 0.0);
        assert_eq!(scaler.inverse(0.0), 100.0);
    }

    #[test]
    fn empty_or_nan_input_is_rejected() {
        assert!(MinMaxScaler::fit(&[]).is_none());
        assert!(MinMaxScaler::fit(&[1.0, f64::NAN]).is_none());
    }
}

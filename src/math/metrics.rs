//! Back-test error metrics and the chronological train/test split.

/// Fraction of samples used for fitting; the rest is the held-out tail.
pub const TRAIN_FRACTION: f64 = 0.8;

/// Index where the held-out tail starts: `floor(0.8 * n)`.
pub fn split_index(n: usize) -> usize {
    (n as f64 * TRAIN_FRACTION) as usize
}

/// Root-mean-square error over paired values.
///
/// Returns `None` for empty or mismatched inputs.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.is_empty() || actual.len() != predicted.len() {
        return None;
    }
    let mse = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64;
    Some(mse.sqrt())
}

/// Mean absolute error over paired values.
pub fn mae(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.is_empty() || actual.len() != predicted.len() {
        return None;
    }
    let sum: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).abs()).sum();
    Some(sum / actual.len() as f64)
}

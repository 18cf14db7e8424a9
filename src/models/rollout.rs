//! Recursive multi-step rollout.
//!
//! Each step predicts one value from the trailing window, then slides the window
//! forward by appending that prediction. Errors compound over the horizon.

use std::collections::VecDeque;

use crate::error::ModelError;

/// Run `horizon` one-step predictions starting from `seed`.
///
/// `step` receives the current window (oldest first, always `seed.len()` long)
/// and returns the next value.
pub fn rollout<F>(seed: &[f64], horizon: usize, mut step: F) -> Result<Vec<f64>, ModelError>
where
    F: FnMut(&[f64]) -> Result<f64, ModelError>,
{
    let mut window: VecDeque<f64> = seed.iter().copied().collect();
    let mut out = Vec::with_capacity(horizon);

    for _ in 0..horizon {
        let next = step(window.make_contiguous())?;
        if !next.is_finite() {
            return Err(ModelError::FitFailure("non-finite value during rollout".into()));
        }
        out.push(next);
        window.pop_front();
        window.push_back(next);
    }

    Ok(out)
}

//! Sliding-window features shared by the windowed models.

/// Predictor windows and their next-value targets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Windows {
    /// Each entry is `series[i..i + lookback]`.
    pub inputs: Vec<Vec<f64>>,
    /// `targets[i] == series[i + lookback]`.
    pub targets: Vec<f64>,
}

impl Windows {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Split chronologically at `at`: `[0, at)` and `[at, len)`.
    pub fn split_at(&self, at: usize) -> (Windows, Windows) {
        let at = at.min(self.len());
        (
            Windows {
                inputs: self.inputs[..at].to_vec(),
                targets: self.targets[..at].to_vec(),
            },
            Windows {
                inputs: self.inputs[at..].to_vec(),
                targets: self.targets[at..].to_vec(),
            },
        )
    }
}

/// Build `len(series) - lookback` windows in order.
///
/// Empty when `lookback == 0` or `lookback >= len(series)`.
pub fn windows(series: &[f64], lookback: usize) -> Windows {
    if lookback == 0 || lookback >= series.len() {
        return Windows::default();
    }
    let n = series.len() - lookback;
    let mut inputs = Vec::with_capacity(n);
    let mut targets = Vec::with_capacity(n);
    for i in 0..n {
        inputs.push(series[i..i + lookback].to_vec());
        targets.push(series[i + lookback]);
    }
    Windows { inputs, targets }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_count_is_len_minus_lookback() {
        let series: Vec<f64> = (0..100).map(|i| i as f64).collect();
        for lookback in [1, 10, 60, 99] {
            let w = windows(&series, lookback);
            assert_eq!(w.len(), series.len() - lookback);
            assert_eq!(w.inputs.len(), w.targets.len());
        }
    }

    #[test]
    fn windows_are_contiguous_and_targets_aligned() {
        let series = [1.0, 2.0, 3.0, 4.0, 5.0];
        let w = windows(&series, 3);
        assert_eq!(w.inputs, vec![vec![1.0, 2.0, 3.0], vec![2.0, 3.0, 4.0]]);
        assert_eq!(w.targets, vec![4.0, 5.0]);
    }

    #[test]
    fn lookback_at_or_past_length_is_empty() {
        let series = [1.0, 2.0, 3.0];
        assert!(windows(&series, 3).is_empty());
        assert!(windows(&series, 10).is_empty());
        assert!(windows(&series, 0).is_empty());
    }

    #[test]
    fn split_preserves_order() {
        let series: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let w = windows(&series, 5);
        let (train, test) = w.split_at(12);
        assert_eq!(train.len(), 12);
        assert_eq!(test.len(), 3);
        assert_eq!(test.targets, vec![17.0, 18.0, 19.0]);
    }
}

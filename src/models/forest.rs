//! Bagged regression trees over lagged prices ("Random Forest").
//!
//! Trees are fitted in parallel but each tree's bootstrap sample is seeded from
//! `seed + tree_index`, and predictions average trees in index order, so runs on
//! the same input are bit-identical.

use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::debug;

use crate::domain::{ForecastResult, ModelKind};
use crate::error::ModelError;
use crate::features::windows;
use crate::math::split_index;
use crate::models::rollout::rollout;
use crate::models::tree::{RegressionTree, TreeConfig};
use crate::models::{Forecaster, MIN_WINDOWS, holdout_scores};

/// Random forest configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestConfig {
    pub n_trees: usize,
    /// Trailing prices used as features for one step.
    pub lookback: usize,
    pub seed: u64,
    pub bootstrap: bool,
    pub tree: TreeConfig,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            lookback: 10,
            seed: 42,
            bootstrap: true,
            tree: TreeConfig::default(),
        }
    }
}

/// A fitted ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    pub fn fit(
        inputs: &[Vec<f64>],
        targets: &[f64],
        config: &ForestConfig,
    ) -> Result<Self, ModelError> {
        let n = targets.len();
        if n == 0 || inputs.len() != n {
            return Err(ModelError::insufficient(1, n));
        }

        let trees = (0..config.n_trees)
            .into_par_iter()
            .map(|i| {
                let sample: Vec<usize> = if config.bootstrap {
                    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(i as u64));
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                RegressionTree::fit(inputs, targets, &sample, &config.tree)
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| ModelError::FitFailure("tree fit on empty sample".into()))?;

        Ok(Self { trees })
    }

    /// Mean of tree predictions, summed in tree order.
    pub fn predict(&self, features: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return f64::NAN;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict(features)).sum();
        sum / self.trees.len() as f64
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ForestForecaster {
    pub config: ForestConfig,
}

impl ForestForecaster {
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }
}

impl Forecaster for ForestForecaster {
    fn kind(&self) -> ModelKind {
        ModelKind::RandomForest
    }

    fn forecast(&self, series: &[f64], horizon: usize) -> Result<ForecastResult, ModelError> {
        let lookback = self.config.lookback;
        let data = windows(series, lookback);
        if data.len() < MIN_WINDOWS {
            return Err(ModelError::insufficient(MIN_WINDOWS, data.len()));
        }

        let (train, test) = data.split_at(split_index(data.len()));
        let forest = RandomForest::fit(&train.inputs, &train.targets, &self.config)?;
        debug!(trees = forest.n_trees(), train = train.len(), test = test.len(), "forest fitted");

        let fitted: Vec<f64> = test.inputs.iter().map(|w| forest.predict(w)).collect();
        let (rmse, mae) = holdout_scores(&test.targets, &fitted, MIN_WINDOWS, data.len())?;

        let seed = &series[series.len() - lookback..];
        let predictions = rollout(seed, horizon, |window| Ok(forest.predict(window)))?;

        Ok(ForecastResult {
            predictions,
            rmse,
            mae,
        })
    }
}

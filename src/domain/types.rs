//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fetching and fitting
//! - exported to JSON for downstream chart/metric formatting
//! - compared across models without knowing which model produced them

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ModelError;

/// One daily OHLCV row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Trading date, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

/// Where a price history came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataOrigin {
    /// Downloaded from the quote source.
    Remote,
    /// Generated by the deterministic fallback.
    Synthetic,
}

/// A dense, ascending daily price history for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistory {
    pub symbol: String,
    pub origin: DataOrigin,
    pub bars: Vec<PriceBar>,
}

impl PriceHistory {
    pub fn new(symbol: impl Into<String>, origin: DataOrigin, bars: Vec<PriceBar>) -> Self {
        Self {
            symbol: symbol.into(),
            origin,
            bars,
        }
    }

    /// Closing prices in chronological order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }
}

/// The four forecasters in the ensemble.
///
/// `Arima` keeps its historical name but is a simple exponential smoother.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Lstm,
    Linear,
    RandomForest,
    Arima,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::Lstm,
        ModelKind::Linear,
        ModelKind::RandomForest,
        ModelKind::Arima,
    ];

    /// Stable key used in bundles and JSON output.
    pub fn key(self) -> &'static str {
        match self {
            ModelKind::Lstm => "lstm",
            ModelKind::Linear => "linear",
            ModelKind::RandomForest => "random_forest",
            ModelKind::Arima => "arima",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Lstm => "LSTM",
            ModelKind::Linear => "Linear Regression",
            ModelKind::RandomForest => "Random Forest",
            ModelKind::Arima => "ARIMA",
        }
    }
}

/// Future predictions plus back-test accuracy on the held-out tail.
///
/// `rmse` and `mae` describe the fit on the last 20% of the input, not the
/// accuracy of `predictions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub predictions: Vec<f64>,
    pub rmse: f64,
    pub mae: f64,
}

/// Outcome of one model within a request.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutcome {
    Forecast(ForecastResult),
    Absent { reason: String },
}

impl ModelOutcome {
    pub fn forecast(&self) -> Option<&ForecastResult> {
        match self {
            ModelOutcome::Forecast(result) => Some(result),
            ModelOutcome::Absent { .. } => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, ModelOutcome::Absent { .. })
    }
}

impl From<Result<ForecastResult, ModelError>> for ModelOutcome {
    fn from(value: Result<ForecastResult, ModelError>) -> Self {
        match value {
            Ok(result) => ModelOutcome::Forecast(result),
            Err(err) => ModelOutcome::Absent {
                reason: err.to_string(),
            },
        }
    }
}

/// Wire shape of a bundle entry: an absent result has all three fields null.
#[derive(Serialize)]
struct OutcomeView<'a> {
    predictions: Option<&'a [f64]>,
    rmse: Option<f64>,
    mae: Option<f64>,
}

impl Serialize for ModelOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let view = match self {
            ModelOutcome::Forecast(r) => OutcomeView {
                predictions: Some(&r.predictions),
                rmse: Some(r.rmse),
                mae: Some(r.mae),
            },
            ModelOutcome::Absent { .. } => OutcomeView {
                predictions: None,
                rmse: None,
                mae: None,
            },
        };
        view.serialize(serializer)
    }
}

/// Per-model outcomes for one prediction request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ModelBundle {
    entries: BTreeMap<ModelKind, ModelOutcome>,
}

impl ModelBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: ModelKind, outcome: ModelOutcome) {
        self.entries.insert(kind, outcome);
    }

    pub fn get(&self, kind: ModelKind) -> Option<&ModelOutcome> {
        self.entries.get(&kind)
    }

    pub fn forecast(&self, kind: ModelKind) -> Option<&ForecastResult> {
        self.get(kind).and_then(ModelOutcome::forecast)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModelKind, &ModelOutcome)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_outcome_serializes_as_nulls() {
        let mut bundle = ModelBundle::new();
        bundle.insert(
            ModelKind::Lstm,
            ModelOutcome::Absent {
                reason: "insufficient data".into(),
            },
        );
        bundle.insert(
            ModelKind::Arima,
            ModelOutcome::Forecast(ForecastResult {
                predictions: vec![1.0, 2.0],
                rmse: 0.5,
                mae: 0.25,
            }),
        );

        let json = serde_json::to_value(&bundle).unwrap();
        assert!(json["lstm"]["predictions"].is_null());
        assert!(json["lstm"]["rmse"].is_null());
        assert!(json["lstm"]["mae"].is_null());
        assert_eq!(json["arima"]["predictions"][1], 2.0);
        assert_eq!(json["arima"]["rmse"], 0.5);
    }

    #[test]
    fn price_bar_date_serializes_iso() {
        let bar = PriceBar {
            date: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            adj_close: 1.0,
            volume: 10,
        };
        let json = serde_json::to_value(&bar).unwrap();
        assert_eq!(json["date"], "2025-03-07");
    }

    #[test]
    fn model_keys_are_stable() {
        let keys: Vec<&str> = ModelKind::ALL.iter().map(|k| k.key()).collect();
        assert_eq!(keys, vec!["lstm", "linear", "random_forest", "arima"]);
    }
}

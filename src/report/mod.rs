//! Reporting utilities: metric tables, chart payloads, and JSON output.
//!
//! Nothing here recomputes a forecast; these are views over a `ModelBundle`.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::domain::{DataOrigin, ModelBundle, ModelKind, PriceHistory};
use crate::error::AppError;

pub mod format;

pub use format::format_summary;

/// Actual closes shown before the forecast in charts.
pub const CHART_HISTORY: usize = 30;

/// Predictions per model kept in the comparison view.
pub const COMPARISON_STEPS: usize = 10;

/// Round to four decimal places.
pub fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// Back-test scores for one model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricScores {
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    #[serde(rename = "MAE")]
    pub mae: f64,
}

/// Display name to scores, in model order. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsTable {
    pub rows: Vec<(ModelKind, MetricScores)>,
}

impl MetricsTable {
    pub fn get(&self, kind: ModelKind) -> Option<&MetricScores> {
        self.rows.iter().find(|(k, _)| *k == kind).map(|(_, s)| s)
    }
}

impl Serialize for MetricsTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rows.len()))?;
        for (kind, scores) in &self.rows {
            map.serialize_entry(kind.display_name(), scores)?;
        }
        map.end()
    }
}

/// Scores of every model that produced a forecast, rounded to 4 dp.
pub fn metrics_table(bundle: &ModelBundle) -> MetricsTable {
    let rows = ModelKind::ALL
        .into_iter()
        .filter_map(|kind| {
            bundle.forecast(kind).map(|r| {
                (
                    kind,
                    MetricScores {
                        rmse: round4(r.rmse),
                        mae: round4(r.mae),
                    },
                )
            })
        })
        .collect();
    MetricsTable { rows }
}

/// Recent history followed by one forecast, ready for a line chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub actual: Vec<f64>,
    pub predictions: Vec<f64>,
    pub labels: Vec<String>,
}

/// Last `CHART_HISTORY` closes plus `predictions`, labelled `Day 1..Day N`.
pub fn chart_data(closes: &[f64], predictions: &[f64]) -> ChartData {
    let start = closes.len().saturating_sub(CHART_HISTORY);
    ChartData {
        actual: closes[start..].to_vec(),
        predictions: predictions.to_vec(),
        labels: (1..=predictions.len()).map(|i| format!("Day {i}")).collect(),
    }
}

/// First `COMPARISON_STEPS` predictions of each model; empty for absent models.
pub fn comparison(bundle: &ModelBundle) -> BTreeMap<ModelKind, Vec<f64>> {
    ModelKind::ALL
        .into_iter()
        .map(|kind| {
            let head = bundle
                .forecast(kind)
                .map(|r| r.predictions.iter().take(COMPARISON_STEPS).copied().collect())
                .unwrap_or_default();
            (kind, head)
        })
        .collect()
}

/// One chart per model that produced a forecast, over the same recent closes.
pub fn charts(closes: &[f64], bundle: &ModelBundle) -> BTreeMap<ModelKind, ChartData> {
    ModelKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let result = bundle.forecast(kind)?;
            Some((kind, chart_data(closes, &result.predictions)))
        })
        .collect()
}

/// Machine-readable result of one prediction request.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport<'a> {
    pub symbol: &'a str,
    pub origin: DataOrigin,
    pub records: usize,
    pub last_close: Option<f64>,
    pub horizon: usize,
    pub models: &'a ModelBundle,
    pub metrics: MetricsTable,
    pub comparison: BTreeMap<ModelKind, Vec<f64>>,
    pub charts: BTreeMap<ModelKind, ChartData>,
}

impl<'a> RunReport<'a> {
    pub fn new(history: &'a PriceHistory, bundle: &'a ModelBundle, horizon: usize) -> Self {
        Self {
            symbol: &history.symbol,
            origin: history.origin,
            records: history.len(),
            last_close: history.bars.last().map(|b| b.close),
            horizon,
            models: bundle,
            metrics: metrics_table(bundle),
            comparison: comparison(bundle),
            charts: charts(&history.closes(), bundle),
        }
    }

    pub fn to_json(&self) -> Result<String, AppError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AppError::new(4, format!("Failed to encode JSON: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::domain::{ForecastResult, ModelOutcome, PriceBar};

    fn bundle() -> ModelBundle {
        let mut bundle = ModelBundle::new();
        bundle.insert(
            ModelKind::Lstm,
            ModelOutcome::Absent {
                reason: "insufficient data".into(),
            },
        );
        bundle.insert(
            ModelKind::Linear,
            ModelOutcome::Forecast(ForecastResult {
                predictions: (1..=15).map(f64::from).collect(),
                rmse: 1.234_567,
                mae: 0.987_654_3,
            }),
        );
        bundle.insert(
            ModelKind::Arima,
            ModelOutcome::Forecast(ForecastResult {
                predictions: vec![5.0, 6.0],
                rmse: 0.0,
                mae: 0.0,
            }),
        );
        bundle
    }

    #[test]
    fn metrics_are_rounded_and_skip_absent_models() {
        let table = metrics_table(&bundle());
        assert_eq!(table.rows.len(), 2);
        assert!(table.get(ModelKind::Lstm).is_none());
        let linear = table.get(ModelKind::Linear).unwrap();
        assert_eq!(linear.rmse, 1.2346);
        assert_eq!(linear.mae, 0.9877);

        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["Linear Regression"]["RMSE"], 1.2346);
        assert_eq!(json["ARIMA"]["MAE"], 0.0);
        assert!(json.get("LSTM").is_none());
    }

    #[test]
    fn chart_keeps_last_thirty_closes() {
        let closes: Vec<f64> = (0..100).map(f64::from).collect();
        let chart = chart_data(&closes, &[1.0, 2.0, 3.0]);
        assert_eq!(chart.actual.len(), 30);
        assert_eq!(chart.actual[0], 70.0);
        assert_eq!(chart.labels, vec!["Day 1", "Day 2", "Day 3"]);

        let short = chart_data(&[1.0, 2.0], &[]);
        assert_eq!(short.actual, vec![1.0, 2.0]);
        assert!(short.labels.is_empty());
    }

    #[test]
    fn comparison_truncates_to_ten_and_lists_every_model() {
        let view = comparison(&bundle());
        assert_eq!(view.len(), 4);
        assert_eq!(view[&ModelKind::Linear].len(), 10);
        assert_eq!(view[&ModelKind::Arima], vec![5.0, 6.0]);
        assert!(view[&ModelKind::Lstm].is_empty());
        assert!(view[&ModelKind::RandomForest].is_empty());
    }

    #[test]
    fn run_report_carries_a_chart_per_forecast() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let bars = (0..40)
            .map(|i| PriceBar {
                date: start + chrono::Duration::days(i),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0 + i as f64,
                adj_close: 100.0 + i as f64,
                volume: 500,
            })
            .collect();
        let history = PriceHistory::new("MSFT", DataOrigin::Synthetic, bars);
        let bundle = bundle();
        let report = RunReport::new(&history, &bundle, 15);

        assert_eq!(report.charts.len(), 2);
        let linear = &report.charts[&ModelKind::Linear];
        assert_eq!(linear.actual.len(), CHART_HISTORY);
        assert_eq!(linear.actual[0], 110.0);
        assert_eq!(linear.predictions.len(), 15);
        assert!(!report.charts.contains_key(&ModelKind::Lstm));

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["charts"]["arima"]["labels"][1], "Day 2");
        assert_eq!(json["charts"]["linear"]["actual"][29], 139.0);
        assert!(json["charts"].get("lstm").is_none());
    }
}

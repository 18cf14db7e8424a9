//! Quote source abstraction and the Yahoo Finance chart client.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::domain::PriceBar;
use crate::error::AppError;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) price-forecast/0.1";

/// Anything that can return daily bars for a symbol over a date range.
///
/// An empty `Vec` means the source answered but had no rows; `Err` means the
/// attempt itself failed. Both count as a failed attempt for retry purposes.
pub trait QuoteSource {
    fn download(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        timeout: Duration,
    ) -> Result<Vec<PriceBar>, AppError>;
}

/// Blocking client for the public chart endpoint.
pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl QuoteSource for YahooClient {
    fn download(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        timeout: Duration,
    ) -> Result<Vec<PriceBar>, AppError> {
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let period2 = end.and_time(NaiveTime::MIN).and_utc().timestamp();

        let resp = self
            .client
            .get(format!("{}/{}", self.base_url, symbol))
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .timeout(timeout)
            .send()
            .map_err(|e| AppError::new(4, format!("Quote request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("Quote request failed with status {}.", resp.status()),
            ));
        }

        let body: ChartResponse = resp
            .json()
            .map_err(|e| AppError::new(4, format!("Failed to parse quote response: {e}")))?;

        parse_chart(body)
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
    #[serde(default)]
    adjclose: Vec<AdjCloseColumn>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteColumns {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Default, Deserialize)]
struct AdjCloseColumn {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

fn parse_chart(body: ChartResponse) -> Result<Vec<PriceBar>, AppError> {
    if let Some(err) = body.chart.error {
        return Err(AppError::new(
            4,
            format!(
                "Quote source error {}: {}",
                err.code.unwrap_or_default(),
                err.description.unwrap_or_default()
            ),
        ));
    }

    let Some(result) = body.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let adj = result.indicators.adjclose.into_iter().next().unwrap_or_default();

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        // Rows without a usable close are holidays/halts padded by the source.
        let Some(close) = column_value(&quote.close, i) else {
            continue;
        };
        let Some(date) =
            DateTime::from_timestamp(ts + result.meta.gmtoffset, 0).map(|d| d.date_naive())
        else {
            continue;
        };
        bars.push(PriceBar {
            date,
            open: column_value(&quote.open, i).unwrap_or(close),
            high: column_value(&quote.high, i).unwrap_or(close),
            low: column_value(&quote.low, i).unwrap_or(close),
            close,
            adj_close: column_value(&adj.adjclose, i).unwrap_or(close),
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
        });
    }

    Ok(normalize_bars(bars))
}

fn column_value(column: &[Option<f64>], i: usize) -> Option<f64> {
    column
        .get(i)
        .copied()
        .flatten()
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// Sort ascending by date, keep the last row for duplicated dates, and drop
/// rows without a positive finite close.
pub fn normalize_bars(mut bars: Vec<PriceBar>) -> Vec<PriceBar> {
    bars.retain(|b| b.close.is_finite() && b.close > 0.0);
    bars.sort_by_key(|b| b.date);

    let mut out: Vec<PriceBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match out.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => out.push(bar),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(date: (i32, u32, u32), close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            adj_close: close,
            volume: 1,
        }
    }

    #[test]
    fn normalize_sorts_dedupes_and_drops_bad_rows() {
        let bars = vec![
            bar((2025, 1, 3), 3.0),
            bar((2025, 1, 1), 1.0),
            bar((2025, 1, 2), f64::NAN),
            bar((2025, 1, 3), 3.5),
            bar((2025, 1, 4), 0.0),
        ];
        let out = normalize_bars(bars);
        let closes: Vec<f64> = out.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 3.5]);
        assert!(out.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn parse_chart_skips_null_closes() {
        let raw = r#"{
            "chart": {
                "result": [{
                    "meta": {"gmtoffset": 0},
                    "timestamp": [1735776000, 1735862400, 1735948800],
                    "indicators": {
                        "quote": [{
                            "open": [10.0, null, 12.0],
                            "high": [11.0, null, 13.0],
                            "low": [9.0, null, 11.0],
                            "close": [10.5, null, 12.5],
                            "volume": [100, null, 300]
                        }],
                        "adjclose": [{"adjclose": [10.4, null, 12.4]}]
                    }
                }],
                "error": null
            }
        }"#;
        let body: ChartResponse = serde_json::from_str(raw).unwrap();
        let bars = parse_chart(body).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date.to_string(), "2025-01-02");
        assert_eq!(bars[1].close, 12.5);
        assert_eq!(bars[1].adj_close, 12.4);
        assert_eq!(bars[1].volume, 300);
    }

    #[test]
    fn parse_chart_reports_source_errors() {
        let raw = r#"{"chart": {"result": null,
            "error": {"code": "Not Found", "description": "No data found"}}}"#;
        let body: ChartResponse = serde_json::from_str(raw).unwrap();
        let err = parse_chart(body).unwrap_err();
        assert!(err.to_string().contains("No data found"));
    }
}

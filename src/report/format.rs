//! Plain-text terminal output.

use crate::domain::{DataOrigin, ModelBundle, ModelKind, ModelOutcome, PriceBar, PriceHistory};
use crate::report::{COMPARISON_STEPS, round4};

/// Format the run summary: data provenance, per-model scores, and forecasts.
pub fn format_summary(history: &PriceHistory, bundle: &ModelBundle, horizon: usize) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== forecast - {} ===\n", history.symbol));
    out.push_str(&format!(
        "Data: {} | {} records",
        origin_label(history.origin),
        history.len()
    ));
    if let (Some(first), Some(last)) = (history.first_date(), history.last_date()) {
        out.push_str(&format!(" | {first} .. {last}"));
    }
    out.push('\n');
    if let Some(bar) = history.bars.last() {
        out.push_str(&format!("Last close: {:.2}\n", bar.close));
    }
    out.push_str(&format!("Horizon: {horizon} days\n"));

    out.push_str("\nModel accuracy (hold-out 20%):\n");
    out.push_str(&format!("{:<18} {:>12} {:>12}\n", "model", "RMSE", "MAE"));
    out.push_str(&format!("{:-<18} {:-<12} {:-<12}\n", "", "", ""));
    for kind in ModelKind::ALL {
        match bundle.get(kind) {
            Some(ModelOutcome::Forecast(r)) => out.push_str(&format!(
                "{:<18} {:>12.4} {:>12.4}\n",
                kind.display_name(),
                round4(r.rmse),
                round4(r.mae)
            )),
            Some(ModelOutcome::Absent { reason }) => {
                out.push_str(&format!("{:<18} (absent) {reason}\n", kind.display_name()));
            }
            None => {}
        }
    }

    let shown = horizon.min(COMPARISON_STEPS);
    out.push_str(&format!("\nForecast (first {shown} days):\n"));
    for kind in ModelKind::ALL {
        if let Some(r) = bundle.forecast(kind) {
            let head = &r.predictions[..shown.min(r.predictions.len())];
            out.push_str(&format!("{:<18} {}\n", kind.display_name(), fmt_vec(head)));
        }
    }

    out
}

/// Format daily bars as a fixed-width table.
pub fn format_bars(bars: &[PriceBar]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>12}\n",
        "date", "open", "high", "low", "close", "adj_close", "volume"
    ));
    out.push_str(&format!(
        "{:-<10} {:-<10} {:-<10} {:-<10} {:-<10} {:-<10} {:-<12}\n",
        "", "", "", "", "", "", ""
    ));
    for b in bars {
        out.push_str(&format!(
            "{:<10} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>12}\n",
            b.date.format("%Y-%m-%d"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.adj_close,
            b.volume
        ));
    }
    out
}

fn origin_label(origin: DataOrigin) -> &'static str {
    match origin {
        DataOrigin::Remote => "remote",
        DataOrigin::Synthetic => "demo (synthetic)",
    }
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.2}")).collect();
    format!("[{}]", parts.join(", "))
}

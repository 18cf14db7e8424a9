//! Command-line parsing for the stock price forecaster.
//!
//! Argument parsing stays separate from fetching and modeling code.

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Daily stock price forecasting with four models")]
pub struct Cli {
    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch history and forecast it with every model.
    Predict(PredictArgs),
    /// Fetch history and print the daily bars.
    Fetch(FetchArgs),
    /// List symbols with known demo prices.
    Symbols,
}

/// Where the price history comes from.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Calendar days of history to request (default from FORECAST_HISTORY_DAYS or 365).
    #[arg(short, long)]
    pub days: Option<u32>,

    /// Download attempts before falling back to demo data.
    #[arg(long)]
    pub retries: Option<u32>,

    /// Skip the network and use deterministic demo data.
    #[arg(long)]
    pub offline: bool,
}

#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    /// Ticker symbol, e.g. AAPL.
    pub symbol: String,

    /// Days to forecast (1-30).
    #[arg(short = 'n', long, default_value_t = 7)]
    pub horizon: usize,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Print the result as JSON instead of a text summary.
    #[arg(long)]
    pub json: bool,

    /// Draw an ASCII chart of recent closes and forecasts.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 18)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct FetchArgs {
    /// Ticker symbol, e.g. AAPL.
    pub symbol: String,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Print the bars as JSON.
    #[arg(long)]
    pub json: bool,
}

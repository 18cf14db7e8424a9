//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs logging
//! - loads settings from the environment
//! - runs the fetch and prediction pipeline
//! - prints summaries, JSON, or plots

use clap::Parser;
use tracing::Level;

use crate::cli::{Cli, Command, FetchArgs, PredictArgs, SourceArgs};
use crate::config::Settings;
use crate::data::SUPPORTED_SYMBOLS;
use crate::error::AppError;
use crate::report::RunReport;

pub mod pipeline;

/// Entry point for the `forecast` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Predict(args) => handle_predict(args),
        Command::Fetch(args) => handle_fetch(args),
        Command::Symbols => {
            for symbol in SUPPORTED_SYMBOLS {
                println!("{symbol}");
            }
            Ok(())
        }
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Environment settings with CLI overrides applied.
fn settings_for(source: &SourceArgs) -> Result<Settings, AppError> {
    let mut settings = Settings::from_env()?;
    if let Some(retries) = source.retries {
        settings.retries = retries;
    }
    if let Some(days) = source.days {
        if days == 0 {
            return Err(AppError::new(2, "--days must be > 0."));
        }
        settings.history_days = days;
    }
    Ok(settings)
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let settings = settings_for(&args.source)?;
    let request = pipeline::PredictRequest {
        symbol: args.symbol.clone(),
        horizon: args.horizon,
        days: settings.history_days,
        offline: args.source.offline,
    };
    let run = pipeline::run_prediction(&request, &settings)?;

    if args.json {
        println!("{}", RunReport::new(&run.history, &run.bundle, run.horizon).to_json()?);
    } else {
        println!("{}", crate::report::format_summary(&run.history, &run.bundle, run.horizon));
    }

    if args.plot {
        let plot = crate::plot::render_forecast_plot(
            &run.history.closes(),
            &run.bundle,
            args.width,
            args.height,
        );
        println!("{plot}");
    }

    Ok(())
}

fn handle_fetch(args: FetchArgs) -> Result<(), AppError> {
    let settings = settings_for(&args.source)?;
    let symbol = pipeline::normalize_symbol(&args.symbol)?;
    let history =
        pipeline::load_history(&symbol, settings.history_days, args.source.offline, &settings)?;

    if args.json {
        let json = serde_json::to_string_pretty(&history)
            .map_err(|e| AppError::new(4, format!("Failed to encode JSON: {e}")))?;
        println!("{json}");
    } else {
        print!("{}", crate::report::format::format_bars(&history.bars));
    }

    Ok(())
}

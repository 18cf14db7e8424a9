//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - price rows and histories (`PriceBar`, `PriceHistory`, `DataOrigin`)
//! - model identities (`ModelKind`)
//! - per-model and per-request outputs (`ForecastResult`, `ModelOutcome`, `ModelBundle`)

pub mod types;

pub use types::*;

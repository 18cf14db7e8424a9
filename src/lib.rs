//! `price-forecast` library crate.
//!
//! The binary (`forecast`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - models and the fetch layer are reusable from other front-ends

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod ensemble;
pub mod error;
pub mod features;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;

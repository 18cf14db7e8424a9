//! Mathematical utilities: least squares, scaling, and error metrics.

pub mod metrics;
pub mod ols;
pub mod scaler;

pub use metrics::*;
pub use ols::*;
pub use scaler::*;

//! Price data acquisition.
//!
//! - `quotes`: the `QuoteSource` seam and the remote chart client
//! - `fetcher`: retry with linear backoff, falling back to demo data
//! - `demo`: deterministic synthetic history

pub mod demo;
pub mod fetcher;
pub mod quotes;

pub use demo::{SUPPORTED_SYMBOLS, base_price, generate_demo_until};
pub use fetcher::{RetryPolicy, StockFetcher, fallback};
pub use quotes::{QuoteSource, YahooClient};

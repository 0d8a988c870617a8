pub mod config;
pub mod emailer;
pub mod error;
pub mod indicators;
pub mod logging;
pub mod massive_client;
pub mod models;
pub mod processor;
pub mod scanner;
pub mod signals;
pub mod utility;

// Re-exports (public API)
pub use config::{Mode, Settings};
pub use error::ApiError;
pub use massive_client::MassiveClient;
pub use models::{Bar, ContractType, OptionContract, OptionSnapshot, Signal, Trend, TrendInfo};
pub use scanner::{ScanReport, TickerOutcome, run_scan, scan_ticker};
pub use signals::{analyze_trend, classify_trend, pick_option_for_trend};

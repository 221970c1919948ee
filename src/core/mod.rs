//! Core business logic abstractions

pub mod cache;
pub mod calculator;
pub mod config;
pub mod dca;
pub mod error;
pub mod log;
pub mod price;
pub mod scenario;

// Re-export main types for cleaner imports
pub use dca::{Frequency, Ledger, LedgerRow, PurchaseConfig, Schedule};
pub use error::SimulationError;
pub use price::{PriceHistoryProvider, PricePoint, PriceSeries};
pub use scenario::{Projection, ScenarioComparison, ScenarioResult};

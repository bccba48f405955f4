//! Compensation projection engine
//!
//! This library provides:
//! - Year-by-year total compensation (salary, bonus, RSU vesting) over a year range
//! - Quarterly vesting tranche resolution with historical-price valuation
//! - Vested/remaining value per grant as of any month
//! - Pluggable future-grant extrapolation and fallback diagnostics
//! - An async service that suppresses stale results, and batch price scenarios

pub mod config;
pub mod error;
pub mod market;
pub mod projection;
pub mod scenario;
pub mod service;

// Re-export commonly used types
pub use config::{CompensationConfig, RsuGrant, VestingCalendar, VestingPattern, YearMonth};
pub use error::{ConfigError, ProjectionError, RateError};
pub use market::{CurrencyConverter, HistoricalPriceLookup, HistoricalPriceTable, RateTable};
pub use projection::{ProjectionConfig, ProjectionSeries, ProjectionSeriesBuilder, YearlyProjection};
pub use scenario::ScenarioRunner;
pub use service::ProjectionService;

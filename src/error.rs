//! Error types for configuration loading, rate conversion and projection runs
//!
//! Data gaps inside the numeric core (missing prices, missing rates) are never
//! errors there; they degrade to fallbacks. These types cover the edges.

use std::time::Duration;
use thiserror::Error;

/// Failure while loading or validating input configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid vesting month {0}: must be 1-12")]
    InvalidVestingMonth(u32),

    #[error("Invalid month {0}: must be 1-12")]
    InvalidMonth(u32),

    #[error("Invalid year-month '{0}': expected YYYY-MM")]
    InvalidYearMonth(String),
}

/// Failure to obtain a conversion rate from a currency collaborator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateError {
    #[error("No exchange rate available for {from}->{to}")]
    Unavailable { from: String, to: String },
}

/// Failure of a projection run as a whole
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("Projection request {generation} superseded by request {latest}")]
    Superseded { generation: u64, latest: u64 },

    #[error("Year range {start_year}-{end_year} spans more than {max_years} years")]
    RangeTooLong {
        start_year: i32,
        end_year: i32,
        max_years: u32,
    },

    #[error("Projection cancelled")]
    Cancelled,

    #[error("Projection timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Projection worker failed: {0}")]
    Worker(String),
}

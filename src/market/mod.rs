//! Market data collaborators: historical stock prices and currency conversion
//!
//! The projection core only consumes these traits. Any caching or fetching
//! strategy belongs to the implementation, which is injected by the caller.

mod prices;
mod rates;

pub use prices::{HistoricalPriceTable, PriceRow};
pub use rates::{RateRow, RateTable};

use crate::error::RateError;

/// Month-end (or representative) stock price by symbol and month
pub trait HistoricalPriceLookup: Send + Sync {
    /// Price for `symbol` in `year`/`month`, or 0.0 when no data exists.
    /// Must not fail for missing data.
    fn get_price(&self, symbol: &str, year: i32, month: u32) -> f64;
}

/// Conversion rate between two currency codes, resolved at call time
pub trait CurrencyConverter: Send + Sync {
    /// Units of `to` per unit of `from`. Returns 1.0 when the codes match.
    fn get_rate(&self, from: &str, to: &str) -> Result<f64, RateError>;
}

/// Lookup with no history; every tranche falls back to the current price
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPriceHistory;

impl HistoricalPriceLookup for NoPriceHistory {
    fn get_price(&self, _symbol: &str, _year: i32, _month: u32) -> f64 {
        0.0
    }
}

pub(crate) fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

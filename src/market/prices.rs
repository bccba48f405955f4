//! In-memory historical price table, loadable from CSV

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use super::{normalize_code, HistoricalPriceLookup};
use crate::config::loader::open;
use crate::error::ConfigError;

/// One row of a price CSV: `symbol,year,month,price`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub symbol: String,
    pub year: i32,
    pub month: u32,
    pub price: f64,
}

/// Historical prices keyed by (symbol, year, month)
#[derive(Debug, Clone, Default)]
pub struct HistoricalPriceTable {
    prices: HashMap<(String, i32, u32), f64>,
}

impl HistoricalPriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows<I: IntoIterator<Item = PriceRow>>(rows: I) -> Self {
        let mut table = Self::new();
        for row in rows {
            table.insert(&row.symbol, row.year, row.month, row.price);
        }
        table
    }

    /// Load prices from a CSV file with header `symbol,year,month,price`
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let table = Self::from_reader(open(path)?)?;
        debug!("Loaded {} historical prices from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut table = Self::new();
        for result in csv_reader.deserialize() {
            let row: PriceRow = result?;
            table.insert(&row.symbol, row.year, row.month, row.price);
        }
        Ok(table)
    }

    /// Insert or replace a price
    pub fn insert(&mut self, symbol: &str, year: i32, month: u32, price: f64) {
        self.prices.insert((normalize_code(symbol), year, month), price);
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl HistoricalPriceLookup for HistoricalPriceTable {
    fn get_price(&self, symbol: &str, year: i32, month: u32) -> f64 {
        self.prices
            .get(&(normalize_code(symbol), year, month))
            .copied()
            .unwrap_or(0.0)
    }
}

//! Currency conversion table, loadable from CSV

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use super::{normalize_code, CurrencyConverter};
use crate::config::loader::open;
use crate::error::{ConfigError, RateError};

/// One row of a rate CSV: `from,to,rate` (units of `to` per `from`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRow {
    pub from: String,
    pub to: String,
    pub rate: f64,
}

/// Known conversion rates; inverse pairs are derived when only one direction is listed
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rates: HashMap<(String, String), f64>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding a single pair
    pub fn fixed(from: &str, to: &str, rate: f64) -> Self {
        let mut table = Self::new();
        table.insert(from, to, rate);
        table
    }

    pub fn from_rows<I: IntoIterator<Item = RateRow>>(rows: I) -> Self {
        let mut table = Self::new();
        for row in rows {
            table.insert(&row.from, &row.to, row.rate);
        }
        table
    }

    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let table = Self::from_reader(open(path)?)?;
        debug!("Loaded {} exchange rates from {}", table.rates.len(), path.display());
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut table = Self::new();
        for result in csv_reader.deserialize() {
            let row: RateRow = result?;
            table.insert(&row.from, &row.to, row.rate);
        }
        Ok(table)
    }

    pub fn insert(&mut self, from: &str, to: &str, rate: f64) {
        self.rates.insert((normalize_code(from), normalize_code(to)), rate);
    }
}

impl CurrencyConverter for RateTable {
    fn get_rate(&self, from: &str, to: &str) -> Result<f64, RateError> {
        let from = normalize_code(from);
        let to = normalize_code(to);
        if from == to {
            return Ok(1.0);
        }

        let usable = |r: f64| r.is_finite() && r > 0.0;
        let direct = self.rates.get(&(from.clone(), to.clone())).copied();
        if let Some(rate) = direct.filter(|&r| usable(r)) {
            return Ok(rate);
        }
        let inverse = self.rates.get(&(to.clone(), from.clone())).copied();
        if let Some(rate) = inverse.filter(|&r| usable(r)) {
            return Ok(1.0 / rate);
        }

        Err(RateError::Unavailable { from, to })
    }
}

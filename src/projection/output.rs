//! Projection output structures

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::config::YearMonth;

/// Compensation earned in one calendar year
///
/// Salary and bonus are in base currency. `rsu_vest` and `total_comp` are in
/// RSU currency terms (salary and bonus are added unconverted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyProjection {
    pub year: i32,
    pub base_salary: f64,
    pub bonus: f64,
    pub rsu_vest: f64,
    pub rsu_vest_in_base_currency: f64,
    pub total_comp: f64,
    pub total_comp_in_base_currency: f64,

    /// Portion of `rsu_vest` from synthetic future grants
    pub future_grant_vest: f64,
    /// Shares vesting in the year, real and synthetic grants combined
    pub vested_shares: f64,
    /// Year lies after the as-of year
    pub is_projected: bool,
}

/// Ordered year-by-year projection plus the inputs resolved once per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSeries {
    /// One record per year, ascending
    pub projections: Vec<YearlyProjection>,
    /// RSU -> base currency rate applied to every year
    pub exchange_rate: f64,
    /// Rate lookup failed and 1:1 was used
    pub rate_fallback: bool,
    pub as_of: YearMonth,
}

impl ProjectionSeries {
    pub fn len(&self) -> usize {
        self.projections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projections.is_empty()
    }

    pub fn year(&self, year: i32) -> Option<&YearlyProjection> {
        self.projections.iter().find(|p| p.year == year)
    }

    /// Totals split between historical and projected years
    pub fn summary(&self) -> SeriesSummary {
        let (projected, historical): (Vec<&YearlyProjection>, Vec<&YearlyProjection>) =
            self.projections.iter().partition(|p| p.is_projected);

        let total = |rows: &[&YearlyProjection]| -> f64 {
            rows.iter().map(|p| p.total_comp_in_base_currency).sum()
        };

        let total_comp_in_base_currency: f64 =
            self.projections.iter().map(|p| p.total_comp_in_base_currency).sum();
        let average_annual_comp = if self.projections.is_empty() {
            0.0
        } else {
            total_comp_in_base_currency / self.projections.len() as f64
        };
        let peak_year = self
            .projections
            .iter()
            .max_by(|a, b| a.total_comp_in_base_currency.total_cmp(&b.total_comp_in_base_currency))
            .map(|p| p.year);

        SeriesSummary {
            years: self.projections.len() as u32,
            total_base_salary: self.projections.iter().map(|p| p.base_salary).sum(),
            total_bonus: self.projections.iter().map(|p| p.bonus).sum(),
            total_rsu_vest: self.projections.iter().map(|p| p.rsu_vest).sum(),
            total_rsu_vest_in_base_currency: self
                .projections
                .iter()
                .map(|p| p.rsu_vest_in_base_currency)
                .sum(),
            total_comp_in_base_currency,
            historical_comp_in_base_currency: total(historical.as_slice()),
            projected_comp_in_base_currency: total(projected.as_slice()),
            average_annual_comp,
            peak_year,
        }
    }

    /// Write one CSV row per year
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in &self.projections {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

/// Summary statistics for a series, in base currency where converted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub years: u32,
    pub total_base_salary: f64,
    pub total_bonus: f64,
    pub total_rsu_vest: f64,
    pub total_rsu_vest_in_base_currency: f64,
    pub total_comp_in_base_currency: f64,
    pub historical_comp_in_base_currency: f64,
    pub projected_comp_in_base_currency: f64,
    pub average_annual_comp: f64,
    pub peak_year: Option<i32>,
}

//! Scenario runner for batch projections
//!
//! Loads market data once, then runs the same compensation package under
//! many stock-price assumptions without re-reading CSV files.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::CompensationConfig;
use crate::projection::{ProjectionSeries, ProjectionSeriesBuilder};

/// One what-if result: the series with `stock_price` as the current price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceScenario {
    pub stock_price: f64,
    pub series: ProjectionSeries,
}

/// Pre-loaded scenario runner
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::new(ProjectionSeriesBuilder::new(prices, rates, config));
/// let scenarios = runner.run_price_scenarios(&comp, &[80.0, 100.0, 120.0], 2021, 2028);
/// ```
#[derive(Clone)]
pub struct ScenarioRunner {
    builder: ProjectionSeriesBuilder,
}

impl ScenarioRunner {
    pub fn new(builder: ProjectionSeriesBuilder) -> Self {
        Self { builder }
    }

    pub fn builder(&self) -> &ProjectionSeriesBuilder {
        &self.builder
    }

    /// Run a single series
    pub fn run(&self, comp: &CompensationConfig, start_year: i32, end_year: i32) -> ProjectionSeries {
        self.builder.build_series(comp, start_year, end_year)
    }

    /// Run series for several packages over the same range
    pub fn run_batch(
        &self,
        comps: &[CompensationConfig],
        start_year: i32,
        end_year: i32,
    ) -> Vec<ProjectionSeries> {
        comps
            .par_iter()
            .map(|comp| self.builder.build_series(comp, start_year, end_year))
            .collect()
    }

    /// Run one series per current-price assumption, in input order
    pub fn run_price_scenarios(
        &self,
        comp: &CompensationConfig,
        stock_prices: &[f64],
        start_year: i32,
        end_year: i32,
    ) -> Vec<PriceScenario> {
        stock_prices
            .par_iter()
            .map(|&stock_price| {
                let mut scenario_comp = comp.clone();
                scenario_comp.stock_price = stock_price;
                PriceScenario {
                    stock_price,
                    series: self.builder.build_series(&scenario_comp, start_year, end_year),
                }
            })
            .collect()
    }
}

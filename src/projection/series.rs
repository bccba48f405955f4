//! Series builder: drives the yearly projector across a year range

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{CompensationConfig, YearMonth};
use crate::error::ProjectionError;
use crate::market::{CurrencyConverter, HistoricalPriceLookup};

use super::diagnostics::{FallbackEvent, LogObserver, ProjectionObserver};
use super::future::{FutureGrantMode, FutureGrantPolicy};
use super::output::{ProjectionSeries, YearlyProjection};
use super::valuation::{GrantSummary, GrantValuator};
use super::vesting::TrancheSplit;
use super::yearly::YearlyProjector;

/// Default bound on a whole series build
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Years before the as-of year in the default range
pub const DEFAULT_YEARS_BACK: i32 = 4;

/// Years after the as-of year in the default range
pub const DEFAULT_YEARS_FORWARD: i32 = 3;

/// Longest year range a single series may cover
pub const MAX_SERIES_YEARS: u32 = 100;

/// Reject ranges longer than `MAX_SERIES_YEARS`; an inverted range is empty, not an error
pub fn check_range(start_year: i32, end_year: i32) -> Result<(), ProjectionError> {
    let span = i64::from(end_year) - i64::from(start_year) + 1;
    if span > i64::from(MAX_SERIES_YEARS) {
        return Err(ProjectionError::RangeTooLong {
            start_year,
            end_year,
            max_years: MAX_SERIES_YEARS,
        });
    }
    Ok(())
}

/// Configuration for a projection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// "Current" month separating historical from future tranches.
    /// None uses today's date.
    pub as_of: Option<YearMonth>,

    /// How annual vesting percentages are divided across calendar months
    pub tranche_split: TrancheSplit,

    /// Extrapolation of grants beyond the last known one
    pub future_grants: FutureGrantMode,

    /// Project years on the rayon pool instead of sequentially
    pub parallel: bool,

    /// Bound on an async series build
    pub timeout_secs: u64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            as_of: None,
            tranche_split: TrancheSplit::FixedQuarters,
            future_grants: FutureGrantMode::RenewLatest,
            parallel: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ProjectionConfig {
    pub fn as_of(&self) -> YearMonth {
        self.as_of.unwrap_or_else(YearMonth::today)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `[as_of - 4, as_of + 3]`
    pub fn default_range(&self) -> (i32, i32) {
        let year = self.as_of().year;
        (
            year.saturating_sub(DEFAULT_YEARS_BACK),
            year.saturating_add(DEFAULT_YEARS_FORWARD),
        )
    }
}

/// Builds year-by-year projections from injected market collaborators
#[derive(Clone)]
pub struct ProjectionSeriesBuilder {
    prices: Arc<dyn HistoricalPriceLookup>,
    converter: Arc<dyn CurrencyConverter>,
    future_grants: Arc<dyn FutureGrantPolicy>,
    observer: Arc<dyn ProjectionObserver>,
    config: ProjectionConfig,
}

impl ProjectionSeriesBuilder {
    /// Builder using the config's future-grant mode and logging fallbacks
    pub fn new(
        prices: Arc<dyn HistoricalPriceLookup>,
        converter: Arc<dyn CurrencyConverter>,
        config: ProjectionConfig,
    ) -> Self {
        Self {
            prices,
            converter,
            future_grants: config.future_grants.policy(),
            observer: Arc::new(LogObserver),
            config,
        }
    }

    /// Replace the future-grant policy chosen by the config
    pub fn with_future_grants(mut self, policy: Arc<dyn FutureGrantPolicy>) -> Self {
        self.future_grants = policy;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProjectionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// RSU -> base currency rate, resolved once per series
    ///
    /// Returns `(rate, fell_back)`; a failed lookup yields `(1.0, true)`.
    pub fn resolve_exchange_rate(&self, comp: &CompensationConfig) -> (f64, bool) {
        if comp.currencies_match() {
            return (1.0, false);
        }
        match self.converter.get_rate(&comp.rsu_currency, &comp.base_currency) {
            Ok(rate) if rate.is_finite() && rate > 0.0 => (rate, false),
            Ok(rate) => {
                self.rate_fallback(comp, format!("unusable rate {}", rate));
                (1.0, true)
            }
            Err(e) => {
                self.rate_fallback(comp, e.to_string());
                (1.0, true)
            }
        }
    }

    fn rate_fallback(&self, comp: &CompensationConfig, reason: String) {
        self.observer.on_fallback(&FallbackEvent::ExchangeRateUnavailable {
            from: comp.rsu_currency.clone(),
            to: comp.base_currency.clone(),
            reason,
        });
    }

    /// One projection per year in `[start_year, end_year]`, ascending
    ///
    /// A range longer than `MAX_SERIES_YEARS` yields an empty series.
    pub fn build_series(&self, comp: &CompensationConfig, start_year: i32, end_year: i32) -> ProjectionSeries {
        match self.build_inner(comp, start_year, end_year, &|| false) {
            Ok(series) => series,
            Err(e) => {
                warn!("{}", e);
                self.empty_series(self.config.as_of())
            }
        }
    }

    /// As `build_series`, checking `is_cancelled` before each year.
    /// Over-long ranges are rejected with `RangeTooLong`.
    pub fn build_series_cancellable(
        &self,
        comp: &CompensationConfig,
        start_year: i32,
        end_year: i32,
        is_cancelled: &(dyn Fn() -> bool + Sync),
    ) -> Result<ProjectionSeries, ProjectionError> {
        self.build_inner(comp, start_year, end_year, is_cancelled)
    }

    fn build_inner(
        &self,
        comp: &CompensationConfig,
        start_year: i32,
        end_year: i32,
        is_cancelled: &(dyn Fn() -> bool + Sync),
    ) -> Result<ProjectionSeries, ProjectionError> {
        let as_of = self.config.as_of();
        if start_year > end_year {
            return Ok(self.empty_series(as_of));
        }
        check_range(start_year, end_year)?;

        if self.config.tranche_split.is_mismatched(&comp.vesting_calendar) {
            self.observer.on_fallback(&FallbackEvent::IrregularCalendar {
                tranches: comp.vesting_calendar.len(),
            });
        }

        let (exchange_rate, rate_fallback) = self.resolve_exchange_rate(comp);
        let projector = YearlyProjector::new(
            self.prices.as_ref(),
            self.future_grants.as_ref(),
            self.observer.as_ref(),
            as_of,
            self.config.tranche_split,
        );

        debug!(
            "Projecting {}-{} as of {} ({} grants, rate {:.4})",
            start_year,
            end_year,
            as_of,
            comp.rsu_grants.len(),
            exchange_rate
        );

        let project = |year: i32| -> Option<YearlyProjection> {
            if is_cancelled() {
                None
            } else {
                Some(projector.project(comp, year, exchange_rate))
            }
        };

        let projections: Option<Vec<YearlyProjection>> = if self.config.parallel {
            (start_year..=end_year).into_par_iter().map(project).collect()
        } else {
            (start_year..=end_year).map(project).collect()
        };

        let projections = projections.ok_or(ProjectionError::Cancelled)?;
        info!("Projected {} years for {}", projections.len(), comp.stock_symbol);

        Ok(ProjectionSeries {
            projections,
            exchange_rate,
            rate_fallback,
            as_of,
        })
    }

    fn empty_series(&self, as_of: YearMonth) -> ProjectionSeries {
        ProjectionSeries {
            projections: Vec::new(),
            exchange_rate: 1.0,
            rate_fallback: false,
            as_of,
        }
    }

    /// Grant valuator sharing this builder's prices, observer and split
    pub fn valuator(&self) -> GrantValuator<'_> {
        GrantValuator::new(self.prices.as_ref(), self.observer.as_ref(), self.config.tranche_split)
    }

    /// Vested/remaining summary for every grant as of the configured month
    pub fn grant_summaries(&self, comp: &CompensationConfig) -> Vec<GrantSummary> {
        let as_of = self.config.as_of();
        let valuator = self.valuator();
        comp.rsu_grants
            .iter()
            .map(|grant| {
                valuator.summarize(grant, &comp.vesting_calendar, &comp.stock_symbol, comp.stock_price, as_of)
            })
            .collect()
    }
}

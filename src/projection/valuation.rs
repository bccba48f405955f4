//! Point-in-time vested and remaining value of a grant
//!
//! Unlike the yearly projection, which values every tranche of the target
//! year, these only count tranches that have actually vested by the as-of
//! month. Remaining (unvested) shares are always valued at the current price.

use serde::{Deserialize, Serialize};

use crate::config::{RsuGrant, VestingCalendar, YearMonth};
use crate::market::HistoricalPriceLookup;

use super::diagnostics::ProjectionObserver;
use super::vesting::{resolve_vests, years_from_grant, TrancheSplit, VestingTranche};
use super::yearly::historical_price_or_current;

/// Value of the shares vested so far
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VestedValue {
    pub total_vested_value: f64,
    pub vested_shares: f64,
    /// Percentage of the grant vested (0-100)
    pub vested_percentage: f64,
}

/// Display summary for one grant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantSummary {
    pub grant_id: String,
    pub total_shares: f64,
    pub vested_shares: f64,
    pub vested_value: f64,
    pub remaining_shares: f64,
    pub remaining_value: f64,
    pub next_vest: Option<VestingTranche>,
}

enum GrantStage {
    NotStarted,
    Vesting,
    FullyVested,
}

/// Values individual grants against price history
pub struct GrantValuator<'a> {
    prices: &'a dyn HistoricalPriceLookup,
    observer: &'a dyn ProjectionObserver,
    split: TrancheSplit,
}

impl<'a> GrantValuator<'a> {
    pub fn new(
        prices: &'a dyn HistoricalPriceLookup,
        observer: &'a dyn ProjectionObserver,
        split: TrancheSplit,
    ) -> Self {
        Self { prices, observer, split }
    }

    fn stage(grant: &RsuGrant, as_of: YearMonth) -> GrantStage {
        let offset = years_from_grant(grant, as_of.year);
        if offset < 0 {
            GrantStage::NotStarted
        } else if offset as usize >= grant.effective_schedule().len() {
            GrantStage::FullyVested
        } else {
            GrantStage::Vesting
        }
    }

    /// Tranches at or before `as_of`, in date order
    fn vested_tranches(
        &self,
        grant: &RsuGrant,
        calendar: &VestingCalendar,
        as_of: YearMonth,
    ) -> impl Iterator<Item = VestingTranche> + '_ {
        let split = self.split;
        let grant = grant.clone();
        let calendar = calendar.clone();
        (grant.grant_year()..=as_of.year)
            .flat_map(move |year| resolve_vests(&grant, year, &calendar, split))
            .filter(move |t| as_of.has_reached(t.year, t.month))
    }

    /// Vested value as of `as_of` (today when None)
    ///
    /// Vested tranches use the historical price of their month, falling back
    /// to `current_price`. Unvested tranches are excluded entirely.
    pub fn vested_value(
        &self,
        grant: &RsuGrant,
        calendar: &VestingCalendar,
        stock_symbol: &str,
        current_price: f64,
        as_of: Option<YearMonth>,
    ) -> VestedValue {
        let as_of = as_of.unwrap_or_else(YearMonth::today);
        match Self::stage(grant, as_of) {
            GrantStage::NotStarted => VestedValue::default(),
            GrantStage::FullyVested => VestedValue {
                total_vested_value: grant.total_shares * current_price,
                vested_shares: grant.total_shares,
                vested_percentage: 100.0,
            },
            GrantStage::Vesting => {
                let mut result = VestedValue::default();
                for tranche in self.vested_tranches(grant, calendar, as_of) {
                    let price = historical_price_or_current(
                        self.prices,
                        self.observer,
                        stock_symbol,
                        &tranche,
                        current_price,
                    );
                    result.vested_percentage += tranche.percentage;
                    result.vested_shares += tranche.shares;
                    result.total_vested_value += tranche.shares * price;
                }
                result
            }
        }
    }

    /// Percentage of the grant vested at `as_of` (0-100)
    pub fn vested_percentage(&self, grant: &RsuGrant, calendar: &VestingCalendar, as_of: YearMonth) -> f64 {
        match Self::stage(grant, as_of) {
            GrantStage::NotStarted => 0.0,
            GrantStage::FullyVested => 100.0,
            GrantStage::Vesting => self
                .vested_tranches(grant, calendar, as_of)
                .map(|t| t.percentage)
                .sum(),
        }
    }

    /// Unvested portion at the current price: `(100% - vested%) * shares * price`
    pub fn remaining_value(
        &self,
        grant: &RsuGrant,
        current_price: f64,
        as_of: YearMonth,
        calendar: &VestingCalendar,
    ) -> f64 {
        self.remaining_shares(grant, as_of, calendar) * current_price
    }

    pub fn remaining_shares(&self, grant: &RsuGrant, as_of: YearMonth, calendar: &VestingCalendar) -> f64 {
        let vested_pct = self.vested_percentage(grant, calendar, as_of);
        (100.0 - vested_pct) / 100.0 * grant.total_shares
    }

    /// First tranche strictly after `as_of`
    pub fn next_tranche(&self, grant: &RsuGrant, calendar: &VestingCalendar, as_of: YearMonth) -> Option<VestingTranche> {
        let first_year = grant.grant_year().max(as_of.year);
        let last_year = grant.grant_year() + grant.effective_schedule().len() as i32 - 1;
        (first_year..=last_year)
            .flat_map(|year| resolve_vests(grant, year, calendar, self.split))
            .find(|t| !as_of.has_reached(t.year, t.month))
    }

    pub fn summarize(
        &self,
        grant: &RsuGrant,
        calendar: &VestingCalendar,
        stock_symbol: &str,
        current_price: f64,
        as_of: YearMonth,
    ) -> GrantSummary {
        let vested = self.vested_value(grant, calendar, stock_symbol, current_price, Some(as_of));
        let remaining_shares = self.remaining_shares(grant, as_of, calendar);
        GrantSummary {
            grant_id: grant.id.clone(),
            total_shares: grant.total_shares,
            vested_shares: vested.vested_shares,
            vested_value: vested.total_vested_value,
            remaining_shares,
            remaining_value: remaining_shares * current_price,
            next_vest: self.next_tranche(grant, calendar, as_of),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VestingPattern;
    use crate::market::{HistoricalPriceTable, NoPriceHistory};
    use crate::projection::diagnostics::{FallbackEvent, RecordingObserver};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn grant() -> RsuGrant {
        RsuGrant::new(
            "g1",
            NaiveDate::from_ymd_opt(2022, 3, 15).unwrap(),
            1000.0,
            VestingPattern::equal(4),
        )
    }

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth { year, month }
    }

    #[test]
    fn test_not_started_grant() {
        let observer = RecordingObserver::new();
        let valuator = GrantValuator::new(&NoPriceHistory, &observer, TrancheSplit::FixedQuarters);
        let calendar = VestingCalendar::quarterly_default();

        let vested = valuator.vested_value(&grant(), &calendar, "ACME", 100.0, Some(ym(2021, 12)));
        assert_eq!(vested, VestedValue::default());
        assert_relative_eq!(valuator.remaining_value(&grant(), 100.0, ym(2021, 12), &calendar), 100_000.0);
    }

    #[test]
    fn test_fully_vested_after_schedule_years() {
        let observer = RecordingObserver::new();
        let valuator = GrantValuator::new(&NoPriceHistory, &observer, TrancheSplit::FixedQuarters);
        let calendar = VestingCalendar::quarterly_default();

        let vested = valuator.vested_value(&grant(), &calendar, "ACME", 120.0, Some(ym(2026, 3)));
        assert_relative_eq!(vested.vested_shares, 1000.0);
        assert_relative_eq!(vested.total_vested_value, 120_000.0);
        assert_eq!(valuator.remaining_value(&grant(), 120.0, ym(2026, 3), &calendar), 0.0);
        assert!(valuator.next_tranche(&grant(), &calendar, ym(2026, 3)).is_none());
    }

    #[test]
    fn test_partial_vesting_counts_only_completed_tranches() {
        let mut prices = HistoricalPriceTable::new();
        prices.insert("ACME", 2022, 5, 40.0);
        prices.insert("ACME", 2022, 8, 50.0);
        let observer = RecordingObserver::new();
        let valuator = GrantValuator::new(&prices, &observer, TrancheSplit::FixedQuarters);
        let calendar = VestingCalendar::quarterly_default();

        // 2022: May, Aug, Nov; 2023: Feb. Nov and Feb have no history.
        let vested = valuator.vested_value(&grant(), &calendar, "ACME", 100.0, Some(ym(2023, 4)));
        assert_relative_eq!(vested.vested_shares, 4.0 * 62.5);
        assert_relative_eq!(vested.vested_percentage, 25.0);
        assert_relative_eq!(vested.total_vested_value, 62.5 * (40.0 + 50.0 + 100.0 + 100.0));
        assert_eq!(
            observer.count_where(|e| matches!(e, FallbackEvent::HistoricalPriceUnavailable { .. })),
            2
        );

        let next = valuator.next_tranche(&grant(), &calendar, ym(2023, 4)).unwrap();
        assert_eq!(next.date(), ym(2023, 5));
    }

    #[test]
    fn test_tranche_month_counts_as_vested() {
        let observer = RecordingObserver::new();
        let valuator = GrantValuator::new(&NoPriceHistory, &observer, TrancheSplit::FixedQuarters);
        let calendar = VestingCalendar::quarterly_default();

        let before = valuator.vested_percentage(&grant(), &calendar, ym(2022, 4));
        let on = valuator.vested_percentage(&grant(), &calendar, ym(2022, 5));
        assert_eq!(before, 0.0);
        assert_relative_eq!(on, 6.25);
    }

    #[test]
    fn test_conservation_of_shares_over_time() {
        let observer = RecordingObserver::new();
        let valuator = GrantValuator::new(&NoPriceHistory, &observer, TrancheSplit::FixedQuarters);
        let calendar = VestingCalendar::quarterly_default();
        let price = 73.0;

        for year in 2021..=2027 {
            for month in 1..=12 {
                let as_of = ym(year, month);
                let vested = valuator.vested_value(&grant(), &calendar, "ACME", price, Some(as_of));
                let remaining = valuator.remaining_value(&grant(), price, as_of, &calendar);
                assert_relative_eq!(
                    vested.vested_shares + remaining / price,
                    1000.0,
                    epsilon = 1e-9
                );
            }
        }
    }

    #[test]
    fn test_equal_pattern_four_years_on_is_fully_vested() {
        let observer = RecordingObserver::new();
        let valuator = GrantValuator::new(&NoPriceHistory, &observer, TrancheSplit::FixedQuarters);
        let calendar = VestingCalendar::quarterly_default();

        let summary = valuator.summarize(&grant(), &calendar, "ACME", 100.0, ym(2026, 3));
        assert_eq!(summary.remaining_value, 0.0);
        assert_relative_eq!(summary.vested_shares, 1000.0);
        assert!(summary.next_vest.is_none());
    }
}

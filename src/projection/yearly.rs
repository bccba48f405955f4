//! Single-year projection: salary, bonus and RSU vesting value

use crate::config::{BonusConfig, CompensationConfig, RsuGrant, YearMonth};
use crate::market::HistoricalPriceLookup;

use super::diagnostics::{FallbackEvent, ProjectionObserver};
use super::future::FutureGrantPolicy;
use super::output::YearlyProjection;
use super::vesting::{resolve_vests, TrancheSplit, VestingTranche};

/// Historical price for a past tranche, or `current_price` when none is usable
pub(crate) fn historical_price_or_current(
    prices: &dyn HistoricalPriceLookup,
    observer: &dyn ProjectionObserver,
    symbol: &str,
    tranche: &VestingTranche,
    current_price: f64,
) -> f64 {
    let price = prices.get_price(symbol, tranche.year, tranche.month);
    if price.is_finite() && price > 0.0 {
        price
    } else {
        observer.on_fallback(&FallbackEvent::HistoricalPriceUnavailable {
            symbol: symbol.to_string(),
            year: tranche.year,
            month: tranche.month,
            fallback_price: current_price,
        });
        current_price
    }
}

/// Vest value and share count accumulated over a set of tranches
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct VestTotals {
    value: f64,
    shares: f64,
}

impl VestTotals {
    fn add(&mut self, shares: f64, price: f64) {
        self.shares += shares;
        self.value += shares * price;
    }
}

/// Projects one calendar year of compensation
pub struct YearlyProjector<'a> {
    prices: &'a dyn HistoricalPriceLookup,
    future_grants: &'a dyn FutureGrantPolicy,
    observer: &'a dyn ProjectionObserver,
    as_of: YearMonth,
    split: TrancheSplit,
}

impl<'a> YearlyProjector<'a> {
    pub fn new(
        prices: &'a dyn HistoricalPriceLookup,
        future_grants: &'a dyn FutureGrantPolicy,
        observer: &'a dyn ProjectionObserver,
        as_of: YearMonth,
        split: TrancheSplit,
    ) -> Self {
        Self {
            prices,
            future_grants,
            observer,
            as_of,
            split,
        }
    }

    /// Project `year` using `exchange_rate` (base currency units per RSU currency unit)
    pub fn project(&self, comp: &CompensationConfig, year: i32, exchange_rate: f64) -> YearlyProjection {
        let base_salary = self.resolve_salary(comp, year);
        let bonus = self.resolve_bonus(comp, year).bonus_on(base_salary);

        let granted = self.granted_vest(comp, year);
        let synthetic = self.synthetic_vest(comp, year);
        let rsu_vest = granted.value + synthetic.value;

        let rsu_vest_in_base_currency = if comp.currencies_match() {
            rsu_vest
        } else {
            rsu_vest * exchange_rate
        };

        YearlyProjection {
            year,
            base_salary,
            bonus,
            rsu_vest,
            rsu_vest_in_base_currency,
            total_comp: base_salary + bonus + rsu_vest,
            total_comp_in_base_currency: base_salary + bonus + rsu_vest_in_base_currency,
            future_grant_vest: synthetic.value,
            vested_shares: granted.shares + synthetic.shares,
            is_projected: year > self.as_of.year,
        }
    }

    /// Salary from the latest config at or before `year`, else the legacy scalar
    pub fn resolve_salary(&self, comp: &CompensationConfig, year: i32) -> f64 {
        match comp.salary_config_for(year) {
            Some(config) => config.amount,
            None => {
                self.observer.on_fallback(&FallbackEvent::LegacySalaryUsed {
                    year,
                    amount: comp.base_salary,
                });
                comp.base_salary
            }
        }
    }

    /// Bonus config from the latest entry at or before `year`, else 15% x 1.0
    pub fn resolve_bonus(&self, comp: &CompensationConfig, year: i32) -> BonusConfig {
        match comp.bonus_config_for(year) {
            Some(config) => config.clone(),
            None => {
                self.observer.on_fallback(&FallbackEvent::DefaultBonusUsed { year });
                BonusConfig::default_for(year)
            }
        }
    }

    /// Real grants: past tranches at historical prices, future ones at the current price
    fn granted_vest(&self, comp: &CompensationConfig, year: i32) -> VestTotals {
        let mut totals = VestTotals::default();
        for grant in &comp.rsu_grants {
            for tranche in self.tranches(grant, comp, year) {
                let price = if self.as_of.has_reached(tranche.year, tranche.month) {
                    historical_price_or_current(
                        self.prices,
                        self.observer,
                        &comp.stock_symbol,
                        &tranche,
                        comp.stock_price,
                    )
                } else {
                    comp.stock_price
                };
                totals.add(tranche.shares, price);
            }
        }
        totals
    }

    /// Synthetic renewals, always at the current price
    fn synthetic_vest(&self, comp: &CompensationConfig, year: i32) -> VestTotals {
        let mut totals = VestTotals::default();
        if year <= self.as_of.year || comp.rsu_grants.is_empty() {
            return totals;
        }
        for grant in self.future_grants.synthetic_grants(&comp.rsu_grants, self.as_of, year) {
            for tranche in self.tranches(&grant, comp, year) {
                totals.add(tranche.shares, comp.stock_price);
            }
        }
        totals
    }

    fn tranches(&self, grant: &RsuGrant, comp: &CompensationConfig, year: i32) -> Vec<VestingTranche> {
        resolve_vests(grant, year, &comp.vesting_calendar, self.split)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SalaryConfig, VestingPattern};
    use crate::market::{HistoricalPriceTable, NoPriceHistory};
    use crate::projection::diagnostics::RecordingObserver;
    use crate::projection::future::{NoFutureGrants, RenewLatestGrant};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn as_of() -> YearMonth {
        YearMonth { year: 2025, month: 6 }
    }

    fn comp() -> CompensationConfig {
        let mut comp = CompensationConfig::new(100_000.0, "ACME", 100.0, "USD", "USD");
        comp.rsu_grants.push(RsuGrant::new(
            "g1",
            NaiveDate::from_ymd_opt(2022, 6, 15).unwrap(),
            1000.0,
            VestingPattern::equal(4),
        ));
        comp
    }

    #[test]
    fn test_grant_year_example_at_current_price() {
        let observer = RecordingObserver::new();
        let projector = YearlyProjector::new(
            &NoPriceHistory,
            &RenewLatestGrant,
            &observer,
            as_of(),
            TrancheSplit::FixedQuarters,
        );
        let row = projector.project(&comp(), 2022, 1.0);

        assert_relative_eq!(row.rsu_vest, 12_500.0);
        assert_relative_eq!(row.vested_shares, 125.0);
        assert_relative_eq!(row.base_salary, 100_000.0);
        assert_relative_eq!(row.bonus, 15_000.0);
        assert_relative_eq!(row.total_comp, 127_500.0);
        assert!(!row.is_projected);

        // Aug and Nov had no history
        assert_eq!(
            observer.count_where(|e| matches!(e, FallbackEvent::HistoricalPriceUnavailable { .. })),
            2
        );
    }

    #[test]
    fn test_full_year_uses_per_month_historical_prices() {
        let mut prices = HistoricalPriceTable::new();
        prices.insert("ACME", 2023, 2, 80.0);
        prices.insert("ACME", 2023, 5, 90.0);
        prices.insert("ACME", 2023, 8, 110.0);
        prices.insert("ACME", 2023, 11, 120.0);

        let observer = RecordingObserver::new();
        let projector =
            YearlyProjector::new(&prices, &RenewLatestGrant, &observer, as_of(), TrancheSplit::FixedQuarters);
        let row = projector.project(&comp(), 2023, 1.0);

        assert_relative_eq!(row.rsu_vest, 62.5 * (80.0 + 90.0 + 110.0 + 120.0));
        assert!(observer.events().iter().all(|e| !matches!(e, FallbackEvent::HistoricalPriceUnavailable { .. })));
    }

    #[test]
    fn test_current_year_splits_past_and_future_tranches() {
        let mut prices = HistoricalPriceTable::new();
        prices.insert("ACME", 2025, 2, 50.0);
        prices.insert("ACME", 2025, 5, 60.0);
        // Later months have prices that must not be used
        prices.insert("ACME", 2025, 8, 999.0);
        prices.insert("ACME", 2025, 11, 999.0);

        let observer = RecordingObserver::new();
        let projector = YearlyProjector::new(
            &prices,
            &NoFutureGrants,
            &observer,
            as_of(),
            TrancheSplit::FixedQuarters,
        );
        let row = projector.project(&comp(), 2025, 1.0);

        assert_relative_eq!(row.rsu_vest, 62.5 * (50.0 + 60.0 + 100.0 + 100.0));
    }

    #[test]
    fn test_currency_conversion_applies_to_rsu_only() {
        let mut comp = comp();
        comp.base_currency = "EUR".to_string();
        let observer = RecordingObserver::new();
        let projector = YearlyProjector::new(
            &NoPriceHistory,
            &RenewLatestGrant,
            &observer,
            as_of(),
            TrancheSplit::FixedQuarters,
        );
        let row = projector.project(&comp, 2023, 0.9);

        assert_relative_eq!(row.rsu_vest, 25_000.0);
        assert_relative_eq!(row.rsu_vest_in_base_currency, 22_500.0);
        assert_relative_eq!(row.total_comp, 140_000.0);
        assert_relative_eq!(row.total_comp_in_base_currency, 137_500.0);
    }

    #[test]
    fn test_same_currency_ignores_rate() {
        let observer = RecordingObserver::new();
        let projector = YearlyProjector::new(
            &NoPriceHistory,
            &RenewLatestGrant,
            &observer,
            as_of(),
            TrancheSplit::FixedQuarters,
        );
        let row = projector.project(&comp(), 2023, 3.0);
        assert_eq!(row.rsu_vest_in_base_currency, row.rsu_vest);
        assert_eq!(row.total_comp_in_base_currency, row.total_comp);
    }

    #[test]
    fn test_salary_history_and_legacy_fallback() {
        let mut comp = comp();
        comp.salary_configs.insert(SalaryConfig { amount: 140_000.0, year: 2024, is_historical: false });
        comp.salary_configs.insert(SalaryConfig { amount: 120_000.0, year: 2023, is_historical: true });
        comp.bonus_configs.insert(BonusConfig {
            percentage: 20.0,
            year: 2024,
            performance_multiplier: 1.5,
            is_historical: false,
        });

        let observer = RecordingObserver::new();
        let projector =
            YearlyProjector::new(&NoPriceHistory, &NoFutureGrants, &observer, as_of(), TrancheSplit::FixedQuarters);

        assert_eq!(projector.resolve_salary(&comp, 2022), 100_000.0);
        assert_eq!(projector.resolve_salary(&comp, 2023), 120_000.0);
        assert_eq!(projector.resolve_salary(&comp, 2030), 140_000.0);
        assert_eq!(
            observer.events(),
            vec![FallbackEvent::LegacySalaryUsed { year: 2022, amount: 100_000.0 }]
        );

        let row = projector.project(&comp, 2026, 1.0);
        assert_relative_eq!(row.bonus, 140_000.0 * 0.20 * 1.5);
        let row = projector.project(&comp, 2023, 1.0);
        assert_relative_eq!(row.bonus, 120_000.0 * 0.15);
    }

    #[test]
    fn test_future_year_adds_synthetic_grants() {
        let observer = RecordingObserver::new();
        let projector = YearlyProjector::new(
            &NoPriceHistory,
            &RenewLatestGrant,
            &observer,
            as_of(),
            TrancheSplit::FixedQuarters,
        );
        let row = projector.project(&comp(), 2027, 1.0);

        // Original grant is fully vested by 2026; renewals dated Jun 2026 and Jun 2027
        // 2026 renewal in its second year: 4 x 62.5; 2027 renewal in its first: Aug + Nov
        assert_relative_eq!(row.future_grant_vest, (4.0 * 62.5 + 2.0 * 62.5) * 100.0);
        assert_relative_eq!(row.rsu_vest, row.future_grant_vest);
        assert!(row.is_projected);
    }

    #[test]
    fn test_no_grants_means_no_rsu() {
        let mut comp = comp();
        comp.rsu_grants.clear();
        let observer = RecordingObserver::new();
        let projector = YearlyProjector::new(
            &NoPriceHistory,
            &RenewLatestGrant,
            &observer,
            as_of(),
            TrancheSplit::FixedQuarters,
        );
        for year in 2021..=2028 {
            let row = projector.project(&comp, year, 1.0);
            assert_eq!(row.rsu_vest, 0.0);
            assert_eq!(row.total_comp, row.base_salary + row.bonus);
        }
    }
}

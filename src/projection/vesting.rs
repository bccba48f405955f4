//! Vesting tranche resolution for a grant within one calendar year

use serde::{Deserialize, Serialize};

use crate::config::{RsuGrant, VestingCalendar, YearMonth};

/// Tranches assumed per year by the fixed-quarter split
pub const TRANCHES_PER_YEAR: usize = 4;

/// How an annual vesting percentage is divided across calendar months
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrancheSplit {
    /// annual_pct / 4 per tranche, whatever the calendar length
    #[default]
    FixedQuarters,
    /// annual_pct / calendar length per tranche
    PerCalendarEntry,
}

impl TrancheSplit {
    pub fn divisor(&self, calendar: &VestingCalendar) -> f64 {
        match self {
            TrancheSplit::FixedQuarters => TRANCHES_PER_YEAR as f64,
            TrancheSplit::PerCalendarEntry => calendar.len().max(1) as f64,
        }
    }

    /// Whether the calendar's tranche count disagrees with the per-tranche percentage
    pub fn is_mismatched(&self, calendar: &VestingCalendar) -> bool {
        matches!(self, TrancheSplit::FixedQuarters) && calendar.len() != TRANCHES_PER_YEAR
    }
}

/// Shares of one grant vesting in one month
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VestingTranche {
    pub year: i32,
    pub month: u32,
    /// Percentage of the total grant in this tranche
    pub percentage: f64,
    pub shares: f64,
}

impl VestingTranche {
    pub fn date(&self) -> YearMonth {
        YearMonth {
            year: self.year,
            month: self.month,
        }
    }
}

/// Whole years between the grant year and `year` (negative before the grant)
pub fn years_from_grant(grant: &RsuGrant, year: i32) -> i64 {
    i64::from(year) - i64::from(grant.grant_year())
}

/// Tranches of `grant` vesting during `target_year`
///
/// Empty before the grant year, after the schedule ends, or when the year's
/// percentage is zero. In the grant year, months before the grant month are
/// skipped.
pub fn resolve_vests(
    grant: &RsuGrant,
    target_year: i32,
    calendar: &VestingCalendar,
    split: TrancheSplit,
) -> Vec<VestingTranche> {
    let schedule = grant.effective_schedule();
    let offset = years_from_grant(grant, target_year);
    if offset < 0 || offset as usize >= schedule.len() {
        return Vec::new();
    }

    let annual_pct = schedule[offset as usize];
    if annual_pct == 0.0 {
        return Vec::new();
    }

    let tranche_pct = annual_pct / split.divisor(calendar);
    let tranche_shares = grant.total_shares * tranche_pct / 100.0;
    let grant_month = grant.grant_month();

    calendar
        .months()
        .iter()
        .filter(|&&month| !(offset == 0 && month < grant_month))
        .map(|&month| VestingTranche {
            year: target_year,
            month,
            percentage: tranche_pct,
            shares: tranche_shares,
        })
        .collect()
}

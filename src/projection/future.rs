//! Future-grant extrapolation beyond the last known RSU grant
//!
//! Projections for years after the as-of year assume grants keep arriving.
//! The assumption is a pluggable policy; the default renews the latest grant
//! with identical size every year.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{RsuGrant, YearMonth};

/// Produces synthetic grants that may vest in a future target year
pub trait FutureGrantPolicy: Send + Sync {
    /// Synthetic grants dated in `as_of.year + 1 ..= target_year` that can
    /// still vest in `target_year`. Empty when `target_year` is not after the
    /// as-of year.
    fn synthetic_grants(&self, grants: &[RsuGrant], as_of: YearMonth, target_year: i32) -> Vec<RsuGrant>;
}

/// Template for renewals: the grant with the latest grant date
fn latest_grant(grants: &[RsuGrant]) -> Option<&RsuGrant> {
    grants.iter().max_by_key(|g| g.grant_date)
}

/// A copy of the latest grant re-dated to every future year
#[derive(Debug, Clone, Copy, Default)]
pub struct RenewLatestGrant;

impl FutureGrantPolicy for RenewLatestGrant {
    fn synthetic_grants(&self, grants: &[RsuGrant], as_of: YearMonth, target_year: i32) -> Vec<RsuGrant> {
        if target_year <= as_of.year {
            return Vec::new();
        }
        let Some(template) = latest_grant(grants) else {
            return Vec::new();
        };
        let schedule_years = i32::try_from(template.effective_schedule().len()).unwrap_or(i32::MAX);
        if schedule_years == 0 {
            return Vec::new();
        }
        // Renewals older than the schedule length have finished vesting by target_year
        let first_year = (as_of.year + 1).max(target_year.saturating_sub(schedule_years - 1));
        (first_year..=target_year)
            .map(|year| template.renewed_in(year))
            .collect()
    }
}

/// No extrapolation: future years only see vests from real grants
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFutureGrants;

impl FutureGrantPolicy for NoFutureGrants {
    fn synthetic_grants(&self, _grants: &[RsuGrant], _as_of: YearMonth, _target_year: i32) -> Vec<RsuGrant> {
        Vec::new()
    }
}

/// Renewals that shrink by `annual_factor` per year after the as-of year
#[derive(Debug, Clone, Copy)]
pub struct DecliningGrants {
    pub annual_factor: f64,
}

impl FutureGrantPolicy for DecliningGrants {
    fn synthetic_grants(&self, grants: &[RsuGrant], as_of: YearMonth, target_year: i32) -> Vec<RsuGrant> {
        RenewLatestGrant
            .synthetic_grants(grants, as_of, target_year)
            .into_iter()
            .map(|mut grant| {
                let years_out = grant.grant_year().saturating_sub(as_of.year);
                grant.total_shares *= self.annual_factor.powi(years_out);
                grant
            })
            .collect()
    }
}

/// Serializable selection of a future-grant policy
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FutureGrantMode {
    #[default]
    RenewLatest,
    Disabled,
    Declining { annual_factor: f64 },
}

impl FutureGrantMode {
    pub fn policy(&self) -> Arc<dyn FutureGrantPolicy> {
        match *self {
            FutureGrantMode::RenewLatest => Arc::new(RenewLatestGrant),
            FutureGrantMode::Disabled => Arc::new(NoFutureGrants),
            FutureGrantMode::Declining { annual_factor } => Arc::new(DecliningGrants { annual_factor }),
        }
    }
}

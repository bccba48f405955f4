//! Projection engine: vesting resolution, yearly projection and series building

mod diagnostics;
mod future;
mod output;
mod series;
mod valuation;
mod vesting;
mod yearly;

pub use diagnostics::{FallbackEvent, LogObserver, ProjectionObserver, RecordingObserver};
pub use future::{DecliningGrants, FutureGrantMode, FutureGrantPolicy, NoFutureGrants, RenewLatestGrant};
pub use output::{ProjectionSeries, SeriesSummary, YearlyProjection};
pub use series::{
    check_range, ProjectionConfig, ProjectionSeriesBuilder, DEFAULT_TIMEOUT_SECS, DEFAULT_YEARS_BACK,
    DEFAULT_YEARS_FORWARD, MAX_SERIES_YEARS,
};
pub use valuation::{GrantSummary, GrantValuator, VestedValue};
pub use vesting::{resolve_vests, years_from_grant, TrancheSplit, VestingTranche, TRANCHES_PER_YEAR};
pub use yearly::YearlyProjector;

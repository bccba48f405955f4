//! Compensation configuration: data model, step-function history and loaders

mod calendar;
mod data;
mod step;
pub mod loader;

pub use calendar::{VestingCalendar, YearMonth, DEFAULT_VESTING_MONTHS};
pub use data::{
    BonusConfig, CompensationConfig, RsuGrant, SalaryConfig, VestingPattern, VestingPatternType,
    DEFAULT_BONUS_PERCENTAGE,
};
pub use loader::{load_compensation, load_compensation_from_reader, load_projection_config};
pub use step::{StepSchedule, YearKeyed};

//! Compensation input data: salary and bonus history, RSU grants, vesting patterns

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::calendar::VestingCalendar;
use super::step::{StepSchedule, YearKeyed};

/// Bonus target used when no bonus config takes effect before the query year
pub const DEFAULT_BONUS_PERCENTAGE: f64 = 15.0;

fn default_multiplier() -> f64 {
    1.0
}

/// Base salary effective from `year` onward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryConfig {
    pub amount: f64,
    pub year: i32,
    #[serde(default)]
    pub is_historical: bool,
}

impl YearKeyed for SalaryConfig {
    fn year(&self) -> i32 {
        self.year
    }
}

/// Bonus target effective from `year` onward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusConfig {
    /// Target bonus as a percentage of base salary (15.0 = 15%)
    pub percentage: f64,
    pub year: i32,
    #[serde(default = "default_multiplier")]
    pub performance_multiplier: f64,
    #[serde(default)]
    pub is_historical: bool,
}

impl BonusConfig {
    /// 15% at 1.0x
    pub fn default_for(year: i32) -> Self {
        Self {
            percentage: DEFAULT_BONUS_PERCENTAGE,
            year,
            performance_multiplier: 1.0,
            is_historical: false,
        }
    }

    /// Bonus amount earned on `base_salary`
    pub fn bonus_on(&self, base_salary: f64) -> f64 {
        base_salary * self.percentage / 100.0 * self.performance_multiplier
    }
}

impl YearKeyed for BonusConfig {
    fn year(&self) -> i32 {
        self.year
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VestingPatternType {
    Equal,
    Increasing,
    Custom,
}

/// Annual vesting percentages by year after grant
///
/// `schedule[i]` is the percentage of the grant vesting in the i-th year
/// after the grant year (0-indexed). The sum is expected to be 100 but is not
/// enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VestingPattern {
    pub name: String,
    #[serde(rename = "type")]
    pub pattern_type: VestingPatternType,
    pub schedule: Vec<f64>,
}

impl VestingPattern {
    /// Equal vesting over `years` years
    pub fn equal(years: usize) -> Self {
        let pct = if years == 0 { 0.0 } else { 100.0 / years as f64 };
        Self {
            name: format!("Equal {} year", years),
            pattern_type: VestingPatternType::Equal,
            schedule: vec![pct; years],
        }
    }

    /// Back-loaded 10/20/30/40
    pub fn increasing_default() -> Self {
        Self {
            name: "Increasing 10/20/30/40".to_string(),
            pattern_type: VestingPatternType::Increasing,
            schedule: vec![10.0, 20.0, 30.0, 40.0],
        }
    }

    pub fn custom(name: impl Into<String>, schedule: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            pattern_type: VestingPatternType::Custom,
            schedule,
        }
    }

    pub fn total_percentage(&self) -> f64 {
        self.schedule.iter().sum()
    }
}

/// A restricted stock unit grant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsuGrant {
    pub id: String,
    pub grant_date: NaiveDate,
    pub total_shares: f64,
    /// Informational only; vests are valued at market price
    #[serde(default)]
    pub grant_price: f64,
    pub vesting_pattern: VestingPattern,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_vesting_schedule: Option<Vec<f64>>,
}

impl RsuGrant {
    pub fn new(
        id: impl Into<String>,
        grant_date: NaiveDate,
        total_shares: f64,
        vesting_pattern: VestingPattern,
    ) -> Self {
        Self {
            id: id.into(),
            grant_date,
            total_shares,
            grant_price: 0.0,
            vesting_pattern,
            custom_vesting_schedule: None,
        }
    }

    /// Custom override when present and non-empty, else the pattern schedule
    pub fn effective_schedule(&self) -> &[f64] {
        match &self.custom_vesting_schedule {
            Some(custom) if !custom.is_empty() => custom,
            _ => &self.vesting_pattern.schedule,
        }
    }

    pub fn grant_year(&self) -> i32 {
        self.grant_date.year()
    }

    pub fn grant_month(&self) -> u32 {
        self.grant_date.month()
    }

    /// Copy of this grant re-dated to the same month/day of `year`
    ///
    /// Feb 29 maps to Feb 28 in non-leap years.
    pub fn renewed_in(&self, year: i32) -> Self {
        let grant_date = self
            .grant_date
            .with_year(year)
            .or_else(|| NaiveDate::from_ymd_opt(year, self.grant_month(), 28))
            .unwrap_or(self.grant_date);

        Self {
            id: format!("{}-renewal-{}", self.id, year),
            grant_date,
            ..self.clone()
        }
    }
}

/// Full compensation configuration supplied on every projection request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompensationConfig {
    /// Legacy scalar salary used when no salary config precedes the query year
    #[serde(default)]
    pub base_salary: f64,

    #[serde(default)]
    pub salary_configs: StepSchedule<SalaryConfig>,

    #[serde(default)]
    pub bonus_configs: StepSchedule<BonusConfig>,

    #[serde(default)]
    pub rsu_grants: Vec<RsuGrant>,

    #[serde(default)]
    pub vesting_calendar: VestingCalendar,

    pub stock_symbol: String,

    /// Current market price, in RSU currency
    pub stock_price: f64,

    pub base_currency: String,

    pub rsu_currency: String,
}

impl CompensationConfig {
    /// Minimal config with a legacy salary and no history or grants
    pub fn new(
        base_salary: f64,
        stock_symbol: impl Into<String>,
        stock_price: f64,
        base_currency: impl Into<String>,
        rsu_currency: impl Into<String>,
    ) -> Self {
        Self {
            base_salary,
            salary_configs: StepSchedule::new(),
            bonus_configs: StepSchedule::new(),
            rsu_grants: Vec::new(),
            vesting_calendar: VestingCalendar::default(),
            stock_symbol: stock_symbol.into(),
            stock_price,
            base_currency: base_currency.into(),
            rsu_currency: rsu_currency.into(),
        }
    }

    pub fn currencies_match(&self) -> bool {
        self.base_currency.eq_ignore_ascii_case(&self.rsu_currency)
    }

    pub fn salary_config_for(&self, year: i32) -> Option<&SalaryConfig> {
        self.salary_configs.at_or_before(year)
    }

    pub fn bonus_config_for(&self, year: i32) -> Option<&BonusConfig> {
        self.bonus_configs.at_or_before(year)
    }

    /// Grant with the latest grant date (last listed wins ties)
    pub fn latest_grant(&self) -> Option<&RsuGrant> {
        self.rsu_grants.iter().max_by_key(|g| g.grant_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_effective_schedule_prefers_custom_override() {
        let mut grant = RsuGrant::new("g1", date(2022, 3, 15), 1000.0, VestingPattern::equal(4));
        assert_eq!(grant.effective_schedule(), &[25.0, 25.0, 25.0, 25.0]);

        grant.custom_vesting_schedule = Some(vec![50.0, 50.0]);
        assert_eq!(grant.effective_schedule(), &[50.0, 50.0]);

        grant.custom_vesting_schedule = Some(Vec::new());
        assert_eq!(grant.effective_schedule().len(), 4);
    }

    #[test]
    fn test_renewed_in_keeps_month_day_and_shares() {
        let grant = RsuGrant::new("g1", date(2022, 3, 15), 1000.0, VestingPattern::equal(4));
        let renewed = grant.renewed_in(2027);

        assert_eq!(renewed.grant_date, date(2027, 3, 15));
        assert_eq!(renewed.total_shares, 1000.0);
        assert_eq!(renewed.vesting_pattern, grant.vesting_pattern);
        assert_ne!(renewed.id, grant.id);
    }

    #[test]
    fn test_renewed_leap_day_falls_back_to_28th() {
        let grant = RsuGrant::new("leap", date(2024, 2, 29), 10.0, VestingPattern::equal(4));
        assert_eq!(grant.renewed_in(2025).grant_date, date(2025, 2, 28));
        assert_eq!(grant.renewed_in(2028).grant_date, date(2028, 2, 29));
    }

    #[test]
    fn test_bonus_defaults_and_amount() {
        let json = r#"{"percentage": 20.0, "year": 2024}"#;
        let bonus: BonusConfig = serde_json::from_str(json).unwrap();
        assert_eq!(bonus.performance_multiplier, 1.0);
        assert_eq!(bonus.bonus_on(100_000.0), 20_000.0);

        assert_eq!(BonusConfig::default_for(2020).bonus_on(200_000.0), 30_000.0);
    }

    #[test]
    fn test_compensation_config_from_json() {
        let json = r#"{
            "base_salary": 90000,
            "salary_configs": [{"amount": 100000, "year": 2022, "is_historical": true}],
            "rsu_grants": [{
                "id": "2022-refresh",
                "grant_date": "2022-03-15",
                "total_shares": 1000,
                "vesting_pattern": {"name": "4y", "type": "equal", "schedule": [25, 25, 25, 25]}
            }],
            "stock_symbol": "ACME",
            "stock_price": 100.0,
            "base_currency": "EUR",
            "rsu_currency": "USD"
        }"#;
        let config: CompensationConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.vesting_calendar, VestingCalendar::quarterly_default());
        assert_eq!(config.salary_config_for(2023).unwrap().amount, 100_000.0);
        assert!(config.salary_config_for(2021).is_none());
        assert!(config.bonus_configs.is_empty());
        assert_eq!(config.latest_grant().unwrap().id, "2022-refresh");
        assert!(!config.currencies_match());
    }
}

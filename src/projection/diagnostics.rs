//! Fallback telemetry
//!
//! Every missing-data path in the projection degrades to a default value.
//! Those degradations are reported here so callers and tests can observe them
//! without changing any returned numbers.

use std::fmt;
use std::sync::Mutex;

use log::{debug, warn};

/// A data gap that was filled with a fallback value
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackEvent {
    /// No usable historical price; the current price was used instead
    HistoricalPriceUnavailable {
        symbol: String,
        year: i32,
        month: u32,
        fallback_price: f64,
    },
    /// Conversion rate lookup failed; 1:1 was used instead
    ExchangeRateUnavailable {
        from: String,
        to: String,
        reason: String,
    },
    /// No salary config at or before the year; the legacy scalar salary was used
    LegacySalaryUsed { year: i32, amount: f64 },
    /// No bonus config at or before the year; 15% x 1.0 was used
    DefaultBonusUsed { year: i32 },
    /// Calendar tranche count differs from the four assumed per year
    IrregularCalendar { tranches: usize },
}

impl FallbackEvent {
    /// Fallbacks that change the result noticeably rather than filling a routine gap
    pub fn is_material(&self) -> bool {
        matches!(
            self,
            FallbackEvent::ExchangeRateUnavailable { .. } | FallbackEvent::IrregularCalendar { .. }
        )
    }
}

impl fmt::Display for FallbackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackEvent::HistoricalPriceUnavailable { symbol, year, month, fallback_price } => write!(
                f,
                "No historical price for {} {}-{:02}, using current price {:.2}",
                symbol, year, month, fallback_price
            ),
            FallbackEvent::ExchangeRateUnavailable { from, to, reason } => {
                write!(f, "Exchange rate {}->{} unavailable ({}), using 1:1", from, to, reason)
            }
            FallbackEvent::LegacySalaryUsed { year, amount } => {
                write!(f, "No salary config for {}, using legacy base salary {:.2}", year, amount)
            }
            FallbackEvent::DefaultBonusUsed { year } => {
                write!(f, "No bonus config for {}, using default 15% x 1.0", year)
            }
            FallbackEvent::IrregularCalendar { tranches } => write!(
                f,
                "Vesting calendar has {} months but each tranche vests a quarter of the annual percentage",
                tranches
            ),
        }
    }
}

/// Receives fallback notifications during a projection
pub trait ProjectionObserver: Send + Sync {
    fn on_fallback(&self, event: &FallbackEvent);
}

/// Forwards fallbacks to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl ProjectionObserver for LogObserver {
    fn on_fallback(&self, event: &FallbackEvent) {
        if event.is_material() {
            warn!("{}", event);
        } else {
            debug!("{}", event);
        }
    }
}

/// Collects every event; intended for assertions
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<FallbackEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<FallbackEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn count_where<F: Fn(&FallbackEvent) -> bool>(&self, predicate: F) -> usize {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|e| predicate(e))
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl ProjectionObserver for RecordingObserver {
    fn on_fallback(&self, event: &FallbackEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
    }
}

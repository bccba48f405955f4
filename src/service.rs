//! Async projection service for reactive callers
//!
//! Every request takes a new generation number. A request that finishes after
//! a newer one has started is reported as superseded and never published, so
//! the latest published series always belongs to the newest request that
//! completed. A timeout bounds each build so a wedged price collaborator
//! yields "no projection" rather than a hang; the abandoned build stops at
//! its next year boundary.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::RwLock;

use crate::config::CompensationConfig;
use crate::error::ProjectionError;
use crate::projection::{check_range, ProjectionSeries, ProjectionSeriesBuilder};

/// A series tagged with the request generation that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedSeries {
    pub generation: u64,
    pub series: ProjectionSeries,
}

#[derive(Clone)]
pub struct ProjectionService {
    builder: ProjectionSeriesBuilder,
    generation: Arc<AtomicU64>,
    latest: Arc<RwLock<Option<PublishedSeries>>>,
    timeout: Duration,
}

impl ProjectionService {
    /// Service bounded by the builder config's timeout
    pub fn new(builder: ProjectionSeriesBuilder) -> Self {
        let timeout = builder.config().timeout();
        Self {
            builder,
            generation: Arc::new(AtomicU64::new(0)),
            latest: Arc::new(RwLock::new(None)),
            timeout,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn builder(&self) -> &ProjectionSeriesBuilder {
        &self.builder
    }

    /// Generation of the most recently started request
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Most recent series that was not superseded
    pub async fn latest(&self) -> Option<PublishedSeries> {
        self.latest.read().await.clone()
    }

    /// Build and publish a series for `[start_year, end_year]`
    ///
    /// Starting a request makes every earlier in-flight request stale; stale
    /// builds stop at the next year boundary and return `Superseded`.
    /// Ranges longer than `MAX_SERIES_YEARS` are rejected before any work starts.
    pub async fn request(
        &self,
        comp: CompensationConfig,
        start_year: i32,
        end_year: i32,
    ) -> Result<PublishedSeries, ProjectionError> {
        check_range(start_year, end_year)?;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Projection request {} for {}-{}", generation, start_year, end_year);

        let builder = self.builder.clone();
        let counter = Arc::clone(&self.generation);
        let abandoned = Arc::new(AtomicBool::new(false));
        let worker_abandoned = Arc::clone(&abandoned);
        let task = tokio::task::spawn_blocking(move || {
            let is_stale = || {
                worker_abandoned.load(Ordering::SeqCst) || counter.load(Ordering::SeqCst) != generation
            };
            builder.build_series_cancellable(&comp, start_year, end_year, &is_stale)
        });

        let series = match tokio::time::timeout(self.timeout, task).await {
            Err(_) => {
                abandoned.store(true, Ordering::SeqCst);
                warn!("Projection request {} timed out after {:?}", generation, self.timeout);
                return Err(ProjectionError::TimedOut(self.timeout));
            }
            Ok(Err(join_error)) => return Err(ProjectionError::Worker(join_error.to_string())),
            Ok(Ok(Err(ProjectionError::Cancelled))) => return Err(self.superseded(generation)),
            Ok(Ok(Err(e))) => return Err(e),
            Ok(Ok(Ok(series))) => series,
        };

        let mut latest = self.latest.write().await;
        if self.current_generation() != generation {
            return Err(self.superseded(generation));
        }
        if latest.as_ref().is_some_and(|p| p.generation > generation) {
            return Err(self.superseded(generation));
        }

        let published = PublishedSeries { generation, series };
        *latest = Some(published.clone());
        Ok(published)
    }

    fn superseded(&self, generation: u64) -> ProjectionError {
        let latest = self.current_generation();
        debug!("Projection request {} superseded by {}", generation, latest);
        ProjectionError::Superseded { generation, latest }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RsuGrant, VestingPattern, YearMonth};
    use crate::market::{HistoricalPriceLookup, NoPriceHistory, RateTable};
    use crate::projection::ProjectionConfig;
    use chrono::NaiveDate;

    /// Price source that blocks on every lookup
    struct SlowPrices(Duration);

    impl HistoricalPriceLookup for SlowPrices {
        fn get_price(&self, _symbol: &str, _year: i32, _month: u32) -> f64 {
            std::thread::sleep(self.0);
            50.0
        }
    }

    fn comp() -> CompensationConfig {
        let mut comp = CompensationConfig::new(100_000.0, "ACME", 100.0, "USD", "USD");
        comp.rsu_grants.push(RsuGrant::new(
            "g1",
            NaiveDate::from_ymd_opt(2021, 1, 10).unwrap(),
            1000.0,
            VestingPattern::equal(4),
        ));
        comp
    }

    fn config() -> ProjectionConfig {
        ProjectionConfig {
            as_of: Some(YearMonth { year: 2025, month: 6 }),
            ..Default::default()
        }
    }

    fn service(prices: Arc<dyn HistoricalPriceLookup>) -> ProjectionService {
        ProjectionService::new(ProjectionSeriesBuilder::new(prices, Arc::new(RateTable::new()), config()))
    }

    #[tokio::test]
    async fn test_request_publishes_series() {
        let service = service(Arc::new(NoPriceHistory));
        let published = service.request(comp(), 2021, 2028).await.unwrap();

        assert_eq!(published.generation, 1);
        assert_eq!(published.series.len(), 8);
        assert_eq!(service.latest().await, Some(published));
    }

    #[tokio::test]
    async fn test_stale_request_is_not_published() {
        let service = service(Arc::new(SlowPrices(Duration::from_millis(20))));

        let (first, second) = tokio::join!(
            service.request(comp(), 2021, 2024),
            service.request(comp(), 2021, 2024)
        );

        assert!(matches!(
            first,
            Err(ProjectionError::Superseded { generation: 1, latest: 2 })
        ));
        let second = second.unwrap();
        assert_eq!(second.generation, 2);
        assert_eq!(service.latest().await.unwrap().generation, 2);
    }

    #[tokio::test]
    async fn test_wedged_lookup_times_out() {
        let service = service(Arc::new(SlowPrices(Duration::from_millis(200))))
            .with_timeout(Duration::from_millis(50));

        let result = service.request(comp(), 2021, 2021).await;
        assert!(matches!(result, Err(ProjectionError::TimedOut(_))));
        assert!(service.latest().await.is_none());
    }

    /// Slow price source that counts lookups
    struct CountingPrices {
        delay: Duration,
        lookups: AtomicU64,
    }

    impl HistoricalPriceLookup for CountingPrices {
        fn get_price(&self, _symbol: &str, _year: i32, _month: u32) -> f64 {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            50.0
        }
    }

    #[tokio::test]
    async fn test_timed_out_build_stops_looking_up_prices() {
        let prices = Arc::new(CountingPrices {
            delay: Duration::from_millis(20),
            lookups: AtomicU64::new(0),
        });
        let service = service(prices.clone()).with_timeout(Duration::from_millis(100));

        // Twenty past years of four quarterly tranches each
        let mut comp = comp();
        comp.rsu_grants[0].grant_date = NaiveDate::from_ymd_opt(2000, 1, 10).unwrap();
        comp.rsu_grants[0].custom_vesting_schedule = Some(vec![5.0; 20]);

        let result = service.request(comp, 2000, 2019).await;
        assert!(matches!(result, Err(ProjectionError::TimedOut(_))));

        // The worker may finish the year it is in, then stops
        tokio::time::sleep(Duration::from_millis(300)).await;
        let settled = prices.lookups.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(prices.lookups.load(Ordering::SeqCst), settled);
        assert!(settled < 80);
    }

    #[tokio::test]
    async fn test_over_long_range_rejected_without_a_generation() {
        let service = service(Arc::new(NoPriceHistory));
        let result = service.request(comp(), i32::MIN, i32::MAX).await;

        assert!(matches!(result, Err(ProjectionError::RangeTooLong { .. })));
        assert_eq!(service.current_generation(), 0);
        assert!(service.latest().await.is_none());
    }

    #[test]
    fn test_default_timeout_from_config() {
        let service = service(Arc::new(NoPriceHistory));
        assert_eq!(service.timeout, Duration::from_secs(10));
        assert_eq!(service.current_generation(), 0);
    }
}

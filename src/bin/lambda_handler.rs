//! AWS Lambda handler for compensation projections
//!
//! Accepts a compensation config plus optional range, settings, price history
//! and exchange rates as JSON, and returns the year-by-year series with a
//! summary, per-grant values and any fallbacks that were applied.
//!
//! Supports Lambda Function URLs for direct HTTP access.

use std::sync::Arc;
use std::time::Instant;

use aws_lambda_events::event::lambda_function_urls::LambdaFunctionUrlRequest;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use comp_projection::market::{PriceRow, RateRow};
use comp_projection::projection::{
    check_range, GrantSummary, ProjectionConfig, ProjectionSeriesBuilder, RecordingObserver, SeriesSummary,
    YearlyProjection,
};
use comp_projection::{CompensationConfig, HistoricalPriceTable, ProjectionService, RateTable};

/// Input for one projection
#[derive(Debug, Deserialize)]
pub struct ProjectionRequest {
    pub config: CompensationConfig,

    /// First year (default: as-of year - 4)
    #[serde(default)]
    pub start_year: Option<i32>,

    /// Last year (default: as-of year + 3)
    #[serde(default)]
    pub end_year: Option<i32>,

    #[serde(default)]
    pub settings: ProjectionConfig,

    #[serde(default)]
    pub historical_prices: Vec<PriceRow>,

    #[serde(default)]
    pub rates: Vec<RateRow>,

    /// RSU -> base currency rate; overrides `rates` for this pair
    #[serde(default)]
    pub exchange_rate: Option<f64>,
}

/// Output from the projection
#[derive(Debug, Serialize)]
pub struct ProjectionResponse {
    pub as_of: String,
    pub exchange_rate: f64,
    pub rate_fallback: bool,
    pub projections: Vec<YearlyProjection>,
    pub summary: SeriesSummary,
    pub grants: Vec<GrantSummary>,
    pub warnings: Vec<String>,
    pub execution_time_ms: u64,
}

fn cors_headers() -> Value {
    json!({
        "Content-Type": "application/json",
        "Access-Control-Allow-Origin": "*",
        "Access-Control-Allow-Methods": "POST, OPTIONS",
        "Access-Control-Allow-Headers": "Content-Type",
    })
}

fn http_response(status: u16, body: String) -> Value {
    json!({
        "statusCode": status,
        "headers": cors_headers(),
        "body": body,
    })
}

fn error_response(status: u16, message: &str) -> Value {
    http_response(status, json!({ "error": message }).to_string())
}

/// Failure with the HTTP status to report it under
struct Rejection {
    status: u16,
    message: String,
}

async fn project(request: ProjectionRequest) -> Result<ProjectionResponse, Rejection> {
    let start = Instant::now();
    let comp = request.config;

    let (default_start, default_end) = request.settings.default_range();
    let start_year = request.start_year.unwrap_or(default_start);
    let end_year = request.end_year.unwrap_or(default_end);
    check_range(start_year, end_year).map_err(|e| Rejection {
        status: 400,
        message: e.to_string(),
    })?;

    let mut rates = RateTable::from_rows(request.rates);
    if let Some(rate) = request.exchange_rate {
        rates.insert(&comp.rsu_currency, &comp.base_currency, rate);
    }

    let observer = Arc::new(RecordingObserver::new());
    let builder = ProjectionSeriesBuilder::new(
        Arc::new(HistoricalPriceTable::from_rows(request.historical_prices)),
        Arc::new(rates),
        request.settings,
    )
    .with_observer(observer.clone());

    let service = ProjectionService::new(builder);
    let published = service
        .request(comp.clone(), start_year, end_year)
        .await
        .map_err(|e| Rejection {
            status: 500,
            message: e.to_string(),
        })?;
    let series = published.series;
    let grants = service.builder().grant_summaries(&comp);

    let mut warnings: Vec<String> = Vec::new();
    for event in observer.events().iter().filter(|e| e.is_material()) {
        let message = event.to_string();
        if !warnings.contains(&message) {
            warnings.push(message);
        }
    }

    Ok(ProjectionResponse {
        as_of: series.as_of.to_string(),
        exchange_rate: series.exchange_rate,
        rate_fallback: series.rate_fallback,
        summary: series.summary(),
        projections: series.projections,
        grants,
        warnings,
        execution_time_ms: start.elapsed().as_millis() as u64,
    })
}

/// Lambda handler function
async fn handler(event: LambdaEvent<LambdaFunctionUrlRequest>) -> Result<Value, Error> {
    let method = event
        .payload
        .request_context
        .http
        .method
        .as_deref()
        .unwrap_or("POST");

    // Handle CORS preflight
    if method == "OPTIONS" {
        return Ok(http_response(200, String::new()));
    }

    let body = event.payload.body.as_deref().unwrap_or("{}");
    let request: ProjectionRequest = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => {
            warn!("Rejected request: {}", e);
            return Ok(error_response(400, &format!("Invalid JSON: {}", e)));
        }
    };

    match project(request).await {
        Ok(response) => {
            info!(
                "Projected {} years in {} ms",
                response.projections.len(),
                response.execution_time_ms
            );
            Ok(http_response(200, serde_json::to_string(&response)?))
        }
        Err(rejection) => {
            warn!("Projection failed: {}", rejection.message);
            Ok(error_response(rejection.status, &rejection.message))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    run(service_fn(handler)).await
}

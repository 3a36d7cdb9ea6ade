use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::IntoEnumIterator;
use validator::Validate;

use super::error::ApiError;
use super::health::SERVICE_NAME;
use crate::app::AppState;
use crate::simulation::{Channel, TelemetryRecord};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Deserialize, Validate)]
pub struct AssetPath {
    #[validate(length(min = 1, max = 128))]
    pub asset_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TelemetryQuery {
    #[validate(length(min = 1, max = 64))]
    pub start_time: String,
    #[validate(length(min = 1, max = 64))]
    pub end_time: String,
}

/// Parse an ISO-8601 timestamp.
///
/// RFC 3339 with `Z` or an offset is preferred; naive date-times and plain
/// dates are read as UTC.
pub fn parse_datetime(input: &str) -> Result<DateTime<Utc>, ApiError> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }

    Err(ApiError::BadRequest(format!(
        "Invalid datetime format: '{input}'. Use ISO format like '2024-01-01T00:00:00Z'"
    )))
}

/// GET /telemetry/:asset_id?start_time=..&end_time=..
///
/// Returns one record per minute of `[start_time, end_time)`.
pub async fn get_telemetry(
    State(st): State<AppState>,
    Path(path): Path<AssetPath>,
    query: Result<Query<TelemetryQuery>, QueryRejection>,
) -> Result<Json<Vec<TelemetryRecord>>, ApiError> {
    let Query(q) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    path.validate()?;
    q.validate()?;

    let start = parse_datetime(&q.start_time)?;
    let end = parse_datetime(&q.end_time)?;

    if start >= end {
        return Err(ApiError::BadRequest(
            "start_time must be before end_time".to_string(),
        ));
    }
    if end - start > st.max_range() {
        return Err(ApiError::BadRequest(format!(
            "Time range cannot exceed {} days",
            st.cfg.generator.max_range_days
        )));
    }

    let generator = Arc::clone(&st.generator);
    let asset_id = path.asset_id;
    let records = tokio::task::spawn_blocking(move || generator.generate(&asset_id, start, end))
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))??;

    Ok(Json(records))
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub endpoint: &'static str,
    pub max_range_days: u32,
    pub channels: Vec<String>,
}

/// GET / - Service information
pub async fn service_info(State(st): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        endpoint: "/telemetry/{asset_id}?start_time=...&end_time=...",
        max_range_days: st.cfg.generator.max_range_days,
        channels: Channel::iter().map(|c| c.to_string()).collect(),
    })
}

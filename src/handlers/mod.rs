use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header::CACHE_CONTROL, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::cache::{Clock, RefreshCache, SystemClock};
use crate::db::VoteStore;
use crate::error::{Error, Result};
use crate::models::Region;
use crate::results::{RegionStandings, ResultAggregator, StationResult};

// Lets shared caches in front of the server hold responses for a minute
pub const CACHE_CONTROL_VALUE: &str = "public, s-maxage=60, stale-while-revalidate=30";

const REGIONS_KEY: &str = "regions";

pub struct AppState {
    pub aggregator: ResultAggregator,
    pub regions: RefreshCache<Vec<Region>>,
    pub standings: RefreshCache<RegionStandings>,
    pub stations: RefreshCache<Vec<StationResult>>,
}

impl AppState {
    pub fn new(store: Arc<dyn VoteStore>, ttl: Duration) -> Arc<Self> {
        Self::with_clock(store, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn VoteStore>, ttl: Duration, clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self {
            aggregator: ResultAggregator::new(store),
            regions: RefreshCache::with_clock(ttl, clock.clone()),
            standings: RefreshCache::with_clock(ttl, clock.clone()),
            stations: RefreshCache::with_clock(ttl, clock),
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/regions", get(regions_handler))
        .route("/results", get(results_handler))
        .route("/stations", get(stations_handler))
        .with_state(state)
}

#[derive(Debug)]
pub enum ApiError {
    // Rejected input; the message is returned to the client
    BadRequest(String),
    // Anything else; only the static message leaves the server
    Internal(&'static str),
}

impl ApiError {
    fn from_error(err: Error, context: &'static str) -> Self {
        match err {
            Error::InvalidInput(message) => ApiError::BadRequest(message),
            Error::StoreUnavailable(e) => {
                error!("{}: {}", context, e);
                ApiError::Internal(context)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                cached(StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": message })),
            )
                .into_response(),
        }
    }
}

fn cached<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL_VALUE));
    response
}

#[derive(Debug, Deserialize)]
pub struct RegionQuery {
    #[serde(rename = "regionId")]
    region_id: Option<String>,
}

/// Validate a `regionId` query value.
///
/// Absent or empty is "required". Otherwise the leading integer is taken
/// after any leading whitespace, ignoring whatever follows it (`12abc` is 12),
/// and must be positive.
pub fn parse_region_id(raw: Option<&str>) -> Result<i64> {
    let raw = raw
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| Error::InvalidInput("Region ID is required".to_string()))?;

    let rest = raw.trim_start();
    let (negative, unsigned) = match rest.strip_prefix('-') {
        Some(unsigned) => (true, unsigned),
        None => (false, rest.strip_prefix('+').unwrap_or(rest)),
    };
    let end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());

    match unsigned[..end].parse::<i64>() {
        Ok(id) if !negative && id > 0 => Ok(id),
        _ => Err(Error::InvalidInput("Invalid region ID".to_string())),
    }
}

// Checked against the cached region list so unknown ids never get a cache
// entry of their own
async fn region_exists(state: &AppState, region_id: i64) -> Result<bool> {
    let store = state.aggregator.store();
    let regions = state
        .regions
        .get(REGIONS_KEY, || store.find_all_regions())
        .await?;
    Ok(regions.iter().any(|region| region.id == region_id))
}

async fn regions_handler(State(state): State<Arc<AppState>>) -> std::result::Result<Response, ApiError> {
    let store = state.aggregator.store();
    let regions = state
        .regions
        .get(REGIONS_KEY, || store.find_all_regions())
        .await
        .map_err(|e| ApiError::from_error(e, "Failed to fetch regions"))?;

    Ok(cached(StatusCode::OK, regions))
}

async fn results_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RegionQuery>,
) -> std::result::Result<Response, ApiError> {
    let context = "Failed to fetch election results";
    let region_id = parse_region_id(query.region_id.as_deref()).map_err(|e| ApiError::from_error(e, context))?;

    let known = region_exists(&state, region_id)
        .await
        .map_err(|e| ApiError::from_error(e, context))?;
    if !known {
        return Ok(cached(StatusCode::OK, RegionStandings::empty()));
    }

    let standings = state
        .standings
        .get(&format!("results:{}", region_id), || {
            state.aggregator.get_region_standings(region_id)
        })
        .await
        .map_err(|e| ApiError::from_error(e, context))?;

    Ok(cached(StatusCode::OK, standings))
}

async fn stations_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RegionQuery>,
) -> std::result::Result<Response, ApiError> {
    let context = "Failed to fetch station results";
    let region_id = parse_region_id(query.region_id.as_deref()).map_err(|e| ApiError::from_error(e, context))?;

    let known = region_exists(&state, region_id)
        .await
        .map_err(|e| ApiError::from_error(e, context))?;
    if !known {
        return Ok(cached(StatusCode::OK, Vec::<StationResult>::new()));
    }

    let stations = state
        .stations
        .get(&format!("stations:{}", region_id), || {
            state.aggregator.get_station_results_by_region(region_id)
        })
        .await
        .map_err(|e| ApiError::from_error(e, context))?;

    info!("Served {} stations for region {}", stations.len(), region_id);
    Ok(cached(StatusCode::OK, stations))
}

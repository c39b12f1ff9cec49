//! Timeline query endpoints.

use std::str::FromStr;

use axum::extract::{Query, State};
use axum::Json;
use poolscan_core::{LatestQuery, OwnershipQuery, OwnershipSlice, TimelineBlock};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 2000;
const DEFAULT_LAST_N: usize = 2880;
const MAX_LAST_N: usize = 100_000;

/// Parse an optional query parameter, falling back to a default.
///
/// Parameters arrive as raw strings so a malformed value produces the JSON
/// error body instead of the framework's plain-text rejection.
fn parse<T: FromStr>(name: &str, value: Option<&String>, default: T) -> Result<T, ApiError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("invalid {name} value: '{raw}'"))),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Blocks
// ═══════════════════════════════════════════════════════════════════════════

/// Query parameters for the latest-blocks view.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlocksParams {
    /// Maximum entries to return (default: 100, max: 2000).
    pub limit: Option<String>,
    /// Exclude orphaned blocks.
    pub only_valid: Option<String>,
    /// Only blocks with a timestamp at or after this Unix time; 0 disables.
    pub since: Option<String>,
}

/// Latest-blocks response.
#[derive(Debug, Clone, Serialize)]
pub struct BlocksResponse {
    pub blocks: Vec<TimelineBlock>,
}

/// `GET /api/blocks`
///
/// Returns the latest merged blocks, newest first, with synthetic "Unknown"
/// entries standing in for heights no configured pool claims.
pub async fn blocks(
    State(app): State<AppState>,
    Query(params): Query<BlocksParams>,
) -> Result<Json<BlocksResponse>, ApiError> {
    let limit = parse("limit", params.limit.as_ref(), DEFAULT_LIMIT)?.clamp(1, MAX_LIMIT);
    let only_valid = parse("onlyValid", params.only_valid.as_ref(), false)?;
    let since = parse("since", params.since.as_ref(), 0u64)?;

    let blocks = app.state.read_view().latest(LatestQuery {
        limit,
        only_valid,
        since,
    });
    Ok(Json(BlocksResponse { blocks }))
}

// ═══════════════════════════════════════════════════════════════════════════
// Ownership
// ═══════════════════════════════════════════════════════════════════════════

/// Query parameters for the ownership aggregation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipParams {
    /// Window size in heights (default: 2880, max: 100000). Ignored when
    /// `since` is set.
    pub last_n: Option<String>,
    /// Aggregate over blocks at or after this Unix time instead of a
    /// height window; 0 disables.
    pub since: Option<String>,
    /// Exclude orphaned blocks.
    pub only_valid: Option<String>,
}

/// Ownership response.
#[derive(Debug, Clone, Serialize)]
pub struct OwnershipResponse {
    pub ownership: Vec<OwnershipSlice>,
}

/// `GET /api/ownership`
///
/// Returns each pool's share of the examined window, largest first.
pub async fn ownership(
    State(app): State<AppState>,
    Query(params): Query<OwnershipParams>,
) -> Result<Json<OwnershipResponse>, ApiError> {
    let last_n = parse("lastN", params.last_n.as_ref(), DEFAULT_LAST_N)?.clamp(1, MAX_LAST_N);
    let since = parse("since", params.since.as_ref(), 0u64)?;
    let only_valid = parse("onlyValid", params.only_valid.as_ref(), false)?;

    let ownership = app.state.read_view().ownership(OwnershipQuery {
        last_n,
        since,
        only_valid,
    });
    Ok(Json(OwnershipResponse { ownership }))
}

// ═══════════════════════════════════════════════════════════════════════════
// Pools
// ═══════════════════════════════════════════════════════════════════════════

/// Pools response.
#[derive(Debug, Clone, Serialize)]
pub struct PoolsResponse {
    pub pools: Vec<String>,
}

/// `GET /api/pools`
///
/// Returns the registered source names.
pub async fn pools(State(app): State<AppState>) -> Json<PoolsResponse> {
    Json(PoolsResponse {
        pools: app.state.names().to_vec(),
    })
}

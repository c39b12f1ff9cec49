//! API route definitions.

mod blocks;
mod health;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Build the complete API router.
///
/// # Route Structure
///
/// - `GET /health` - Health check
/// - `GET /api/blocks` - Latest merged blocks (`limit`, `onlyValid`, `since`)
/// - `GET /api/ownership` - Per-pool share (`lastN`, `since`, `onlyValid`)
/// - `GET /api/pools` - Registered source names
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/blocks", get(blocks::blocks))
        .route("/ownership", get(blocks::ownership))
        .route("/pools", get(blocks::pools));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api)
        .with_state(state)
}

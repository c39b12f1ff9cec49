//! Poolscan Serve - batch scans and the HTTP API.
//!
//! This crate backs the `poolscan` binary. In batch mode it runs one full
//! refresh cycle and rewrites the CSV snapshot; in serve mode it keeps the
//! shared stores fresh on a background ticker and answers timeline queries
//! over HTTP.
//!
//! # Architecture
//!
//! - **AppState**: shared handle over the per-pool stores
//! - **Routes**: the open, read-only query endpoints
//! - **Refresh**: the fixed-period background fetch cycle

mod error;
mod refresh;
mod routes;
mod state;

pub use self::error::ApiError;
pub use self::refresh::background_refresh;
pub use self::routes::router;
pub use self::state::AppState;

//! Error types for the ingestion crate.
//!
//! Note that per-page fetch failures are deliberately *not* errors: the
//! source contract folds them into "empty page, no token" so one flaky pool
//! can never poison a refresh cycle. What remains here is setup-time
//! failure.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building the source fleet.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP client construction failed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// A source base URL could not be interpreted.
    #[error("invalid source URL: {0}")]
    InvalidUrl(String),
}

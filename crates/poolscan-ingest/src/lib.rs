//! Pool ingestion for poolscan.
//!
//! Polls every configured mining-pool API for its found-blocks history and
//! folds the results into the shared per-pool stores. Three pieces:
//!
//! - [`source`] - one adapter per pool API dialect, all behind [`PoolSource`]
//! - [`throttle`] - per-source request spacing
//! - [`orchestrator`] - the concurrent refresh cycle with its stop boundary
//!
//! Adapters never error at the page level; a failed fetch just ends that
//! source's cycle and the next refresh picks it up again.

pub mod error;
pub mod orchestrator;
pub mod source;
pub mod throttle;

pub use error::{Error, Result};
pub use orchestrator::{refresh_all, run_source};
pub use source::{default_sources, Page, PageToken, PoolSource};
pub use throttle::Throttle;

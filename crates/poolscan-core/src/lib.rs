//! Core timeline engine for poolscan.
//!
//! This crate owns everything between the pool adapters and the serving
//! layer:
//!
//! - [`block`] - the canonical block record and timestamp normalization
//! - [`store`] - the ordered, deduplicated per-pool store
//! - [`merge`] - the filtered k-way merge producing every derived view
//! - [`state`] - the lock-guarded container shared by refreshers and queries
//! - [`snapshot`] - CSV persistence for incremental resume
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   upsert (write lock,    ┌─────────────────┐
//! │ pool sources │──per page batch)────────▶│   SharedState   │
//! └──────────────┘                          │  [PoolStore; N] │
//!                                           └────────┬────────┘
//!                        read lock (whole traversal) │
//!                                           ┌────────▼────────┐
//!                                           │   merge views   │
//!                                           │ export/latest/  │
//!                                           │   ownership     │
//!                                           └────────┬────────┘
//!                                                    │
//!                                       CSV snapshot / HTTP API
//! ```
//!
//! Stores are the source of truth for one process run; the snapshot file is
//! the durable form, fully rewritten from the merged timeline.

pub mod block;
pub mod error;
pub mod merge;
pub mod snapshot;
pub mod state;
pub mod store;

pub use block::{normalize_timestamp, Block, BlockId};
pub use error::{Error, Result};
pub use merge::{
    LatestQuery, OwnershipQuery, OwnershipSlice, TimelineBlock, UNKNOWN_POOL,
};
pub use state::{SharedState, StateView};
pub use store::PoolStore;

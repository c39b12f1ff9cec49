//! Fetch orchestration.
//!
//! One refresh cycle polls every source concurrently. Each source walks its
//! pages newest-first and stops once it descends past the store's previous
//! top height (or the configured floor on a cold start), upserting each
//! whole page before checking the boundary so a page straddling the stop
//! height still lands completely.

use std::sync::Arc;

use poolscan_core::{normalize_timestamp, SharedState};
use tokio::task::JoinSet;

use crate::source::PoolSource;

/// Poll one source until it is exhausted or it reaches the stop boundary.
///
/// Page upserts are batched: the write lock is taken once per page, every
/// block in the page is applied with its timestamp normalized, and the store
/// is re-sorted before the lock drops. A source that fails mid-walk simply
/// ends its cycle early; whatever it already upserted stays.
pub async fn run_source(
    source: Arc<dyn PoolSource>,
    state: Arc<SharedState>,
    index: usize,
    floor: u64,
) {
    let stop_height = state.top_height(index).unwrap_or(floor);
    tracing::debug!(pool = source.name(), stop_height, "refresh started");

    let mut token = None;
    let mut pages = 0u64;
    let mut fetched = 0usize;
    loop {
        let (blocks, next) = source.fetch_page(token).await;
        if blocks.is_empty() && next.is_none() {
            break;
        }
        pages += 1;
        fetched += blocks.len();

        let mut finished = false;
        if !blocks.is_empty() {
            let last_height = blocks.last().map(|b| b.height);
            state.with_store(index, |store| {
                for mut block in blocks {
                    if block.height < stop_height {
                        finished = true;
                    }
                    block.timestamp = normalize_timestamp(block.timestamp);
                    store.upsert(block);
                }
                store.resort();
            });
            tracing::debug!(
                pool = source.name(),
                page = pages,
                last_height,
                "page applied"
            );
        }

        if finished {
            break;
        }
        match next {
            Some(t) => token = Some(t),
            None => break,
        }
    }

    tracing::info!(pool = source.name(), pages, fetched, "refresh finished");
}

/// Run one full refresh cycle across all sources.
///
/// Sources run concurrently, each against its own store. A panicking source
/// task is logged and does not abort the cycle.
pub async fn refresh_all(sources: &[Arc<dyn PoolSource>], state: &Arc<SharedState>, floor: u64) {
    let mut set = JoinSet::new();
    for (index, source) in sources.iter().enumerate() {
        set.spawn(run_source(
            Arc::clone(source),
            Arc::clone(state),
            index,
            floor,
        ));
    }
    while let Some(result) = set.join_next().await {
        if let Err(e) = result {
            tracing::warn!(error = %e, "source task failed");
        }
    }
}

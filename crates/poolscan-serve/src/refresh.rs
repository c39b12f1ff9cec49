//! Background refresh ticker for serve mode.

use std::sync::Arc;
use std::time::Duration;

use poolscan_core::SharedState;
use poolscan_ingest::{refresh_all, PoolSource};

/// Re-run the full refresh cycle on a fixed period, forever.
///
/// The first tick fires immediately, so serve mode starts fetching without
/// waiting a full period. A cycle where every source fails changes nothing;
/// queries keep serving whatever the stores already hold.
pub async fn background_refresh(
    sources: Vec<Arc<dyn PoolSource>>,
    state: Arc<SharedState>,
    floor: u64,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        tracing::info!("refresh cycle started");
        refresh_all(&sources, &state, floor).await;
        tracing::info!(
            blocks = state.read_view().total_blocks(),
            "refresh cycle finished"
        );
    }
}

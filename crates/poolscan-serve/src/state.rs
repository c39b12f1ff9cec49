//! Shared application state.

use std::sync::Arc;

use poolscan_core::SharedState;

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    /// The per-pool stores, shared with the background refresher.
    pub state: Arc<SharedState>,
}

impl AppState {
    /// Create application state over the shared stores.
    pub fn new(state: Arc<SharedState>) -> Self {
        Self { state }
    }
}

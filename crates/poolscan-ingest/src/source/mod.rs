//! Pool source adapters.
//!
//! Each mining-pool API gets one adapter that speaks its particular dialect
//! (paging scheme, field names, timestamp units, orphan flags) and emits
//! canonical [`Block`]s. The orchestrator is written once against the
//! [`PoolSource`] trait and never branches on source identity.
//!
//! # Contract
//!
//! `fetch_page(token)` returns a page of blocks plus an optional resume
//! token for the next call:
//!
//! - empty page, no token: exhausted *or* failed — indistinguishable by
//!   design, the caller just ends this cycle and retries on the next one;
//! - non-empty page, no token: final page;
//! - token present: call again with it (an empty page with a token is a
//!   legal "keep going" answer for cursor-style APIs).
//!
//! Adapters swallow their own transport and decode errors; nothing a single
//! pool does can surface as an error to the orchestrator.

mod c3pool;
mod cryptonote;
mod kryptex;
mod nanopool;
mod p2pool;
mod rplant;
mod solopool;
mod two_miners;

pub use c3pool::C3Pool;
pub use cryptonote::CryptonotePool;
pub use kryptex::Kryptex;
pub use nanopool::Nanopool;
pub use p2pool::P2Pool;
pub use rplant::Rplant;
pub use solopool::Solopool;
pub use two_miners::TwoMiners;

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use poolscan_core::Block;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// How long a page request may take before the adapter gives up on it.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum spacing between requests to the same source.
pub const THROTTLE_INTERVAL: Duration = Duration::from_secs(5);

/// Opaque paging state, produced and consumed by one adapter.
///
/// The orchestrator only ever tests for presence; what is inside (a page
/// index, a last-seen id, a height cursor) is the owning adapter's business.
pub struct PageToken(Box<dyn Any + Send>);

impl PageToken {
    /// Wrap adapter-private paging state.
    pub fn new<T: Any + Send>(state: T) -> Self {
        Self(Box::new(state))
    }

    /// Recover the paging state, if this token belongs to the caller.
    ///
    /// A token of a foreign type yields `None`, which adapters treat the
    /// same as a fresh start.
    pub fn downcast<T: Any>(self) -> Option<T> {
        self.0.downcast::<T>().ok().map(|b| *b)
    }
}

impl std::fmt::Debug for PageToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PageToken(..)")
    }
}

/// A fetched page and the token to resume with, if any.
pub type Page = (Vec<Block>, Option<PageToken>);

/// One pool API being polled.
#[async_trait]
pub trait PoolSource: Send + Sync {
    /// Stable source identifier; also the snapshot's pool column value.
    fn name(&self) -> &str;

    /// Fetch the next page of found blocks.
    async fn fetch_page(&self, token: Option<PageToken>) -> Page;
}

/// GET a JSON document, folding any transport/decode failure into `None`.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Option<T> {
    let response = match client.get(url).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(url, error = %e, "request failed");
            return None;
        }
    };
    if !response.status().is_success() {
        tracing::debug!(url, status = %response.status(), "non-success response");
        return None;
    }
    match response.json().await {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(url, error = %e, "payload decode failed");
            None
        }
    }
}

/// Build the configured source fleet.
///
/// Registration order is load-bearing: it is the store order and therefore
/// the merge tie-break order, so appending new sources at the end keeps
/// existing exports reproducible.
pub fn default_sources() -> Result<Vec<Arc<dyn PoolSource>>> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("poolscan/", env!("CARGO_PKG_VERSION")))
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    let sources: Vec<Arc<dyn PoolSource>> = vec![
        Arc::new(Nanopool::new(client.clone())),
        Arc::new(Kryptex::new(client.clone())),
        Arc::new(C3Pool::new(client.clone())),
        Arc::new(CryptonotePool::new(
            client.clone(),
            "https://web.xmrpool.eu:8119",
            "xmrpool.eu",
        )),
        Arc::new(CryptonotePool::new(
            client.clone(),
            "https://monero.herominers.com/api",
            "monero.herominers.com",
        )),
        Arc::new(CryptonotePool::new(
            client.clone(),
            "https://monerohash.com/api",
            "monerohash.com",
        )),
        Arc::new(CryptonotePool::new(
            client.clone(),
            "https://fastpool.xyz/api-xmr",
            "fastpool.xyz",
        )),
        Arc::new(CryptonotePool::new(
            client.clone(),
            "https://xmr.zeropool.io:8119",
            "xmr.zeropool.io",
        )),
        Arc::new(CryptonotePool::new(
            client.clone(),
            "https://monero.fairhash.org/api",
            "monero.fairhash.org",
        )),
        Arc::new(TwoMiners::new(client.clone())),
        Arc::new(Solopool::new(client.clone())),
        Arc::new(Rplant::new(client.clone())),
        // p2pool observers last: on cross-pool height ties the freshest
        // observer instance wins, matching historical exports.
        Arc::new(P2Pool::new(client.clone(), "https://p2pool.observer")?),
        Arc::new(P2Pool::new(client.clone(), "https://old.p2pool.observer")?),
        Arc::new(P2Pool::new(
            client.clone(),
            "https://old-old.p2pool.observer",
        )?),
        Arc::new(P2Pool::new(client.clone(), "https://mini.p2pool.observer")?),
        Arc::new(P2Pool::new(
            client.clone(),
            "https://old-mini.p2pool.observer",
        )?),
        Arc::new(P2Pool::new(client, "https://nano.p2pool.observer")?),
    ];

    Ok(sources)
}

//! p2pool.observer adapter.
//!
//! The observer sites expose `/api/found_blocks`, already newest-first, with
//! timestamps in seconds and miner address attribution. One request returns
//! everything the instance will give us, so there is no paging.

use async_trait::async_trait;
use poolscan_core::{Block, BlockId};
use serde::Deserialize;

use super::{get_json, PageToken, PoolSource, THROTTLE_INTERVAL};
use crate::error::{Error, Result};
use crate::throttle::Throttle;

pub struct P2Pool {
    client: reqwest::Client,
    base_url: String,
    name: String,
    throttle: Throttle,
}

#[derive(Deserialize)]
struct FoundBlock {
    main_block: MainBlock,
    #[serde(default)]
    miner_address: String,
}

#[derive(Deserialize)]
struct MainBlock {
    height: u64,
    id: BlockId,
    timestamp: u64,
    reward: u64,
}

impl P2Pool {
    /// Create an adapter for one observer instance; the instance's host name
    /// becomes the source name.
    pub fn new(client: reqwest::Client, base_url: &str) -> Result<Self> {
        let parsed = reqwest::Url::parse(base_url)
            .map_err(|e| Error::InvalidUrl(format!("{base_url}: {e}")))?;
        let name = parsed
            .host_str()
            .ok_or_else(|| Error::InvalidUrl(format!("{base_url}: no host")))?
            .to_string();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            name,
            throttle: Throttle::new(THROTTLE_INTERVAL),
        })
    }
}

#[async_trait]
impl PoolSource for P2Pool {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_page(&self, _token: Option<PageToken>) -> (Vec<Block>, Option<PageToken>) {
        self.throttle.wait().await;

        let url = format!("{}/api/found_blocks?limit=1000", self.base_url);
        let Some(found) = get_json::<Vec<FoundBlock>>(&self.client, &url).await else {
            return (Vec::new(), None);
        };

        let blocks: Vec<Block> = found
            .into_iter()
            .map(|b| Block {
                id: b.main_block.id,
                height: b.main_block.height,
                reward: b.main_block.reward,
                // Observer timestamps are already in seconds.
                timestamp: b.main_block.timestamp,
                valid: true,
                miner: b.miner_address,
            })
            .collect();

        (blocks, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_observer_host() {
        let client = reqwest::Client::new();
        let pool = P2Pool::new(client, "https://mini.p2pool.observer").unwrap();
        assert_eq!(pool.name(), "mini.p2pool.observer");
    }

    #[test]
    fn rejects_urls_without_host() {
        let client = reqwest::Client::new();
        assert!(P2Pool::new(client, "not a url").is_err());
    }

    #[test]
    fn decodes_found_block_payload() {
        let json = r#"[{
            "main_block": {
                "height": 2800000,
                "id": "4ff2236ceb2fdc6dee6317cd0b841f3f020ac985bb3f99f7f4c1f973ec28d06b",
                "timestamp": 1700000000,
                "reward": 600000000000
            },
            "miner_address": "4ABC"
        }]"#;
        let found: Vec<FoundBlock> = serde_json::from_str(json).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].main_block.height, 2_800_000);
        assert_eq!(found[0].miner_address, "4ABC");
    }
}

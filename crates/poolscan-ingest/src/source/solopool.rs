//! xmr.solopool.org adapter.
//!
//! Single page combining candidates, immature, and matured blocks. Rewards
//! arrive as decimal strings in a 10^18 base and are scaled down to atomic
//! units; the combined list is re-sorted height-descending before returning
//! since the three buckets interleave.

use async_trait::async_trait;
use poolscan_core::{Block, BlockId};
use serde::Deserialize;

use super::{get_json, PageToken, PoolSource, THROTTLE_INTERVAL};
use crate::throttle::Throttle;

pub struct Solopool {
    client: reqwest::Client,
    throttle: Throttle,
}

#[derive(Deserialize, Default)]
struct BlocksPayload {
    #[serde(default)]
    matured: Vec<BlockJson>,
    #[serde(default)]
    immatured: Vec<BlockJson>,
    #[serde(default)]
    candidates: Vec<BlockJson>,
}

#[derive(Deserialize)]
struct BlockJson {
    #[serde(rename = "timestamp")]
    ts: u64,
    hash: BlockId,
    height: u64,
    #[serde(default, rename = "orphan")]
    orphaned: bool,
    #[serde(rename = "reward")]
    value: String,
    #[serde(default)]
    miner: String,
}

impl Solopool {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            throttle: Throttle::new(THROTTLE_INTERVAL),
        }
    }

    fn convert(b: BlockJson) -> Block {
        Block {
            id: b.hash,
            height: b.height,
            reward: b.value.parse::<u64>().unwrap_or(0) / 1_000_000,
            // Already Unix seconds.
            timestamp: b.ts,
            valid: !b.orphaned,
            miner: b.miner,
        }
    }
}

#[async_trait]
impl PoolSource for Solopool {
    fn name(&self) -> &str {
        "xmr.solopool.org"
    }

    async fn fetch_page(&self, _token: Option<PageToken>) -> (Vec<Block>, Option<PageToken>) {
        self.throttle.wait().await;

        let url = "https://xmr.solopool.org/api/blocks";
        let Some(payload) = get_json::<BlocksPayload>(&self.client, url).await else {
            return (Vec::new(), None);
        };

        let mut blocks: Vec<Block> = payload
            .candidates
            .into_iter()
            .chain(payload.immatured)
            .chain(payload.matured)
            .map(Self::convert)
            .collect();
        blocks.sort_by(|a, b| b.height.cmp(&a.height));

        (blocks, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_and_scales_reward() {
        let json = r#"{
            "hash": "4ff2236ceb2fdc6dee6317cd0b841f3f020ac985bb3f99f7f4c1f973ec28d06b",
            "timestamp": 1700000000,
            "height": 2800000,
            "orphan": true,
            "reward": "600000000000000000",
            "miner": "4ABC"
        }"#;
        let b: BlockJson = serde_json::from_str(json).unwrap();
        let block = Solopool::convert(b);
        assert_eq!(block.reward, 600_000_000_000);
        assert!(!block.valid);
        assert_eq!(block.miner, "4ABC");
    }

    #[test]
    fn missing_buckets_default_empty() {
        let payload: BlocksPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.matured.is_empty());
        assert!(payload.candidates.is_empty());
    }
}

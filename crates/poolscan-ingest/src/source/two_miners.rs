//! xmr.2miners.com adapter.
//!
//! Single-page source: the API returns its matured block list in one shot,
//! with no paging support.

use async_trait::async_trait;
use poolscan_core::{Block, BlockId};
use serde::Deserialize;

use super::{get_json, PageToken, PoolSource, THROTTLE_INTERVAL};
use crate::throttle::Throttle;

pub struct TwoMiners {
    client: reqwest::Client,
    throttle: Throttle,
}

#[derive(Deserialize)]
struct BlocksPayload {
    #[serde(default)]
    matured: Vec<BlockJson>,
}

#[derive(Deserialize)]
struct BlockJson {
    #[serde(rename = "timestamp")]
    ts: u64,
    hash: BlockId,
    height: u64,
    #[serde(rename = "reward")]
    value: u64,
}

impl TwoMiners {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            throttle: Throttle::new(THROTTLE_INTERVAL),
        }
    }
}

#[async_trait]
impl PoolSource for TwoMiners {
    fn name(&self) -> &str {
        "xmr.2miners.com"
    }

    async fn fetch_page(&self, _token: Option<PageToken>) -> (Vec<Block>, Option<PageToken>) {
        self.throttle.wait().await;

        let url = "https://xmr.2miners.com/api/blocks";
        let Some(payload) = get_json::<BlocksPayload>(&self.client, url).await else {
            return (Vec::new(), None);
        };

        let blocks: Vec<Block> = payload
            .matured
            .into_iter()
            .map(|b| Block {
                id: b.hash,
                height: b.height,
                reward: b.value,
                // Milliseconds; normalized to seconds on upsert.
                timestamp: b.ts * 1000,
                // Matured means on-chain and unlocked.
                valid: true,
                miner: String::new(),
            })
            .collect();

        (blocks, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_matured_list() {
        let json = r#"{"matured": [{
            "timestamp": 1700000000,
            "hash": "4ff2236ceb2fdc6dee6317cd0b841f3f020ac985bb3f99f7f4c1f973ec28d06b",
            "height": 2800000,
            "reward": 600000000000
        }]}"#;
        let payload: BlocksPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.matured.len(), 1);
        assert_eq!(payload.matured[0].value, 600_000_000_000);
    }
}

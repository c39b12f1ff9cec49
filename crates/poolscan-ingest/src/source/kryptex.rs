//! pool.kryptex.com adapter.
//!
//! Kryptex only exposes its recent finds inside the pool stats document, so
//! this is a single-page source: no paging, no rewards, and the timestamp
//! arrives as a millisecond string.

use async_trait::async_trait;
use poolscan_core::{Block, BlockId};
use serde::Deserialize;

use super::{get_json, PageToken, PoolSource, THROTTLE_INTERVAL};
use crate::throttle::Throttle;

pub struct Kryptex {
    client: reqwest::Client,
    throttle: Throttle,
}

#[derive(Deserialize)]
struct StatsPayload {
    #[serde(default)]
    last_blocks_found: Vec<BlockJson>,
}

#[derive(Deserialize)]
struct BlockJson {
    #[serde(rename = "date", with = "string_u64")]
    ts: u64,
    hash: String,
    height: u64,
    kind: String,
}

/// Kryptex serializes the date as a decimal string.
mod string_u64 {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Kryptex {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            throttle: Throttle::new(THROTTLE_INTERVAL),
        }
    }
}

#[async_trait]
impl PoolSource for Kryptex {
    fn name(&self) -> &str {
        "kryptex.com"
    }

    async fn fetch_page(&self, _token: Option<PageToken>) -> (Vec<Block>, Option<PageToken>) {
        self.throttle.wait().await;

        let url = "https://pool.kryptex.com/xmr/api/v1/pool/stats";
        let Some(stats) = get_json::<StatsPayload>(&self.client, url).await else {
            return (Vec::new(), None);
        };

        let mut blocks = Vec::new();
        for b in stats.last_blocks_found {
            // The list mixes in uncle/reward entries; only real blocks count.
            if b.kind != "BLOCK" {
                continue;
            }
            let Ok(id) = b.hash.parse::<BlockId>() else {
                continue;
            };
            blocks.push(Block {
                id,
                height: b.height,
                reward: 0,
                // `date` is milliseconds; normalized to seconds on upsert.
                timestamp: b.ts * 1000,
                valid: true,
                miner: String::new(),
            });
        }

        (blocks, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_stats_payload_and_string_date() {
        let json = r#"{"last_blocks_found": [
            {"date": "1700000000", "hash": "4ff2236ceb2fdc6dee6317cd0b841f3f020ac985bb3f99f7f4c1f973ec28d06b", "height": 2800000, "kind": "BLOCK"},
            {"date": "1700000100", "hash": "ffff", "height": 2800001, "kind": "UNCLE"}
        ]}"#;
        let stats: StatsPayload = serde_json::from_str(json).unwrap();
        assert_eq!(stats.last_blocks_found.len(), 2);
        assert_eq!(stats.last_blocks_found[0].ts, 1_700_000_000);
        assert_eq!(stats.last_blocks_found[1].kind, "UNCLE");
    }
}

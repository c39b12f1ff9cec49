//! pool.rplant.xyz adapter.
//!
//! Single page of colon-joined records
//! (`hash:?:height:miner:ts:status:reward:...`); a status containing
//! `ORPHAN` marks the block invalid.

use async_trait::async_trait;
use poolscan_core::{Block, BlockId};
use serde::Deserialize;

use super::{get_json, PageToken, PoolSource, THROTTLE_INTERVAL};
use crate::throttle::Throttle;

pub struct Rplant {
    client: reqwest::Client,
    throttle: Throttle,
}

#[derive(Deserialize)]
struct BlocksPayload {
    #[serde(default)]
    blocks: Vec<String>,
}

impl Rplant {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            throttle: Throttle::new(THROTTLE_INTERVAL),
        }
    }

    fn parse_record(record: &str) -> Option<Block> {
        let parts: Vec<&str> = record.split(':').collect();
        if parts.len() < 7 {
            return None;
        }
        let id = parts[0].parse::<BlockId>().ok()?;
        let height = parts[2].parse::<u64>().unwrap_or(0);
        let miner = parts[3].to_string();
        let ts = parts[4].parse::<u64>().unwrap_or(0);
        let status = parts[5].to_uppercase();
        let reward = parts[6].parse::<u64>().unwrap_or(0);
        Some(Block {
            id,
            height,
            reward,
            // Already Unix seconds.
            timestamp: ts,
            valid: !status.contains("ORPHAN"),
            miner,
        })
    }
}

#[async_trait]
impl PoolSource for Rplant {
    fn name(&self) -> &str {
        "pool.rplant.xyz"
    }

    async fn fetch_page(&self, _token: Option<PageToken>) -> (Vec<Block>, Option<PageToken>) {
        self.throttle.wait().await;

        let url = "https://pool.rplant.xyz/api2/poolminer2/monero/0/0";
        let Some(payload) = get_json::<BlocksPayload>(&self.client, url).await else {
            return (Vec::new(), None);
        };

        let blocks: Vec<Block> = payload
            .blocks
            .iter()
            .filter_map(|r| Self::parse_record(r))
            .collect();

        (blocks, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "4ff2236ceb2fdc6dee6317cd0b841f3f020ac985bb3f99f7f4c1f973ec28d06b";

    #[test]
    fn parses_confirmed_record() {
        let record = format!("{ID}:x:2800000:4ABC:1700000000:CONFIRMED:600000000000");
        let block = Rplant::parse_record(&record).unwrap();
        assert_eq!(block.height, 2_800_000);
        assert_eq!(block.miner, "4ABC");
        assert!(block.valid);
    }

    #[test]
    fn orphan_status_marks_invalid() {
        let record = format!("{ID}:x:2800000:4ABC:1700000000:orphaned:600000000000");
        let block = Rplant::parse_record(&record).unwrap();
        assert!(!block.valid);
    }

    #[test]
    fn short_or_bad_records_are_skipped() {
        assert!(Rplant::parse_record("tooshort").is_none());
        assert!(Rplant::parse_record("nothex:x:1:m:2:OK:3").is_none());
    }
}

//! c3pool.org adapter.
//!
//! Page-numbered API with native validity flags and timestamps in seconds.
//! Uses the same overlap-trimming cursor as nanopool since pages shift when
//! new blocks land during a scan.

use async_trait::async_trait;
use poolscan_core::{Block, BlockId};
use serde::Deserialize;

use super::{get_json, PageToken, PoolSource, THROTTLE_INTERVAL};
use crate::throttle::Throttle;

pub struct C3Pool {
    client: reqwest::Client,
    throttle: Throttle,
}

struct Cursor {
    page: u64,
    id: BlockId,
    height: u64,
}

#[derive(Deserialize)]
struct BlockJson {
    ts: u64,
    hash: BlockId,
    height: u64,
    valid: bool,
    value: u64,
}

impl C3Pool {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            throttle: Throttle::new(THROTTLE_INTERVAL),
        }
    }
}

#[async_trait]
impl PoolSource for C3Pool {
    fn name(&self) -> &str {
        "c3pool.org"
    }

    async fn fetch_page(&self, token: Option<PageToken>) -> (Vec<Block>, Option<PageToken>) {
        let cursor = token
            .and_then(PageToken::downcast::<Cursor>)
            .unwrap_or(Cursor {
                page: 0,
                id: BlockId::ZERO,
                height: 0,
            });

        self.throttle.wait().await;

        let url = format!(
            "https://api.c3pool.org/pool/blocks?page={}&limit=9999",
            cursor.page
        );
        let Some(payload) = get_json::<Vec<BlockJson>>(&self.client, &url).await else {
            return (Vec::new(), None);
        };

        let mut blocks = Vec::new();
        let mut past_overlap = cursor.id.is_zero();
        for b in payload {
            if b.height < cursor.height {
                past_overlap = true;
            }
            if past_overlap {
                blocks.push(Block {
                    id: b.hash,
                    height: b.height,
                    reward: b.value,
                    // `ts` is already Unix seconds.
                    timestamp: b.ts,
                    valid: b.valid,
                    miner: String::new(),
                });
            }
            if b.hash == cursor.id {
                past_overlap = true;
            }
        }

        let Some(last) = blocks.last() else {
            return (Vec::new(), None);
        };
        let next = Cursor {
            page: cursor.page + 1,
            id: last.id,
            height: last.height,
        };
        (blocks, Some(PageToken::new(next)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_block_payload() {
        let json = r#"[{
            "ts": 1700000000,
            "hash": "4ff2236ceb2fdc6dee6317cd0b841f3f020ac985bb3f99f7f4c1f973ec28d06b",
            "height": 2800000,
            "valid": false,
            "value": 600000000000
        }]"#;
        let payload: Vec<BlockJson> = serde_json::from_str(json).unwrap();
        assert_eq!(payload[0].height, 2_800_000);
        assert!(!payload[0].valid);
        assert_eq!(payload[0].value, 600_000_000_000);
    }
}

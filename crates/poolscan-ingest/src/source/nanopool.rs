//! xmr.nanopool.org adapter.
//!
//! Offset-paged API, 500 blocks per page, newest first. The resume token
//! remembers the last block seen on the previous page so overlapping entries
//! are trimmed instead of re-emitted: paging by offset shifts underneath us
//! whenever a new block is found mid-scan.

use async_trait::async_trait;
use poolscan_core::{Block, BlockId};
use serde::Deserialize;

use super::{get_json, PageToken, PoolSource, THROTTLE_INTERVAL};
use crate::throttle::Throttle;

const PAGE_SIZE: u64 = 500;

pub struct Nanopool {
    client: reqwest::Client,
    throttle: Throttle,
}

struct Cursor {
    page: u64,
    id: BlockId,
    height: u64,
}

#[derive(Deserialize)]
struct BlocksPayload {
    #[serde(default)]
    data: Vec<BlockJson>,
}

#[derive(Deserialize)]
struct BlockJson {
    #[serde(rename = "date")]
    ts: u64,
    hash: BlockId,
    #[serde(rename = "block_number")]
    height: u64,
    status: i64,
    value: f64,
    #[serde(default)]
    miner: String,
}

impl Nanopool {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            throttle: Throttle::new(THROTTLE_INTERVAL),
        }
    }
}

#[async_trait]
impl PoolSource for Nanopool {
    fn name(&self) -> &str {
        "xmr.nanopool.org"
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
            "https://xmr.nanopool.org/api/v1/pool/blocks/{}/{}",
            cursor.page * PAGE_SIZE,
            PAGE_SIZE
        );
        let Some(payload) = get_json::<BlocksPayload>(&self.client, &url).await else {
            return (Vec::new(), None);
        };

        let mut blocks = Vec::new();
        // Skip until we pass the block the previous page ended on; a drop in
        // height below the cursor means the overlap window has shifted away.
        let mut past_overlap = cursor.id.is_zero();
        for b in payload.data {
            if b.height < cursor.height {
                past_overlap = true;
            }
            if past_overlap {
                blocks.push(Block {
                    id: b.hash,
                    height: b.height,
                    // `value` is whole XMR; scale to atomic units.
                    reward: (b.value * 1e12) as u64,
                    // `date` is already Unix seconds.
                    timestamp: b.ts,
                    // Status 1 marks an orphan.
                    valid: b.status != 1,
                    miner: b.miner,
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

//! Generic cryptonote-universal-pool adapter.
//!
//! Covers the family of pools running the classic cryptonote pool frontend
//! (xmrpool.eu, herominers, monerohash, fastpool, zeropool, fairhash). The
//! API is `/get_blocks?height=<cursor>` returning a flat JSON array of
//! alternating strings: a colon-joined record
//! (`hash:ts:difficulty:shares:unlocked:reward:...`) followed by the height.
//! Paging walks down by height cursor, so an empty page with a token is a
//! normal "keep descending" answer here.

use async_trait::async_trait;
use poolscan_core::{Block, BlockId};

use super::{get_json, PageToken, PoolSource, THROTTLE_INTERVAL};
use crate::throttle::Throttle;

/// First-call cursor; comfortably above any real Monero height.
const TOP_CURSOR: u64 = i32::MAX as u64;

pub struct CryptonotePool {
    client: reqwest::Client,
    api_url: String,
    name: String,
    throttle: Throttle,
}

struct Cursor {
    height: u64,
    id: BlockId,
}

impl CryptonotePool {
    pub fn new(client: reqwest::Client, api_url: &str, name: &str) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            name: name.to_string(),
            throttle: Throttle::new(THROTTLE_INTERVAL),
        }
    }

    /// Decode one `record, height` string pair into a block.
    ///
    /// Returns `None` for records that cannot be decoded, including pending
    /// candidates that have no reward field yet; the caller ends the page
    /// there and anything below is refetched on the next cycle.
    fn parse_pair(record: &str, height: &str) -> Option<Block> {
        let pieces: Vec<&str> = record.split(':').collect();
        if pieces.len() < 6 {
            return None;
        }
        let id = pieces[0].parse::<BlockId>().ok()?;
        let ts = pieces[1].parse::<u64>().ok()?;
        let height = height.parse::<u64>().ok()?;
        // Field 4 is the unlock flag: "0" means the block was orphaned.
        let unlocked = pieces[4] != "0";
        let reward = pieces[5].parse::<u64>().ok()?;
        Some(Block {
            id,
            height,
            reward,
            // Historically carried as milliseconds in this family's
            // snapshots; normalization rescales it to seconds on upsert.
            timestamp: ts * 1000,
            valid: unlocked,
            miner: String::new(),
        })
    }
}

#[async_trait]
impl PoolSource for CryptonotePool {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_page(&self, token: Option<PageToken>) -> (Vec<Block>, Option<PageToken>) {
        let cursor = token
            .and_then(PageToken::downcast::<Cursor>)
            .unwrap_or(Cursor {
                height: TOP_CURSOR,
                id: BlockId::ZERO,
            });

        self.throttle.wait().await;

        let url = format!("{}/get_blocks?height={}", self.api_url, cursor.height);
        let Some(payload) = get_json::<Vec<String>>(&self.client, &url).await else {
            return (Vec::new(), None);
        };
        if payload.len() % 2 != 0 {
            tracing::debug!(pool = %self.name, "odd-length get_blocks payload");
            return (Vec::new(), None);
        }

        let mut blocks = Vec::new();
        for pair in payload.chunks_exact(2) {
            let Some(block) = Self::parse_pair(&pair[0], &pair[1]) else {
                break;
            };
            blocks.push(block);
        }
        let Some(last) = blocks.last() else {
            return (Vec::new(), None);
        };
        let next = Cursor {
            height: last.height,
            id: last.id,
        };

        // Trim the overlap with the previous page: emit only once we have
        // descended past the block the last page ended on.
        let mut past_overlap = cursor.id.is_zero();
        for (i, b) in blocks.iter().enumerate() {
            if b.height < cursor.height {
                past_overlap = true;
            }
            if past_overlap {
                return (blocks[i..].to_vec(), Some(PageToken::new(next)));
            }
            if b.id == cursor.id {
                past_overlap = true;
            }
        }

        // Entire page was overlap; keep descending from the new cursor.
        (Vec::new(), Some(PageToken::new(next)))
    }
}

//! Per-pool block stores.

use crate::block::Block;

/// The ordered, deduplicated set of blocks known for one pool.
///
/// Records are kept sorted by height descending. Identity within a store is
/// the block id: upserting a record whose id is already present replaces the
/// stored copy, so sources that revise a block after confirmation depth
/// (validity flips, corrected timestamps) converge instead of duplicating.
#[derive(Debug, Clone, Default)]
pub struct PoolStore {
    blocks: Vec<Block>,
}

impl PoolStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a block by id.
    ///
    /// Ordering is not restored here; callers batch upserts and call
    /// [`PoolStore::resort`] once per batch.
    pub fn upsert(&mut self, block: Block) {
        if !block.id.is_zero() {
            if let Some(existing) = self.blocks.iter_mut().find(|b| b.id == block.id) {
                *existing = block;
                return;
            }
        }
        self.blocks.push(block);
    }

    /// Restore height-descending order after a batch of upserts.
    ///
    /// The sort is stable so records at equal heights keep arrival order.
    pub fn resort(&mut self) {
        self.blocks.sort_by(|a, b| b.height.cmp(&a.height));
    }

    /// Highest known height, if any block is stored.
    pub fn top_height(&self) -> Option<u64> {
        self.blocks.first().map(|b| b.height)
    }

    /// Lowest known height, if any block is stored.
    pub fn bottom_height(&self) -> Option<u64> {
        self.blocks.last().map(|b| b.height)
    }

    /// Number of stored blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True when no blocks are stored.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The stored blocks, height-descending.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}

//! Filtered k-way merge across per-pool stores.
//!
//! All derived views share one mechanic: a read cursor per store, always
//! selecting the highest-height record among the store fronts, with ties
//! going to the highest store index. The tie-break is arbitrary but
//! deterministic; it matches the historical output of this system and must
//! not be changed, or exported timelines stop being reproducible.
//!
//! Three consumers:
//! - [`export`]: the full timeline, used to rewrite the snapshot file;
//! - [`latest`]: a bounded view with synthetic gap entries;
//! - [`ownership`]: per-pool share aggregation over the same traversal.

use serde::Serialize;

use crate::block::{Block, BlockId};
use crate::store::PoolStore;

/// Sentinel pool name for synthetic entries covering unattributed heights.
pub const UNKNOWN_POOL: &str = "Unknown";

/// A block attributed to its pool in a merged view.
///
/// Synthetic entries carry [`BlockId::ZERO`], the [`UNKNOWN_POOL`] name,
/// `valid = true`, and zero reward/timestamp. They exist only in view
/// output and are never written back into a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineBlock {
    pub height: u64,
    pub id: BlockId,
    pub timestamp: u64,
    pub reward: u64,
    pub pool: String,
    pub valid: bool,
    pub miner: String,
}

impl TimelineBlock {
    fn real(block: &Block, pool: &str) -> Self {
        Self {
            height: block.height,
            id: block.id,
            timestamp: block.timestamp,
            reward: block.reward,
            pool: pool.to_string(),
            valid: block.valid,
            miner: block.miner.clone(),
        }
    }

    fn synthetic(height: u64) -> Self {
        Self {
            height,
            id: BlockId::ZERO,
            timestamp: 0,
            reward: 0,
            pool: UNKNOWN_POOL.to_string(),
            valid: true,
            miner: String::new(),
        }
    }

    /// Whether this entry is a synthetic gap placeholder.
    pub fn is_synthetic(&self) -> bool {
        self.id.is_zero() && self.pool == UNKNOWN_POOL
    }
}

/// Parameters for the bounded latest view.
#[derive(Debug, Clone, Copy)]
pub struct LatestQuery {
    /// Maximum number of entries to emit (synthetic entries count).
    pub limit: usize,
    /// Drop records the pool marked invalid.
    pub only_valid: bool,
    /// Drop records with a normalized timestamp below this; 0 disables.
    pub since: u64,
}

/// Parameters for the ownership aggregation.
#[derive(Debug, Clone, Copy)]
pub struct OwnershipQuery {
    /// Window size in heights when `since` is 0; ignored otherwise.
    pub last_n: usize,
    /// Time window threshold; non-zero switches to time-windowed mode.
    pub since: u64,
    /// Drop records the pool marked invalid.
    pub only_valid: bool,
}

/// One pool's share of the examined window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnershipSlice {
    pub pool: String,
    pub count: u64,
    pub percentage: f64,
}

/// The shared cursor walk: repeatedly yields `(store index, block)` for the
/// highest-height record passing the filter, advancing only the winning
/// cursor. Fronts failing the filter are skipped without emission.
struct MergeWalk<'a> {
    stores: &'a [PoolStore],
    cursors: Vec<usize>,
    only_valid: bool,
    since: u64,
}

impl<'a> MergeWalk<'a> {
    fn new(stores: &'a [PoolStore], only_valid: bool, since: u64) -> Self {
        Self {
            stores,
            cursors: vec![0; stores.len()],
            only_valid,
            since,
        }
    }

    fn passes(&self, block: &Block) -> bool {
        (!self.only_valid || block.valid) && (self.since == 0 || block.timestamp >= self.since)
    }

    fn next(&mut self) -> Option<(usize, &'a Block)> {
        // Park every cursor on a record that passes the filter.
        for (i, store) in self.stores.iter().enumerate() {
            let blocks = store.blocks();
            while let Some(b) = blocks.get(self.cursors[i]) {
                if self.passes(b) {
                    break;
                }
                self.cursors[i] += 1;
            }
        }

        // Highest height wins; `>=` lets the later store take equal heights.
        let mut winner: Option<(usize, u64)> = None;
        for (i, store) in self.stores.iter().enumerate() {
            if let Some(b) = store.blocks().get(self.cursors[i]) {
                if winner.is_none_or(|(_, h)| b.height >= h) {
                    winner = Some((i, b.height));
                }
            }
        }

        let (idx, _) = winner?;
        let block = &self.stores[idx].blocks()[self.cursors[idx]];
        self.cursors[idx] += 1;
        Some((idx, block))
    }
}

/// The lowest height any store still has coverage for.
///
/// Gap synthesis never reaches below this: where every source's history
/// already ends, a missing height is unknowable rather than unattributed.
fn min_known(stores: &[PoolStore]) -> u64 {
    stores
        .iter()
        .filter_map(PoolStore::bottom_height)
        .min()
        .unwrap_or(u64::MAX)
}

/// Full timeline export: every record from every store, globally ordered by
/// descending height, no filters, no synthesis, cross-source duplicate
/// heights all present.
pub fn export(stores: &[PoolStore], names: &[String]) -> Vec<TimelineBlock> {
    let total: usize = stores.iter().map(PoolStore::len).sum();
    let mut out = Vec::with_capacity(total);
    let mut walk = MergeWalk::new(stores, false, 0);
    while let Some((idx, block)) = walk.next() {
        out.push(TimelineBlock::real(block, &names[idx]));
    }
    out
}

/// Bounded latest view with gap synthesis.
///
/// Emits at most `limit` entries in strictly decreasing height order. Each
/// height appears once: the tie-break winner for heights multiple pools
/// found, or a synthetic [`UNKNOWN_POOL`] entry for heights inside the
/// covered range that no tracked pool accounts for.
pub fn latest(stores: &[PoolStore], names: &[String], query: LatestQuery) -> Vec<TimelineBlock> {
    let floor = min_known(stores);
    let mut walk = MergeWalk::new(stores, query.only_valid, query.since);
    let mut out: Vec<TimelineBlock> = Vec::new();
    let mut prev_height: Option<u64> = None;

    while out.len() < query.limit {
        let Some((idx, block)) = walk.next() else {
            break;
        };

        if let Some(prev) = prev_height {
            // Another pool found the same height; first winner stands.
            if block.height >= prev {
                continue;
            }
            let mut gap = prev - 1;
            while gap > block.height && gap >= floor && out.len() < query.limit {
                out.push(TimelineBlock::synthetic(gap));
                gap -= 1;
            }
            if out.len() >= query.limit {
                break;
            }
        }

        out.push(TimelineBlock::real(block, &names[idx]));
        prev_height = Some(block.height);
    }

    out
}

/// Ownership aggregation over the merged timeline.
///
/// With `since == 0` the window is the most recent `last_n` heights and gap
/// synthesis feeds the [`UNKNOWN_POOL`] bucket, bounded by the same floor as
/// [`latest`]. With `since != 0` the window is time-bounded, `last_n` is
/// ignored, and no heights are synthesized: a time window carries no
/// assumption about block spacing, so "missing height" is undefined there.
pub fn ownership(
    stores: &[PoolStore],
    names: &[String],
    query: OwnershipQuery,
) -> Vec<OwnershipSlice> {
    let time_windowed = query.since != 0;
    let floor = min_known(stores);

    let mut counts = vec![0u64; stores.len()];
    let mut unknown = 0u64;
    let mut total = 0u64;
    let mut prev_height: Option<u64> = None;

    let mut walk = MergeWalk::new(stores, query.only_valid, query.since);
    'merge: while time_windowed || (total as usize) < query.last_n {
        let Some((idx, block)) = walk.next() else {
            break;
        };

        if let Some(prev) = prev_height {
            if block.height >= prev {
                continue;
            }
            if !time_windowed {
                let mut gap = prev - 1;
                while gap > block.height && gap >= floor {
                    unknown += 1;
                    total += 1;
                    if total as usize >= query.last_n {
                        break 'merge;
                    }
                    gap -= 1;
                }
            }
        }

        counts[idx] += 1;
        total += 1;
        prev_height = Some(block.height);
    }

    let divisor = total.max(1) as f64;
    let mut slices: Vec<OwnershipSlice> = names
        .iter()
        .zip(&counts)
        .filter(|(_, &count)| count > 0)
        .map(|(name, &count)| OwnershipSlice {
            pool: name.clone(),
            count,
            percentage: count as f64 / divisor * 100.0,
        })
        .collect();
    if unknown > 0 {
        slices.push(OwnershipSlice {
            pool: UNKNOWN_POOL.to_string(),
            count: unknown,
            percentage: unknown as f64 / divisor * 100.0,
        });
    }
    slices.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.pool.cmp(&b.pool)));
    slices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(height: u64, id_byte: u8) -> Block {
        let mut bytes = [0u8; 32];
        bytes[0] = id_byte;
        bytes[1] = (height & 0xff) as u8;
        Block {
            id: BlockId::from(bytes),
            height,
            timestamp: 1_700_000_000 + height,
            reward: 600_000_000_000,
            valid: true,
            miner: String::new(),
        }
    }

    fn store_of(heights: &[u64], id_base: u8) -> PoolStore {
        let mut store = PoolStore::new();
        for (i, &h) in heights.iter().enumerate() {
            store.upsert(block(h, id_base + i as u8));
        }
        store.resort();
        store
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("pool{}", i)).collect()
    }

    #[test]
    fn export_emits_every_record_once_in_order() {
        let stores = vec![
            store_of(&[100, 98, 95], 1),
            store_of(&[99, 98, 90], 10),
            store_of(&[97], 20),
        ];
        let merged = export(&stores, &names(3));
        assert_eq!(merged.len(), 7);
        for pair in merged.windows(2) {
            assert!(pair[0].height >= pair[1].height);
        }
        // Each source record appears exactly once.
        let mut ids: Vec<BlockId> = merged.iter().map(|b| b.id).collect();
        ids.sort_by_key(|id| *id.as_bytes());
        ids.dedup();
        assert_eq!(ids.len(), 7);
    }

    #[test]
    fn export_tie_break_prefers_higher_store_index() {
        // Same height fronted by both stores: store 1 must come out first,
        // every time.
        let mut a = PoolStore::new();
        let mut b_store = PoolStore::new();
        let mut b1 = block(100, 1);
        b1.valid = true;
        let mut b2 = block(100, 2);
        b2.valid = false;
        a.upsert(b1.clone());
        b_store.upsert(b2.clone());
        a.resort();
        b_store.resort();

        for _ in 0..5 {
            let merged = export(&[a.clone(), b_store.clone()], &names(2));
            assert_eq!(merged.len(), 2);
            assert_eq!(merged[0].id, b2.id);
            assert_eq!(merged[0].pool, "pool1");
            assert!(!merged[0].valid);
            assert_eq!(merged[1].id, b1.id);
            assert_eq!(merged[1].pool, "pool0");
        }
    }

    #[test]
    fn latest_respects_limit_and_order() {
        let stores = vec![store_of(&[100, 99, 98, 97, 96], 1)];
        let view = latest(
            &stores,
            &names(1),
            LatestQuery {
                limit: 3,
                only_valid: false,
                since: 0,
            },
        );
        let heights: Vec<u64> = view.iter().map(|b| b.height).collect();
        assert_eq!(heights, vec![100, 99, 98]);
    }

    #[test]
    fn latest_synthesizes_gaps_between_emitted_heights() {
        let stores = vec![store_of(&[100, 96], 1), store_of(&[95, 90], 10)];
        let view = latest(
            &stores,
            &names(2),
            LatestQuery {
                limit: 50,
                only_valid: false,
                since: 0,
            },
        );
        let heights: Vec<u64> = view.iter().map(|b| b.height).collect();
        assert_eq!(heights, vec![100, 99, 98, 97, 96, 95, 94, 93, 92, 91, 90]);
        for entry in &view {
            match entry.height {
                99 | 98 | 97 | 94 | 93 | 92 | 91 => {
                    assert!(entry.is_synthetic());
                    assert_eq!(entry.pool, UNKNOWN_POOL);
                    assert_eq!(entry.reward, 0);
                    assert_eq!(entry.timestamp, 0);
                    assert!(entry.valid);
                }
                _ => assert!(!entry.is_synthetic()),
            }
        }
    }

    #[test]
    fn latest_never_synthesizes_below_min_known() {
        // Coverage [100,90] and [95,80]: min_known is 80, so nothing below
        // 80 may be invented even with limit to spare.
        let stores = vec![store_of(&[100, 90], 1), store_of(&[95, 80], 10)];
        let view = latest(
            &stores,
            &names(2),
            LatestQuery {
                limit: 1000,
                only_valid: false,
                since: 0,
            },
        );
        assert_eq!(view.last().unwrap().height, 80);
        assert!(view.iter().all(|b| b.height >= 80));
        // 21 entries: heights 100..=80, each exactly once.
        assert_eq!(view.len(), 21);
        let synthetic: Vec<u64> = view
            .iter()
            .filter(|b| b.is_synthetic())
            .map(|b| b.height)
            .collect();
        assert!(!synthetic.contains(&79));
        assert!(!synthetic.is_empty());
    }

    #[test]
    fn latest_deduplicates_cross_source_heights() {
        let stores = vec![store_of(&[100, 99], 1), store_of(&[100, 98], 10)];
        let view = latest(
            &stores,
            &names(2),
            LatestQuery {
                limit: 10,
                only_valid: false,
                since: 0,
            },
        );
        let heights: Vec<u64> = view.iter().map(|b| b.height).collect();
        assert_eq!(heights, vec![100, 99, 98]);
        // Height 100 belongs to the tie-break winner.
        assert_eq!(view[0].pool, "pool1");
    }

    #[test]
    fn latest_synthetic_counts_toward_limit() {
        let stores = vec![store_of(&[100], 1), store_of(&[90], 10)];
        let view = latest(
            &stores,
            &names(2),
            LatestQuery {
                limit: 4,
                only_valid: false,
                since: 0,
            },
        );
        let heights: Vec<u64> = view.iter().map(|b| b.height).collect();
        assert_eq!(heights, vec![100, 99, 98, 97]);
        assert!(view[1].is_synthetic());
    }

    #[test]
    fn latest_only_valid_skips_orphans() {
        let mut store = PoolStore::new();
        store.upsert(block(100, 1));
        let mut orphan = block(99, 2);
        orphan.valid = false;
        store.upsert(orphan);
        store.upsert(block(98, 3));
        store.resort();

        let view = latest(
            &[store],
            &names(1),
            LatestQuery {
                limit: 10,
                only_valid: true,
                since: 0,
            },
        );
        let heights: Vec<u64> = view.iter().map(|b| b.height).collect();
        // 99 is filtered out, then refilled as a synthetic entry since it sits
        // inside covered range.
        assert_eq!(heights, vec![100, 99, 98]);
        assert!(view[1].is_synthetic());
    }

    #[test]
    fn latest_since_filters_by_timestamp() {
        let stores = vec![store_of(&[100, 99, 98], 1)];
        let view = latest(
            &stores,
            &names(1),
            LatestQuery {
                limit: 10,
                only_valid: false,
                since: 1_700_000_000 + 99,
            },
        );
        let real: Vec<u64> = view
            .iter()
            .filter(|b| !b.is_synthetic())
            .map(|b| b.height)
            .collect();
        assert_eq!(real, vec![100, 99]);
    }

    #[test]
    fn ownership_percentages_sum_to_100() {
        let stores = vec![
            store_of(&[100, 99, 97], 1),
            store_of(&[98, 96], 10),
            store_of(&[95], 20),
        ];
        let slices = ownership(
            &stores,
            &names(3),
            OwnershipQuery {
                last_n: 6,
                since: 0,
                only_valid: false,
            },
        );
        let sum: f64 = slices.iter().map(|s| s.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);
        let total: u64 = slices.iter().map(|s| s.count).sum();
        assert_eq!(total, 6);
    }

    #[test]
    fn ownership_counts_unknown_bucket_in_count_window() {
        let stores = vec![store_of(&[100], 1), store_of(&[96], 10)];
        let slices = ownership(
            &stores,
            &names(2),
            OwnershipQuery {
                last_n: 5,
                since: 0,
                only_valid: false,
            },
        );
        // Heights 100, 99, 98, 97, 96: one each for the pools, three unknown.
        let unknown = slices.iter().find(|s| s.pool == UNKNOWN_POOL).unwrap();
        assert_eq!(unknown.count, 3);
        let sum: f64 = slices.iter().map(|s| s.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);
        // Sorted by count descending.
        for pair in slices.windows(2) {
            assert!(pair[0].count >= pair[1].count);
        }
    }

    #[test]
    fn ownership_window_stops_at_last_n() {
        let stores = vec![store_of(&[100, 99, 98, 97], 1)];
        let slices = ownership(
            &stores,
            &names(1),
            OwnershipQuery {
                last_n: 2,
                since: 0,
                only_valid: false,
            },
        );
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].count, 2);
    }

    #[test]
    fn ownership_time_window_disables_synthesis_and_ignores_last_n() {
        let stores = vec![store_of(&[100], 1), store_of(&[90], 10)];
        let slices = ownership(
            &stores,
            &names(2),
            OwnershipQuery {
                last_n: 1,
                since: 1,
                only_valid: false,
            },
        );
        // Both real blocks counted (last_n ignored), no Unknown bucket even
        // though heights 91..=99 are uncovered.
        assert_eq!(slices.len(), 2);
        assert!(slices.iter().all(|s| s.pool != UNKNOWN_POOL));
        assert!(slices.iter().all(|s| s.count == 1));
    }

    #[test]
    fn ownership_of_empty_stores_is_empty() {
        let slices = ownership(
            &[PoolStore::new(), PoolStore::new()],
            &names(2),
            OwnershipQuery {
                last_n: 100,
                since: 0,
                only_valid: false,
            },
        );
        assert!(slices.is_empty());
    }

    #[test]
    fn ownership_dedups_cross_source_heights() {
        let stores = vec![store_of(&[100, 99], 1), store_of(&[100], 10)];
        let slices = ownership(
            &stores,
            &names(2),
            OwnershipQuery {
                last_n: 10,
                since: 0,
                only_valid: false,
            },
        );
        let total: u64 = slices.iter().map(|s| s.count).sum();
        // Height 100 counted once, for the tie-break winner (pool1).
        assert_eq!(total, 2);
        assert_eq!(
            slices.iter().find(|s| s.pool == "pool1").unwrap().count,
            1
        );
    }
}

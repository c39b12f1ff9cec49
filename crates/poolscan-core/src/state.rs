//! Shared in-memory state.
//!
//! One [`SharedState`] owns every per-pool store for the life of the
//! process. Fetch orchestrators mutate it through [`SharedState::with_store`]
//! one page batch at a time; queries read it through
//! [`SharedState::read_view`], which holds the read lock for the whole merge
//! traversal so a query always observes one consistent snapshot even while
//! other pools are being refreshed.

use parking_lot::{RwLock, RwLockReadGuard};

use crate::block::Block;
use crate::merge::{self, LatestQuery, OwnershipQuery, OwnershipSlice, TimelineBlock};
use crate::store::PoolStore;

/// All per-pool stores plus the registered source names.
///
/// The name list is fixed at construction; its order is the store order and
/// therefore the merge tie-break order.
pub struct SharedState {
    names: Vec<String>,
    stores: RwLock<Vec<PoolStore>>,
}

/// A read-locked view over all stores, alive for one query.
pub struct StateView<'a> {
    names: &'a [String],
    guard: RwLockReadGuard<'a, Vec<PoolStore>>,
}

impl SharedState {
    /// Create empty stores for the given source names.
    pub fn new(names: Vec<String>) -> Self {
        let stores = names.iter().map(|_| PoolStore::new()).collect();
        Self {
            names,
            stores: RwLock::new(stores),
        }
    }

    /// Registered source names, in tie-break order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Index of a source name, if registered.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Run one mutation batch against a single store under the write lock.
    ///
    /// Callers must not perform I/O inside `f`; the lock is meant to be held
    /// only for the duration of applying one already-fetched page.
    pub fn with_store<R>(&self, index: usize, f: impl FnOnce(&mut PoolStore) -> R) -> R {
        let mut stores = self.stores.write();
        f(&mut stores[index])
    }

    /// Seed a store with already-normalized blocks (snapshot load).
    pub fn seed(&self, index: usize, blocks: Vec<Block>) {
        self.with_store(index, |store| {
            for block in blocks {
                store.upsert(block);
            }
            store.resort();
        });
    }

    /// Current top height of one store, used as the fetch stop boundary.
    pub fn top_height(&self, index: usize) -> Option<u64> {
        self.stores.read()[index].top_height()
    }

    /// Take the read lock for a full merge traversal.
    pub fn read_view(&self) -> StateView<'_> {
        StateView {
            names: &self.names,
            guard: self.stores.read(),
        }
    }
}

impl StateView<'_> {
    /// Full-timeline export (see [`merge::export`]).
    pub fn export(&self) -> Vec<TimelineBlock> {
        merge::export(&self.guard, self.names)
    }

    /// Bounded latest view (see [`merge::latest`]).
    pub fn latest(&self, query: LatestQuery) -> Vec<TimelineBlock> {
        merge::latest(&self.guard, self.names, query)
    }

    /// Ownership aggregation (see [`merge::ownership`]).
    pub fn ownership(&self, query: OwnershipQuery) -> Vec<OwnershipSlice> {
        merge::ownership(&self.guard, self.names, query)
    }

    /// Total number of stored blocks across all pools.
    pub fn total_blocks(&self) -> usize {
        self.guard.iter().map(PoolStore::len).sum()
    }
}

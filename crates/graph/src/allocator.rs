//! Node id allocation with reuse.
//!
//! Ids released by deletions go into a free pool and are handed out again in
//! ascending order before any new id is minted from the counter.

use std::collections::BTreeSet;
use topotrace_types::NodeId;
use tracing::trace;

/// Issues, releases and reserves unique positive node ids.
///
/// Every id in the free pool is strictly below `counter`, so the counter can
/// never mint an id that is also waiting in the pool.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    /// Released ids, smallest first.
    free: BTreeSet<u64>,
    /// Next id to mint when the pool is empty. Starts at 1.
    counter: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    /// Create an allocator whose first id is 1.
    pub fn new() -> Self {
        Self {
            free: BTreeSet::new(),
            counter: 1,
        }
    }

    /// Take the smallest free id, or mint the next one.
    pub fn next_id(&mut self) -> NodeId {
        if let Some(id) = self.free.pop_first() {
            trace!(id, "Reusing released id");
            return NodeId(id);
        }
        let id = self.counter;
        self.counter += 1;
        NodeId(id)
    }

    /// Return an id to the free pool.
    ///
    /// Id 0 is never valid and is ignored. Releasing an id the counter has not
    /// reached yet advances the counter past it.
    pub fn release_id(&mut self, id: NodeId) {
        if id.0 == 0 {
            return;
        }
        if id.0 >= self.counter {
            self.counter = id.0 + 1;
        }
        self.free.insert(id.0);
    }

    /// Claim a specific id.
    ///
    /// Succeeds if the id is waiting in the free pool or has never been
    /// minted. Returns `false` when the id is currently in use.
    pub fn reserve_id(&mut self, id: NodeId) -> bool {
        if id.0 == 0 {
            return false;
        }
        if self.free.remove(&id.0) {
            return true;
        }
        if id.0 >= self.counter {
            self.counter = id.0 + 1;
            return true;
        }
        false
    }

    /// The id the counter would mint next.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Whether `id` is waiting in the free pool.
    pub fn is_free(&self, id: NodeId) -> bool {
        self.free.contains(&id.0)
    }

    /// Number of ids waiting in the free pool.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }
}

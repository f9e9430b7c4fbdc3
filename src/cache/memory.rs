//! In-memory image cache with LRU eviction.

use crate::cache::key::CacheKey;
use crate::imaging::DecodedImage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::debug;

/// Entry in the memory cache.
struct MemoryEntry {
    /// Decoded image, shared with callers
    image: Arc<DecodedImage>,
    /// Decoded size in bytes
    cost: usize,
    /// Last access time for LRU eviction
    last_accessed: Instant,
}

impl MemoryEntry {
    fn new(image: Arc<DecodedImage>, cost: usize) -> Self {
        Self {
            image,
            cost,
            last_accessed: Instant::now(),
        }
    }

    /// Update access time.
    fn touch(&mut self) {
        self.last_accessed = Instant::now();
    }
}

/// Mutable cache state guarded by a single lock so the size bookkeeping
/// can never drift from the entry map.
struct MemoryState {
    entries: HashMap<CacheKey, MemoryEntry>,
    total_cost: usize,
}

/// Bounded in-memory cache of decoded images.
///
/// Bounded both by entry count and by total decoded byte cost; exceeding
/// either bound evicts least-recently-used entries first. Safe for
/// concurrent use from arbitrary call sites.
pub struct MemoryCache {
    state: Mutex<MemoryState>,
    max_entries: usize,
    max_cost_bytes: usize,
}

impl MemoryCache {
    /// Create a new memory cache with the given bounds.
    pub fn new(max_entries: usize, max_cost_bytes: usize) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                entries: HashMap::new(),
                total_cost: 0,
            }),
            max_entries,
            max_cost_bytes,
        }
    }

    /// Get a cached image, marking it as recently used.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<DecodedImage>> {
        let mut state = self.state.lock().unwrap();
        let entry = state.entries.get_mut(key)?;
        entry.touch();
        Some(entry.image.clone())
    }

    /// Insert an image, evicting LRU entries if a bound is exceeded.
    ///
    /// Replacing an existing key updates the cost accounting; the insert
    /// itself never fails. If a single image is larger than the cost bound
    /// it is kept alone (everything else is evicted around it).
    pub fn set(&self, key: CacheKey, image: Arc<DecodedImage>, cost: usize) {
        let mut state = self.state.lock().unwrap();

        if let Some(old) = state.entries.insert(key, MemoryEntry::new(image, cost)) {
            state.total_cost -= old.cost;
        }
        state.total_cost += cost;

        self.evict_lru(&mut state);
    }

    /// Remove an entry if present.
    pub fn remove(&self, key: &CacheKey) {
        let mut state = self.state.lock().unwrap();
        if let Some(entry) = state.entries.remove(key) {
            state.total_cost -= entry.cost;
        }
    }

    /// Check whether a key is cached.
    pub fn contains(&self, key: &CacheKey) -> bool {
        let state = self.state.lock().unwrap();
        state.entries.contains_key(key)
    }

    /// Number of cached entries.
    pub fn entry_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.entries.len()
    }

    /// Total decoded cost of cached entries in bytes.
    pub fn total_cost(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.total_cost
    }

    /// Maximum entry count bound.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Maximum cost bound in bytes.
    pub fn max_cost_bytes(&self) -> usize {
        self.max_cost_bytes
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        let dropped = state.entries.len();
        state.entries.clear();
        state.total_cost = 0;
        if dropped > 0 {
            debug!("Memory cache cleared: dropped {} entries", dropped);
        }
    }

    /// Evict least-recently-used entries until both bounds are respected.
    ///
    /// Never evicts down to zero entries: a single over-cost image stays
    /// resident so callers that just stored it can still read it back.
    fn evict_lru(&self, state: &mut MemoryState) {
        let mut evicted = 0usize;

        while state.entries.len() > 1
            && (state.entries.len() > self.max_entries || state.total_cost > self.max_cost_bytes)
        {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed)
                .map(|(key, _)| key.clone());

            let Some(key) = oldest else { break };
            if let Some(entry) = state.entries.remove(&key) {
                state.total_cost -= entry.cost;
                evicted += 1;
            }
        }

        if evicted > 0 {
            debug!(
                "Memory cache eviction: removed {} entries, {} remain ({} bytes)",
                evicted,
                state.entries.len(),
                state.total_cost
            );
        }
    }
}

//! Two-tier image cache facade.
//!
//! Coordinates the memory and disk tiers behind the single entry point UI
//! code calls. Constructed explicitly at the application's composition
//! root and injected into every consumer; the host shell drives cache
//! maintenance through the lifecycle methods ([`ImageCache::on_low_memory`],
//! [`ImageCache::on_background`], [`ImageCache::on_terminate`]).

use crate::cache::disk::DiskStore;
use crate::cache::key::CacheKey;
use crate::cache::memory::MemoryCache;
use crate::cache::types::CacheConfig;
use crate::imaging::DecodedImage;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Two-tier (memory + disk) image cache.
///
/// Lookup strategy:
/// 1. Memory tier (fast path, no I/O)
/// 2. Disk tier: read, decode, refresh freshness, promote to memory
/// 3. Miss - the cache never fetches from the network itself
///
/// All cache-layer failures degrade silently to misses or no-ops; the
/// cache is best effort, never a source of truth.
pub struct ImageCache {
    /// Memory tier (volatile)
    memory: MemoryCache,
    /// Disk tier (persists across restarts)
    disk: DiskStore,
    /// Disk expiration age used by the background sweep
    max_age: Duration,
}

impl ImageCache {
    /// Create a cache from the given configuration.
    ///
    /// Creates the disk directory if missing and runs an initial
    /// expiration sweep, mirroring a fresh process start.
    pub fn new(config: CacheConfig) -> Self {
        let memory = MemoryCache::new(config.memory.max_entries, config.memory.max_cost_bytes);
        let disk = DiskStore::new(config.disk.cache_dir.clone());

        // Expired entries from previous sessions go before first use.
        disk.sweep_expired(config.disk.max_age);

        info!(
            "Image cache ready: {} entries / {} bytes in memory, disk at {}",
            config.memory.max_entries,
            config.memory.max_cost_bytes,
            config.disk.cache_dir.display()
        );

        Self {
            memory,
            disk,
            max_age: config.disk.max_age,
        }
    }

    /// Look up the image for a locator.
    ///
    /// Memory hit returns without touching the disk. A disk hit decodes
    /// the stored bytes, refreshes the entry's freshness marker, and
    /// promotes the image to the memory tier. Bytes that no longer decode
    /// are treated as a miss and the corrupt entry is deleted so the next
    /// load goes back to the network instead of failing again.
    pub fn image(&self, locator: &str) -> Option<Arc<DecodedImage>> {
        let key = CacheKey::derive(locator);

        if let Some(image) = self.memory.get(&key) {
            return Some(image);
        }

        let bytes = self.disk.read(&key)?;
        match DecodedImage::decode(&bytes) {
            Ok(image) => {
                let image = Arc::new(image);
                let cost = image.byte_size();
                self.memory.set(key, image.clone(), cost);
                Some(image)
            }
            Err(e) => {
                debug!("Corrupt cache entry {key}: {e}, removing");
                self.disk.remove(&key);
                None
            }
        }
    }

    /// Store an image in both tiers.
    ///
    /// The memory write is synchronous, so a lookup for the same locator
    /// immediately afterwards observes a hit. The disk copy is the JPEG
    /// re-encoding; if encoding or the write fails only the memory copy
    /// remains, which is fine for the process lifetime.
    pub fn store_image(&self, image: Arc<DecodedImage>, locator: &str) {
        let key = CacheKey::derive(locator);
        let cost = image.byte_size();
        self.memory.set(key.clone(), image.clone(), cost);

        match image.to_jpeg() {
            Ok(bytes) => self.disk.write(&key, &bytes),
            Err(e) => debug!("Skipping disk write for {key}: {e}"),
        }
    }

    /// Remove the entry for a locator from both tiers.
    pub fn remove_image(&self, locator: &str) {
        let key = CacheKey::derive(locator);
        self.memory.remove(&key);
        self.disk.remove(&key);
    }

    /// Clear both tiers.
    pub fn clear_all(&self) {
        self.memory.clear();
        self.disk.clear();
    }

    /// Host signal: the OS reported memory pressure.
    ///
    /// Drops the memory tier; the disk tier is untouched, so previously
    /// stored images remain reachable through the disk path.
    pub fn on_low_memory(&self) {
        debug!("Low-memory signal: clearing memory tier");
        self.memory.clear();
    }

    /// Host signal: the application entered the background.
    ///
    /// Runs the disk expiration sweep.
    pub fn on_background(&self) {
        self.disk.sweep_expired(self.max_age);
    }

    /// Host signal: the application is about to terminate.
    ///
    /// Drops the memory tier; disk entries outlive the process by design.
    pub fn on_terminate(&self) {
        self.memory.clear();
    }

    /// Number of entries in the memory tier.
    pub fn memory_entry_count(&self) -> usize {
        self.memory.entry_count()
    }

    /// Number of entries in the disk tier.
    pub fn disk_entry_count(&self) -> usize {
        self.disk.entry_count()
    }
}

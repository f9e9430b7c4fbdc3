//! Cache configuration types.

use std::path::PathBuf;
use std::time::Duration;

/// Directory name for the disk cache under the platform cache location.
pub const CACHE_DIR_NAME: &str = "ImageCache";

/// Memory cache configuration.
#[derive(Debug, Clone)]
pub struct MemoryCacheConfig {
    /// Maximum number of images kept in memory (default: 100)
    pub max_entries: usize,
    /// Maximum total decoded size in bytes (default: 50 MB)
    pub max_cost_bytes: usize,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 100,
            max_cost_bytes: 50 * 1024 * 1024, // 50 MB
        }
    }
}

/// Disk cache configuration.
#[derive(Debug, Clone)]
pub struct DiskCacheConfig {
    /// Directory holding the cached image files
    pub cache_dir: PathBuf,
    /// Entries older than this are removed by the expiration sweep
    /// (default: 7 days)
    pub max_age: Duration,
}

impl Default for DiskCacheConfig {
    fn default() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CACHE_DIR_NAME);

        Self {
            cache_dir,
            max_age: Duration::from_secs(7 * 24 * 60 * 60), // 1 week
        }
    }
}

/// Complete cache configuration.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Memory tier configuration
    pub memory: MemoryCacheConfig,
    /// Disk tier configuration
    pub disk: DiskCacheConfig,
}

impl CacheConfig {
    /// Create a configuration with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of in-memory entries.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.memory.max_entries = max_entries;
        self
    }

    /// Set the in-memory cost limit in bytes.
    pub fn with_max_cost(mut self, max_cost_bytes: usize) -> Self {
        self.memory.max_cost_bytes = max_cost_bytes;
        self
    }

    /// Set the disk cache directory.
    pub fn with_cache_dir(mut self, dir: PathBuf) -> Self {
        self.disk.cache_dir = dir;
        self
    }

    /// Set the disk expiration age.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.disk.max_age = max_age;
        self
    }
}

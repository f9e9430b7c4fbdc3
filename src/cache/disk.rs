//! Disk image cache with age-based expiration.
//!
//! Stores encoded image bytes in a single flat directory, one file per
//! cache key. File modification time is the freshness marker: it is
//! refreshed on every successful read, so the expiration sweep behaves
//! like LRU-by-calendar-time rather than a pure write-time TTL.
//!
//! The disk tier is an optimization layer, not a source of truth: every
//! I/O failure degrades to a cache miss or a no-op and is only logged.

use crate::cache::key::CacheKey;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Persistent image store keyed by sanitized cache keys.
pub struct DiskStore {
    /// Flat directory holding one file per key
    dir: PathBuf,
}

impl DiskStore {
    /// Create a disk store rooted at `dir`, creating the directory if
    /// missing.
    ///
    /// Creation failure is swallowed: the store stays usable and every
    /// operation degrades to a miss/no-op for the session.
    pub fn new(dir: PathBuf) -> Self {
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!(
                "Failed to create cache directory {}: {} (disk tier disabled for this session)",
                dir.display(),
                e
            );
        }
        Self { dir }
    }

    /// Read the bytes stored under `key`, refreshing its freshness marker.
    ///
    /// Any I/O error reads as `None`.
    pub fn read(&self, key: &CacheKey) -> Option<Vec<u8>> {
        let path = self.path_for(key);
        let bytes = fs::read(&path).ok()?;
        touch(&path);
        Some(bytes)
    }

    /// Write `bytes` under `key`, overwriting any existing entry.
    ///
    /// The full payload is in memory before the write starts, so a failed
    /// or interrupted write never leaves a partial file behind a
    /// successful return. Errors are swallowed; the caller keeps its
    /// in-memory copy either way.
    pub fn write(&self, key: &CacheKey, bytes: &[u8]) {
        let path = self.path_for(key);
        if let Err(e) = fs::write(&path, bytes) {
            warn!("Failed to write cache file {}: {}", path.display(), e);
        }
    }

    /// Delete the entry for `key` if present.
    pub fn remove(&self, key: &CacheKey) {
        let _ = fs::remove_file(self.path_for(key));
    }

    /// Delete every entry whose modification time is older than
    /// `now - max_age`.
    pub fn sweep_expired(&self, max_age: Duration) {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return;
        };

        let Some(threshold) = SystemTime::now().checked_sub(max_age) else {
            return;
        };

        let mut removed = 0usize;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            let Ok(modified) = metadata.modified() else {
                continue;
            };

            if modified < threshold && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }

        if removed > 0 {
            debug!("Disk cache sweep: removed {} expired entries", removed);
        }
    }

    /// Delete and recreate the cache directory.
    pub fn clear(&self) {
        if let Err(e) = fs::remove_dir_all(&self.dir) {
            warn!("Failed to clear cache directory {}: {}", self.dir.display(), e);
        }
        if let Err(e) = fs::create_dir_all(&self.dir) {
            warn!(
                "Failed to recreate cache directory {}: {}",
                self.dir.display(),
                e
            );
        }
    }

    /// Number of entries currently on disk.
    pub fn entry_count(&self) -> usize {
        fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .flatten()
                    .filter(|entry| entry.path().is_file())
                    .count()
            })
            .unwrap_or(0)
    }

    /// Whether an entry for `key` exists on disk.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.path_for(key).is_file()
    }

    /// File path for a key.
    fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.as_str())
    }
}

/// Refresh a file's modification time to now.
///
/// Best effort: a file that cannot be re-opened keeps its old timestamp
/// and simply expires earlier.
fn touch(path: &Path) {
    let Ok(file) = File::options().write(true).open(path) else {
        return;
    };
    let _ = file.set_modified(SystemTime::now());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::TempDir;

    fn create_store() -> (DiskStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = DiskStore::new(temp.path().to_path_buf());
        (store, temp)
    }

    fn test_key(n: u32) -> CacheKey {
        CacheKey::derive(&format!("https://example.com/photos/{n}.jpg"))
    }

    #[test]
    fn test_write_and_read() {
        let (store, _temp) = create_store();
        let key = test_key(1);

        store.write(&key, &[1, 2, 3, 4, 5]);
        assert_eq!(store.read(&key), Some(vec![1, 2, 3, 4, 5]));
    }

    #[test]
    fn test_read_miss() {
        let (store, _temp) = create_store();
        assert_eq!(store.read(&test_key(1)), None);
    }

    #[test]
    fn test_write_overwrites() {
        let (store, _temp) = create_store();
        let key = test_key(1);

        store.write(&key, &[1, 2, 3]);
        store.write(&key, &[9, 9]);
        assert_eq!(store.read(&key), Some(vec![9, 9]));
        assert_eq!(store.entry_count(), 1);
    }

    #[test]
    fn test_remove() {
        let (store, _temp) = create_store();
        let key = test_key(1);

        store.write(&key, &[1, 2, 3]);
        assert!(store.contains(&key));

        store.remove(&key);
        assert!(!store.contains(&key));
        assert_eq!(store.read(&key), None);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let (store, _temp) = create_store();
        store.remove(&test_key(1));
    }

    #[test]
    fn test_clear_recreates_directory() {
        let (store, temp) = create_store();
        store.write(&test_key(1), &[1]);
        store.write(&test_key(2), &[2]);

        store.clear();
        assert_eq!(store.entry_count(), 0);
        assert!(temp.path().is_dir());

        // Still usable after clearing.
        store.write(&test_key(3), &[3]);
        assert_eq!(store.read(&test_key(3)), Some(vec![3]));
    }

    #[test]
    fn test_persistence_across_instances() {
        let temp = TempDir::new().unwrap();
        let key = test_key(1);

        {
            let store = DiskStore::new(temp.path().to_path_buf());
            store.write(&key, &[1, 2, 3]);
        }

        let store = DiskStore::new(temp.path().to_path_buf());
        assert_eq!(store.read(&key), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_sweep_removes_stale_entries() {
        let (store, _temp) = create_store();
        let key = test_key(1);

        store.write(&key, &[1, 2, 3]);
        thread::sleep(Duration::from_millis(50));

        // Everything written more than 10ms ago is stale.
        store.sweep_expired(Duration::from_millis(10));
        assert!(!store.contains(&key));
    }

    #[test]
    fn test_sweep_keeps_fresh_entries() {
        let (store, _temp) = create_store();
        let key = test_key(1);

        store.write(&key, &[1, 2, 3]);
        store.sweep_expired(Duration::from_secs(3600));
        assert!(store.contains(&key));
    }

    #[test]
    fn test_read_refreshes_freshness_marker() {
        let (store, _temp) = create_store();
        let key = test_key(1);

        store.write(&key, &[1, 2, 3]);
        thread::sleep(Duration::from_millis(80));

        // Reading refreshes the modification time, so an entry written
        // long ago but read recently survives the sweep.
        assert!(store.read(&key).is_some());
        store.sweep_expired(Duration::from_millis(50));
        assert!(store.contains(&key));
    }

    #[test]
    fn test_sweep_with_missing_directory_is_noop() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("never-created");
        let store = DiskStore { dir };
        store.sweep_expired(Duration::from_secs(1));
    }

    #[test]
    fn test_unwritable_directory_degrades_to_miss() {
        let temp = TempDir::new().unwrap();
        // A file where the directory should be makes creation fail.
        let blocked = temp.path().join("blocked");
        fs::write(&blocked, b"not a directory").unwrap();

        let store = DiskStore::new(blocked);
        let key = test_key(1);
        store.write(&key, &[1, 2, 3]);
        assert_eq!(store.read(&key), None);
    }
}

//! Single-flight coalescing of image fetches.
//!
//! When multiple loaders ask for the same locator at the same time, only
//! one network fetch runs. The first loader to register becomes the
//! leader and performs the fetch; every other loader becomes a follower
//! and waits on a broadcast of the leader's outcome.
//!
//! If the leader is cancelled it abandons its registration: the channel
//! closes without a result and followers re-register, one of them taking
//! over as the new leader. Followers are never failed by someone else's
//! cancellation.

use crate::cache::CacheKey;
use crate::loader::{FetchOutcome, LoadError};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

/// Outcome of registering a fetch with the coalescer.
pub enum Registration {
    /// First request for this key: the caller performs the fetch and must
    /// finish with [`FetchCoalescer::complete`] or
    /// [`FetchCoalescer::abandon`].
    Leader,
    /// A fetch for this key is already in flight: wait on the receiver.
    Follower(broadcast::Receiver<FetchOutcome>),
}

/// Statistics for monitoring coalescing effectiveness.
#[derive(Debug, Default, Clone)]
pub struct CoalescerStats {
    /// Total registrations received
    pub total_requests: u64,
    /// Registrations that joined an in-flight fetch
    pub coalesced_requests: u64,
    /// Registrations that started a new fetch
    pub new_requests: u64,
}

/// Pending-fetch registry keyed by cache key.
///
/// Uses `DashMap` for lock-free concurrent registration and a one-shot
/// `broadcast` channel per in-flight fetch to fan the outcome out to
/// every waiter.
pub struct FetchCoalescer {
    /// In-flight fetches: key -> broadcast sender for the outcome
    in_flight: DashMap<CacheKey, broadcast::Sender<FetchOutcome>>,
    total_requests: AtomicU64,
    coalesced_requests: AtomicU64,
    new_requests: AtomicU64,
}

impl FetchCoalescer {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            in_flight: DashMap::new(),
            total_requests: AtomicU64::new(0),
            coalesced_requests: AtomicU64::new(0),
            new_requests: AtomicU64::new(0),
        }
    }

    /// Register interest in fetching `key`.
    ///
    /// The entry API makes check-and-insert atomic, so exactly one caller
    /// becomes the leader even under concurrent registration.
    pub fn register(&self, key: &CacheKey) -> Registration {
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        match self.in_flight.entry(key.clone()) {
            dashmap::mapref::entry::Entry::Occupied(entry) => {
                self.coalesced_requests.fetch_add(1, Ordering::Relaxed);
                debug!("Coalescing fetch for {key}: joining in-flight request");
                Registration::Follower(entry.get().subscribe())
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                // Capacity 1: the channel only ever carries the single
                // terminal outcome.
                let (tx, _rx) = broadcast::channel(1);
                entry.insert(tx);
                self.new_requests.fetch_add(1, Ordering::Relaxed);
                Registration::Leader
            }
        }
    }

    /// Publish the leader's outcome and release the registration.
    pub fn complete(&self, key: &CacheKey, outcome: FetchOutcome) {
        if let Some((_, tx)) = self.in_flight.remove(key) {
            // No receivers is fine: the leader had no followers.
            let _ = tx.send(outcome);
        }
    }

    /// Release a registration without an outcome (leader cancelled).
    ///
    /// Dropping the sender closes the channel; followers observe the
    /// closure and re-register.
    pub fn abandon(&self, key: &CacheKey) {
        self.in_flight.remove(key);
    }

    /// Number of fetches currently in flight.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Snapshot of the coalescing counters.
    pub fn stats(&self) -> CoalescerStats {
        CoalescerStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            coalesced_requests: self.coalesced_requests.load(Ordering::Relaxed),
            new_requests: self.new_requests.load(Ordering::Relaxed),
        }
    }
}

impl Default for FetchCoalescer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::DecodedImage;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::sync::Arc;

    fn test_key() -> CacheKey {
        CacheKey::derive("https://example.com/photos/1.jpg")
    }

    fn test_outcome() -> FetchOutcome {
        let img = RgbImage::from_pixel(2, 2, Rgb([1, 2, 3]));
        FetchOutcome::Fetched(Arc::new(DecodedImage::from_dynamic(DynamicImage::ImageRgb8(
            img,
        ))))
    }

    #[test]
    fn test_first_registration_is_leader() {
        let coalescer = FetchCoalescer::new();
        assert!(matches!(coalescer.register(&test_key()), Registration::Leader));
        assert_eq!(coalescer.in_flight_count(), 1);
    }

    #[test]
    fn test_second_registration_is_follower() {
        let coalescer = FetchCoalescer::new();
        let key = test_key();

        assert!(matches!(coalescer.register(&key), Registration::Leader));
        assert!(matches!(coalescer.register(&key), Registration::Follower(_)));

        let stats = coalescer.stats();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.new_requests, 1);
        assert_eq!(stats.coalesced_requests, 1);
    }

    #[test]
    fn test_distinct_keys_do_not_coalesce() {
        let coalescer = FetchCoalescer::new();
        let other = CacheKey::derive("https://example.com/photos/2.jpg");

        assert!(matches!(coalescer.register(&test_key()), Registration::Leader));
        assert!(matches!(coalescer.register(&other), Registration::Leader));
        assert_eq!(coalescer.in_flight_count(), 2);
    }

    #[tokio::test]
    async fn test_followers_receive_the_outcome() {
        let coalescer = FetchCoalescer::new();
        let key = test_key();

        let Registration::Leader = coalescer.register(&key) else {
            panic!("expected leader");
        };
        let Registration::Follower(mut rx) = coalescer.register(&key) else {
            panic!("expected follower");
        };

        coalescer.complete(&key, test_outcome());

        match rx.recv().await {
            Ok(FetchOutcome::Fetched(image)) => assert_eq!(image.width(), 2),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(coalescer.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn test_abandon_closes_channel_without_outcome() {
        let coalescer = FetchCoalescer::new();
        let key = test_key();

        let Registration::Leader = coalescer.register(&key) else {
            panic!("expected leader");
        };
        let Registration::Follower(mut rx) = coalescer.register(&key) else {
            panic!("expected follower");
        };

        coalescer.abandon(&key);

        assert!(rx.recv().await.is_err());
        // The key is free again: the next registration leads.
        assert!(matches!(coalescer.register(&key), Registration::Leader));
    }

    #[test]
    fn test_complete_after_abandon_is_noop() {
        let coalescer = FetchCoalescer::new();
        let key = test_key();

        let Registration::Leader = coalescer.register(&key) else {
            panic!("expected leader");
        };
        coalescer.abandon(&key);
        coalescer.complete(&key, FetchOutcome::Failed(LoadError::NoLocator));
        assert_eq!(coalescer.in_flight_count(), 0);
    }
}

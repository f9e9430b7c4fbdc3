//! Asynchronous image loading.
//!
//! An [`ImageLoader`] is a per-request object bound to one locator. It
//! checks the injected [`ImageCache`] synchronously, fetches over HTTP on
//! a miss, decodes, populates both cache tiers, and publishes its state
//! machine (`Idle -> Loading -> {Loaded, Failed}`) through a watch
//! channel for the observing caller.
//!
//! Concurrent loaders for the same locator share one underlying fetch
//! through the [`FetchCoalescer`].

mod coalesce;

pub use coalesce::{CoalescerStats, FetchCoalescer, Registration};

use crate::cache::{CacheKey, ImageCache};
use crate::http::{AsyncHttpClient, HttpError};
use crate::imaging::DecodedImage;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Errors surfaced to the loader's observer.
///
/// Cache-layer failures never appear here; the cache degrades silently.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LoadError {
    /// The loader was constructed without a locator
    #[error("No locator supplied")]
    NoLocator,

    /// The network fetch failed
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The fetched bytes were not a decodable image
    #[error("Failed to decode image: {0}")]
    Decode(String),
}

/// Observable loader state.
#[derive(Debug, Clone)]
pub enum LoadState {
    /// No load in progress
    Idle,
    /// A fetch is in flight
    Loading,
    /// The image is available
    Loaded(Arc<DecodedImage>),
    /// The load failed; no automatic retry
    Failed(LoadError),
}

impl LoadState {
    /// Whether this is a terminal state (`Loaded` or `Failed`).
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadState::Loaded(_) | LoadState::Failed(_))
    }
}

/// Terminal outcome of a (possibly shared) fetch.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Fetched and decoded; both cache tiers are populated
    Fetched(Arc<DecodedImage>),
    /// Fetch or decode failed
    Failed(LoadError),
}

/// Per-request image loader.
///
/// The cache, HTTP client, and coalescer are injected by the composition
/// root and shared between loaders; each loader owns only its locator,
/// its published state, and its cancellation handle.
pub struct ImageLoader<C: AsyncHttpClient + Clone + 'static> {
    locator: Option<String>,
    cache: Arc<ImageCache>,
    client: C,
    coalescer: Arc<FetchCoalescer>,
    state: Arc<watch::Sender<LoadState>>,
    /// Replaced with a fresh token on every `load`, so a cancelled loader
    /// can be loaded again.
    cancel: Mutex<CancellationToken>,
}

impl<C: AsyncHttpClient + Clone + 'static> ImageLoader<C> {
    /// Create a loader for an optional locator. No work starts until
    /// [`load`](Self::load) is called.
    pub fn new(
        locator: Option<&str>,
        cache: Arc<ImageCache>,
        client: C,
        coalescer: Arc<FetchCoalescer>,
    ) -> Self {
        let (state, _) = watch::channel(LoadState::Idle);
        Self {
            locator: locator.map(str::to_owned),
            cache,
            client,
            coalescer,
            state: Arc::new(state),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// The locator this loader is bound to.
    pub fn locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.state.subscribe()
    }

    /// Current state snapshot.
    pub fn state(&self) -> LoadState {
        self.state.borrow().clone()
    }

    /// Start loading.
    ///
    /// The cache check is synchronous: a hit transitions straight to
    /// `Loaded` with no network access and no async gap. On a miss the
    /// fetch runs on the Tokio runtime this is called from.
    pub fn load(&self) {
        if matches!(self.state(), LoadState::Loading) {
            return;
        }

        let Some(locator) = self.locator.clone() else {
            self.state.send_replace(LoadState::Failed(LoadError::NoLocator));
            return;
        };

        if let Some(image) = self.cache.image(&locator) {
            self.state.send_replace(LoadState::Loaded(image));
            return;
        }

        let cancel = {
            let mut guard = self.cancel.lock().unwrap();
            *guard = CancellationToken::new();
            guard.clone()
        };

        self.state.send_replace(LoadState::Loading);

        let cache = self.cache.clone();
        let client = self.client.clone();
        let coalescer = self.coalescer.clone();
        let state = self.state.clone();
        tokio::spawn(async move {
            match run_fetch(&cache, &client, &coalescer, &locator, &cancel).await {
                Some(FetchOutcome::Fetched(image)) => {
                    state.send_replace(LoadState::Loaded(image));
                }
                Some(FetchOutcome::Failed(error)) => {
                    state.send_replace(LoadState::Failed(error));
                }
                // Cancelled: nothing was stored, drop back to Idle.
                None => {
                    state.send_replace(LoadState::Idle);
                }
            }
        });
    }

    /// Abort any in-flight fetch and discard its pending result.
    ///
    /// Safe to call from any state. A cancelled fetch never leaves a
    /// half-populated cache entry: the store only happens after a full,
    /// successful decode.
    pub fn cancel(&self) {
        self.cancel.lock().unwrap().cancel();
    }
}

impl<C: AsyncHttpClient + Clone + 'static> Drop for ImageLoader<C> {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Drive one coalesced fetch to a terminal outcome.
///
/// Returns `None` when cancelled. Loops because a follower whose leader
/// abandoned the fetch re-registers and may become the new leader.
async fn run_fetch<C: AsyncHttpClient>(
    cache: &ImageCache,
    client: &C,
    coalescer: &FetchCoalescer,
    locator: &str,
    cancel: &CancellationToken,
) -> Option<FetchOutcome> {
    let key = CacheKey::derive(locator);

    loop {
        match coalescer.register(&key) {
            Registration::Leader => {
                let result = tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Fetch cancelled for {key}");
                        coalescer.abandon(&key);
                        return None;
                    }
                    result = client.get(locator) => result,
                };

                let outcome = match result {
                    Ok(bytes) => match DecodedImage::decode(&bytes) {
                        Ok(image) => {
                            let image = Arc::new(image);
                            if cancel.is_cancelled() {
                                coalescer.abandon(&key);
                                return None;
                            }
                            cache.store_image(image.clone(), locator);
                            FetchOutcome::Fetched(image)
                        }
                        Err(e) => FetchOutcome::Failed(LoadError::Decode(e.to_string())),
                    },
                    Err(e) => FetchOutcome::Failed(LoadError::Http(e)),
                };

                coalescer.complete(&key, outcome.clone());
                return Some(outcome);
            }
            Registration::Follower(mut rx) => {
                tokio::select! {
                    _ = cancel.cancelled() => return None,
                    received = rx.recv() => match received {
                        Ok(outcome) => return Some(outcome),
                        // Leader abandoned without an outcome; take over.
                        Err(_) => continue,
                    },
                }
            }
        }
    }
}

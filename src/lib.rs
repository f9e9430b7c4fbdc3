//! Forkful - core library for a recipe-browsing application.
//!
//! This library provides the non-UI parts of the app: a recipe feed client
//! (fetch, decode, validate), a two-tier image cache (memory + disk), and an
//! asynchronous image loader with cancellation and request coalescing.
//!
//! # High-Level API
//!
//! ```ignore
//! use forkful::cache::{CacheConfig, ImageCache};
//! use forkful::http::ReqwestClient;
//! use forkful::loader::{FetchCoalescer, ImageLoader};
//! use std::sync::Arc;
//!
//! // Composition root: construct the cache once and inject it everywhere.
//! let cache = Arc::new(ImageCache::new(CacheConfig::default()));
//! let coalescer = Arc::new(FetchCoalescer::new());
//! let client = ReqwestClient::new()?;
//!
//! let loader = ImageLoader::new(
//!     Some("https://example.com/photos/pasta.jpg"),
//!     cache.clone(),
//!     client.clone(),
//!     coalescer.clone(),
//! );
//! loader.load();
//! ```

pub mod cache;
pub mod http;
pub mod imaging;
pub mod loader;
pub mod recipe;

/// Version of the forkful library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Cache key derivation.

use std::fmt;

/// Characters substituted when deriving a key from a locator.
///
/// These are the URL characters that are unsafe in file names; the derived
/// key doubles as the disk-cache file name.
const RESERVED: [char; 5] = ['/', ':', '?', '&', '='];

/// Cache key uniquely identifying a cached image.
///
/// Derived deterministically from the image locator (its URL string), so the
/// same locator maps to the same key within a process and across restarts.
/// Distinct locators that differ only in reserved characters can collide;
/// a collision overwrites the existing entry rather than corrupting it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive a key from a locator string.
    ///
    /// Pure and infallible: each of `/`, `:`, `?`, `&`, `=` is replaced
    /// with `_`; all other characters pass through unchanged.
    pub fn derive(locator: &str) -> Self {
        let sanitized = locator
            .chars()
            .map(|c| if RESERVED.contains(&c) { '_' } else { c })
            .collect();
        Self(sanitized)
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

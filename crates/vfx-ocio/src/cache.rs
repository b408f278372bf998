//! Thread-safe processor caching.
//!
//! Every [`Config`](crate::Config) owns one cache keyed on the
//! (source, destination) pair. The cache can be switched off, which skips
//! both lookup and insertion; probing code does this to keep throwaway
//! processors out of it.
//!
//! ```
//! use vfx_ocio::{builtin, ProcessorCache};
//!
//! let config = builtin::reference();
//! let cache = ProcessorCache::new();
//!
//! let p = cache.get_or_create("ACEScg", "ACES2065-1", || config.processor("ACEScg", "ACES2065-1"))?;
//! assert_eq!(cache.len(), 1);
//! assert!(!p.is_empty());
//! # Ok::<(), vfx_ocio::OcioError>(())
//! ```

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::OcioResult;
use crate::processor::{Processor, ProcessorOp};

/// Cache key for processor lookup.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct CacheKey {
    src: String,
    dst: String,
}

impl CacheKey {
    fn new(src: &str, dst: &str) -> Self {
        Self {
            src: src.to_ascii_lowercase(),
            dst: dst.to_ascii_lowercase(),
        }
    }
}

/// Thread-safe processor cache.
#[derive(Debug)]
pub struct ProcessorCache {
    cache: RwLock<HashMap<CacheKey, Vec<ProcessorOp>>>,
    enabled: AtomicBool,
}

impl Default for ProcessorCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ProcessorCache {
    /// Clones the enabled flag only; cached entries stay with the original.
    fn clone(&self) -> Self {
        let cache = Self::new();
        cache.set_enabled(self.is_enabled());
        cache
    }
}

impl ProcessorCache {
    /// Create an empty, enabled cache.
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            enabled: AtomicBool::new(true),
        }
    }

    /// Whether lookups and insertions happen.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Switches the cache on or off. Switching off does not drop entries.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Returns the cached processor for `src -> dst`, or builds it with
    /// `create` and caches the result.
    pub fn get_or_create<F>(&self, src: &str, dst: &str, create: F) -> OcioResult<Processor>
    where
        F: FnOnce() -> OcioResult<Processor>,
    {
        if !self.is_enabled() {
            return create();
        }
        let key = CacheKey::new(src, dst);

        if let Ok(cache) = self.cache.read() {
            if let Some(ops) = cache.get(&key) {
                return Ok(Processor::from_ops(ops.clone()));
            }
        }

        let processor = create()?;

        // A poisoned lock only costs us the insertion.
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key, processor.ops().to_vec());
        }
        Ok(processor)
    }

    /// Clear all cached processors.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    /// Number of cached processors.
    pub fn len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

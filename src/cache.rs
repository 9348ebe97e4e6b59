//! In-memory memoization, keyed by argument hash.
//!
//! A classic never-invalidated memo store for plugins that recompute
//! the same expensive scan on every request (category counts, archive
//! indexes). Disabled by default; [`enable`] is called once at startup
//! for compile runs, where the content cannot change mid-run.
//!
//! Because nothing ever invalidates, this is unsafe for long-running
//! serving processes with changing content - which is why the serve
//! command never enables it.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Turn memoization on for the rest of the process lifetime.
pub fn enable() {
    ENABLED.store(true, Ordering::Relaxed);
}

pub fn enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// One memo scope. Plugins keep a `static` of these, one per concern.
#[derive(Default)]
pub struct Memo<V> {
    map: Mutex<HashMap<u64, V>>,
}

impl<V: Clone> Memo<V> {
    pub fn new() -> Self {
        Self {
            map: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key`, computing and storing it on
    /// the first call. When the cache is disabled this is a plain call
    /// to `compute`.
    pub fn get_or_insert_with<K: Hash>(&self, key: &K, compute: impl FnOnce() -> V) -> V {
        self.lookup(key, compute, enabled())
    }

    fn lookup<K: Hash>(&self, key: &K, compute: impl FnOnce() -> V, use_cache: bool) -> V {
        if !use_cache {
            return compute();
        }

        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let hash = hasher.finish();

        let mut map = match self.map.lock() {
            Ok(map) => map,
            // a poisoned lock means a compute panicked; skip the cache
            Err(_) => return compute(),
        };
        if let Some(value) = map.get(&hash) {
            return value.clone();
        }
        let value = compute();
        map.insert(hash, value.clone());
        value
    }
}

// ============================================================================
// Tests
// ============================================================================

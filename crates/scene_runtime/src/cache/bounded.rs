//! Generic bounded cache with recency and size-based eviction
//!
//! Eviction always notifies the caller-supplied callback before an entry is
//! dropped, so cached values referencing external resources (decoded assets,
//! GPU handles) can be released deterministically on every removal path:
//! LRU eviction, replacement, explicit removal, `clear`, and TTL expiry.

use crate::core::config::CacheConfig;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Callback invoked with each entry as it leaves the cache.
pub type EvictFn<K, V> = Box<dyn Fn(&K, &V) + Send>;

struct CacheEntry<V> {
    value: V,
    size: usize,
    created: Instant,
    last_access: Instant,
    hits: u64,
}

/// Fixed-capacity key/value cache with LRU eviction and optional TTL.
///
/// Recency is an ordered key sequence: the least-recently-used key is always
/// the front element. [`get`](Self::get) refreshes recency;
/// [`contains`](Self::contains) deliberately does not, so probing an entry
/// never extends its lifetime.
pub struct BoundedCache<K, V> {
    config: CacheConfig,
    entries: HashMap<K, CacheEntry<V>>,
    recency: VecDeque<K>,
    total_bytes: usize,
    on_evict: Option<EvictFn<K, V>>,
}

impl<K: Eq + Hash + Clone, V> BoundedCache<K, V> {
    /// Create an empty cache.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
            recency: VecDeque::new(),
            total_bytes: 0,
            on_evict: None,
        }
    }

    /// Install the eviction callback.
    #[must_use]
    pub fn with_evict_callback(mut self, on_evict: EvictFn<K, V>) -> Self {
        self.on_evict = Some(on_evict);
        self
    }

    fn ttl(&self) -> Option<Duration> {
        (self.config.ttl_ms > 0).then(|| Duration::from_millis(self.config.ttl_ms))
    }

    fn is_expired(&self, key: &K) -> bool {
        match (self.ttl(), self.entries.get(key)) {
            (Some(ttl), Some(entry)) => entry.created.elapsed() > ttl,
            _ => false,
        }
    }

    /// Look up `key`, refreshing its recency and hit count.
    ///
    /// A TTL-expired entry is removed as a side effect and reported as a miss.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        if self.is_expired(key) {
            self.evict_entry(key);
            return None;
        }
        let entry = self.entries.get_mut(key)?;
        entry.last_access = Instant::now();
        entry.hits += 1;
        self.recency.retain(|k| k != key);
        self.recency.push_back(key.clone());
        self.entries.get(key).map(|e| &e.value)
    }

    /// Whether `key` holds a live entry. Purges a TTL-expired entry like
    /// [`get`](Self::get), but never refreshes recency.
    pub fn contains(&mut self, key: &K) -> bool {
        if self.is_expired(key) {
            self.evict_entry(key);
            return false;
        }
        self.entries.contains_key(key)
    }

    /// Insert `value` under `key` with a declared size in bytes.
    ///
    /// Returns `false` (logged, nothing stored) when `size` alone exceeds the
    /// configured maximum total size. Otherwise an existing entry for `key`
    /// is displaced first, then least-recently-used entries are evicted,
    /// oldest first, until both the count and size constraints hold.
    pub fn insert(&mut self, key: K, value: V, size: usize) -> bool {
        if size > self.config.max_size_bytes {
            log::warn!(
                "Rejecting cache entry of {size} bytes (max {})",
                self.config.max_size_bytes
            );
            return false;
        }

        if self.entries.contains_key(&key) {
            self.evict_entry(&key);
        }

        while self.entries.len() + 1 > self.config.max_entries
            || self.total_bytes + size > self.config.max_size_bytes
        {
            let Some(oldest) = self.recency.front().cloned() else {
                break;
            };
            log::trace!("Evicting least-recently-used cache entry");
            self.evict_entry(&oldest);
        }

        let now = Instant::now();
        self.entries.insert(
            key.clone(),
            CacheEntry {
                value,
                size,
                created: now,
                last_access: now,
                hits: 0,
            },
        );
        self.recency.push_back(key);
        self.total_bytes += size;
        true
    }

    /// Remove `key`, invoking the eviction callback when present.
    pub fn remove(&mut self, key: &K) -> bool {
        if self.entries.contains_key(key) {
            self.evict_entry(key);
            true
        } else {
            false
        }
    }

    /// Remove every entry, invoking the eviction callback for each.
    pub fn clear(&mut self) {
        let keys: Vec<K> = self.recency.iter().cloned().collect();
        for key in keys {
            self.evict_entry(&key);
        }
    }

    /// Sweep out all TTL-expired entries and return how many were removed.
    ///
    /// A no-op returning 0 when TTL is disabled.
    pub fn prune(&mut self) -> usize {
        let Some(ttl) = self.ttl() else {
            return 0;
        };
        let expired: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.created.elapsed() > ttl)
            .map(|(key, _)| key.clone())
            .collect();
        let count = expired.len();
        for key in &expired {
            self.evict_entry(key);
        }
        count
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of declared entry sizes currently held.
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Hit count of `key`, without touching it.
    #[must_use]
    pub fn hits(&self, key: &K) -> Option<u64> {
        self.entries.get(key).map(|e| e.hits)
    }

    fn evict_entry(&mut self, key: &K) {
        if let Some(entry) = self.entries.remove(key) {
            self.total_bytes -= entry.size;
            self.recency.retain(|k| k != key);
            if let Some(on_evict) = &self.on_evict {
                on_evict(key, &entry.value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::thread::sleep;

    fn cache_with(max_entries: usize) -> BoundedCache<&'static str, u32> {
        BoundedCache::new(CacheConfig::new().with_max_entries(max_entries))
    }

    #[test]
    fn test_lru_eviction_order() {
        let mut cache = cache_with(2);
        cache.insert("a", 1, 0);
        cache.insert("b", 2, 0);
        cache.insert("c", 3, 0);

        assert!(!cache.contains(&"a")); // least recently used
        assert!(cache.contains(&"b"));
        assert!(cache.contains(&"c"));
    }

    #[test]
    fn test_get_refreshes_recency() {
        let mut cache = cache_with(2);
        cache.insert("a", 1, 0);
        cache.insert("b", 2, 0);
        assert_eq!(cache.get(&"a"), Some(&1)); // "a" is now most recent
        cache.insert("c", 3, 0);

        assert!(cache.contains(&"a"));
        assert!(!cache.contains(&"b"));
        assert!(cache.contains(&"c"));
    }

    #[test]
    fn test_contains_does_not_refresh_recency() {
        let mut cache = cache_with(2);
        cache.insert("a", 1, 0);
        cache.insert("b", 2, 0);
        assert!(cache.contains(&"a")); // probe, must not extend lifetime
        cache.insert("c", 3, 0);

        assert!(!cache.contains(&"a"));
        assert!(cache.contains(&"b"));
    }

    #[test]
    fn test_size_pressure_evicts_until_fit() {
        let mut cache: BoundedCache<&str, u32> = BoundedCache::new(
            CacheConfig::new()
                .with_max_entries(100)
                .with_max_size_bytes(100),
        );
        cache.insert("a", 1, 40);
        cache.insert("b", 2, 40);
        cache.insert("c", 3, 40); // 120 > 100: "a" must go

        assert!(!cache.contains(&"a"));
        assert_eq!(cache.total_bytes(), 80);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_oversize_entry_rejected() {
        let mut cache: BoundedCache<&str, u32> =
            BoundedCache::new(CacheConfig::new().with_max_size_bytes(10));
        assert!(!cache.insert("big", 1, 11));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_ttl_expiry_and_prune() {
        let mut cache: BoundedCache<&str, u32> =
            BoundedCache::new(CacheConfig::new().with_ttl_ms(60));
        cache.insert("a", 1, 0);

        sleep(Duration::from_millis(20));
        assert!(cache.contains(&"a"));
        assert_eq!(cache.get(&"a"), Some(&1));

        sleep(Duration::from_millis(80));
        cache.insert("b", 2, 0);
        assert_eq!(cache.prune(), 1); // only "a" is past its TTL
        assert!(!cache.contains(&"a"));
        assert!(cache.contains(&"b"));
    }

    #[test]
    fn test_expired_entry_is_a_miss_on_get() {
        let mut cache: BoundedCache<&str, u32> =
            BoundedCache::new(CacheConfig::new().with_ttl_ms(20));
        cache.insert("a", 1, 0);
        sleep(Duration::from_millis(50));
        assert_eq!(cache.get(&"a"), None);
        assert!(cache.is_empty()); // purged as a side effect
    }

    #[test]
    fn test_prune_noop_without_ttl() {
        let mut cache = cache_with(10);
        cache.insert("a", 1, 0);
        assert_eq!(cache.prune(), 0);
        assert!(cache.contains(&"a"));
    }

    #[test]
    fn test_evict_callback_runs_on_every_removal_path() {
        let evicted: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = evicted.clone();
        let mut cache: BoundedCache<&str, u32> =
            BoundedCache::new(CacheConfig::new().with_max_entries(2))
                .with_evict_callback(Box::new(move |key, _value| {
                    sink.lock().expect("sink").push(key);
                }));

        cache.insert("a", 1, 0);
        cache.insert("b", 2, 0);
        cache.insert("c", 3, 0); // LRU-evicts "a"
        cache.insert("c", 4, 0); // replacement displaces old "c"
        cache.remove(&"b");
        cache.clear(); // drops "c"

        assert_eq!(*evicted.lock().expect("sink"), vec!["a", "c", "b", "c"]);
        assert_eq!(cache.total_bytes(), 0);
    }

    #[test]
    fn test_hit_counter() {
        let mut cache = cache_with(4);
        cache.insert("a", 1, 0);
        cache.get(&"a");
        cache.get(&"a");
        cache.contains(&"a"); // probes do not count as hits
        assert_eq!(cache.hits(&"a"), Some(2));
    }
}

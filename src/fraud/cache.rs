//! Capacity-bounded cache of wallet verifications.
//!
//! Purely an optimization: a miss re-derives the verification from
//! intel, so eviction is always safe. Keys are lowercased addresses
//! so lookups tolerate mixed-case input.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;

use crate::fraud::engine::WalletVerification;

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that fell through to intel.
    pub misses: u64,
    /// Entries currently held.
    pub entries: usize,
    /// Maximum entries before eviction.
    pub capacity: usize,
}

impl CacheStats {
    /// Fraction of lookups answered from the cache, 0.0 when none.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache of wallet verifications with hit/miss accounting.
pub struct VerificationCache {
    inner: Mutex<LruCache<String, WalletVerification>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl VerificationCache {
    /// Create a cache holding at most `capacity` verifications.
    ///
    /// A zero capacity is bumped to one so the cache type never has
    /// a degenerate state.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a verification, counting the hit or miss.
    #[must_use]
    pub fn get(&self, address: &str) -> Option<WalletVerification> {
        let found = self.inner.lock().get(&address.to_lowercase()).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Store a verification under its wallet address.
    pub fn insert(&self, verification: WalletVerification) {
        let key = verification.address.to_lowercase();
        self.inner.lock().put(key, verification);
    }

    /// Drop a single entry, if present.
    pub fn invalidate(&self, address: &str) {
        self.inner.lock().pop(&address.to_lowercase());
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: inner.len(),
            capacity: inner.cap().get(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn verification(address: &str, score: u8) -> WalletVerification {
        WalletVerification {
            address: address.to_string(),
            age_days: 30,
            is_banned: false,
            risk_score: score,
            completed_bookings: 3,
            device_hash: None,
            is_verified: true,
        }
    }

    #[test]
    fn test_hit_and_miss_accounting() {
        let cache = VerificationCache::new(4);
        assert!(cache.get("0xAbsent").is_none());
        cache.insert(verification("0xAbCd", 10));
        let hit = cache.get("0xabcd").expect("case-insensitive hit");
        assert_eq!(hit.risk_score, 10);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let cache = VerificationCache::new(2);
        cache.insert(verification("0x01", 1));
        cache.insert(verification("0x02", 2));
        assert!(cache.get("0x01").is_some());
        cache.insert(verification("0x03", 3));

        assert!(cache.get("0x02").is_none(), "least recently used evicted");
        assert!(cache.get("0x01").is_some());
        assert!(cache.get("0x03").is_some());
        assert_eq!(cache.stats().capacity, 2);
    }

    #[test]
    fn test_zero_capacity_is_bumped() {
        let cache = VerificationCache::new(0);
        cache.insert(verification("0x01", 1));
        assert!(cache.get("0x01").is_some());
        assert_eq!(cache.stats().capacity, 1);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = VerificationCache::new(4);
        cache.insert(verification("0x01", 1));
        cache.insert(verification("0x02", 2));
        cache.invalidate("0x01");
        assert!(cache.get("0x01").is_none());
        cache.clear();
        assert!(cache.get("0x02").is_none());
        assert_eq!(cache.stats().entries, 0);
    }
}

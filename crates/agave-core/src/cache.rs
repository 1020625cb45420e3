// ── Seen-IP cache ──
//
// Grow-only set of source addresses that already produced an event.
// Reads share the lock; inserts take it exclusively.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

/// Thread-safe record of source IPs seen by this sensor process.
///
/// Entries are never evicted and nothing is persisted; a restart starts
/// from an empty set.
#[derive(Debug, Default)]
pub struct SeenIpCache {
    seen: RwLock<HashSet<String>>,
}

impl SeenIpCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `ip` as seen. Idempotent.
    pub fn record(&self, ip: &str) {
        self.seen
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ip.to_owned());
    }

    /// Whether `ip` was previously passed to [`record`](Self::record).
    pub fn has_seen(&self, ip: &str) -> bool {
        self.seen
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(ip)
    }

    pub fn len(&self) -> usize {
        self.seen
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn unseen_until_recorded() {
        let cache = SeenIpCache::new();
        assert!(!cache.has_seen("10.0.0.5"));
        assert!(cache.is_empty());

        cache.record("10.0.0.5");
        assert!(cache.has_seen("10.0.0.5"));
        assert!(!cache.has_seen("10.0.0.6"));
    }

    #[test]
    fn record_is_idempotent() {
        let cache = SeenIpCache::new();
        cache.record("203.0.113.9");
        cache.record("203.0.113.9");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn concurrent_records_are_never_lost() {
        let cache = Arc::new(SeenIpCache::new());

        let handles: Vec<_> = (0..8u8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..=255u8 {
                        let ip = format!("10.{t}.0.{i}");
                        cache.record(&ip);
                        assert!(cache.has_seen(&ip));
                        // Readers on other threads' ranges must not block or panic.
                        let _ = cache.has_seen(&format!("10.{}.0.{i}", (t + 1) % 8));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 8 * 256);
        for t in 0..8u8 {
            for i in 0..=255u8 {
                assert!(cache.has_seen(&format!("10.{t}.0.{i}")));
            }
        }
        assert!(!cache.has_seen("10.8.0.0"));
    }
}

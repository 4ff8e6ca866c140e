use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;

use super::result::ResolutionError;
use crate::descriptor::CacheKey;
use crate::session::ElementHandle;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub handle: ElementHandle,
    pub resolved_at: Instant,
    /// Time spent resolving, retries included.
    pub elapsed: Duration,
}

/// One network resolution of a key, shared by every lookup that arrives
/// while it runs. Failures are shared too, then the flight is discarded.
pub(crate) type Flight = Arc<OnceCell<Result<CacheEntry, ResolutionError>>>;

fn settled_ok(flight: &Flight) -> Option<&CacheEntry> {
    flight.get().and_then(|outcome| outcome.as_ref().ok())
}

/// Resolved handles keyed by (selector, description).
///
/// Entries are never checked for staleness; [`ElementCache::clear`] is the
/// only way to drop them.
#[derive(Debug, Default)]
pub struct ElementCache {
    flights: DashMap<CacheKey, Flight>,
}

impl ElementCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.flights
            .get(key)
            .and_then(|flight| settled_ok(flight.value()).cloned())
    }

    /// Returns the flight for `key`: a cached success, one still running, or
    /// a fresh one. A flight that settled with an error is never handed out.
    pub(crate) fn flight(&self, key: &CacheKey) -> Flight {
        let mut flight = self.flights.entry(key.clone()).or_default();
        if matches!(flight.value().get(), Some(Err(_))) {
            *flight = Flight::default();
        }
        flight.value().clone()
    }

    /// Forget `flight` if it is still the one registered for `key`.
    pub(crate) fn discard(&self, key: &CacheKey, flight: &Flight) {
        self.flights.remove_if(key, |_, current| Arc::ptr_eq(current, flight));
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.get(key).is_some()
    }

    /// Number of populated entries.
    pub fn len(&self) -> usize {
        self.flights
            .iter()
            .filter(|f| settled_ok(f.value()).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of keys held, in-flight lookups included.
    pub fn tracked(&self) -> usize {
        self.flights.len()
    }

    /// Drops every entry and returns the handles that were cached. Lookups
    /// already in flight finish into detached flights and are not visible
    /// afterwards.
    pub fn clear(&self) -> Vec<ElementHandle> {
        let handles = self
            .flights
            .iter()
            .filter_map(|f| settled_ok(f.value()).map(|e| e.handle.clone()))
            .collect();
        self.flights.clear();
        handles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> CacheKey {
        CacheKey {
            selector: s.into(),
            description: format!("{} element", s),
        }
    }

    fn entry(id: &str) -> CacheEntry {
        CacheEntry {
            handle: ElementHandle::new(id),
            resolved_at: Instant::now(),
            elapsed: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_pending_flight_is_not_an_entry() {
        let cache = ElementCache::new();
        let _ = cache.flight(&key("a"));
        assert!(!cache.contains(&key("a")));
        assert!(cache.is_empty());
        assert_eq!(cache.tracked(), 1);
    }

    #[tokio::test]
    async fn test_populated_flight_then_clear() {
        let cache = ElementCache::new();
        cache.flight(&key("a")).set(Ok(entry("el-1"))).unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key("a")).unwrap().handle.id(), "el-1");

        let dropped = cache.clear();
        assert_eq!(dropped, vec![ElementHandle::new("el-1")]);
        assert!(cache.is_empty());
        assert_eq!(cache.tracked(), 0);
    }

    #[tokio::test]
    async fn test_failed_flight_is_replaced() {
        let cache = ElementCache::new();
        let failed = cache.flight(&key("a"));
        failed
            .set(Err(ResolutionError::ConditionTimeout { attempts: 1 }))
            .unwrap();

        let fresh = cache.flight(&key("a"));
        assert!(!Arc::ptr_eq(&failed, &fresh));
        assert!(!fresh.initialized());
    }

    #[tokio::test]
    async fn test_discard_only_removes_matching_flight() {
        let cache = ElementCache::new();
        let stale = Flight::default();
        let current = cache.flight(&key("a"));

        cache.discard(&key("a"), &stale);
        assert_eq!(cache.tracked(), 1);

        cache.discard(&key("a"), &current);
        assert_eq!(cache.tracked(), 0);
    }
}

//! TTL-based caching for reference lists.
//!
//! Forms need the same lookup lists over and over (courses and
//! lecturers for the class form, departments for the student form);
//! a short TTL avoids refetching them within one console run while any
//! write to the entity invalidates its list.

use dashmap::DashMap;
use std::time::{Duration, Instant};

/// A cached list with metadata.
#[derive(Clone)]
struct CachedList<T> {
    items: Vec<T>,
    cached_at: Instant,
    ttl: Duration,
}

/// Thread-safe cache of fetched lists, keyed by endpoint path.
pub struct ListCache<T> {
    entries: DashMap<String, CachedList<T>>,
    default_ttl: Duration,
}

impl<T: Clone> ListCache<T> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
        }
    }

    /// Cache with a 5-minute default TTL.
    pub fn with_default_ttl() -> Self {
        Self::new(Duration::from_secs(5 * 60))
    }

    /// Gets a cached list if it exists and hasn't expired.
    pub fn get(&self, key: &str) -> Option<Vec<T>> {
        self.entries.get(key).and_then(|entry| {
            if entry.cached_at.elapsed() < entry.ttl {
                Some(entry.items.clone())
            } else {
                drop(entry);
                self.entries.remove(key);
                None
            }
        })
    }

    /// Inserts a list with the default TTL.
    pub fn insert(&self, key: impl Into<String>, items: Vec<T>) {
        self.insert_with_ttl(key, items, self.default_ttl);
    }

    /// Inserts a list with a custom TTL.
    pub fn insert_with_ttl(&self, key: impl Into<String>, items: Vec<T>, ttl: Duration) {
        self.entries.insert(
            key.into(),
            CachedList {
                items,
                cached_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Invalidates one cached list.
    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Clears every cached list.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> Default for ListCache<T> {
    fn default() -> Self {
        Self::with_default_ttl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_and_invalidate() {
        let cache: ListCache<i32> = ListCache::with_default_ttl();
        assert!(cache.get("/deans/courses").is_none());

        cache.insert("/deans/courses", vec![1, 2, 3]);
        assert_eq!(cache.get("/deans/courses"), Some(vec![1, 2, 3]));

        cache.invalidate("/deans/courses");
        assert!(cache.get("/deans/courses").is_none());
    }

    #[test]
    fn test_expired_entry_is_removed_on_read() {
        let cache: ListCache<i32> = ListCache::new(Duration::from_millis(0));
        cache.insert("/deans/lecturers", vec![7]);
        assert!(cache.get("/deans/lecturers").is_none());
        assert!(cache.is_empty());
    }
}

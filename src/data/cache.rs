use crate::error::Result;
use polars::prelude::*;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct CacheEntry {
    frame: DataFrame,
    fetched_at: Instant,
}

/// TTL'd cache for downloaded price data, keyed by symbols + period +
/// interval.
///
/// The lock is held across the fetch closure: two concurrent misses for the
/// same key resolve to a single upstream fetch.
pub struct DataCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

pub fn cache_key(symbols: &[String], period: &str, interval: &str) -> String {
    format!("{}|{}|{}", symbols.join(","), period, interval)
}

impl DataCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Return the cached frame for `key` if it is still fresh, otherwise run
    /// `fetch` and store the result with a new timestamp. An entry past its
    /// TTL is a miss, not an error.
    pub fn get_or_fetch<F>(&self, key: &str, fetch: F) -> Result<DataFrame>
    where
        F: FnOnce() -> Result<DataFrame>,
    {
        let mut entries = self.entries.lock().unwrap();

        if let Some(entry) = entries.get(key) {
            if entry.fetched_at.elapsed() < self.ttl {
                log::debug!("Cache hit for {}", key);
                return Ok(entry.frame.clone());
            }
            log::debug!("Cache entry for {} expired", key);
        }

        let frame = fetch()?;
        entries.insert(
            key.to_string(),
            CacheEntry {
                frame: frame.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(frame)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_frame() -> DataFrame {
        df! { "close" => &[100.0, 101.0, 102.0] }.unwrap()
    }

    #[test]
    fn test_second_lookup_within_ttl_is_a_hit() {
        let cache = DataCache::new(Duration::from_secs(3600));
        let fetches = AtomicUsize::new(0);

        let key = cache_key(&["BTC".to_string()], "1y", "1d");
        for _ in 0..2 {
            let frame = cache
                .get_or_fetch(&key, || {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    Ok(sample_frame())
                })
                .unwrap();
            assert_eq!(frame.height(), 3);
        }

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_expired_entry_triggers_one_refetch() {
        let cache = DataCache::new(Duration::ZERO);
        let fetches = AtomicUsize::new(0);

        let key = cache_key(&["BTC".to_string()], "1y", "1d");
        for _ in 0..2 {
            cache
                .get_or_fetch(&key, || {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    Ok(sample_frame())
                })
                .unwrap();
        }

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_fetch_error_is_propagated_and_not_cached() {
        let cache = DataCache::new(Duration::from_secs(3600));
        let key = cache_key(&["ETH".to_string()], "6mo", "1h");

        let result = cache.get_or_fetch(&key, || {
            Err(crate::error::EvotradeError::DataUnavailable(
                "offline".to_string(),
            ))
        });
        assert!(result.is_err());
        assert!(cache.is_empty());
    }
}

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use parking_lot::RwLock;
use tracing::debug;

use super::PriceSeries;

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// Identifies one fetched series: a provider ticker and its start date.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct SeriesKey {
    pub ticker: String,
    pub start: NaiveDate,
}

impl SeriesKey {
    pub fn new(ticker: impl Into<String>, start: NaiveDate) -> Self {
        Self {
            ticker: ticker.into(),
            start,
        }
    }
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.ticker, self.start)
    }
}

// ---------------------------------------------------------------------------
// SeriesCache -- thread-safe, time-bounded store of fetched series
// ---------------------------------------------------------------------------

struct Entry {
    series: Arc<PriceSeries>,
    stored_at: Instant,
}

/// Keeps recently downloaded series so that flipping between assets or
/// indicators does not hit the data provider every time. Entries older than
/// `ttl` are treated as missing. At most `max_entries` series are held; the
/// oldest one is evicted first.
///
/// Only raw provider data lives here, never indicator output.
pub struct SeriesCache {
    entries: RwLock<HashMap<SeriesKey, Entry>>,
    ttl: Duration,
    max_entries: usize,
}

impl SeriesCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Return the cached series for `key` if it is still fresh.
    pub fn get(&self, key: &SeriesKey) -> Option<Arc<PriceSeries>> {
        let map = self.entries.read();
        let entry = map.get(key)?;
        if entry.stored_at.elapsed() < self.ttl {
            debug!(key = %key, "series cache hit");
            Some(entry.series.clone())
        } else {
            debug!(key = %key, "series cache entry expired");
            None
        }
    }

    /// Store `series` under `key`, replacing any previous entry.
    pub fn insert(&self, key: SeriesKey, series: Arc<PriceSeries>) {
        let mut map = self.entries.write();
        map.insert(
            key,
            Entry {
                series,
                stored_at: Instant::now(),
            },
        );

        while map.len() > self.max_entries {
            let oldest = map
                .iter()
                .min_by_key(|(_, e)| e.stored_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    map.remove(&k);
                }
                None => break,
            }
        }
    }

    /// Number of entries held, fresh or not.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::Bar;

    fn key(ticker: &str) -> SeriesKey {
        SeriesKey::new(ticker, NaiveDate::from_ymd_opt(2019, 1, 1).unwrap())
    }

    fn one_bar(close: f64) -> Arc<PriceSeries> {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        Arc::new(PriceSeries::new(vec![Bar::new(date, close, close, close, close)]).unwrap())
    }

    #[test]
    fn fresh_entry_is_returned() {
        let cache = SeriesCache::new(Duration::from_secs(300), 8);
        cache.insert(key("BTC-USD"), one_bar(42.0));
        let hit = cache.get(&key("BTC-USD")).unwrap();
        assert_eq!(hit.closes(), vec![42.0]);
        assert!(cache.get(&key("^GSPC")).is_none());
    }

    #[test]
    fn zero_ttl_never_hits() {
        let cache = SeriesCache::new(Duration::ZERO, 8);
        cache.insert(key("GC=F"), one_bar(1.0));
        assert!(cache.get(&key("GC=F")).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn insert_replaces_existing_entry() {
        let cache = SeriesCache::new(Duration::from_secs(300), 8);
        cache.insert(key("BTC-USD"), one_bar(1.0));
        cache.insert(key("BTC-USD"), one_bar(2.0));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key("BTC-USD")).unwrap().closes(), vec![2.0]);
    }

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let cache = SeriesCache::new(Duration::from_secs(300), 2);
        cache.insert(key("A"), one_bar(1.0));
        std::thread::sleep(Duration::from_millis(2));
        cache.insert(key("B"), one_bar(2.0));
        std::thread::sleep(Duration::from_millis(2));
        cache.insert(key("C"), one_bar(3.0));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key("A")).is_none());
        assert!(cache.get(&key("B")).is_some());
        assert!(cache.get(&key("C")).is_some());
    }
}

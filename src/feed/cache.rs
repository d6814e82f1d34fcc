//! Per-trading-date response cache.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use chrono::NaiveDate;
use tracing::debug;

/// Values cached by trading date.
///
/// Past days are immutable once published and are served from the cache.
/// The *live* date (normally today) is still being published, so it is
/// never served from the cache: every lookup for it reloads.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use merit_curve::feed::cache::DatedCache;
///
/// let today = NaiveDate::from_ymd_opt(2025, 12, 30).unwrap();
/// let yesterday = today.pred_opt().unwrap();
/// let mut cache = DatedCache::with_live_date(today);
///
/// let mut loads = 0;
/// for _ in 0..3 {
///     cache
///         .get_or_try_insert_with(yesterday, || {
///             loads += 1;
///             Ok::<_, ()>("offers")
///         })
///         .unwrap();
/// }
/// assert_eq!(loads, 1);
/// ```
#[derive(Debug, Clone)]
pub struct DatedCache<T> {
    entries: HashMap<NaiveDate, T>,
    live_date: Option<NaiveDate>,
}

impl<T> Default for DatedCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DatedCache<T> {
    /// Creates an empty cache with no live date.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            live_date: None,
        }
    }

    /// Creates an empty cache that always reloads `live`.
    pub fn with_live_date(live: NaiveDate) -> Self {
        Self {
            entries: HashMap::new(),
            live_date: Some(live),
        }
    }

    /// Moves the live date, e.g. at midnight.
    pub fn set_live_date(&mut self, live: NaiveDate) {
        self.live_date = Some(live);
    }

    /// Current live date.
    pub fn live_date(&self) -> Option<NaiveDate> {
        self.live_date
    }

    /// Cached value for `date`, unless `date` is live.
    pub fn get(&self, date: NaiveDate) -> Option<&T> {
        if self.live_date == Some(date) {
            return None;
        }
        self.entries.get(&date)
    }

    /// Stores a value, returning the one it replaced.
    pub fn insert(&mut self, date: NaiveDate, value: T) -> Option<T> {
        self.entries.insert(date, value)
    }

    /// Drops the value for `date`.
    pub fn invalidate(&mut self, date: NaiveDate) -> Option<T> {
        self.entries.remove(&date)
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored dates, live date included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the cached value for `date`, running `load` on a miss or
    /// when `date` is live.
    ///
    /// # Errors
    ///
    /// Propagates the loader's error; the cache is left unchanged.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        date: NaiveDate,
        load: impl FnOnce() -> Result<T, E>,
    ) -> Result<&T, E> {
        let live = self.live_date == Some(date);
        match self.entries.entry(date) {
            Entry::Occupied(mut e) => {
                if live {
                    debug!(%date, "reloading live date");
                    e.insert(load()?);
                }
                Ok(e.into_mut())
            }
            Entry::Vacant(e) => {
                debug!(%date, "cache miss");
                Ok(e.insert(load()?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, d).unwrap()
    }

    #[test]
    fn past_dates_are_cached() {
        let mut cache = DatedCache::with_live_date(day(30));
        cache.insert(day(29), 1);
        assert_eq!(cache.get(day(29)), Some(&1));
        assert_eq!(cache.get(day(28)), None);
    }

    #[test]
    fn live_date_is_never_served() {
        let mut cache = DatedCache::with_live_date(day(30));
        cache.insert(day(30), 1);
        assert_eq!(cache.get(day(30)), None);

        let mut loads = 0;
        for expected in [10, 11] {
            let v = cache
                .get_or_try_insert_with(day(30), || {
                    loads += 1;
                    Ok::<_, ()>(loads + 9)
                })
                .unwrap();
            assert_eq!(*v, expected);
        }
        assert_eq!(loads, 2);
    }

    #[test]
    fn moving_live_date_freezes_previous_day() {
        let mut cache = DatedCache::with_live_date(day(30));
        cache.insert(day(30), "partial");
        cache.set_live_date(day(31));
        assert_eq!(cache.get(day(30)), Some(&"partial"));
        assert_eq!(cache.live_date(), Some(day(31)));
    }

    #[test]
    fn loader_error_leaves_cache_unchanged() {
        let mut cache: DatedCache<u32> = DatedCache::new();
        let result = cache.get_or_try_insert_with(day(1), || Err("offline"));
        assert_eq!(result, Err("offline"));
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_and_clear() {
        let mut cache = DatedCache::new();
        cache.insert(day(1), 1);
        cache.insert(day(2), 2);
        assert_eq!(cache.invalidate(day(1)), Some(1));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}

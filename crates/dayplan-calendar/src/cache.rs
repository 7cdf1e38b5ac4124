//! In-memory memoization of recurrence expansions.
//!
//! Expansion itself is stateless; this cache is for callers that redraw the
//! same window repeatedly. Entries are keyed by the base event's id and
//! `updated_at`, so edits made through the store invalidate naturally.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;

use crate::error::CalendarResult;
use crate::recurrence::expand;
use crate::types::Event;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ExpansionKey {
    event_id: String,
    updated_at: Option<DateTime<Utc>>,
    window_start: NaiveDate,
    window_end: NaiveDate,
}

/// Thread-safe cache of expanded instances.
#[derive(Debug)]
pub struct ExpansionCache {
    capacity: usize,
    entries: Mutex<HashMap<ExpansionKey, Arc<Vec<Event>>>>,
}

impl ExpansionCache {
    /// Create a cache holding at most `capacity` expansions. Zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Expand `base`, reusing a previous result for the same key.
    ///
    /// # Errors
    ///
    /// Propagates [`expand`] errors; failed expansions are not cached.
    pub fn expand(
        &self,
        base: &Event,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> CalendarResult<Arc<Vec<Event>>> {
        if self.capacity == 0 {
            return Ok(Arc::new(expand(base, window_start, window_end)?));
        }

        let key = ExpansionKey {
            event_id: base.id.clone(),
            updated_at: base.updated_at,
            window_start,
            window_end,
        };

        if let Some(hit) = self.entries.lock().get(&key) {
            tracing::trace!("Expansion cache hit for {}", base.id);
            return Ok(Arc::clone(hit));
        }

        let instances = Arc::new(expand(base, window_start, window_end)?);

        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity {
            tracing::debug!("Expansion cache full ({} entries), clearing", entries.len());
            entries.clear();
        }
        entries.insert(key, Arc::clone(&instances));

        Ok(instances)
    }

    /// Drop every cached expansion of `event_id`.
    pub fn invalidate(&self, event_id: &str) {
        self.entries.lock().retain(|key, _| key.event_id != event_id);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventTime, RecurrencePattern, RecurrenceRule};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily(id: &str) -> Event {
        let day = date(2024, 6, 1);
        Event {
            id: id.to_string(),
            calendar_id: None,
            title: "Daily".to_string(),
            description: None,
            location: None,
            start: EventTime::DateTime(day.and_hms_opt(8, 0, 0).unwrap()),
            end: EventTime::DateTime(day.and_hms_opt(8, 30, 0).unwrap()),
            all_day: false,
            is_recurring: true,
            recurrence: Some(RecurrenceRule::new(RecurrencePattern::Daily, 1)),
            original_event_id: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_repeated_expansion_is_shared() {
        let cache = ExpansionCache::new(4);
        let event = daily("d");

        let first = cache.expand(&event, date(2024, 6, 1), date(2024, 6, 7)).unwrap();
        let second = cache.expand(&event, date(2024, 6, 1), date(2024, 6, 7)).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 7);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_updated_event_misses_cache() {
        let cache = ExpansionCache::new(4);
        let mut event = daily("d");
        let first = cache.expand(&event, date(2024, 6, 1), date(2024, 6, 7)).unwrap();

        event.updated_at = Some(Utc::now());
        if let Some(rule) = event.recurrence.as_mut() {
            rule.count = Some(2);
        }
        let second = cache.expand(&event, date(2024, 6, 1), date(2024, 6, 7)).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_full_cache_is_cleared() {
        let cache = ExpansionCache::new(2);
        for id in ["a", "b", "c"] {
            cache.expand(&daily(id), date(2024, 6, 1), date(2024, 6, 2)).unwrap();
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_zero_capacity_never_stores() {
        let cache = ExpansionCache::new(0);
        let instances = cache.expand(&daily("d"), date(2024, 6, 1), date(2024, 6, 3)).unwrap();
        assert_eq!(instances.len(), 3);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_removes_only_that_event() {
        let cache = ExpansionCache::new(8);
        cache.expand(&daily("a"), date(2024, 6, 1), date(2024, 6, 2)).unwrap();
        cache.expand(&daily("a"), date(2024, 6, 3), date(2024, 6, 4)).unwrap();
        cache.expand(&daily("b"), date(2024, 6, 1), date(2024, 6, 2)).unwrap();

        cache.invalidate("a");
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = ExpansionCache::new(4);
        assert!(cache.expand(&daily("d"), date(2024, 6, 7), date(2024, 6, 1)).is_err());
        assert!(cache.is_empty());
    }
}

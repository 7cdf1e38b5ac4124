//! Canonical day keys used to bucket events by calendar day.
//!
//! Keys are zero-padded `YYYY-MM-DD`, so lexicographic order is date order.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::error::{CalendarError, CalendarResult};
use crate::types::Event;

pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

pub fn day_key(date: NaiveDate) -> String {
    date.format(DAY_KEY_FORMAT).to_string()
}

/// Parse a day key produced by [`day_key`].
pub fn parse_day_key(key: &str) -> CalendarResult<NaiveDate> {
    NaiveDate::parse_from_str(key, DAY_KEY_FORMAT)
        .map_err(|e| CalendarError::InvalidArgument(format!("Invalid day key '{}': {}", key, e)))
}

/// Group events under the day key of their start day.
///
/// Input order is kept within each bucket.
pub fn bucket_by_day<I>(events: I) -> BTreeMap<String, Vec<Event>>
where
    I: IntoIterator<Item = Event>,
{
    let mut buckets: BTreeMap<String, Vec<Event>> = BTreeMap::new();
    for event in events {
        buckets
            .entry(day_key(event.start.date()))
            .or_default()
            .push(event);
    }
    buckets
}

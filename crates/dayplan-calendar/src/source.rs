//! Event sources and the week view pipeline built on top of them.

use chrono::Days;

use crate::cache::ExpansionCache;
use crate::day_key::bucket_by_day;
use crate::error::CalendarResult;
use crate::layout::layout_week;
use crate::recurrence::expand_all_with;
use crate::types::{Event, PositionedEvent};
use crate::week::Week;

/// Anything that can hand out stored base events.
///
/// Fetching, filtering by owner and persistence belong to the implementor.
pub trait EventSource {
    fn events(&self) -> anyhow::Result<Vec<Event>>;
}

impl EventSource for Vec<Event> {
    fn events(&self) -> anyhow::Result<Vec<Event>> {
        Ok(self.clone())
    }
}

impl EventSource for [Event] {
    fn events(&self) -> anyhow::Result<Vec<Event>> {
        Ok(self.to_vec())
    }
}

/// Expand, bucket and lay out every event from `source` for `week`.
///
/// Recurrences are expanded over the week padded by `lookahead_days` on both
/// sides, so long instances that began before the week still appear clipped.
///
/// Expansion walks from the padded window start, not from the series start.
/// A rule's `count` and the `_n` instance suffixes therefore count from the
/// window, and a `count`-bounded series keeps producing instances in windows
/// far past its last real occurrence. Store an `endDate` on series that must
/// stop showing up.
///
/// # Errors
///
/// Returns [`crate::CalendarError::Source`] when the source fails.
pub fn week_view<S>(
    source: &S,
    week: &Week,
    lookahead_days: u32,
    cache: Option<&ExpansionCache>,
) -> CalendarResult<Vec<PositionedEvent>>
where
    S: EventSource + ?Sized,
{
    let events = source.events()?;
    let padding = Days::new(u64::from(lookahead_days));
    let window_start = week
        .first_day()
        .checked_sub_days(padding)
        .unwrap_or(week.first_day());
    let window_end = week
        .last_day()
        .checked_add_days(padding)
        .unwrap_or(week.last_day());

    let instances = expand_all_with(&events, window_start, window_end, cache)?;
    Ok(layout_week(&bucket_by_day(instances), week))
}

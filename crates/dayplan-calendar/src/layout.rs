//! Week grid layout: day spans and vertical stacking for a week view.
//!
//! Slots are assigned greedily. Each event takes the lowest slot whose last
//! occupant ends on an earlier day, so the result is never overlapping but
//! not always minimal.

use std::collections::{BTreeMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use crate::day_key::bucket_by_day;
use crate::types::{exclusive_end_day, Event, PositionedEvent};
use crate::week::Week;

/// An event cut down to the visible week.
#[derive(Debug)]
struct Clipped {
    event: Event,
    start_day: NaiveDate,
    end_day: NaiveDate,
    duration: TimeDelta,
}

/// Lay out bucketed events on `week`.
///
/// Buckets are visited in day-key order, so events anchored earlier are placed
/// first; inside a bucket longer events go first. Events that miss the week
/// entirely are dropped, and an id seen in more than one bucket is placed once.
pub fn layout_week(
    events_by_day: &BTreeMap<String, Vec<Event>>,
    week: &Week,
) -> Vec<PositionedEvent> {
    let mut placed_ids: HashSet<&str> = HashSet::new();
    // last occupied day per slot
    let mut slots: Vec<NaiveDate> = Vec::new();
    let mut positioned = Vec::new();

    for bucket in events_by_day.values() {
        let mut clipped: Vec<Clipped> = bucket
            .iter()
            .filter(|&event| placed_ids.insert(event.id.as_str()))
            .filter_map(|event| clip(event, week))
            .collect();
        clipped.sort_by(|a, b| b.duration.cmp(&a.duration));

        for item in clipped {
            let vertical_slot = match slots.iter().position(|end| *end < item.start_day) {
                Some(slot) => {
                    slots[slot] = item.end_day;
                    slot
                }
                None => {
                    slots.push(item.end_day);
                    slots.len() - 1
                }
            };

            let column_span = usize::try_from((item.end_day - item.start_day).num_days() + 1)
                .unwrap_or(1)
                .clamp(1, 7);

            positioned.push(PositionedEvent {
                day_index: week.day_index(item.start_day).unwrap_or(0),
                column_span,
                vertical_slot,
                event: item.event,
            });
        }
    }

    tracing::debug!(
        "Laid out {} events in {} slots for week of {}",
        positioned.len(),
        slots.len(),
        week.first_day()
    );
    positioned
}

/// Bucket `events` by start day and lay them out on `week`.
pub fn layout_events(events: &[Event], week: &Week) -> Vec<PositionedEvent> {
    layout_week(&bucket_by_day(events.iter().cloned()), week)
}

fn clip(event: &Event, week: &Week) -> Option<Clipped> {
    let (week_start, week_end) = week.bounds();
    let start = event.start.as_datetime();
    let end = event.end.as_datetime().max(start);

    if !overlaps(start, end, week_start, week_end) {
        return None;
    }

    let clipped_start = start.max(week_start);
    let clipped_end = end.min(week_end);

    Some(Clipped {
        event: Event {
            start: event.start.with_datetime(clipped_start),
            end: event.end.with_datetime(clipped_end),
            ..event.clone()
        },
        start_day: clipped_start.date(),
        end_day: exclusive_end_day(clipped_start, clipped_end),
        duration: clipped_end - clipped_start,
    })
}

fn overlaps(
    start: NaiveDateTime,
    end: NaiveDateTime,
    week_start: NaiveDateTime,
    week_end: NaiveDateTime,
) -> bool {
    if start == end {
        start >= week_start && start < week_end
    } else {
        start < week_end && end > week_start
    }
}

//! Recurrence expansion for repeating events.
//!
//! Turns one base event and its rule into the concrete instances whose start
//! day falls inside an inclusive day window. Expansion is pure: the same base
//! event and window always produce the same instances with the same ids.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveTime, TimeDelta, Weekday};

use crate::cache::ExpansionCache;
use crate::error::{CalendarError, CalendarResult};
use crate::types::{Event, MonthlyType, RecurrencePattern, RecurrenceRule};

/// Candidates examined per expansion before giving up on a rule.
pub const MAX_EXPANSION_STEPS: usize = 1000;

/// Expand `base` into the instances starting within `[window_start, window_end]`.
///
/// Non-recurring events (or recurring ones missing their rule) come back as a
/// single unchanged element.
///
/// # Errors
///
/// Returns [`CalendarError::InvalidArgument`] when `window_start > window_end`.
pub fn expand(
    base: &Event,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> CalendarResult<Vec<Event>> {
    check_window(window_start, window_end)?;

    let rule = match (&base.recurrence, base.is_recurring) {
        (Some(rule), true) => rule,
        (None, true) => {
            tracing::debug!("Event {} is flagged recurring but has no rule", base.id);
            return Ok(vec![base.clone()]);
        }
        _ => return Ok(vec![base.clone()]),
    };

    Ok(expand_rule(base, rule, window_start, window_end))
}

/// Expand every event for the window.
///
/// Recurring events contribute their instances; one-off events are kept only
/// if they touch the window.
///
/// # Errors
///
/// Returns [`CalendarError::InvalidArgument`] when `window_start > window_end`.
pub fn expand_all(
    events: &[Event],
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> CalendarResult<Vec<Event>> {
    expand_all_with(events, window_start, window_end, None)
}

pub(crate) fn expand_all_with(
    events: &[Event],
    window_start: NaiveDate,
    window_end: NaiveDate,
    cache: Option<&ExpansionCache>,
) -> CalendarResult<Vec<Event>> {
    check_window(window_start, window_end)?;

    let mut instances = Vec::new();
    for event in events {
        if !event.expands() {
            if event.overlaps_days(window_start, window_end) {
                instances.push(event.clone());
            }
            continue;
        }
        match cache {
            Some(cache) => {
                let expanded = cache.expand(event, window_start, window_end)?;
                instances.extend(expanded.iter().cloned());
            }
            None => instances.extend(expand(event, window_start, window_end)?),
        }
    }

    tracing::debug!(
        "Expanded {} events into {} instances for {}..={}",
        events.len(),
        instances.len(),
        window_start,
        window_end
    );
    Ok(instances)
}

fn check_window(window_start: NaiveDate, window_end: NaiveDate) -> CalendarResult<()> {
    if window_start > window_end {
        return Err(CalendarError::InvalidArgument(format!(
            "Window start {} is after window end {}",
            window_start, window_end
        )));
    }
    Ok(())
}

fn expand_rule(
    base: &Event,
    rule: &RecurrenceRule,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Vec<Event> {
    if rule.interval < 1 {
        tracing::warn!(
            "Event {} has interval {}, using 1",
            base.id,
            rule.interval
        );
    }

    let anchor = base.start.date();
    let step = Step::for_rule(rule, anchor);
    let time_of_day = base.start.as_datetime().time();
    let duration = base.duration();

    let mut instances = Vec::new();
    let mut candidate = step.first_on_or_after(anchor, window_start);
    let mut steps = 0;

    while let Some(day) = candidate {
        if rule.end_date.is_some_and(|end| day > end) {
            break;
        }
        if rule
            .count
            .is_some_and(|count| instances.len() >= count as usize)
        {
            break;
        }
        if steps >= MAX_EXPANSION_STEPS {
            tracing::warn!(
                "Stopped expanding event {} after {} steps",
                base.id,
                MAX_EXPANSION_STEPS
            );
            break;
        }
        steps += 1;
        if day > window_end {
            break;
        }

        if rule.is_exception(day) {
            tracing::trace!("Skipping exception {} for event {}", day, base.id);
        } else {
            instances.push(instance(base, day, time_of_day, duration, instances.len()));
        }

        candidate = step.advance(day);
    }

    instances
}

fn instance(
    base: &Event,
    day: NaiveDate,
    time_of_day: NaiveTime,
    duration: TimeDelta,
    index: usize,
) -> Event {
    let start = day.and_time(time_of_day);
    let end = start.checked_add_signed(duration).unwrap_or(start);

    Event {
        id: format!("{}_{}", base.id, index),
        start: base.start.with_datetime(start),
        end: base.end.with_datetime(end),
        original_event_id: Some(base.id.clone()),
        ..base.clone()
    }
}

/// How far one step of a rule moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Days(u64),
    Months { months: u32, ordinal: Option<Ordinal> },
}

impl Step {
    fn for_rule(rule: &RecurrenceRule, anchor: NaiveDate) -> Self {
        let interval = rule.effective_interval();
        let ordinal = match rule.monthly_type {
            MonthlyType::Day => Some(Ordinal::of(anchor)),
            MonthlyType::Date => None,
        };

        match rule.pattern {
            RecurrencePattern::Daily | RecurrencePattern::Custom => Step::Days(u64::from(interval)),
            RecurrencePattern::Weekly => Step::Days(7 * u64::from(interval)),
            RecurrencePattern::Biweekly => Step::Days(14),
            RecurrencePattern::Monthly => Step::Months {
                months: interval,
                ordinal,
            },
            RecurrencePattern::Quarterly => Step::Months {
                months: interval.saturating_mul(3),
                ordinal,
            },
            RecurrencePattern::Yearly => Step::Months {
                months: interval.saturating_mul(12),
                ordinal: None,
            },
        }
    }

    /// Next candidate after `day`. Month steps clamp to the end of shorter
    /// months, and later steps continue from the clamped day.
    fn advance(&self, day: NaiveDate) -> Option<NaiveDate> {
        match self {
            Step::Days(days) => day.checked_add_days(Days::new(*days)),
            Step::Months {
                months,
                ordinal: None,
            } => day.checked_add_months(Months::new(*months)),
            Step::Months {
                months,
                ordinal: Some(ordinal),
            } => {
                let month = day
                    .with_day(1)?
                    .checked_add_months(Months::new(*months))?;
                ordinal.resolve(month.year(), month.month())
            }
        }
    }

    /// First aligned candidate on or after `window_start`, walking from `anchor`.
    fn first_on_or_after(&self, anchor: NaiveDate, window_start: NaiveDate) -> Option<NaiveDate> {
        if anchor >= window_start {
            return Some(anchor);
        }

        match self {
            Step::Days(days) => {
                let behind = u64::try_from((window_start - anchor).num_days()).ok()?;
                let steps = behind.div_ceil(*days);
                anchor.checked_add_days(Days::new(steps.checked_mul(*days)?))
            }
            Step::Months { .. } => {
                let mut day = anchor;
                while day < window_start {
                    day = self.advance(day)?;
                }
                Some(day)
            }
        }
    }
}

/// "The nth weekday of the month", taken from the base event's start day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ordinal {
    weekday: Weekday,
    /// 1..=4, or `None` for "last".
    nth: Option<u8>,
}

impl Ordinal {
    fn of(day: NaiveDate) -> Self {
        let nth = (day.day0() / 7 + 1) as u8;
        Self {
            weekday: day.weekday(),
            nth: (nth <= 4).then_some(nth),
        }
    }

    fn resolve(&self, year: i32, month: u32) -> Option<NaiveDate> {
        match self.nth {
            Some(n) => NaiveDate::from_weekday_of_month_opt(year, month, self.weekday, n),
            None => NaiveDate::from_weekday_of_month_opt(year, month, self.weekday, 5)
                .or_else(|| NaiveDate::from_weekday_of_month_opt(year, month, self.weekday, 4)),
        }
    }
}

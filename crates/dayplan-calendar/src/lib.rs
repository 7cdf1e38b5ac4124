//! Calendar engines for Dayplan.
//!
//! Expands recurring events into concrete instances and lays events out on a
//! week grid. Everything here is pure computation over event records handed in
//! by an external store.

pub mod cache;
pub mod day_key;
pub mod error;
pub mod layout;
pub mod recurrence;
pub mod source;
pub mod types;
pub mod week;

pub use cache::ExpansionCache;
pub use day_key::{bucket_by_day, day_key, parse_day_key};
pub use error::{CalendarError, CalendarResult};
pub use layout::{layout_events, layout_week};
pub use recurrence::{expand, expand_all, MAX_EXPANSION_STEPS};
pub use source::{week_view, EventSource};
pub use types::{
    Event, EventTime, MonthlyType, PositionedEvent, RecurrencePattern, RecurrenceRule,
};
pub use week::Week;

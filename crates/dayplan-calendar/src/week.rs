//! The seven visible days of a week view.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use crate::day_key::day_key;
use crate::error::{CalendarError, CalendarResult};

/// Seven consecutive days, plus the exclusive end boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Week {
    days: [NaiveDate; 7],
    end: NaiveDate,
}

impl Week {
    /// Week whose first column is `first_day`.
    pub fn starting(first_day: NaiveDate) -> CalendarResult<Self> {
        let mut days = [first_day; 7];
        for (offset, day) in (0u64..).zip(days.iter_mut()) {
            *day = add_days(first_day, offset)?;
        }
        let end = add_days(first_day, 7)?;
        Ok(Self { days, end })
    }

    /// Week containing `date`, with columns starting on `week_start`.
    pub fn containing(date: NaiveDate, week_start: Weekday) -> CalendarResult<Self> {
        let offset = (7 + date.weekday().num_days_from_sunday()
            - week_start.num_days_from_sunday())
            % 7;
        let first_day = date
            .checked_sub_days(Days::new(u64::from(offset)))
            .ok_or_else(|| out_of_range(date))?;
        Self::starting(first_day)
    }

    pub fn days(&self) -> &[NaiveDate; 7] {
        &self.days
    }

    pub fn first_day(&self) -> NaiveDate {
        self.days[0]
    }

    pub fn last_day(&self) -> NaiveDate {
        self.days[6]
    }

    /// Column of `date` in this week, if it is visible.
    pub fn day_index(&self, date: NaiveDate) -> Option<usize> {
        self.days.iter().position(|d| *d == date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.day_index(date).is_some()
    }

    /// Half-open `[first day 00:00, day after last 00:00)` range.
    pub fn bounds(&self) -> (NaiveDateTime, NaiveDateTime) {
        (
            self.first_day().and_time(NaiveTime::MIN),
            self.end.and_time(NaiveTime::MIN),
        )
    }

    pub fn day_keys(&self) -> Vec<String> {
        self.days.iter().map(|d| day_key(*d)).collect()
    }

    pub fn next(&self) -> CalendarResult<Self> {
        Self::starting(self.end)
    }

    pub fn previous(&self) -> CalendarResult<Self> {
        let first_day = self
            .first_day()
            .checked_sub_days(Days::new(7))
            .ok_or_else(|| out_of_range(self.first_day()))?;
        Self::starting(first_day)
    }
}

fn add_days(date: NaiveDate, days: u64) -> CalendarResult<NaiveDate> {
    date.checked_add_days(Days::new(days))
        .ok_or_else(|| out_of_range(date))
}

fn out_of_range(date: NaiveDate) -> CalendarError {
    CalendarError::InvalidArgument(format!("Week around {} is out of the supported range", date))
}

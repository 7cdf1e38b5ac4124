//! Calendar event records and the derived render types.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::day_key::DAY_KEY_FORMAT;

/// Calendar event as returned by the event store.
///
/// Generated recurrence instances share this shape; they carry
/// `original_event_id` pointing back at their base event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Time between start and end. Inverted ranges count as zero.
    pub fn duration(&self) -> TimeDelta {
        (self.end.as_datetime() - self.start.as_datetime()).max(TimeDelta::zero())
    }

    /// Whether this event should be expanded into instances.
    pub fn expands(&self) -> bool {
        self.is_recurring && self.recurrence.is_some()
    }

    /// Whether this is a generated instance rather than a stored base event.
    pub fn is_instance(&self) -> bool {
        self.original_event_id.is_some()
    }

    /// Last calendar day the event touches. An end exactly at midnight
    /// belongs to the previous day.
    pub fn last_day(&self) -> NaiveDate {
        let start = self.start.as_datetime();
        let end = self.end.as_datetime().max(start);
        exclusive_end_day(start, end)
    }

    /// Whether any day of the event falls inside `[first, last]`.
    pub fn overlaps_days(&self, first: NaiveDate, last: NaiveDate) -> bool {
        self.start.date() <= last && self.last_day() >= first
    }
}

/// Day an event ending at `end` visually ends on. Midnight ends are exclusive.
pub(crate) fn exclusive_end_day(start: NaiveDateTime, end: NaiveDateTime) -> NaiveDate {
    if end > start && end.time() == NaiveTime::MIN {
        end.date().pred_opt().unwrap_or(end.date()).max(start.date())
    } else {
        end.date()
    }
}

/// Event time - either a wall-clock datetime or an all-day date.
///
/// Times are floating (no zone); the store hands them out in the user's local
/// time. All-day ends are exclusive, so a one-day event runs `d .. d+1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTime {
    DateTime(NaiveDateTime),
    Date(NaiveDate),
}

impl EventTime {
    pub fn as_datetime(&self) -> NaiveDateTime {
        match self {
            EventTime::DateTime(dt) => *dt,
            EventTime::Date(d) => d.and_time(NaiveTime::MIN),
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            EventTime::DateTime(dt) => dt.date(),
            EventTime::Date(d) => *d,
        }
    }

    /// Replace the instant while keeping this value's variant.
    pub fn with_datetime(&self, dt: NaiveDateTime) -> EventTime {
        match self {
            EventTime::DateTime(_) => EventTime::DateTime(dt),
            EventTime::Date(_) => EventTime::Date(dt.date()),
        }
    }

    pub fn is_date_only(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }
}

/// How often a recurring event repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
    /// No custom payload exists yet; advances like `Daily`.
    Custom,
}

impl RecurrencePattern {
    /// Parse a stored pattern name. Unknown names fall back to `Custom`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "daily" => Self::Daily,
            "weekly" => Self::Weekly,
            "biweekly" => Self::Biweekly,
            "monthly" => Self::Monthly,
            "quarterly" => Self::Quarterly,
            "yearly" => Self::Yearly,
            "custom" => Self::Custom,
            other => {
                tracing::warn!("Unknown recurrence pattern '{}', treating as custom", other);
                Self::Custom
            }
        }
    }
}

impl<'de> Deserialize<'de> for RecurrencePattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Which day a monthly/quarterly rule lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthlyType {
    /// Same day of month as the base event.
    #[default]
    Date,
    /// Same ordinal weekday as the base event ("3rd Monday").
    Day,
}

impl MonthlyType {
    /// Parse a stored monthly type. Unknown names fall back to `Date`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "date" => Self::Date,
            "day" => Self::Day,
            other => {
                tracing::warn!("Unknown monthly type '{}', treating as date", other);
                Self::Date
            }
        }
    }
}

impl<'de> Deserialize<'de> for MonthlyType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Recurrence rule attached to a base event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    pub pattern: RecurrencePattern,
    #[serde(default = "default_interval")]
    pub interval: i64,
    /// Inclusive bound on instance start days. Stored timestamps keep their date part.
    #[serde(
        default,
        deserialize_with = "deserialize_end_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    /// Weekday indices, 0 = Sunday. Stored for the editor; expansion ignores it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days_of_week: Vec<u8>,
    #[serde(default)]
    pub monthly_type: MonthlyType,
    /// ISO dates (`YYYY-MM-DD`, optionally with a time part) to skip.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exceptions: Vec<String>,
}

fn default_interval() -> i64 {
    1
}

/// Date part of a stored ISO string (`2024-06-30` or `2024-06-30T00:00:00.000Z`).
fn date_part(raw: &str) -> &str {
    raw.trim().split('T').next().unwrap_or_default()
}

fn deserialize_end_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| {
        match NaiveDate::parse_from_str(date_part(&raw), DAY_KEY_FORMAT) {
            Ok(date) => Some(date),
            Err(_) => {
                tracing::warn!("Unparseable recurrence endDate '{}', ignoring it", raw);
                None
            }
        }
    }))
}

impl RecurrenceRule {
    pub fn new(pattern: RecurrencePattern, interval: i64) -> Self {
        Self {
            pattern,
            interval,
            end_date: None,
            count: None,
            days_of_week: Vec::new(),
            monthly_type: MonthlyType::Date,
            exceptions: Vec::new(),
        }
    }

    /// Interval clamped to at least 1.
    pub fn effective_interval(&self) -> u32 {
        if self.interval < 1 {
            return 1;
        }
        u32::try_from(self.interval).unwrap_or(u32::MAX)
    }

    /// Whether `day` is listed in `exceptions`. Time parts are ignored.
    pub fn is_exception(&self, day: NaiveDate) -> bool {
        let key = crate::day_key::day_key(day);
        self.exceptions
            .iter()
            .any(|raw| date_part(raw) == key)
    }
}

/// An event placed on the week grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedEvent {
    /// The event clipped to the week.
    pub event: Event,
    /// Column of the clipped start day, 0..=6.
    pub day_index: usize,
    /// Number of day columns covered, 1..=7.
    pub column_span: usize,
    /// Stacking row; the UI multiplies it by its row height.
    pub vertical_slot: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_event_from_store_json() {
        let json = r#"{
            "id": "e1",
            "title": "Standup",
            "start": "2024-06-03T09:00:00",
            "end": "2024-06-03T09:15:00",
            "isRecurring": true,
            "recurrence": {"pattern": "weekly", "interval": 1, "exceptions": ["2024-06-10"]}
        }"#;

        let event: Event = serde_json::from_str(json).unwrap();

        assert_eq!(event.id, "e1");
        assert!(event.expands());
        assert!(!event.is_instance());
        assert_eq!(event.duration(), TimeDelta::minutes(15));
        let rule = event.recurrence.unwrap();
        assert_eq!(rule.pattern, RecurrencePattern::Weekly);
        assert_eq!(rule.monthly_type, MonthlyType::Date);
        assert!(rule.is_exception(date(2024, 6, 10)));
    }

    #[test]
    fn test_all_day_event_parses_as_date() {
        let json = r#"{
            "id": "holiday",
            "start": "2024-02-01",
            "end": "2024-02-02",
            "allDay": true
        }"#;

        let event: Event = serde_json::from_str(json).unwrap();

        assert!(event.all_day);
        assert!(event.start.is_date_only());
        assert_eq!(event.last_day(), date(2024, 2, 1));
        assert_eq!(event.duration(), TimeDelta::days(1));
    }

    #[test]
    fn test_unknown_pattern_falls_back_to_custom() {
        let rule: RecurrenceRule =
            serde_json::from_str(r#"{"pattern": "fortnightly-ish"}"#).unwrap();
        assert_eq!(rule.pattern, RecurrencePattern::Custom);
        assert_eq!(rule.interval, 1);
    }

    #[test]
    fn test_end_date_accepts_stored_timestamp() {
        let rule: RecurrenceRule = serde_json::from_str(
            r#"{"pattern": "daily", "endDate": "2024-06-30T00:00:00.000Z"}"#,
        )
        .unwrap();
        assert_eq!(rule.end_date, Some(date(2024, 6, 30)));

        let rule: RecurrenceRule =
            serde_json::from_str(r#"{"pattern": "daily", "endDate": "2024-06-30"}"#).unwrap();
        assert_eq!(rule.end_date, Some(date(2024, 6, 30)));
    }

    #[test]
    fn test_unparseable_end_date_is_dropped() {
        let rule: RecurrenceRule =
            serde_json::from_str(r#"{"pattern": "daily", "endDate": "someday"}"#).unwrap();
        assert_eq!(rule.end_date, None);

        let rule: RecurrenceRule =
            serde_json::from_str(r#"{"pattern": "daily", "endDate": null}"#).unwrap();
        assert_eq!(rule.end_date, None);
    }

    #[test]
    fn test_unknown_monthly_type_falls_back_to_date() {
        let rule: RecurrenceRule =
            serde_json::from_str(r#"{"pattern": "monthly", "monthlyType": "weekday"}"#).unwrap();
        assert_eq!(rule.monthly_type, MonthlyType::Date);

        let rule: RecurrenceRule =
            serde_json::from_str(r#"{"pattern": "monthly", "monthlyType": "Day"}"#).unwrap();
        assert_eq!(rule.monthly_type, MonthlyType::Day);
    }

    #[test]
    fn test_one_bad_rule_does_not_reject_the_list() {
        let json = r#"[
            {"id": "a", "start": "2024-06-03T09:00:00", "end": "2024-06-03T10:00:00"},
            {
                "id": "b",
                "start": "2024-06-03T09:00:00",
                "end": "2024-06-03T10:00:00",
                "isRecurring": true,
                "recurrence": {
                    "pattern": "monthly",
                    "monthlyType": "weekday",
                    "endDate": "2024-12-31T23:59:59.000Z"
                }
            }
        ]"#;

        let events: Vec<Event> = serde_json::from_str(json).unwrap();

        assert_eq!(events.len(), 2);
        let rule = events[1].recurrence.as_ref().unwrap();
        assert_eq!(rule.end_date, Some(date(2024, 12, 31)));
        assert_eq!(rule.monthly_type, MonthlyType::Date);
    }

    #[test]
    fn test_effective_interval_clamps() {
        let mut rule = RecurrenceRule::new(RecurrencePattern::Daily, 0);
        assert_eq!(rule.effective_interval(), 1);
        rule.interval = -4;
        assert_eq!(rule.effective_interval(), 1);
        rule.interval = 3;
        assert_eq!(rule.effective_interval(), 3);
    }

    #[test]
    fn test_exception_ignores_time_part() {
        let mut rule = RecurrenceRule::new(RecurrencePattern::Daily, 1);
        rule.exceptions = vec!["2024-06-03T00:00:00.000Z".to_string(), "garbage".to_string()];
        assert!(rule.is_exception(date(2024, 6, 3)));
        assert!(!rule.is_exception(date(2024, 6, 4)));
    }

    #[test]
    fn test_midnight_end_belongs_to_previous_day() {
        let event = Event {
            id: "late".into(),
            calendar_id: None,
            title: String::new(),
            description: None,
            location: None,
            start: EventTime::DateTime(date(2024, 6, 3).and_hms_opt(22, 0, 0).unwrap()),
            end: EventTime::DateTime(date(2024, 6, 4).and_hms_opt(0, 0, 0).unwrap()),
            all_day: false,
            is_recurring: false,
            recurrence: None,
            original_event_id: None,
            updated_at: None,
        };
        assert_eq!(event.last_day(), date(2024, 6, 3));
        assert!(event.overlaps_days(date(2024, 6, 3), date(2024, 6, 3)));
        assert!(!event.overlaps_days(date(2024, 6, 4), date(2024, 6, 10)));
    }

    #[test]
    fn test_with_datetime_keeps_variant() {
        let dt = date(2024, 6, 8).and_hms_opt(9, 30, 0).unwrap();
        assert_eq!(
            EventTime::Date(date(2024, 6, 1)).with_datetime(dt),
            EventTime::Date(date(2024, 6, 8))
        );
        assert_eq!(
            EventTime::DateTime(dt).with_datetime(dt),
            EventTime::DateTime(dt)
        );
    }
}

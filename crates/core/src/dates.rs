//! Event-time parsing and the calendar-day window.
//!
//! Event times arrive as free text from an attribute field. Parsing tries a
//! fixed list of formats in order and never fails loudly: anything that does
//! not match is reported as [`EventTime::Unparsable`].

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// `mm-dd-yyyy hh:mm`, the format the CRM form writes.
static CRM_EVENT_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2})-(\d{2})-(\d{4})\s+(\d{2}):(\d{2})$").expect("valid event time regex")
});

/// ISO layouts tried after RFC 3339, most specific first.
const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Result of parsing an event-time field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTime {
    Parsed(NaiveDateTime),
    Missing,
    Unparsable,
}

impl EventTime {
    /// Calendar day of the event, if it parsed.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Parsed(dt) => Some(dt.date()),
            Self::Missing | Self::Unparsable => None,
        }
    }
}

/// Parse an event-time string.
///
/// Offsets in RFC 3339 values are kept as wall-clock time: the calendar day
/// is the one written in the value, not the one in the local time zone.
pub fn parse_event_time(raw: &str) -> EventTime {
    let raw = raw.trim();
    if raw.is_empty() {
        return EventTime::Missing;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return EventTime::Parsed(dt.naive_local());
    }

    for format in ISO_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return EventTime::Parsed(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return EventTime::Parsed(dt);
        }
    }

    parse_crm_event_time(raw).map_or(EventTime::Unparsable, EventTime::Parsed)
}

fn parse_crm_event_time(raw: &str) -> Option<NaiveDateTime> {
    let caps = CRM_EVENT_TIME.captures(raw)?;
    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let month = field(1)?;
    let day = field(2)?;
    let year = i32::try_from(field(3)?).ok()?;
    let hour = field(4)?;
    let minute = field(5)?;

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)
}

/// One calendar-day column of the aggregation window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateColumn {
    pub date: NaiveDate,
    /// Short `dd/MM` label
    pub label: String,
}

impl DateColumn {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            label: date.format("%d/%m").to_string(),
            date,
        }
    }
}

/// The `days` calendar days ending with `today`, oldest first.
pub fn trailing_days(today: NaiveDate, days: u32) -> Vec<DateColumn> {
    (0..i64::from(days.max(1)))
        .rev()
        .map(|offset| DateColumn::new(today - Duration::days(offset)))
        .collect()
}

/// `today` as a single column.
pub fn today_only(today: NaiveDate) -> Vec<DateColumn> {
    vec![DateColumn::new(today)]
}

/// Dashboard view: the trailing week or today alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Week,
    Day,
}

impl ViewMode {
    /// Date columns for this view, ending at `today`.
    pub fn columns(&self, today: NaiveDate, window_days: u32) -> Vec<DateColumn> {
        match self {
            Self::Week => trailing_days(today, window_days),
            Self::Day => today_only(today),
        }
    }
}

//! Test fixtures: CRM rows and dates.

use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};

/// The day every dashboard test treats as today.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

/// `today` shifted by `days`.
pub fn day_offset(days: i64) -> NaiveDate {
    today() + Duration::days(days)
}

/// Event time in the CRM form layout, `mm-dd-yyyy hh:mm`.
pub fn event_time(date: NaiveDate, hour: u32, minute: u32) -> String {
    format!("{} {:02}:{:02}", date.format("%m-%d-%Y"), hour, minute)
}

pub fn user(id: &str, first: &str, last: &str) -> Value {
    json!({ "id": id, "firstName": first, "lastName": last })
}

pub fn deal(id: &str, owner: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Deal {}", id),
        "owner": owner,
        "cdate": "2025-03-08T10:00:00-05:00"
    })
}

/// Attribute listing with the default field keys.
pub fn attributes(event_time: &str, country: &str, program: &str, eligibility: &str) -> Value {
    json!({
        "dealCustomFieldData": [
            { "customFieldId": 15, "fieldValue": event_time },
            { "customFieldId": 53, "fieldValue": country },
            { "customFieldId": 52, "fieldValue": program },
            { "customFieldId": 6, "fieldValue": eligibility }
        ]
    })
}

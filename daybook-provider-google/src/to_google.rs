use chrono::{Local, NaiveDateTime, TimeZone};
use daybook_core::calendar::{EventStatus, EventTime, ExternalEvent};

use crate::types::{GoogleEvent, GoogleEventTime};

/// Wall-clock times with a named zone are sent without an offset and let
/// Google resolve them; without a zone the system offset is used.
fn to_google_time(time: &EventTime) -> GoogleEventTime {
    match time {
        EventTime::Date(date) => GoogleEventTime {
            date: Some(*date),
            ..Default::default()
        },
        EventTime::DateTime {
            local,
            time_zone: Some(zone),
        } => GoogleEventTime {
            date_time: Some(local.format("%Y-%m-%dT%H:%M:%S").to_string()),
            time_zone: Some(zone.clone()),
            ..Default::default()
        },
        EventTime::DateTime { local, time_zone: None } => GoogleEventTime {
            date_time: Some(with_local_offset(local)),
            ..Default::default()
        },
    }
}

fn with_local_offset(local: &NaiveDateTime) -> String {
    match Local.from_local_datetime(local).earliest() {
        Some(dt) => dt.to_rfc3339(),
        // Inside a DST gap: the wall clock does not exist locally.
        None => local.and_utc().to_rfc3339(),
    }
}

fn to_google_status(status: &EventStatus) -> &'static str {
    match status {
        EventStatus::Confirmed => "confirmed",
        EventStatus::Tentative => "tentative",
        EventStatus::Cancelled => "cancelled",
    }
}

pub fn to_google_event(event: &ExternalEvent) -> GoogleEvent {
    GoogleEvent {
        id: event.id.clone(),
        status: Some(to_google_status(&event.status).to_string()),
        summary: Some(event.summary.clone()),
        description: event.description.clone(),
        start: Some(to_google_time(&event.start)),
        end: Some(to_google_time(&event.end)),
        recurrence: event.recurrence.clone(),
        color_id: event.color_id.clone(),
    }
}

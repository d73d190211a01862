use anyhow::{Context, Result, bail};
use chrono::DateTime;
use daybook_core::calendar::{EventStatus, EventTime, ExternalEvent};

use crate::types::{GoogleEvent, GoogleEventTime};

fn from_google_time(time: &GoogleEventTime) -> Result<EventTime> {
    if let Some(date_time) = &time.date_time {
        let parsed = DateTime::parse_from_rfc3339(date_time)
            .with_context(|| format!("Invalid dateTime '{}'", date_time))?;
        Ok(EventTime::DateTime {
            local: parsed.naive_local(),
            time_zone: time.time_zone.clone(),
        })
    } else if let Some(date) = time.date {
        Ok(EventTime::Date(date))
    } else {
        bail!("Event time has neither date nor dateTime");
    }
}

fn from_google_status(status: Option<&str>) -> EventStatus {
    match status {
        Some("tentative") => EventStatus::Tentative,
        Some("cancelled") => EventStatus::Cancelled,
        _ => EventStatus::Confirmed,
    }
}

pub fn from_google_event(event: GoogleEvent) -> Result<ExternalEvent> {
    let start = event.start.as_ref().context("Event has no start time")?;
    let end = event.end.as_ref().context("Event has no end time")?;

    Ok(ExternalEvent {
        start: from_google_time(start)?,
        end: from_google_time(end)?,
        status: from_google_status(event.status.as_deref()),
        id: event.id,
        summary: event.summary.unwrap_or_default(),
        description: event.description.filter(|d| !d.is_empty()),
        recurrence: event.recurrence,
        color_id: event.color_id,
    })
}

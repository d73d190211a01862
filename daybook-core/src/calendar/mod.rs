//! External calendar seam.
//!
//! Providers (see `daybook-provider-google`) convert their API payloads into
//! these provider-neutral types; sync works exclusively with them.

mod convert;
mod token;

pub use convert::{DedupKey, color_for_id, event_to_draft, id_for_color, task_to_event};
pub use token::OAuthTokens;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DaybookResult;

/// A calendar event (provider-neutral).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalEvent {
    /// Provider-assigned id; empty for events that have not been created yet.
    pub id: String,
    pub summary: String,
    pub description: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    /// RRULE lines for recurring events.
    pub recurrence: Vec<String>,
    pub color_id: Option<String>,
    pub status: EventStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventTime {
    /// All-day; the end of an all-day event is exclusive.
    Date(NaiveDate),
    /// Wall-clock time in `time_zone` (or the calendar's zone when `None`).
    DateTime {
        local: NaiveDateTime,
        time_zone: Option<String>,
    },
}

impl EventTime {
    pub fn date(&self) -> NaiveDate {
        match self {
            EventTime::Date(d) => *d,
            EventTime::DateTime { local, .. } => local.date(),
        }
    }

    pub fn clock(&self) -> Option<String> {
        match self {
            EventTime::Date(_) => None,
            EventTime::DateTime { local, .. } => Some(crate::dates::clock(local.time())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    Confirmed,
    Tentative,
    Cancelled,
}

/// A calendar the account can write to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalCalendar {
    pub id: String,
    pub name: String,
    pub primary: bool,
}

/// Operations the scheduler needs from a calendar provider.
#[async_trait]
pub trait CalendarApi: Send + Sync {
    async fn list_calendars(&self) -> DaybookResult<Vec<ExternalCalendar>>;

    async fn list_events(
        &self,
        calendar_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DaybookResult<Vec<ExternalEvent>>;

    /// Create an event and return it with the provider-assigned id.
    async fn create_event(&self, calendar_id: &str, event: &ExternalEvent) -> DaybookResult<ExternalEvent>;

    async fn update_event(&self, calendar_id: &str, event: &ExternalEvent) -> DaybookResult<ExternalEvent>;

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> DaybookResult<()>;
}

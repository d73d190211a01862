//! Calendar v3 REST calls behind the [`CalendarApi`] seam.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use daybook_core::calendar::{CalendarApi, EventStatus, ExternalCalendar, ExternalEvent};
use daybook_core::error::{DaybookError, DaybookResult};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::from_google::from_google_event;
use crate::session::GoogleSession;
use crate::to_google::to_google_event;
use crate::types::{CalendarList, EventList, GoogleEvent};

const API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Maximum page size Google accepts for event listings.
const PAGE_SIZE: &str = "2500";

pub struct GoogleCalendar {
    session: GoogleSession,
}

impl GoogleCalendar {
    pub fn new(session: GoogleSession) -> Self {
        GoogleCalendar { session }
    }

    pub fn session(&self) -> &GoogleSession {
        &self.session
    }

    fn url(segments: &[&str]) -> DaybookResult<Url> {
        let mut url = Url::parse(API_BASE).map_err(|e| DaybookError::Calendar(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| DaybookError::Calendar("API base cannot take a path".into()))?
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url, body: Option<&GoogleEvent>) -> DaybookResult<reqwest::Response> {
        let token = self.session.access_token().await?;
        let what = format!("{} {}", method, url.path());

        let mut request = self.session.http().request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| DaybookError::Calendar(format!("{}: {}", what, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        Err(classify_error(status, &what, &text))
    }

    async fn json<T: DeserializeOwned>(response: reqwest::Response) -> DaybookResult<T> {
        response
            .json()
            .await
            .map_err(|e| DaybookError::Calendar(format!("Unexpected response from Google: {}", e)))
    }
}

fn classify_error(status: StatusCode, what: &str, body: &str) -> DaybookError {
    if status == StatusCode::UNAUTHORIZED {
        return DaybookError::CalendarAuthExpired;
    }
    DaybookError::Calendar(format!("{} failed ({}): {}", what, status, body.trim()))
}

fn to_event(google: GoogleEvent) -> DaybookResult<ExternalEvent> {
    from_google_event(google).map_err(|e| DaybookError::Calendar(format!("{:#}", e)))
}

#[async_trait]
impl CalendarApi for GoogleCalendar {
    async fn list_calendars(&self) -> DaybookResult<Vec<ExternalCalendar>> {
        let mut calendars = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = Self::url(&["users", "me", "calendarList"])?;
            url.query_pairs_mut().append_pair("minAccessRole", "writer");
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }

            let page: CalendarList = Self::json(self.send(Method::GET, url, None).await?).await?;
            calendars.extend(page.items.into_iter().map(|entry| ExternalCalendar {
                name: entry.summary_override.unwrap_or(entry.summary),
                id: entry.id,
                primary: entry.primary,
            }));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(calendars)
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DaybookResult<Vec<ExternalEvent>> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = Self::url(&["calendars", calendar_id, "events"])?;
            url.query_pairs_mut()
                .append_pair("timeMin", &from.to_rfc3339_opts(SecondsFormat::Secs, true))
                .append_pair("timeMax", &to.to_rfc3339_opts(SecondsFormat::Secs, true))
                .append_pair("singleEvents", "true")
                .append_pair("orderBy", "startTime")
                .append_pair("maxResults", PAGE_SIZE);
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }

            let page: EventList = Self::json(self.send(Method::GET, url, None).await?).await?;
            for google in page.items {
                let id = google.id.clone();
                match to_event(google) {
                    Ok(event) if event.status != EventStatus::Cancelled => events.push(event),
                    Ok(_) => {}
                    Err(e) => tracing::warn!(event_id = %id, error = %e, "skipping unreadable event"),
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(calendar_id = %calendar_id, count = events.len(), "listed events");
        Ok(events)
    }

    async fn create_event(&self, calendar_id: &str, event: &ExternalEvent) -> DaybookResult<ExternalEvent> {
        let mut google = to_google_event(event);
        google.id = String::new(); // Let Google assign the ID

        let url = Self::url(&["calendars", calendar_id, "events"])?;
        let created: GoogleEvent = Self::json(self.send(Method::POST, url, Some(&google)).await?).await?;
        to_event(created)
    }

    async fn update_event(&self, calendar_id: &str, event: &ExternalEvent) -> DaybookResult<ExternalEvent> {
        let google = to_google_event(event);

        let url = Self::url(&["calendars", calendar_id, "events", &event.id])?;
        let updated: GoogleEvent = Self::json(self.send(Method::PUT, url, Some(&google)).await?).await?;
        to_event(updated)
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> DaybookResult<()> {
        let url = Self::url(&["calendars", calendar_id, "events", event_id])?;
        match self.send(Method::DELETE, url, None).await {
            Ok(_) => Ok(()),
            // Already gone
            Err(DaybookError::Calendar(msg)) if msg.contains("(404") || msg.contains("(410") => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_ids_are_escaped() {
        let url = GoogleCalendar::url(&["calendars", "team@group.calendar.google.com", "events", "a/b"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/calendar/v3/calendars/team@group.calendar.google.com/events/a%2Fb"
        );
    }

    #[test]
    fn test_classify_error() {
        assert!(classify_error(StatusCode::UNAUTHORIZED, "GET /x", "").is_auth_failure());

        let gone = classify_error(StatusCode::GONE, "DELETE /x", "{}");
        assert!(gone.to_string().contains("(410"));
        assert!(!gone.is_auth_failure());
    }
}

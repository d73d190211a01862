//! Wiring shared by every command: config, local store, mirror, scheduler.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use chrono_tz::Tz;
use daybook_core::activity::StoreActivityLog;
use daybook_core::dates::{self, date_key, parse_date_key, shift};
use daybook_core::mirror::MirrorHandle;
use daybook_core::remote::RestStore;
use daybook_core::settings::AppConfig;
use daybook_core::store::{FileStore, LocalStore};
use daybook_core::task::{Profile, Task};
use daybook_core::Scheduler;
use daybook_provider_google::{DEFAULT_CALENDAR_ID, GoogleCalendar, GoogleCredentials, GoogleSession};

pub struct App {
    pub config: AppConfig,
    pub store: LocalStore,
    pub scheduler: Scheduler,
    tz: Option<Tz>,
}

impl App {
    pub fn open() -> Result<Self> {
        let config = AppConfig::load()?;
        let tz = config.tz()?;

        let data_dir = config.data_path();
        let file_store = FileStore::open(&data_dir)
            .with_context(|| format!("Failed to open data directory {}", data_dir.display()))?;
        let store = LocalStore::new(Arc::new(file_store));

        let mirror = match &config.remote {
            Some(remote) => {
                let rest = RestStore::new(remote);
                let user_id = rest.user_id().map(str::to_string);
                tracing::debug!(url = %remote.url, "mirroring changes to remote store");
                MirrorHandle::spawn(Arc::new(rest), config.retry_policy(), user_id)
            }
            None => MirrorHandle::disabled(),
        };

        let activity = Arc::new(StoreActivityLog::new(store.clone()));
        let scheduler = Scheduler::new(store.clone(), activity, mirror);

        Ok(App {
            config,
            store,
            scheduler,
            tz,
        })
    }

    pub fn today(&self) -> NaiveDate {
        dates::today(self.tz)
    }

    /// Zone stamped on timed calendar events: the sync preference, then the
    /// configured zone.
    pub fn sync_time_zone(&self) -> Option<String> {
        self.scheduler
            .preferences()
            .sync
            .time_zone
            .or_else(|| self.config.time_zone.clone())
    }

    /// Calendar to sync with: the sync preference, then `[google]
    /// calendar_id`, then the account's primary calendar.
    pub fn calendar_id(&self) -> String {
        self.scheduler
            .preferences()
            .sync
            .calendar_id
            .or_else(|| self.config.google.as_ref().map(|g| g.calendar_id.clone()))
            .unwrap_or_else(|| DEFAULT_CALENDAR_ID.to_string())
    }

    pub fn google_session(&self) -> Result<GoogleSession> {
        let google = self.config.google.as_ref().with_context(|| {
            let path = AppConfig::config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "the config file".to_string());
            format!("Google is not configured. Add client_id and client_secret under [google] in {}", path)
        })?;
        let credentials = GoogleCredentials {
            client_id: google.client_id.clone(),
            client_secret: google.client_secret.clone(),
        };
        Ok(GoogleSession::new(credentials, self.store.clone()))
    }

    /// Connected Google calendar client; fails when the account was never
    /// connected.
    pub async fn google_calendar(&self) -> Result<GoogleCalendar> {
        let session = self.google_session()?;
        if !session.is_connected().await {
            anyhow::bail!("Google Calendar is not connected. Run `daybook auth google` first");
        }
        Ok(GoogleCalendar::new(session))
    }

    /// Accepts `YYYY-MM-DD`, `today`, `tomorrow`, `yesterday`, or a day
    /// offset like `+3` / `-1`.
    pub fn parse_day(&self, input: &str) -> Result<NaiveDate> {
        let today = self.today();
        let day = match input.trim().to_ascii_lowercase().as_str() {
            "today" => today,
            "tomorrow" => shift(today, 1),
            "yesterday" => shift(today, -1),
            other if other.starts_with('+') || other.starts_with('-') => {
                let days: i64 = other
                    .parse()
                    .with_context(|| format!("Invalid day offset '{}'", input))?;
                shift(today, days)
            }
            other => parse_date_key(other)?,
        };
        Ok(day)
    }

    pub fn parse_day_key(&self, input: &str) -> Result<String> {
        Ok(date_key(self.parse_day(input)?))
    }

    /// Find a task by full id or unique id prefix.
    pub fn find_task(&self, reference: &str) -> Result<Task> {
        let matches: Vec<Task> = self
            .scheduler
            .tasks()
            .into_iter()
            .filter(|t| t.id.starts_with(reference))
            .collect();

        match matches.as_slice() {
            [] => anyhow::bail!("No task matches '{}'", reference),
            [task] => Ok(task.clone()),
            many => anyhow::bail!("'{}' matches {} tasks; use a longer prefix", reference, many.len()),
        }
    }

    /// Find a profile by id, id prefix or case-insensitive name.
    pub fn find_profile(&self, reference: &str) -> Result<Profile> {
        let profiles = self.scheduler.profiles();
        profiles
            .iter()
            .find(|p| p.id == reference || p.name.eq_ignore_ascii_case(reference))
            .or_else(|| {
                let mut prefixed = profiles.iter().filter(|p| p.id.starts_with(reference));
                match (prefixed.next(), prefixed.next()) {
                    (Some(one), None) => Some(one),
                    _ => None,
                }
            })
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No profile matches '{}'", reference))
    }
}

//! Two-way reconciliation between tasks and an external calendar.
//!
//! A pass runs three steps in order:
//! 1. profile backfill: calendar-linked tasks get the configured import
//!    profile;
//! 2. outbound push: dated tasks are created or updated as events;
//! 3. inbound pull (two-way only): events in the sync window that no task
//!    knows about are linked to a matching task or imported.
//!
//! Per-item failures are collected into the report and the pass carries on.
//! An authorization failure aborts the whole pass.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::calendar::{CalendarApi, DedupKey, EventStatus, event_to_draft, task_to_event};
use crate::constants::{BACKGROUND_SYNC_INTERVAL, SYNC_DAYS_BACK, SYNC_DAYS_FORWARD};
use crate::dates::shift;
use crate::error::{DaybookError, DaybookResult};
use crate::scheduler::Scheduler;
use crate::task::{Task, TaskPatch};

/// Sync options, stored with the user's preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    /// Also import calendar events as tasks.
    pub two_way_sync: bool,
    /// Push every dated task.
    pub sync_all_tasks: bool,
    /// Push only dated tasks with a time slot. Ignored with `sync_all_tasks`.
    pub sync_time_blocked_only: bool,
    /// Profile that imported events are filed under.
    pub import_profile_id: Option<String>,
    /// Calendar to sync with; the account's primary calendar when unset.
    pub calendar_id: Option<String>,
    /// Zone stamped on timed events.
    pub time_zone: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            two_way_sync: true,
            sync_all_tasks: false,
            sync_time_blocked_only: true,
            import_profile_id: None,
            calendar_id: None,
            time_zone: None,
        }
    }
}

impl SyncConfig {
    /// Whether `task` is pushed to the calendar.
    pub fn should_push(&self, task: &Task) -> bool {
        if task.date.is_none() {
            return false;
        }
        self.sync_all_tasks || !self.sync_time_blocked_only || task.time_slot.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub imported: usize,
    pub linked: usize,
    pub backfilled: usize,
    pub errors: Vec<String>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run one full reconciliation pass against `calendar_id`.
///
/// Returns `Err` only when the calendar rejects our authorization; every
/// other failure ends up in [`SyncReport::errors`].
pub async fn full_sync(
    scheduler: &Scheduler,
    api: &dyn CalendarApi,
    calendar_id: &str,
    config: &SyncConfig,
    today: NaiveDate,
) -> DaybookResult<SyncReport> {
    let mut report = SyncReport::default();

    tracing::info!(calendar_id = %calendar_id, two_way = config.two_way_sync, "starting full sync");

    backfill_profiles(scheduler, config, &mut report);
    push(scheduler, api, calendar_id, config, &mut report).await?;
    if config.two_way_sync {
        pull(scheduler, api, calendar_id, config, today, &mut report).await?;
    }

    if let Err(e) = scheduler.store().save_last_sync(Utc::now()) {
        tracing::warn!(error = %e, "failed to record sync time");
    }

    tracing::info!(
        created = report.created,
        updated = report.updated,
        imported = report.imported,
        linked = report.linked,
        backfilled = report.backfilled,
        errors = report.errors.len(),
        "full sync finished"
    );
    Ok(report)
}

fn backfill_profiles(scheduler: &Scheduler, config: &SyncConfig, report: &mut SyncReport) {
    let Some(profile) = config.import_profile_id.as_deref() else {
        return;
    };

    let stale: Vec<String> = scheduler
        .tasks()
        .into_iter()
        .filter(|t| t.is_external() && t.project_id.as_deref() != Some(profile))
        .map(|t| t.id)
        .collect();

    for id in stale {
        scheduler.update_task(
            &id,
            TaskPatch {
                project_id: Some(Some(profile.to_string())),
                ..Default::default()
            },
        );
        report.backfilled += 1;
    }
}

/// Record a per-item failure, or abort the pass on an auth failure.
fn record_failure(report: &mut SyncReport, what: String, error: DaybookError) -> DaybookResult<()> {
    if error.is_auth_failure() {
        tracing::warn!(error = %error, "calendar authorization failed; aborting sync");
        return Err(error);
    }
    tracing::warn!(error = %error, "{}", what);
    report.errors.push(format!("{}: {}", what, error));
    Ok(())
}

async fn push(
    scheduler: &Scheduler,
    api: &dyn CalendarApi,
    calendar_id: &str,
    config: &SyncConfig,
    report: &mut SyncReport,
) -> DaybookResult<()> {
    let outbound: Vec<Task> = scheduler
        .tasks()
        .into_iter()
        .filter(|t| config.should_push(t))
        .collect();

    for task in outbound {
        let Some(event) = task_to_event(&task, config.time_zone.as_deref()) else {
            report.errors.push(format!("\"{}\" has an unreadable date", task.title));
            continue;
        };

        if task.is_external() {
            match api.update_event(calendar_id, &event).await {
                Ok(_) => report.updated += 1,
                Err(e) => record_failure(report, format!("update \"{}\"", task.title), e)?,
            }
        } else {
            match api.create_event(calendar_id, &event).await {
                Ok(created) => {
                    tracing::debug!(task_id = %task.id, event_id = %created.id, "event created");
                    scheduler.update_task(
                        &task.id,
                        TaskPatch {
                            external_event_id: Some(Some(created.id)),
                            ..Default::default()
                        },
                    );
                    report.created += 1;
                }
                Err(e) => record_failure(report, format!("create \"{}\"", task.title), e)?,
            }
        }
    }
    Ok(())
}

async fn pull(
    scheduler: &Scheduler,
    api: &dyn CalendarApi,
    calendar_id: &str,
    config: &SyncConfig,
    today: NaiveDate,
    report: &mut SyncReport,
) -> DaybookResult<()> {
    let from = shift(today, -SYNC_DAYS_BACK).and_time(NaiveTime::MIN).and_utc();
    let to = shift(today, SYNC_DAYS_FORWARD + 1).and_time(NaiveTime::MIN).and_utc();

    let events = match api.list_events(calendar_id, from, to).await {
        Ok(events) => events,
        Err(e) => return record_failure(report, "list events".to_string(), e),
    };

    let tasks = scheduler.tasks();
    let mut known: HashSet<String> = tasks.iter().filter_map(|t| t.external_event_id.clone()).collect();
    let mut unlinked: HashMap<DedupKey, String> = tasks
        .iter()
        .filter(|t| !t.is_external())
        .filter_map(|t| DedupKey::for_task(t).map(|key| (key, t.id.clone())))
        .collect();

    for event in events {
        if event.status == EventStatus::Cancelled || event.id.is_empty() || known.contains(&event.id) {
            continue;
        }

        let key = DedupKey::for_event(&event);
        if let Some(task_id) = unlinked.remove(&key) {
            tracing::debug!(task_id = %task_id, event_id = %event.id, "linked event to existing task");
            scheduler.update_task(
                &task_id,
                TaskPatch {
                    external_event_id: Some(Some(event.id.clone())),
                    ..Default::default()
                },
            );
            report.linked += 1;
        } else {
            let draft = event_to_draft(&event, config.import_profile_id.as_deref());
            let task = scheduler.add_task(draft);
            tracing::debug!(task_id = %task.id, event_id = %event.id, "imported event");
            report.imported += 1;
        }
        known.insert(event.id);
    }
    Ok(())
}

/// Debounce gate for automatic syncs: at most one attempt per interval.
pub struct BackgroundSync {
    min_interval: Duration,
    last_attempt: Mutex<Option<Instant>>,
}

impl Default for BackgroundSync {
    fn default() -> Self {
        BackgroundSync::new(BACKGROUND_SYNC_INTERVAL)
    }
}

impl BackgroundSync {
    pub fn new(min_interval: Duration) -> Self {
        BackgroundSync {
            min_interval,
            last_attempt: Mutex::new(None),
        }
    }

    /// Gate that treats `last_sync` (wall-clock, e.g. from the local store)
    /// as the previous attempt, so the interval holds across processes.
    pub fn resume(min_interval: Duration, last_sync: Option<DateTime<Utc>>) -> Self {
        let last_attempt = last_sync.and_then(|at| {
            let elapsed = (Utc::now() - at).to_std().ok()?;
            Instant::now().checked_sub(elapsed)
        });
        BackgroundSync {
            min_interval,
            last_attempt: Mutex::new(last_attempt),
        }
    }

    /// Claim the next attempt. False while the previous one is too recent.
    pub fn try_begin(&self) -> bool {
        let now = Instant::now();
        let mut last = self.last_attempt.lock().unwrap_or_else(|e| e.into_inner());
        match *last {
            Some(at) if now.duration_since(at) < self.min_interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    /// Run a full sync unless one was attempted within the interval.
    pub async fn run(
        &self,
        scheduler: &Scheduler,
        api: &dyn CalendarApi,
        calendar_id: &str,
        config: &SyncConfig,
        today: NaiveDate,
    ) -> Option<DaybookResult<SyncReport>> {
        if !self.try_begin() {
            tracing::debug!("background sync skipped; last attempt too recent");
            return None;
        }
        Some(full_sync(scheduler, api, calendar_id, config, today).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::EventTime;
    use crate::dates::parse_date_key;
    use crate::task::{TaskDraft, TimeSlot};
    use crate::testing::{MockCalendar, all_day_event, scheduler, timed_event};

    fn today() -> NaiveDate {
        parse_date_key("2024-06-10").unwrap()
    }

    fn timed(title: &str, date: &str, start: &str, end: &str) -> TaskDraft {
        let mut draft = TaskDraft::new(title, Some(date));
        draft.time_slot = Some(TimeSlot::new(start, end).unwrap());
        draft
    }

    #[tokio::test]
    async fn test_second_sync_imports_nothing() {
        let s = scheduler(None);
        s.add_task(timed("Gym", "2024-06-11", "07:00", "08:00"));
        s.add_task(TaskDraft::new("Untimed", Some("2024-06-11")));
        let api = MockCalendar::with_events(vec![
            all_day_event("holiday", "Holiday", "2024-06-12"),
            timed_event("lunch", "Lunch", "2024-06-13", "12:00", "13:00"),
            all_day_event("ancient", "Too old", "2024-01-01"),
        ]);
        let config = SyncConfig::default();

        let first = full_sync(&s, &api, "primary", &config, today()).await.unwrap();
        assert_eq!(first.created, 1);
        assert_eq!(first.imported, 2);
        assert!(first.is_clean());
        let count = s.tasks().len();
        assert_eq!(count, 4);

        let second = full_sync(&s, &api, "primary", &config, today()).await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.imported, 0);
        assert_eq!(second.linked, 0);
        assert_eq!(s.tasks().len(), count);
        assert!(s.store().last_sync().is_some());
    }

    #[tokio::test]
    async fn test_pushing_imported_events_leaves_them_unchanged() {
        let s = scheduler(None);
        let mut overnight = timed_event("late", "", "2024-06-11", "22:00", "23:00");
        overnight.end = EventTime::DateTime {
            local: parse_date_key("2024-06-12")
                .unwrap()
                .and_time(crate::dates::parse_clock("02:00").unwrap()),
            time_zone: None,
        };
        let original = vec![overnight, timed_event("lunch", "Lunch", "2024-06-13", "12:00", "13:00")];
        let api = MockCalendar::with_events(original.clone());
        let config = SyncConfig::default();

        let first = full_sync(&s, &api, "primary", &config, today()).await.unwrap();
        assert_eq!(first.imported, 2);
        let second = full_sync(&s, &api, "primary", &config, today()).await.unwrap();
        assert_eq!(second.updated, 2);
        assert!(second.is_clean());

        assert_eq!(api.events(), original);
    }

    #[tokio::test]
    async fn test_backfill_corrects_profile_once() {
        let s = scheduler(None);
        let mut draft = TaskDraft::new("Imported", Some("2024-06-11"));
        draft.external_event_id = Some("evt-old".into());
        draft.project_id = Some("stale".into());
        let task = s.add_task(draft);

        let api = MockCalendar::default();
        let config = SyncConfig {
            import_profile_id: Some("calendar".into()),
            two_way_sync: false,
            ..Default::default()
        };

        let first = full_sync(&s, &api, "primary", &config, today()).await.unwrap();
        assert_eq!(first.backfilled, 1);
        assert_eq!(s.task(&task.id).unwrap().project_id.as_deref(), Some("calendar"));

        let second = full_sync(&s, &api, "primary", &config, today()).await.unwrap();
        assert_eq!(second.backfilled, 0);
        assert_eq!(s.tasks().len(), 1);
    }

    #[tokio::test]
    async fn test_dedup_links_instead_of_duplicating() {
        let s = scheduler(None);
        // Pushing is off for untimed tasks, so this one never got an event id.
        let task = s.add_task(TaskDraft::new("Dentist", Some("2024-06-14")));
        let api = MockCalendar::with_events(vec![all_day_event("dentist", " Dentist", "2024-06-14")]);

        let report = full_sync(&s, &api, "primary", &SyncConfig::default(), today()).await.unwrap();

        assert_eq!(report.linked, 1);
        assert_eq!(report.imported, 0);
        assert_eq!(s.tasks().len(), 1);
        assert_eq!(s.task(&task.id).unwrap().external_event_id.as_deref(), Some("dentist"));
    }

    #[tokio::test]
    async fn test_imports_are_tagged_and_cancelled_events_skipped() {
        let s = scheduler(None);
        let mut cancelled = all_day_event("gone", "Cancelled party", "2024-06-15");
        cancelled.status = EventStatus::Cancelled;
        let api = MockCalendar::with_events(vec![cancelled, all_day_event("trip", "Trip", "2024-06-16")]);
        let config = SyncConfig {
            import_profile_id: Some("calendar".into()),
            ..Default::default()
        };

        let report = full_sync(&s, &api, "primary", &config, today()).await.unwrap();

        assert_eq!(report.imported, 1);
        let tasks = s.tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Trip");
        assert_eq!(tasks[0].project_id.as_deref(), Some("calendar"));
        assert_eq!(tasks[0].external_event_id.as_deref(), Some("trip"));
    }

    #[tokio::test]
    async fn test_item_failures_do_not_stop_the_batch() {
        let s = scheduler(None);
        s.add_task(timed("Broken", "2024-06-11", "09:00", "10:00"));
        s.add_task(timed("Fine", "2024-06-11", "11:00", "12:00"));
        let api = MockCalendar::default();
        api.fail_on_title("Broken");

        let report = full_sync(&s, &api, "primary", &SyncConfig::default(), today()).await.unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("Broken"));
    }

    #[tokio::test]
    async fn test_auth_failure_aborts() {
        let s = scheduler(None);
        s.add_task(timed("Gym", "2024-06-11", "07:00", "08:00"));
        let api = MockCalendar::default();
        api.expire_auth();

        let err = full_sync(&s, &api, "primary", &SyncConfig::default(), today()).await.unwrap_err();

        assert!(err.is_auth_failure());
        assert!(s.tasks()[0].external_event_id.is_none());
        assert!(s.store().last_sync().is_none());
    }

    #[test]
    fn test_push_selection() {
        let mut timed_task = crate::testing::sample_task("a", Some("2024-06-11"), 0.0);
        timed_task.time_slot = Some(TimeSlot::new("09:00", "10:00").unwrap());
        let untimed = crate::testing::sample_task("b", Some("2024-06-11"), 0.0);
        let inbox = crate::testing::sample_task("c", None, 0.0);

        let config = SyncConfig::default();
        assert!(config.should_push(&timed_task));
        assert!(!config.should_push(&untimed));

        let all = SyncConfig {
            sync_all_tasks: true,
            ..Default::default()
        };
        assert!(all.should_push(&untimed));
        assert!(!all.should_push(&inbox));
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sync_is_debounced() {
        let s = scheduler(None);
        let api = MockCalendar::default();
        let gate = BackgroundSync::default();
        let config = SyncConfig::default();

        assert!(gate.run(&s, &api, "primary", &config, today()).await.is_some());
        assert!(gate.run(&s, &api, "primary", &config, today()).await.is_none());

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(gate.run(&s, &api, "primary", &config, today()).await.is_none());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(gate.run(&s, &api, "primary", &config, today()).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resumed_gate_respects_stored_sync_time() {
        let recent = BackgroundSync::resume(BACKGROUND_SYNC_INTERVAL, Some(Utc::now() - chrono::Duration::seconds(10)));
        assert!(!recent.try_begin());

        let stale = BackgroundSync::resume(BACKGROUND_SYNC_INTERVAL, Some(Utc::now() - chrono::Duration::minutes(5)));
        assert!(stale.try_begin());

        assert!(BackgroundSync::resume(BACKGROUND_SYNC_INTERVAL, None).try_begin());
    }
}

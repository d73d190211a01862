//! In-memory fakes shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::activity::StoreActivityLog;
use crate::calendar::{CalendarApi, EventStatus, EventTime, ExternalCalendar, ExternalEvent};
use crate::error::{DaybookError, DaybookResult};
use crate::mirror::{MirrorHandle, RetryPolicy};
use crate::remote::{RemoteStore, Table};
use crate::scheduler::Scheduler;
use crate::store::LocalStore;
use crate::task::{RepeatPattern, Task, new_id};

pub fn sample_task(title: &str, date: Option<&str>, order: f64) -> Task {
    let now = Utc::now();
    Task {
        id: new_id(),
        title: title.to_string(),
        completed: false,
        date: date.map(str::to_string),
        end_date: None,
        order,
        time_slot: None,
        project_id: None,
        external_event_id: None,
        subtasks: Vec::new(),
        repeat_pattern: RepeatPattern::None,
        notes: None,
        color: None,
        created_at: now,
        updated_at: now,
    }
}

/// Scheduler over an in-memory store, mirroring to `remote` when given.
pub fn scheduler(remote: Option<Arc<MemoryRemote>>) -> Scheduler {
    let store = LocalStore::in_memory();
    let activity = Arc::new(StoreActivityLog::new(store.clone()));
    let mirror = match remote {
        Some(remote) => MirrorHandle::spawn(remote, RetryPolicy::default(), None),
        None => MirrorHandle::disabled(),
    };
    Scheduler::new(store, activity, mirror)
}

/// Row store kept in memory, with knobs for schema drift and outages.
#[derive(Default)]
pub struct MemoryRemote {
    tables: Mutex<HashMap<Table, HashMap<String, Map<String, Value>>>>,
    missing_columns: HashSet<String>,
    failures_left: AtomicU32,
    failed_attempts: AtomicU32,
}

impl MemoryRemote {
    pub fn without_column(column: &str) -> Self {
        MemoryRemote {
            missing_columns: HashSet::from([column.to_string()]),
            ..Default::default()
        }
    }

    /// Fail the next `n` calls with a transport error.
    pub fn fail_next(&self, n: u32) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts.load(Ordering::SeqCst)
    }

    pub fn row(&self, table: Table, id: &str) -> Option<Map<String, Value>> {
        self.tables.lock().unwrap().get(&table)?.get(id).cloned()
    }

    pub fn len(&self, table: Table) -> usize {
        self.tables.lock().unwrap().get(&table).map_or(0, |t| t.len())
    }

    fn check(&self, fields: Option<&Map<String, Value>>) -> DaybookResult<()> {
        let outage = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if outage {
            self.failed_attempts.fetch_add(1, Ordering::SeqCst);
            return Err(DaybookError::Remote("simulated outage".into()));
        }

        if let Some(column) = fields
            .into_iter()
            .flat_map(|f| f.keys())
            .find(|k| self.missing_columns.contains(*k))
        {
            self.failed_attempts.fetch_add(1, Ordering::SeqCst);
            return Err(DaybookError::MissingColumn(column.clone()));
        }

        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn insert(&self, table: Table, row: Map<String, Value>) -> DaybookResult<()> {
        self.check(Some(&row))?;
        let id = row
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| DaybookError::Remote("row without id".into()))?
            .to_string();
        self.tables.lock().unwrap().entry(table).or_default().insert(id, row);
        Ok(())
    }

    async fn update(&self, table: Table, id: &str, fields: Map<String, Value>) -> DaybookResult<()> {
        self.check(Some(&fields))?;
        let mut tables = self.tables.lock().unwrap();
        let row = tables.entry(table).or_default().entry(id.to_string()).or_default();
        row.extend(fields);
        Ok(())
    }

    async fn delete(&self, table: Table, id: &str) -> DaybookResult<()> {
        self.check(None)?;
        if let Some(rows) = self.tables.lock().unwrap().get_mut(&table) {
            rows.remove(id);
        }
        Ok(())
    }

    async fn select(&self, table: Table) -> DaybookResult<Vec<Value>> {
        self.check(None)?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .get(&table)
            .map(|rows| rows.values().cloned().map(Value::Object).collect())
            .unwrap_or_default())
    }
}

/// Calendar kept in memory.
#[derive(Default)]
pub struct MockCalendar {
    events: Mutex<Vec<ExternalEvent>>,
    next_id: AtomicUsize,
    failing_titles: Mutex<HashSet<String>>,
    auth_expired: AtomicBool,
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
}

impl MockCalendar {
    pub fn with_events(events: Vec<ExternalEvent>) -> Self {
        MockCalendar {
            events: Mutex::new(events),
            ..Default::default()
        }
    }

    pub fn events(&self) -> Vec<ExternalEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn fail_on_title(&self, title: &str) {
        self.failing_titles.lock().unwrap().insert(title.to_string());
    }

    pub fn expire_auth(&self) {
        self.auth_expired.store(true, Ordering::SeqCst);
    }

    fn check(&self, event: Option<&ExternalEvent>) -> DaybookResult<()> {
        if self.auth_expired.load(Ordering::SeqCst) {
            return Err(DaybookError::CalendarAuthExpired);
        }
        if let Some(event) = event {
            if self.failing_titles.lock().unwrap().contains(&event.summary) {
                return Err(DaybookError::Calendar(format!("rejected '{}'", event.summary)));
            }
        }
        Ok(())
    }
}

pub fn all_day_event(id: &str, summary: &str, date: &str) -> ExternalEvent {
    let day = crate::dates::parse_date_key(date).unwrap();
    ExternalEvent {
        id: id.to_string(),
        summary: summary.to_string(),
        description: None,
        start: EventTime::Date(day),
        end: EventTime::Date(crate::dates::shift(day, 1)),
        recurrence: Vec::new(),
        color_id: None,
        status: EventStatus::Confirmed,
    }
}

pub fn timed_event(id: &str, summary: &str, date: &str, start: &str, end: &str) -> ExternalEvent {
    let day = crate::dates::parse_date_key(date).unwrap();
    let at = |clock: &str| EventTime::DateTime {
        local: day.and_time(crate::dates::parse_clock(clock).unwrap()),
        time_zone: None,
    };
    ExternalEvent {
        id: id.to_string(),
        summary: summary.to_string(),
        description: None,
        start: at(start),
        end: at(end),
        recurrence: Vec::new(),
        color_id: None,
        status: EventStatus::Confirmed,
    }
}

#[async_trait]
impl CalendarApi for MockCalendar {
    async fn list_calendars(&self) -> DaybookResult<Vec<ExternalCalendar>> {
        self.check(None)?;
        Ok(vec![ExternalCalendar {
            id: "primary".into(),
            name: "Personal".into(),
            primary: true,
        }])
    }

    async fn list_events(
        &self,
        _calendar_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DaybookResult<Vec<ExternalEvent>> {
        self.check(None)?;
        let (from, to) = (from.date_naive(), to.date_naive());
        Ok(self
            .events()
            .into_iter()
            .filter(|e| e.start.date() >= from && e.start.date() <= to)
            .collect())
    }

    async fn create_event(&self, _calendar_id: &str, event: &ExternalEvent) -> DaybookResult<ExternalEvent> {
        self.check(Some(event))?;
        let mut created = event.clone();
        created.id = format!("evt-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.events.lock().unwrap().push(created.clone());
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(created)
    }

    async fn update_event(&self, _calendar_id: &str, event: &ExternalEvent) -> DaybookResult<ExternalEvent> {
        self.check(Some(event))?;
        let mut events = self.events.lock().unwrap();
        let existing = events
            .iter_mut()
            .find(|e| e.id == event.id)
            .ok_or_else(|| DaybookError::Calendar(format!("no event {}", event.id)))?;
        *existing = event.clone();
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(event.clone())
    }

    async fn delete_event(&self, _calendar_id: &str, event_id: &str) -> DaybookResult<()> {
        self.check(None)?;
        self.events.lock().unwrap().retain(|e| e.id != event_id);
        Ok(())
    }
}

//! Recent-activity log backing undo.
//!
//! The log is its own capability, injected into the scheduler. Anything that
//! displays it (the recent-activity view, a status line) subscribes for
//! change notifications instead of polling the store.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::constants::ACTIVITY_LOG_LIMIT;
use crate::store::{LocalStore, keys};
use crate::task::{Task, new_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Completed,
    Added,
    Deleted,
    Updated,
}

/// Where a task sat before a cross-day move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovedFrom {
    pub date: Option<String>,
    pub order: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityData {
    pub task_id: String,
    /// Full copy of a deleted task.
    #[serde(default)]
    pub task: Option<Task>,
    #[serde(default)]
    pub moved_from: Option<MovedFrom>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub task_title: String,
    pub timestamp: DateTime<Utc>,
    pub data: ActivityData,
}

impl ActivityEntry {
    pub fn new(kind: ActivityKind, task: &Task) -> Self {
        ActivityEntry {
            id: new_id(),
            kind,
            task_title: task.title.clone(),
            timestamp: Utc::now(),
            data: ActivityData {
                task_id: task.id.clone(),
                task: None,
                moved_from: None,
            },
        }
    }

    pub fn with_task_copy(mut self, task: &Task) -> Self {
        self.data.task = Some(task.clone());
        self
    }

    pub fn with_moved_from(mut self, date: Option<String>, order: f64) -> Self {
        self.data.moved_from = Some(MovedFrom { date, order });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActivityEvent {
    Recorded(ActivityEntry),
    Removed(String),
    Cleared,
}

pub trait ActivityLog: Send + Sync {
    fn record(&self, entry: ActivityEntry);

    /// Newest first.
    fn list(&self, limit: usize) -> Vec<ActivityEntry>;

    fn get(&self, id: &str) -> Option<ActivityEntry> {
        self.list(usize::MAX).into_iter().find(|e| e.id == id)
    }

    fn remove(&self, id: &str) -> Option<ActivityEntry>;

    fn clear(&self);

    fn subscribe(&self) -> broadcast::Receiver<ActivityEvent>;
}

/// Activity log persisted in the local store, capped at the newest entries.
pub struct StoreActivityLog {
    store: LocalStore,
    write_lock: Mutex<()>,
    events: broadcast::Sender<ActivityEvent>,
}

impl StoreActivityLog {
    pub fn new(store: LocalStore) -> Self {
        let (events, _) = broadcast::channel(64);
        StoreActivityLog {
            store,
            write_lock: Mutex::new(()),
            events,
        }
    }

    fn entries(&self) -> Vec<ActivityEntry> {
        self.store.get(keys::ACTIVITY_LOG, Vec::new())
    }

    fn save(&self, entries: &[ActivityEntry]) {
        if let Err(e) = self.store.set(keys::ACTIVITY_LOG, entries) {
            tracing::warn!(error = %e, "failed to save activity log");
        }
    }

    fn notify(&self, event: ActivityEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl ActivityLog for StoreActivityLog {
    fn record(&self, entry: ActivityEntry) {
        {
            let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
            let mut entries = self.entries();
            entries.insert(0, entry.clone());
            entries.truncate(ACTIVITY_LOG_LIMIT);
            self.save(&entries);
        }
        self.notify(ActivityEvent::Recorded(entry));
    }

    fn list(&self, limit: usize) -> Vec<ActivityEntry> {
        self.entries().into_iter().take(limit).collect()
    }

    fn remove(&self, id: &str) -> Option<ActivityEntry> {
        let removed = {
            let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
            let mut entries = self.entries();
            let index = entries.iter().position(|e| e.id == id)?;
            let removed = entries.remove(index);
            self.save(&entries);
            removed
        };
        self.notify(ActivityEvent::Removed(removed.id.clone()));
        Some(removed)
    }

    fn clear(&self) {
        {
            let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
            self.save(&[]);
        }
        self.notify(ActivityEvent::Cleared);
    }

    fn subscribe(&self) -> broadcast::Receiver<ActivityEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_task;

    #[test]
    fn test_log_is_capped_and_newest_first() {
        let log = StoreActivityLog::new(LocalStore::in_memory());
        for i in 0..(ACTIVITY_LOG_LIMIT + 5) {
            let task = sample_task(&format!("task {i}"), None, 0.0);
            log.record(ActivityEntry::new(ActivityKind::Added, &task));
        }

        let entries = log.list(usize::MAX);
        assert_eq!(entries.len(), ACTIVITY_LOG_LIMIT);
        assert_eq!(entries[0].task_title, format!("task {}", ACTIVITY_LOG_LIMIT + 4));
        assert_eq!(log.list(3).len(), 3);
    }

    #[test]
    fn test_remove_and_clear() {
        let log = StoreActivityLog::new(LocalStore::in_memory());
        let task = sample_task("a", None, 0.0);
        let entry = ActivityEntry::new(ActivityKind::Deleted, &task).with_task_copy(&task);
        log.record(entry.clone());

        assert_eq!(log.get(&entry.id).unwrap().data.task, Some(task));
        assert_eq!(log.remove(&entry.id).map(|e| e.id), Some(entry.id.clone()));
        assert!(log.remove(&entry.id).is_none());

        log.record(entry);
        log.clear();
        assert!(log.list(10).is_empty());
    }

    #[test]
    fn test_subscribers_are_notified() {
        let log = StoreActivityLog::new(LocalStore::in_memory());
        let mut rx = log.subscribe();
        let task = sample_task("a", None, 0.0);
        let entry = ActivityEntry::new(ActivityKind::Completed, &task);
        log.record(entry.clone());
        log.clear();

        assert_eq!(rx.try_recv().unwrap(), ActivityEvent::Recorded(entry));
        assert_eq!(rx.try_recv().unwrap(), ActivityEvent::Cleared);
    }

    #[test]
    fn test_entry_json_uses_type_field() {
        let task = sample_task("a", None, 0.0);
        let entry = ActivityEntry::new(ActivityKind::Updated, &task).with_moved_from(None, 2.0);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "updated");
        assert_eq!(json["taskTitle"], "a");
    }
}

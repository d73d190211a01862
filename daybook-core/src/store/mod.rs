//! Local key-value persistence.
//!
//! The store is a cache of the session state, not a source of truth: every
//! mutation overwrites the whole value for its key. Values are JSON documents
//! so the same data can be inspected by hand in the data directory.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DaybookResult;
use crate::modules::ModuleLayout;
use crate::settings::{Preferences, ReminderPreset};
use crate::task::{Profile, Project, Task};

/// Namespaced keys for everything daybook keeps locally.
pub mod keys {
    pub const TASKS: &str = "tasks";
    pub const PROJECTS: &str = "projects";
    pub const PROFILES: &str = "profiles";
    pub const PREFERENCES: &str = "preferences";
    pub const MODULE_LAYOUT: &str = "module-layout";
    pub const REMINDER_PRESETS: &str = "reminder-presets";
    pub const CURRENT_PROFILE: &str = "current-profile";
    pub const ACTIVITY_LOG: &str = "activity-log";
    pub const GOOGLE_SESSION: &str = "google-session";
    pub const LAST_SYNC: &str = "last-sync";
}

/// Raw JSON key-value storage.
pub trait KeyValueStore: Send + Sync {
    fn get_raw(&self, key: &str) -> DaybookResult<Option<serde_json::Value>>;
    fn set_raw(&self, key: &str, value: serde_json::Value) -> DaybookResult<()>;
    fn remove(&self, key: &str) -> DaybookResult<()>;
}

/// Typed access on top of a [`KeyValueStore`].
#[derive(Clone)]
pub struct LocalStore {
    inner: Arc<dyn KeyValueStore>,
}

impl LocalStore {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        LocalStore { inner }
    }

    pub fn in_memory() -> Self {
        LocalStore::new(Arc::new(MemoryStore::default()))
    }

    /// Read `key`, falling back to `default` when it is absent or unreadable.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.inner.get_raw(key) {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(key, error = %e, "stored value is malformed, using default");
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read local store");
                default
            }
        }
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> DaybookResult<()> {
        let value = serde_json::to_value(value)?;
        self.inner.set_raw(key, value)
    }

    pub fn remove(&self, key: &str) -> DaybookResult<()> {
        self.inner.remove(key)
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.get(keys::TASKS, Vec::new())
    }

    pub fn save_tasks(&self, tasks: &[Task]) -> DaybookResult<()> {
        self.set(keys::TASKS, tasks)
    }

    pub fn projects(&self) -> Vec<Project> {
        self.get(keys::PROJECTS, Vec::new())
    }

    pub fn save_projects(&self, projects: &[Project]) -> DaybookResult<()> {
        self.set(keys::PROJECTS, projects)
    }

    pub fn profiles(&self) -> Vec<Profile> {
        self.get(keys::PROFILES, Vec::new())
    }

    pub fn save_profiles(&self, profiles: &[Profile]) -> DaybookResult<()> {
        self.set(keys::PROFILES, profiles)
    }

    pub fn preferences(&self) -> Preferences {
        self.get(keys::PREFERENCES, Preferences::default())
    }

    pub fn save_preferences(&self, prefs: &Preferences) -> DaybookResult<()> {
        self.set(keys::PREFERENCES, prefs)
    }

    pub fn module_layout(&self) -> ModuleLayout {
        self.get(keys::MODULE_LAYOUT, ModuleLayout::default())
    }

    pub fn save_module_layout(&self, layout: &ModuleLayout) -> DaybookResult<()> {
        self.set(keys::MODULE_LAYOUT, layout)
    }

    pub fn reminder_presets(&self) -> Vec<ReminderPreset> {
        self.get(keys::REMINDER_PRESETS, ReminderPreset::defaults())
    }

    pub fn save_reminder_presets(&self, presets: &[ReminderPreset]) -> DaybookResult<()> {
        self.set(keys::REMINDER_PRESETS, presets)
    }

    pub fn current_profile(&self) -> Option<String> {
        self.get(keys::CURRENT_PROFILE, None)
    }

    pub fn save_current_profile(&self, profile_id: Option<&str>) -> DaybookResult<()> {
        match profile_id {
            Some(id) => self.set(keys::CURRENT_PROFILE, id),
            None => self.remove(keys::CURRENT_PROFILE),
        }
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.get(keys::LAST_SYNC, None)
    }

    pub fn save_last_sync(&self, at: DateTime<Utc>) -> DaybookResult<()> {
        self.set(keys::LAST_SYNC, &at)
    }

    pub fn auto_trash(&self) -> bool {
        self.preferences().auto_trash
    }

    pub fn move_completed_to_bottom(&self) -> bool {
        self.preferences().move_completed_to_bottom
    }
}

//! Remote row store.
//!
//! The remote store is a mirror of local state, written through the
//! [`crate::mirror`] queue. Rows are keyed by `id` and always carry their full
//! field values, so writes for different rows may land in any order.

mod rest;
pub mod rows;

pub use rest::RestStore;
pub use rows::{ProjectRow, TaskRow};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::DaybookResult;
use crate::task::{Project, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Tasks,
    Projects,
    UserSettings,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Tasks => "tasks",
            Table::Projects => "projects",
            Table::UserSettings => "user_settings",
        }
    }
}

/// Row-oriented CRUD keyed by `id`.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn insert(&self, table: Table, row: Map<String, Value>) -> DaybookResult<()>;

    async fn update(&self, table: Table, id: &str, fields: Map<String, Value>) -> DaybookResult<()>;

    async fn delete(&self, table: Table, id: &str) -> DaybookResult<()>;

    async fn select(&self, table: Table) -> DaybookResult<Vec<Value>>;
}

/// Fetch tasks and projects from the remote store.
///
/// Rows that fail to decode are skipped with a warning rather than failing
/// the whole load.
pub async fn load_remote(remote: &dyn RemoteStore) -> DaybookResult<(Vec<Task>, Vec<Project>)> {
    let tasks = remote
        .select(Table::Tasks)
        .await?
        .into_iter()
        .filter_map(|row| match serde_json::from_value::<TaskRow>(row) {
            Ok(row) => Some(Task::from(row)),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed task row");
                None
            }
        })
        .collect();

    let projects = remote
        .select(Table::Projects)
        .await?
        .into_iter()
        .filter_map(|row| match serde_json::from_value::<ProjectRow>(row) {
            Ok(row) => Some(Project::from(row)),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed project row");
                None
            }
        })
        .collect();

    Ok((tasks, projects))
}

//! Background mirroring of local changes to the remote store.
//!
//! Scheduler operations update local state and return immediately; each
//! remote write is queued here and applied by a single tokio worker. A failed
//! write never rolls local state back: it is retried per [`RetryPolicy`] and
//! then logged and dropped.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot};

use crate::error::DaybookError;
use crate::remote::{ProjectRow, RemoteStore, Table, TaskRow};
use crate::task::{Project, Task};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total tries per write, including the first one.
    pub max_attempts: u32,
    /// Delay before the second try; doubles after each failure.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

/// A single keyed write against the remote store.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Insert {
        table: Table,
        row: Map<String, Value>,
    },
    Update {
        table: Table,
        id: String,
        fields: Map<String, Value>,
    },
    Delete {
        table: Table,
        id: String,
    },
}

impl Write {
    async fn apply(&self, remote: &dyn RemoteStore) -> Result<(), DaybookError> {
        match self {
            Write::Insert { table, row } => remote.insert(*table, row.clone()).await,
            Write::Update { table, id, fields } => remote.update(*table, id, fields.clone()).await,
            Write::Delete { table, id } => remote.delete(*table, id).await,
        }
    }

    /// Drop `column` from the payload. Returns false when there was nothing
    /// to drop, so a repeated schema error cannot loop forever.
    fn strip_column(&mut self, column: &str) -> bool {
        match self {
            Write::Insert { row, .. } => row.remove(column).is_some(),
            Write::Update { fields, .. } => fields.remove(column).is_some(),
            Write::Delete { .. } => false,
        }
    }

    fn describe(&self) -> String {
        match self {
            Write::Insert { table, row } => {
                let id = row.get("id").and_then(Value::as_str).unwrap_or("?");
                format!("insert {} {}", table.name(), id)
            }
            Write::Update { table, id, .. } => format!("update {} {}", table.name(), id),
            Write::Delete { table, id } => format!("delete {} {}", table.name(), id),
        }
    }
}

pub enum MirrorCommand {
    Write(Write),
    /// Answered once every earlier command has been processed.
    Flush(oneshot::Sender<()>),
}

/// Sending side of the mirror queue. Cheap to clone.
#[derive(Clone)]
pub struct MirrorHandle {
    tx: Option<mpsc::UnboundedSender<MirrorCommand>>,
    user_id: Option<String>,
}

impl MirrorHandle {
    /// A handle that drops every write; used when no remote is configured.
    pub fn disabled() -> Self {
        MirrorHandle {
            tx: None,
            user_id: None,
        }
    }

    /// Start the worker on the current tokio runtime.
    pub fn spawn(remote: Arc<dyn RemoteStore>, policy: RetryPolicy, user_id: Option<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(remote, policy, rx));

        MirrorHandle {
            tx: Some(tx),
            user_id,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    pub fn enqueue(&self, write: Write) {
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.send(MirrorCommand::Write(write)).is_err() {
            tracing::warn!("remote mirror worker has stopped; dropping write");
        }
    }

    pub fn insert_task(&self, task: &Task) {
        match TaskRow::from(task).with_user(self.user_id.as_deref()).to_json() {
            Ok(row) => self.enqueue(Write::Insert {
                table: Table::Tasks,
                row,
            }),
            Err(e) => tracing::warn!(task_id = %task.id, error = %e, "could not encode task row"),
        }
    }

    /// Mirror the task's current field values (a full row, not a diff).
    pub fn update_task(&self, task: &Task) {
        match TaskRow::from(task).to_json() {
            Ok(mut fields) => {
                fields.remove("id");
                fields.remove("created_at");
                self.enqueue(Write::Update {
                    table: Table::Tasks,
                    id: task.id.clone(),
                    fields,
                })
            }
            Err(e) => tracing::warn!(task_id = %task.id, error = %e, "could not encode task row"),
        }
    }

    /// Mirror only the fields a move touches.
    pub fn update_task_position(&self, task: &Task) {
        let mut fields = Map::new();
        fields.insert("date".into(), serde_json::json!(task.date));
        fields.insert("order".into(), serde_json::json!(task.order));
        fields.insert("updated_at".into(), serde_json::json!(task.updated_at));
        self.enqueue(Write::Update {
            table: Table::Tasks,
            id: task.id.clone(),
            fields,
        });
    }

    pub fn delete_task(&self, id: &str) {
        self.enqueue(Write::Delete {
            table: Table::Tasks,
            id: id.to_string(),
        });
    }

    pub fn insert_project(&self, project: &Project) {
        match ProjectRow::from(project).with_user(self.user_id.as_deref()).to_json() {
            Ok(row) => self.enqueue(Write::Insert {
                table: Table::Projects,
                row,
            }),
            Err(e) => tracing::warn!(project_id = %project.id, error = %e, "could not encode project row"),
        }
    }

    pub fn delete_project(&self, id: &str) {
        self.enqueue(Write::Delete {
            table: Table::Projects,
            id: id.to_string(),
        });
    }

    /// Wait until every write queued so far has been applied or given up on.
    pub async fn flush(&self) {
        let Some(tx) = &self.tx else {
            return;
        };
        let (done_tx, done_rx) = oneshot::channel();
        if tx.send(MirrorCommand::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }
}

async fn run_worker(
    remote: Arc<dyn RemoteStore>,
    policy: RetryPolicy,
    mut rx: mpsc::UnboundedReceiver<MirrorCommand>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            MirrorCommand::Write(write) => apply_with_retry(remote.as_ref(), &policy, write).await,
            MirrorCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

/// Apply one write. A missing-column error is schema drift, not an outage:
/// the same write is retried at once without that column and does not use
/// up an attempt.
pub async fn apply_with_retry(remote: &dyn RemoteStore, policy: &RetryPolicy, mut write: Write) {
    let mut attempt = 1;
    let mut delay = policy.backoff;

    loop {
        let result = write.apply(remote).await;
        match result {
            Ok(()) => return,
            Err(DaybookError::MissingColumn(column)) if write.strip_column(&column) => {
                tracing::debug!(column = %column, write = %write.describe(), "remote column missing, retrying without it");
            }
            Err(e) if attempt < policy.max_attempts => {
                tracing::debug!(attempt, error = %e, write = %write.describe(), "remote write failed, retrying");
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(e) => {
                tracing::warn!(attempts = attempt, error = %e, write = %write.describe(), "giving up on remote write");
                return;
            }
        }
    }
}

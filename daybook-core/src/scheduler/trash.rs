//! Deferred deletes for completed tasks when auto-trash is on.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::{AbortHandle, JoinSet};

use super::Inner;
use crate::constants::AUTO_TRASH_DELAY;

/// Pending timers keyed by task id. Each timer carries a generation so a
/// callback that lost a race with a newer schedule or a cancel does nothing.
#[derive(Default)]
pub(super) struct TrashTimers {
    pending: HashMap<String, (u64, AbortHandle)>,
    running: JoinSet<()>,
    next_generation: u64,
}

impl Inner {
    pub(super) fn schedule_trash(self: &Arc<Self>, id: &str) {
        let mut timers = self.timers();
        while timers.running.try_join_next().is_some() {}

        let generation = timers.next_generation;
        timers.next_generation += 1;

        let inner = Arc::clone(self);
        let task_id = id.to_string();
        let delay = AUTO_TRASH_DELAY;
        let handle = timers.running.spawn(async move {
            tokio::time::sleep(delay).await;
            inner.fire_trash(&task_id, generation);
        });

        if let Some((_, previous)) = timers.pending.insert(id.to_string(), (generation, handle)) {
            previous.abort();
        }
        tracing::debug!(task_id = %id, delay_ms = delay.as_millis() as u64, "auto-trash scheduled");
    }

    pub(super) fn cancel_trash(&self, id: &str) {
        if let Some((_, handle)) = self.timers().pending.remove(id) {
            handle.abort();
            tracing::debug!(task_id = %id, "auto-trash cancelled");
        }
    }

    fn fire_trash(&self, id: &str, generation: u64) {
        {
            let mut timers = self.timers();
            match timers.pending.get(id) {
                Some((current, _)) if *current == generation => {
                    timers.pending.remove(id);
                }
                _ => return,
            }
        }

        // Re-read the task: it may have been deleted or reopened meanwhile.
        let still_completed = self.state().tasks.iter().any(|t| t.id == id && t.completed);
        if still_completed {
            tracing::info!(task_id = %id, "auto-trashing completed task");
            self.delete_task(id, true);
        }
    }

    /// Wait for every timer scheduled so far to fire or be cancelled.
    pub(super) async fn wait_for_timers(&self) {
        let mut running = std::mem::take(&mut self.timers().running);
        while running.join_next().await.is_some() {}
    }

    fn timers(&self) -> std::sync::MutexGuard<'_, TrashTimers> {
        self.timers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

//! The scheduling core: the single owner of tasks, projects and profiles.
//!
//! Every operation mutates in-memory state synchronously, persists the whole
//! collection to the local store, then queues the matching remote write on
//! the mirror. Unknown ids are silent no-ops. Remote failures never reach the
//! caller; the mirror logs them.

mod profiles;
mod trash;

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use crate::activity::{ActivityEntry, ActivityKind, ActivityLog};
use crate::error::{DaybookError, DaybookResult};
use crate::mirror::MirrorHandle;
use crate::ordering::{next_order, plan_move, sorted_bucket};
use crate::settings::Preferences;
use crate::store::LocalStore;
use crate::task::{Profile, Project, Task, TaskDraft, TaskPatch, TimeSlot, new_id};

use trash::TrashTimers;

#[derive(Debug, Clone, Default)]
struct State {
    tasks: Vec<Task>,
    projects: Vec<Project>,
    profiles: Vec<Profile>,
    active_profile: Option<String>,
}

struct Inner {
    state: Mutex<State>,
    store: LocalStore,
    mirror: MirrorHandle,
    activity: Arc<dyn ActivityLog>,
    timers: Mutex<TrashTimers>,
}

/// Handle to the scheduling core. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    /// Create a scheduler over `store` and load its persisted state.
    pub fn new(store: LocalStore, activity: Arc<dyn ActivityLog>, mirror: MirrorHandle) -> Self {
        let scheduler = Scheduler {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                store,
                mirror,
                activity,
                timers: Mutex::new(TrashTimers::default()),
            }),
        };
        scheduler.load();
        scheduler
    }

    /// Re-read tasks, projects and profiles from the local store.
    ///
    /// Profiles double as projects (same id); any profile without its
    /// project record gets one created and mirrored.
    pub fn load(&self) {
        let inner = &self.inner;
        let mut state = State {
            tasks: inner.store.tasks(),
            projects: inner.store.projects(),
            profiles: inner.store.profiles(),
            active_profile: inner.store.current_profile(),
        };

        let repaired = profiles::repair_profile_projects(&mut state);
        if !repaired.is_empty() {
            tracing::info!(count = repaired.len(), "created missing projects for profiles");
            inner.save_projects(&state.projects);
            for project in &repaired {
                inner.mirror.insert_project(project);
            }
        }

        tracing::debug!(
            tasks = state.tasks.len(),
            projects = state.projects.len(),
            profiles = state.profiles.len(),
            "loaded local state"
        );
        *inner.state() = state;
    }

    /// Replace the local collections with a snapshot fetched from the remote
    /// store at session start. Profiles missing from the snapshot's projects
    /// get their project recreated, as on load.
    pub fn hydrate(&self, tasks: Vec<Task>, projects: Vec<Project>) {
        let repaired = {
            let mut state = self.inner.state();
            state.tasks = tasks;
            state.projects = projects;
            let repaired = profiles::repair_profile_projects(&mut state);
            self.inner.save_tasks(&state.tasks);
            self.inner.save_projects(&state.projects);
            repaired
        };

        if !repaired.is_empty() {
            tracing::info!(count = repaired.len(), "recreated projects missing from remote snapshot");
            for project in &repaired {
                self.inner.mirror.insert_project(project);
            }
        }
    }

    pub fn store(&self) -> &LocalStore {
        &self.inner.store
    }

    pub fn activity(&self) -> Arc<dyn ActivityLog> {
        Arc::clone(&self.inner.activity)
    }

    pub fn preferences(&self) -> Preferences {
        self.inner.store.preferences()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.inner.state().tasks.clone()
    }

    pub fn task(&self, id: &str) -> Option<Task> {
        self.inner.state().tasks.iter().find(|t| t.id == id).cloned()
    }

    pub fn projects(&self) -> Vec<Project> {
        self.inner.state().projects.clone()
    }

    /// Tasks in `date`'s bucket in display order. With the
    /// move-completed-to-bottom preference on, completed tasks follow the
    /// open ones (each group keeping its order).
    pub fn bucket(&self, date: Option<&str>) -> Vec<Task> {
        let mut tasks: Vec<Task> = {
            let state = self.inner.state();
            sorted_bucket(&state.tasks, date, None).into_iter().cloned().collect()
        };
        if self.inner.store.move_completed_to_bottom() {
            tasks.sort_by_key(|t| t.completed);
        }
        tasks
    }

    pub fn add_task(&self, draft: TaskDraft) -> Task {
        self.inner.add_task(draft, true)
    }

    /// Like [`Scheduler::add_task`], but rejects a time slot that overlaps
    /// another task's slot on the same date.
    pub fn add_task_checked(&self, draft: TaskDraft) -> DaybookResult<Task> {
        if let (Some(slot), Some(date)) = (&draft.time_slot, &draft.date) {
            check_slot(None, date, draft.end_date.as_deref(), slot, &self.inner.state().tasks)?;
        }
        Ok(self.add_task(draft))
    }

    /// Merge `patch` into task `id`. Unknown ids are ignored.
    pub fn update_task(&self, id: &str, patch: TaskPatch) {
        self.inner.update_task(id, &patch);
    }

    /// Like [`Scheduler::update_task`], but rejects a time slot that overlaps
    /// another task's slot on the same date. State is untouched on error.
    pub fn update_task_checked(&self, id: &str, patch: TaskPatch) -> DaybookResult<()> {
        {
            let state = self.inner.state();
            let Some(current) = state.tasks.iter().find(|t| t.id == id) else {
                return Ok(());
            };
            let mut candidate = current.clone();
            candidate.apply(&patch);
            check_time_slot(&candidate, &state.tasks)?;
        }
        self.inner.update_task(id, &patch);
        Ok(())
    }

    pub fn delete_task(&self, id: &str) {
        self.inner.delete_task(id, true);
    }

    /// Move task `id` into `new_date`'s bucket at `dest_index` (end of the
    /// list when `None`).
    pub fn move_task(&self, id: &str, new_date: Option<&str>, dest_index: Option<usize>) {
        self.inner.move_task(id, new_date, dest_index);
    }

    /// Flip completion. Completing logs an activity entry and, with
    /// auto-trash on, schedules a delete; reopening cancels it.
    pub fn toggle_task_complete(&self, id: &str) {
        let Some(task) = self.inner.set_completed(id, None) else {
            return;
        };

        if task.completed {
            self.inner.record(ActivityEntry::new(ActivityKind::Completed, &task));
            if self.inner.store.auto_trash() {
                self.inner.schedule_trash(id);
            }
        } else {
            self.inner.cancel_trash(id);
        }
    }

    /// Replay the inverse of activity entry `activity_id` and drop it from
    /// the log. Returns false when the entry no longer exists.
    pub fn undo(&self, activity_id: &str) -> bool {
        let Some(entry) = self.inner.activity.remove(activity_id) else {
            return false;
        };
        let task_id = entry.data.task_id.as_str();
        tracing::info!(kind = ?entry.kind, task_id = %task_id, "undo");

        match entry.kind {
            ActivityKind::Added => {
                self.inner.delete_task(task_id, false);
            }
            ActivityKind::Deleted => match &entry.data.task {
                // Re-added under a fresh id; the old one may still be
                // pending deletion on the remote.
                Some(copy) => {
                    self.inner.add_task(copy.to_draft(), false);
                }
                None => tracing::warn!(task_id = %task_id, "deleted entry has no task copy"),
            },
            ActivityKind::Completed => {
                self.inner.cancel_trash(task_id);
                self.inner.set_completed(task_id, Some(false));
            }
            ActivityKind::Updated => {
                if let Some(from) = &entry.data.moved_from {
                    // The old bucket may have handed that key to another task
                    // since; append at its tail instead of tying.
                    let order = {
                        let state = self.inner.state();
                        let taken = state.tasks.iter().any(|t| {
                            t.id != task_id && t.in_bucket(from.date.as_deref()) && t.order == from.order
                        });
                        if taken {
                            next_order(&state.tasks, from.date.as_deref())
                        } else {
                            from.order
                        }
                    };
                    self.inner.update_task(
                        task_id,
                        &TaskPatch {
                            date: Some(from.date.clone()),
                            order: Some(order),
                            ..Default::default()
                        },
                    );
                }
            }
        }
        true
    }

    /// Delete task `id` if its title is blank. Used when a detail view closes
    /// on a freshly added task that was never named.
    pub fn cleanup_empty(&self, id: &str) -> bool {
        let blank = self
            .task(id)
            .is_some_and(|t| t.title.trim().is_empty());
        if blank {
            self.inner.delete_task(id, false);
        }
        blank
    }

    /// Wait until every queued remote write has been applied or dropped.
    pub async fn flush(&self) {
        self.inner.mirror.flush().await;
    }

    /// Wait for pending auto-trash timers, then flush the mirror.
    pub async fn settle(&self) {
        self.inner.wait_for_timers().await;
        self.flush().await;
    }
}

fn check_time_slot(candidate: &Task, tasks: &[Task]) -> DaybookResult<()> {
    match (&candidate.time_slot, &candidate.date) {
        (Some(slot), Some(date)) => check_slot(
            Some(&candidate.id),
            date,
            candidate.end_date.as_deref(),
            slot,
            tasks,
        ),
        _ => Ok(()),
    }
}

/// Validate `slot` on `date` against the other tasks of that day. The end may
/// fall on a later day only when `end_date` is after `date`.
fn check_slot(
    own_id: Option<&str>,
    date: &str,
    end_date: Option<&str>,
    slot: &TimeSlot,
    tasks: &[Task],
) -> DaybookResult<()> {
    let (start, end) = slot.bounds()?;
    let spans_days = end_date.is_some_and(|end_date| end_date > date);
    if end <= start && !spans_days {
        return Err(DaybookError::Validation(format!(
            "Time slot {}-{} ends before it starts",
            slot.start, slot.end
        )));
    }

    let clash = tasks.iter().find(|t| {
        Some(t.id.as_str()) != own_id
            && t.date.as_deref() == Some(date)
            && t.time_slot.as_ref().is_some_and(|other| other.overlaps(slot))
    });
    match clash {
        Some(other) => Err(DaybookError::Validation(format!(
            "Time slot {}-{} overlaps \"{}\"",
            slot.start, slot.end, other.title
        ))),
        None => Ok(()),
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, entry: ActivityEntry) {
        self.activity.record(entry);
    }

    fn save_tasks(&self, tasks: &[Task]) {
        if let Err(e) = self.store.save_tasks(tasks) {
            tracing::warn!(error = %e, "failed to save tasks locally");
        }
    }

    fn save_projects(&self, projects: &[Project]) {
        if let Err(e) = self.store.save_projects(projects) {
            tracing::warn!(error = %e, "failed to save projects locally");
        }
    }

    fn add_task(&self, draft: TaskDraft, log: bool) -> Task {
        let task = {
            let mut state = self.state();
            let now = Utc::now();
            let order = draft
                .order
                .unwrap_or_else(|| next_order(&state.tasks, draft.date.as_deref()));
            let task = Task {
                id: new_id(),
                title: draft.title,
                completed: draft.completed,
                date: draft.date,
                end_date: draft.end_date,
                order,
                time_slot: draft.time_slot,
                project_id: draft.project_id,
                external_event_id: draft.external_event_id,
                subtasks: draft.subtasks,
                repeat_pattern: draft.repeat_pattern,
                notes: draft.notes,
                color: draft.color,
                created_at: now,
                updated_at: now,
            };
            state.tasks.push(task.clone());
            self.save_tasks(&state.tasks);
            task
        };

        tracing::debug!(task_id = %task.id, date = ?task.date, order = task.order, "task added");
        if log {
            self.record(ActivityEntry::new(ActivityKind::Added, &task));
        }
        self.mirror.insert_task(&task);
        task
    }

    fn update_task(&self, id: &str, patch: &TaskPatch) -> Option<Task> {
        let task = {
            let mut state = self.state();
            let task = state.tasks.iter_mut().find(|t| t.id == id)?;
            task.apply(patch);
            task.updated_at = Utc::now();
            let task = task.clone();
            self.save_tasks(&state.tasks);
            task
        };
        self.mirror.update_task(&task);
        Some(task)
    }

    /// Set completion to `value`, or flip it when `None`.
    fn set_completed(&self, id: &str, value: Option<bool>) -> Option<Task> {
        let completed = {
            let state = self.state();
            let task = state.tasks.iter().find(|t| t.id == id)?;
            value.unwrap_or(!task.completed)
        };
        self.update_task(
            id,
            &TaskPatch {
                completed: Some(completed),
                ..Default::default()
            },
        )
    }

    fn delete_task(&self, id: &str, log: bool) -> Option<Task> {
        self.cancel_trash(id);

        let removed = {
            let mut state = self.state();
            let index = state.tasks.iter().position(|t| t.id == id)?;
            let removed = state.tasks.remove(index);
            self.save_tasks(&state.tasks);
            removed
        };

        tracing::debug!(task_id = %id, "task deleted");
        if log {
            self.record(ActivityEntry::new(ActivityKind::Deleted, &removed).with_task_copy(&removed));
        }
        self.mirror.delete_task(id);
        Some(removed)
    }

    fn move_task(&self, id: &str, new_date: Option<&str>, dest_index: Option<usize>) {
        let (moved, previous, changed) = {
            let mut state = self.state();
            let Some(plan) = plan_move(&state.tasks, id, new_date, dest_index) else {
                return;
            };
            let now = Utc::now();

            let mut changed = Vec::with_capacity(plan.renumbered.len() + 1);
            for (other_id, order) in &plan.renumbered {
                if let Some(other) = state.tasks.iter_mut().find(|t| &t.id == other_id) {
                    other.order = *order;
                    other.updated_at = now;
                    changed.push(other.clone());
                }
            }

            let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) else {
                return;
            };
            let previous = (task.date.clone(), task.order);
            task.date = new_date.map(str::to_string);
            task.order = plan.order;
            task.updated_at = now;
            let moved = task.clone();
            changed.push(moved.clone());

            self.save_tasks(&state.tasks);
            (moved, previous, changed)
        };

        tracing::debug!(
            task_id = %id,
            from = ?previous.0,
            to = ?moved.date,
            order = moved.order,
            renumbered = changed.len() - 1,
            "task moved"
        );

        if previous.0 != moved.date {
            self.record(ActivityEntry::new(ActivityKind::Updated, &moved).with_moved_from(previous.0, previous.1));
        }
        for task in &changed {
            self.mirror.update_task_position(task);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityKind;
    use crate::remote::Table;
    use crate::settings::Preferences;
    use crate::task::TimeSlot;
    use crate::testing::{MemoryRemote, scheduler};
    use std::time::Duration;

    fn orders(s: &Scheduler, date: Option<&str>) -> Vec<(String, f64)> {
        s.bucket(date).into_iter().map(|t| (t.title, t.order)).collect()
    }

    fn titles(s: &Scheduler, date: Option<&str>) -> Vec<String> {
        s.bucket(date).into_iter().map(|t| t.title).collect()
    }

    fn enable_auto_trash(s: &Scheduler) {
        let prefs = Preferences {
            auto_trash: true,
            ..Default::default()
        };
        s.store().save_preferences(&prefs).unwrap();
    }

    #[test]
    fn test_add_appends_to_bucket() {
        let s = scheduler(None);
        for title in ["a", "b", "c"] {
            s.add_task(TaskDraft::new(title, Some("2024-06-01")));
        }
        s.add_task(TaskDraft::new("inbox", None));

        assert_eq!(
            orders(&s, Some("2024-06-01")),
            vec![("a".into(), 0.0), ("b".into(), 1.0), ("c".into(), 2.0)]
        );
        assert_eq!(orders(&s, None), vec![("inbox".into(), 0.0)]);
        assert_eq!(s.store().tasks().len(), 4);
    }

    #[test]
    fn test_move_to_head_of_same_day() {
        let s = scheduler(None);
        let a = s.add_task(TaskDraft::new("a", Some("2024-06-01")));
        let b = s.add_task(TaskDraft::new("b", Some("2024-06-01")));
        let c = s.add_task(TaskDraft::new("c", Some("2024-06-01")));

        s.move_task(&c.id, Some("2024-06-01"), Some(0));

        assert!(s.task(&c.id).unwrap().order < 0.0);
        assert_eq!(s.task(&a.id).unwrap().order, 0.0);
        assert_eq!(s.task(&b.id).unwrap().order, 1.0);
        assert_eq!(titles(&s, Some("2024-06-01")), vec!["c", "a", "b"]);

        // Same-day reorder is not logged.
        let kinds: Vec<_> = s.activity().list(10).into_iter().map(|e| e.kind).collect();
        assert!(!kinds.contains(&ActivityKind::Updated));
    }

    #[test]
    fn test_move_between_two_tasks_takes_midpoint() {
        let s = scheduler(None);
        s.add_task(TaskDraft::new("a", Some("2024-06-02")));
        s.add_task(TaskDraft::new("b", Some("2024-06-02")));
        let inbox = s.add_task(TaskDraft::new("x", None));

        s.move_task(&inbox.id, Some("2024-06-02"), Some(1));

        let moved = s.task(&inbox.id).unwrap();
        assert_eq!(moved.order, 0.5);
        assert_eq!(moved.date.as_deref(), Some("2024-06-02"));
        assert_eq!(titles(&s, Some("2024-06-02")), vec!["a", "x", "b"]);

        let entry = &s.activity().list(1)[0];
        assert_eq!(entry.kind, ActivityKind::Updated);
        assert_eq!(entry.data.moved_from.as_ref().unwrap().date, None);
    }

    #[test]
    fn test_moves_follow_requested_positions() {
        let s = scheduler(None);
        let day = Some("2024-06-03");
        let ids: Vec<String> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|t| s.add_task(TaskDraft::new(t, day)).id)
            .collect();

        // Model the list alongside and check after every move.
        let mut expected = vec!["a", "b", "c", "d"];
        let moves = [(3, 1), (0, 3), (2, 0), (1, 2), (3, 2), (0, 1), (2, 1)];
        for (from, to) in moves {
            let title = expected.remove(from);
            expected.insert(to, title);
            let id = &ids[["a", "b", "c", "d"].iter().position(|t| *t == title).unwrap()];
            s.move_task(id, day, Some(to));
            assert_eq!(titles(&s, day), expected);
        }
    }

    #[test]
    fn test_move_unknown_id_is_noop() {
        let s = scheduler(None);
        s.add_task(TaskDraft::new("a", None));
        s.move_task("missing", Some("2024-06-01"), None);
        s.update_task("missing", TaskPatch::default());
        s.delete_task("missing");
        s.toggle_task_complete("missing");
        assert_eq!(s.tasks().len(), 1);
    }

    #[test]
    fn test_overlapping_slot_is_rejected() {
        let s = scheduler(None);
        let first = s.add_task(TaskDraft::new("first", Some("2024-06-01")));
        let second = s.add_task(TaskDraft::new("second", Some("2024-06-01")));
        let slot = |a: &str, b: &str| TaskPatch {
            time_slot: Some(Some(TimeSlot::new(a, b).unwrap())),
            ..Default::default()
        };

        s.update_task_checked(&first.id, slot("09:00", "10:00")).unwrap();
        let err = s.update_task_checked(&second.id, slot("09:30", "10:30")).unwrap_err();

        assert!(matches!(err, DaybookError::Validation(_)));
        assert_eq!(s.task(&first.id).unwrap().time_slot, Some(TimeSlot::new("09:00", "10:00").unwrap()));
        assert_eq!(s.task(&second.id).unwrap().time_slot, None);
        assert_eq!(s.tasks().len(), 2);

        // Back-to-back is fine.
        s.update_task_checked(&second.id, slot("10:00", "10:30")).unwrap();
    }

    #[test]
    fn test_add_checked_rejects_overlap_without_writing() {
        let s = scheduler(None);
        let slotted = |title: &str, a: &str, b: &str| TaskDraft {
            time_slot: Some(TimeSlot::new(a, b).unwrap()),
            ..TaskDraft::new(title, Some("2024-06-01"))
        };

        s.add_task_checked(slotted("standup", "09:00", "09:15")).unwrap();
        assert!(s.add_task_checked(slotted("clash", "09:10", "09:30")).is_err());
        assert_eq!(s.tasks().len(), 1);
        assert_eq!(s.activity().list(10).len(), 1);

        // Other days are unaffected.
        let other = TaskDraft {
            date: Some("2024-06-02".into()),
            ..slotted("tomorrow", "09:00", "09:15")
        };
        s.add_task_checked(other).unwrap();
    }

    #[test]
    fn test_undo_delete_restores_copy_with_new_id() {
        let s = scheduler(None);
        let mut draft = TaskDraft::new("Call mom", Some("2024-06-01"));
        draft.color = Some("#e67c73".into());
        let original = s.add_task(draft);
        s.delete_task(&original.id);
        assert!(s.tasks().is_empty());

        let entry = s.activity().list(1).remove(0);
        assert_eq!(entry.kind, ActivityKind::Deleted);
        assert!(s.undo(&entry.id));

        let restored = s.tasks().remove(0);
        assert_ne!(restored.id, original.id);
        assert_eq!(restored.title, original.title);
        assert_eq!(restored.date, original.date);
        assert_eq!(restored.color, original.color);
        assert_eq!(restored.order, original.order);
        assert!(s.activity().get(&entry.id).is_none());
        assert!(!s.undo(&entry.id));
    }

    #[test]
    fn test_undo_add_complete_and_move() {
        let s = scheduler(None);
        let task = s.add_task(TaskDraft::new("a", None));

        s.move_task(&task.id, Some("2024-06-05"), None);
        let moved = s.activity().list(1).remove(0);
        assert!(s.undo(&moved.id));
        assert_eq!(s.task(&task.id).unwrap().date, None);

        s.toggle_task_complete(&task.id);
        let completed = s.activity().list(1).remove(0);
        assert_eq!(completed.kind, ActivityKind::Completed);
        assert!(s.undo(&completed.id));
        assert!(!s.task(&task.id).unwrap().completed);

        let added = s
            .activity()
            .list(10)
            .into_iter()
            .find(|e| e.kind == ActivityKind::Added)
            .unwrap();
        assert!(s.undo(&added.id));
        assert!(s.tasks().is_empty());
    }

    #[test]
    fn test_undo_move_appends_when_old_key_was_reused() {
        let s = scheduler(None);
        s.add_task(TaskDraft::new("a", Some("2024-06-01")));
        let b = s.add_task(TaskDraft::new("b", Some("2024-06-01")));

        s.move_task(&b.id, Some("2024-06-02"), None);
        let moved = s.activity().list(1).remove(0);
        let c = s.add_task(TaskDraft::new("c", Some("2024-06-01")));
        assert_eq!(s.task(&c.id).unwrap().order, 1.0);

        assert!(s.undo(&moved.id));
        let restored = s.task(&b.id).unwrap();
        assert_eq!(restored.date.as_deref(), Some("2024-06-01"));
        assert_eq!(restored.order, 2.0);
        assert_eq!(titles(&s, Some("2024-06-01")), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_completed_tasks_sink_when_preferred() {
        let s = scheduler(None);
        let a = s.add_task(TaskDraft::new("a", Some("2024-06-01")));
        s.add_task(TaskDraft::new("b", Some("2024-06-01")));
        s.toggle_task_complete(&a.id);
        assert_eq!(titles(&s, Some("2024-06-01")), vec!["a", "b"]);

        let prefs = Preferences {
            move_completed_to_bottom: true,
            ..Default::default()
        };
        s.store().save_preferences(&prefs).unwrap();
        assert_eq!(titles(&s, Some("2024-06-01")), vec!["b", "a"]);
    }

    #[test]
    fn test_cleanup_empty() {
        let s = scheduler(None);
        let blank = s.add_task(TaskDraft::new("  ", None));
        let named = s.add_task(TaskDraft::new("named", None));
        assert!(s.cleanup_empty(&blank.id));
        assert!(!s.cleanup_empty(&named.id));
        assert_eq!(s.tasks().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_trash_deletes_after_delay() {
        let s = scheduler(None);
        enable_auto_trash(&s);
        let task = s.add_task(TaskDraft::new("a", None));

        s.toggle_task_complete(&task.id);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(s.task(&task.id).is_some());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(s.task(&task.id).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_trash_cancelled_by_reopening() {
        let s = scheduler(None);
        enable_auto_trash(&s);
        let task = s.add_task(TaskDraft::new("a", None));

        s.toggle_task_complete(&task.id);
        tokio::time::sleep(Duration::from_secs(1)).await;
        s.toggle_task_complete(&task.id);
        tokio::time::sleep(Duration::from_secs(5)).await;

        let task = s.task(&task.id).unwrap();
        assert!(!task.completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_trash_restarts_on_recomplete() {
        let s = scheduler(None);
        enable_auto_trash(&s);
        let task = s.add_task(TaskDraft::new("a", None));

        s.toggle_task_complete(&task.id);
        tokio::time::sleep(Duration::from_secs(2)).await;
        s.toggle_task_complete(&task.id);
        s.toggle_task_complete(&task.id);

        // The first timer would have fired here.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(s.task(&task.id).is_some());

        s.settle().await;
        assert!(s.task(&task.id).is_none());
    }

    #[tokio::test]
    async fn test_mutations_are_mirrored() {
        let remote = Arc::new(MemoryRemote::default());
        let s = scheduler(Some(remote.clone()));

        let a = s.add_task(TaskDraft::new("a", Some("2024-06-01")));
        let b = s.add_task(TaskDraft::new("b", Some("2024-06-01")));
        s.move_task(&b.id, Some("2024-06-01"), Some(0));
        s.update_task(
            &a.id,
            TaskPatch {
                title: Some("renamed".into()),
                ..Default::default()
            },
        );
        s.flush().await;

        assert_eq!(remote.row(Table::Tasks, &a.id).unwrap()["title"], "renamed");
        assert_eq!(remote.row(Table::Tasks, &b.id).unwrap()["order"], -1.0);

        s.delete_task(&a.id);
        s.flush().await;
        assert!(remote.row(Table::Tasks, &a.id).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_state_survives_remote_outage() {
        let remote = Arc::new(MemoryRemote::default());
        remote.fail_next(100);
        let s = scheduler(Some(remote.clone()));

        let task = s.add_task(TaskDraft::new("offline", None));
        s.flush().await;

        assert_eq!(s.store().tasks()[0].id, task.id);
        assert_eq!(remote.len(Table::Tasks), 0);
    }
}

//! Profiles, their backing projects, and subtasks.

use chrono::Utc;

use super::{Scheduler, State};
use crate::task::{Profile, Project, Subtask, Task, TaskPatch, new_id};

/// Create a project for every profile that lacks one. Returns the new
/// projects.
pub(super) fn repair_profile_projects(state: &mut State) -> Vec<Project> {
    let missing: Vec<Project> = state
        .profiles
        .iter()
        .filter(|p| !state.projects.iter().any(|project| project.id == p.id))
        .map(project_for)
        .collect();
    state.projects.extend(missing.iter().cloned());
    missing
}

fn project_for(profile: &Profile) -> Project {
    Project {
        id: profile.id.clone(),
        name: profile.name.clone(),
        color: profile.color.clone(),
        created_at: Utc::now(),
    }
}

impl Scheduler {
    pub fn profiles(&self) -> Vec<Profile> {
        self.inner.state().profiles.clone()
    }

    pub fn active_profile(&self) -> Option<String> {
        self.inner.state().active_profile.clone()
    }

    /// Create a profile along with its project.
    pub fn add_profile(&self, name: &str, color: &str) -> Profile {
        let profile = Profile {
            id: new_id(),
            name: name.to_string(),
            color: color.to_string(),
        };
        let project = project_for(&profile);

        {
            let mut state = self.inner.state();
            state.profiles.push(profile.clone());
            state.projects.push(project.clone());
            self.save_profiles(&state.profiles);
            self.inner.save_projects(&state.projects);
        }

        tracing::info!(profile_id = %profile.id, name = %profile.name, "profile added");
        self.inner.mirror.insert_project(&project);
        profile
    }

    /// Remove a profile and its project. Its tasks stay, untagged.
    pub fn remove_profile(&self, id: &str) {
        let untagged: Vec<String> = {
            let mut state = self.inner.state();
            let Some(index) = state.profiles.iter().position(|p| p.id == id) else {
                return;
            };
            state.profiles.remove(index);
            state.projects.retain(|p| p.id != id);
            if state.active_profile.as_deref() == Some(id) {
                state.active_profile = None;
                self.save_current_profile(None);
            }
            self.save_profiles(&state.profiles);
            self.inner.save_projects(&state.projects);

            state
                .tasks
                .iter()
                .filter(|t| t.project_id.as_deref() == Some(id))
                .map(|t| t.id.clone())
                .collect()
        };

        for task_id in &untagged {
            self.inner.update_task(
                task_id,
                &TaskPatch {
                    project_id: Some(None),
                    ..Default::default()
                },
            );
        }
        tracing::info!(profile_id = %id, untagged = untagged.len(), "profile removed");
        self.inner.mirror.delete_project(id);
    }

    /// Select the profile views are filtered to, or clear the filter. An
    /// unknown id is ignored.
    pub fn set_active_profile(&self, id: Option<&str>) {
        let mut state = self.inner.state();
        if let Some(id) = id {
            if !state.profiles.iter().any(|p| p.id == id) {
                tracing::debug!(profile_id = %id, "ignoring unknown profile");
                return;
            }
        }
        state.active_profile = id.map(str::to_string);
        self.save_current_profile(id);
    }

    /// Tasks of the active profile, or every task when none is selected.
    pub fn visible_tasks(&self) -> Vec<Task> {
        let state = self.inner.state();
        match state.active_profile.as_deref() {
            Some(profile) => state
                .tasks
                .iter()
                .filter(|t| t.project_id.as_deref() == Some(profile))
                .cloned()
                .collect(),
            None => state.tasks.clone(),
        }
    }

    pub fn add_subtask(&self, task_id: &str, title: &str) -> Option<Subtask> {
        let subtask = Subtask {
            id: new_id(),
            title: title.to_string(),
            completed: false,
        };
        let pushed = subtask.clone();
        self.edit_subtasks(task_id, move |subtasks| subtasks.push(pushed))?;
        Some(subtask)
    }

    pub fn toggle_subtask(&self, task_id: &str, subtask_id: &str) {
        self.edit_subtasks(task_id, |subtasks| {
            if let Some(subtask) = subtasks.iter_mut().find(|s| s.id == subtask_id) {
                subtask.completed = !subtask.completed;
            }
        });
    }

    pub fn remove_subtask(&self, task_id: &str, subtask_id: &str) {
        self.edit_subtasks(task_id, |subtasks| subtasks.retain(|s| s.id != subtask_id));
    }

    fn edit_subtasks(&self, task_id: &str, edit: impl FnOnce(&mut Vec<Subtask>)) -> Option<Task> {
        let mut subtasks = self.task(task_id)?.subtasks;
        edit(&mut subtasks);
        self.inner.update_task(
            task_id,
            &TaskPatch {
                subtasks: Some(subtasks),
                ..Default::default()
            },
        )
    }

    fn save_profiles(&self, profiles: &[Profile]) {
        if let Err(e) = self.inner.store.save_profiles(profiles) {
            tracing::warn!(error = %e, "failed to save profiles locally");
        }
    }

    fn save_current_profile(&self, id: Option<&str>) {
        if let Err(e) = self.inner.store.save_current_profile(id) {
            tracing::warn!(error = %e, "failed to save current profile");
        }
    }
}

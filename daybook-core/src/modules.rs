//! Side-panel modules: named task subsets derived from the full collection.
//!
//! The set of modules is closed, so each one is resolved by an exhaustive
//! `match` to a [`ModuleSpec`] holding its filter and display metadata.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::{parse_date_key, shift};
use crate::task::{Project, Task, bucket_cmp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleKind {
    Overdue,
    Inbox,
    Upcoming,
    RecentActivity,
    HabitStreak,
    Pomodoro,
    Projects,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 7] = [
        ModuleKind::Overdue,
        ModuleKind::Inbox,
        ModuleKind::Upcoming,
        ModuleKind::RecentActivity,
        ModuleKind::HabitStreak,
        ModuleKind::Pomodoro,
        ModuleKind::Projects,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            ModuleKind::Overdue => "overdue",
            ModuleKind::Inbox => "inbox",
            ModuleKind::Upcoming => "upcoming",
            ModuleKind::RecentActivity => "recent-activity",
            ModuleKind::HabitStreak => "habit-streak",
            ModuleKind::Pomodoro => "pomodoro",
            ModuleKind::Projects => "projects",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.id() == id)
    }
}

/// Inputs shared by every module filter besides the collections.
#[derive(Debug, Clone, Copy)]
pub struct ModuleContext<'a> {
    pub today: NaiveDate,
    pub active_profile: Option<&'a str>,
    /// Calendar-origin tasks are events rather than to-dos.
    pub external_as_non_tasks: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleMeta {
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

pub type ModuleFilter = fn(&[Task], &[Project], &ModuleContext<'_>) -> Vec<Task>;

#[derive(Clone, Copy)]
pub struct ModuleSpec {
    pub kind: ModuleKind,
    pub filter: ModuleFilter,
    pub meta: ModuleMeta,
}

pub fn spec(kind: ModuleKind) -> ModuleSpec {
    let (filter, meta): (ModuleFilter, ModuleMeta) = match kind {
        ModuleKind::Overdue => (
            overdue as ModuleFilter,
            ModuleMeta {
                title: "Overdue",
                description: "Open tasks from past days",
                icon: "!",
            },
        ),
        ModuleKind::Inbox => (
            inbox as ModuleFilter,
            ModuleMeta {
                title: "Inbox",
                description: "Tasks without a date",
                icon: "@",
            },
        ),
        ModuleKind::Upcoming => (
            upcoming as ModuleFilter,
            ModuleMeta {
                title: "Upcoming",
                description: "Open tasks for the week after this one",
                icon: ">",
            },
        ),
        ModuleKind::RecentActivity => (
            nothing as ModuleFilter,
            ModuleMeta {
                title: "Recent activity",
                description: "Latest changes, with undo",
                icon: "~",
            },
        ),
        ModuleKind::HabitStreak => (
            nothing as ModuleFilter,
            ModuleMeta {
                title: "Habit streak",
                description: "Consecutive days with a completed habit",
                icon: "*",
            },
        ),
        ModuleKind::Pomodoro => (
            nothing as ModuleFilter,
            ModuleMeta {
                title: "Pomodoro",
                description: "Focus timer",
                icon: "o",
            },
        ),
        ModuleKind::Projects => (
            nothing as ModuleFilter,
            ModuleMeta {
                title: "Projects",
                description: "Profiles and their projects",
                icon: "#",
            },
        ),
    };

    ModuleSpec { kind, filter, meta }
}

/// Run `kind`'s filter.
pub fn derive(kind: ModuleKind, tasks: &[Task], projects: &[Project], ctx: &ModuleContext<'_>) -> Vec<Task> {
    (spec(kind).filter)(tasks, projects, ctx)
}

fn task_date(task: &Task) -> Option<NaiveDate> {
    task.date.as_deref().and_then(|d| parse_date_key(d).ok())
}

fn in_profile(task: &Task, ctx: &ModuleContext<'_>) -> bool {
    match ctx.active_profile {
        Some(profile) => task.project_id.as_deref() == Some(profile),
        None => true,
    }
}

fn sorted_by_day(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| bucket_cmp(a, b)));
    tasks
}

pub fn overdue(tasks: &[Task], _projects: &[Project], ctx: &ModuleContext<'_>) -> Vec<Task> {
    sorted_by_day(
        tasks
            .iter()
            .filter(|t| !t.completed)
            .filter(|t| task_date(t).is_some_and(|d| d < ctx.today))
            .filter(|t| !(ctx.external_as_non_tasks && t.is_external()))
            .filter(|t| in_profile(t, ctx))
            .cloned()
            .collect(),
    )
}

/// The inbox is global: it ignores the active profile.
pub fn inbox(tasks: &[Task], _projects: &[Project], _ctx: &ModuleContext<'_>) -> Vec<Task> {
    let mut result: Vec<Task> = tasks.iter().filter(|t| t.date.is_none()).cloned().collect();
    result.sort_by(bucket_cmp);
    result
}

/// Seven days starting one week from today.
pub fn upcoming(tasks: &[Task], _projects: &[Project], ctx: &ModuleContext<'_>) -> Vec<Task> {
    let from = shift(ctx.today, 7);
    let to = shift(ctx.today, 13);

    sorted_by_day(
        tasks
            .iter()
            .filter(|t| !t.completed)
            .filter(|t| task_date(t).is_some_and(|d| d >= from && d <= to))
            .filter(|t| in_profile(t, ctx))
            .cloned()
            .collect(),
    )
}

fn nothing(_tasks: &[Task], _projects: &[Project], _ctx: &ModuleContext<'_>) -> Vec<Task> {
    Vec::new()
}

/// Which modules are shown, in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleLayout {
    pub modules: Vec<ModuleKind>,
}

impl Default for ModuleLayout {
    fn default() -> Self {
        ModuleLayout {
            modules: vec![ModuleKind::Overdue, ModuleKind::Inbox, ModuleKind::Upcoming],
        }
    }
}

impl ModuleLayout {
    pub fn toggle(&mut self, kind: ModuleKind) {
        if let Some(pos) = self.modules.iter().position(|k| *k == kind) {
            self.modules.remove(pos);
        } else {
            self.modules.push(kind);
        }
    }
}

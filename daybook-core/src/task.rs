//! Task and project types.
//!
//! These are the in-memory shapes owned by the scheduler. The local store
//! persists them as camelCase JSON; the remote store has its own snake_case
//! row types in [`crate::remote::rows`].

use std::cmp::Ordering;

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::parse_clock;
use crate::error::DaybookResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    /// Date bucket key (`YYYY-MM-DD`); `None` is the inbox.
    pub date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub order: f64,
    #[serde(default)]
    pub time_slot: Option<TimeSlot>,
    #[serde(default)]
    pub project_id: Option<String>,
    /// Set when the task is linked to an event on the external calendar.
    #[serde(default)]
    pub external_event_id: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub repeat_pattern: RepeatPattern,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn is_external(&self) -> bool {
        self.external_event_id.is_some()
    }

    pub fn in_bucket(&self, date: Option<&str>) -> bool {
        self.date.as_deref() == date
    }

    /// Apply a partial update. Does not touch `updated_at`.
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(date) = &patch.date {
            self.date = date.clone();
        }
        if let Some(end_date) = &patch.end_date {
            self.end_date = end_date.clone();
        }
        if let Some(order) = patch.order {
            self.order = order;
        }
        if let Some(slot) = &patch.time_slot {
            self.time_slot = slot.clone();
        }
        if let Some(project_id) = &patch.project_id {
            self.project_id = project_id.clone();
        }
        if let Some(event_id) = &patch.external_event_id {
            self.external_event_id = event_id.clone();
        }
        if let Some(subtasks) = &patch.subtasks {
            self.subtasks = subtasks.clone();
        }
        if let Some(repeat) = patch.repeat_pattern {
            self.repeat_pattern = repeat;
        }
        if let Some(notes) = &patch.notes {
            self.notes = notes.clone();
        }
        if let Some(color) = &patch.color {
            self.color = color.clone();
        }
    }

    /// Copy of this task's fields as a creation draft, keeping its order.
    pub fn to_draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            completed: self.completed,
            date: self.date.clone(),
            end_date: self.end_date.clone(),
            order: Some(self.order),
            time_slot: self.time_slot.clone(),
            project_id: self.project_id.clone(),
            external_event_id: self.external_event_id.clone(),
            subtasks: self.subtasks.clone(),
            repeat_pattern: self.repeat_pattern,
            notes: self.notes.clone(),
            color: self.color.clone(),
        }
    }
}

/// Sequence of tasks within one date bucket: `order`, then `created_at`.
pub fn bucket_cmp(a: &Task, b: &Task) -> Ordering {
    a.order
        .partial_cmp(&b.order)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.created_at.cmp(&b.created_at))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: String,
    pub end: String,
}

impl TimeSlot {
    pub fn new(start: &str, end: &str) -> DaybookResult<Self> {
        let slot = TimeSlot {
            start: start.to_string(),
            end: end.to_string(),
        };
        let (s, e) = slot.bounds()?;
        if e <= s {
            return Err(crate::error::DaybookError::Validation(format!(
                "Time slot {}-{} ends before it starts",
                start, end
            )));
        }
        Ok(slot)
    }

    pub fn bounds(&self) -> DaybookResult<(NaiveTime, NaiveTime)> {
        Ok((parse_clock(&self.start)?, parse_clock(&self.end)?))
    }

    /// An end at or before the start is a clock on a later day (the task's
    /// `end_date`).
    pub fn runs_past_midnight(&self) -> bool {
        self.bounds().is_ok_and(|(start, end)| end <= start)
    }

    /// Minutes from midnight covered on the start day. A slot running past
    /// midnight covers the rest of the day.
    fn day_minutes(&self) -> Option<(u32, u32)> {
        let (start, end) = self.bounds().ok()?;
        let start = start.num_seconds_from_midnight() / 60;
        let end = end.num_seconds_from_midnight() / 60;
        Some((start, if end <= start { 24 * 60 } else { end }))
    }

    /// Half-open overlap: back-to-back slots do not collide.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        match (self.day_minutes(), other.day_minutes()) {
            (Some((a_start, a_end)), Some((b_start, b_end))) => a_start < b_end && b_start < a_end,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatPattern {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RepeatPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatPattern::None => "none",
            RepeatPattern::Daily => "daily",
            RepeatPattern::Weekly => "weekly",
            RepeatPattern::Monthly => "monthly",
            RepeatPattern::Yearly => "yearly",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "daily" => RepeatPattern::Daily,
            "weekly" => RepeatPattern::Weekly,
            "monthly" => RepeatPattern::Monthly,
            "yearly" => RepeatPattern::Yearly,
            _ => RepeatPattern::None,
        }
    }
}

/// Input for creating a task: everything except id and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    /// Explicit order key; appended to the tail of the bucket when `None`.
    #[serde(default)]
    pub order: Option<f64>,
    #[serde(default)]
    pub time_slot: Option<TimeSlot>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub external_event_id: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub repeat_pattern: RepeatPattern,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, date: Option<&str>) -> Self {
        TaskDraft {
            title: title.into(),
            date: date.map(str::to_string),
            ..Default::default()
        }
    }
}

/// Partial update. Outer `None` leaves a field alone; for nullable fields
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub date: Option<Option<String>>,
    pub end_date: Option<Option<String>>,
    pub order: Option<f64>,
    pub time_slot: Option<Option<TimeSlot>>,
    pub project_id: Option<Option<String>>,
    pub external_event_id: Option<Option<String>>,
    pub subtasks: Option<Vec<Subtask>>,
    pub repeat_pattern: Option<RepeatPattern>,
    pub notes: Option<Option<String>>,
    pub color: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// User-facing grouping; every profile is backed by a project with the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub color: String,
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

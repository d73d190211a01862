//! Row shapes for the remote store.
//!
//! Rows are a snake_case mirror of the in-memory types. The `order` column
//! is missing in some deployments, so it is optional on the way in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DaybookError;
use crate::task::{Project, RepeatPattern, Subtask, Task, TimeSlot};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
    pub time_slot: Option<TimeSlot>,
    pub project_id: Option<String>,
    pub external_event_id: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    pub repeat_pattern: String,
    pub notes: Option<String>,
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        TaskRow {
            id: task.id.clone(),
            title: task.title.clone(),
            completed: task.completed,
            date: task.date.clone(),
            end_date: task.end_date.clone(),
            order: Some(task.order),
            time_slot: task.time_slot.clone(),
            project_id: task.project_id.clone(),
            external_event_id: task.external_event_id.clone(),
            subtasks: task.subtasks.clone(),
            repeat_pattern: task.repeat_pattern.as_str().to_string(),
            notes: task.notes.clone(),
            color: task.color.clone(),
            user_id: None,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Task {
            id: row.id,
            title: row.title,
            completed: row.completed,
            date: row.date,
            end_date: row.end_date,
            order: row.order.unwrap_or_default(),
            time_slot: row.time_slot,
            project_id: row.project_id,
            external_event_id: row.external_event_id,
            subtasks: row.subtasks,
            repeat_pattern: RepeatPattern::parse(&row.repeat_pattern),
            notes: row.notes,
            color: row.color,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl TaskRow {
    pub fn with_user(mut self, user_id: Option<&str>) -> Self {
        self.user_id = user_id.map(str::to_string);
        self
    }

    pub fn to_json(&self) -> Result<serde_json::Map<String, serde_json::Value>, DaybookError> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(DaybookError::Serialization("task row is not an object".into())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRow {
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Project> for ProjectRow {
    fn from(project: &Project) -> Self {
        ProjectRow {
            id: project.id.clone(),
            name: project.name.clone(),
            color: project.color.clone(),
            user_id: None,
            created_at: project.created_at,
        }
    }
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: row.id,
            name: row.name,
            color: row.color,
            created_at: row.created_at,
        }
    }
}

impl ProjectRow {
    pub fn with_user(mut self, user_id: Option<&str>) -> Self {
        self.user_id = user_id.map(str::to_string);
        self
    }

    pub fn to_json(&self) -> Result<serde_json::Map<String, serde_json::Value>, DaybookError> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(DaybookError::Serialization("project row is not an object".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_without_order_column_loads() {
        let row: TaskRow = serde_json::from_value(json!({
            "id": "t1",
            "title": "Buy milk",
            "completed": false,
            "date": "2024-06-01",
            "end_date": null,
            "time_slot": {"start": "09:00", "end": "09:30"},
            "project_id": null,
            "external_event_id": null,
            "repeat_pattern": "weekly",
            "notes": null,
            "color": null,
            "created_at": "2024-06-01T08:00:00Z",
            "updated_at": "2024-06-01T08:00:00Z"
        }))
        .unwrap();

        let task = Task::from(row);
        assert_eq!(task.order, 0.0);
        assert_eq!(task.repeat_pattern, RepeatPattern::Weekly);
        assert_eq!(task.time_slot.unwrap().start, "09:00");
    }

    #[test]
    fn test_row_json_uses_snake_case() {
        let row: TaskRow = serde_json::from_value(json!({
            "id": "t1", "title": "x", "completed": true, "date": null, "end_date": null,
            "order": 2.5, "time_slot": null, "project_id": "p", "external_event_id": "e",
            "repeat_pattern": "none", "notes": null, "color": null,
            "created_at": "2024-06-01T08:00:00Z", "updated_at": "2024-06-01T08:00:00Z"
        }))
        .unwrap();

        let map = row.with_user(Some("u1")).to_json().unwrap();
        assert_eq!(map["order"], json!(2.5));
        assert_eq!(map["project_id"], json!("p"));
        assert_eq!(map["user_id"], json!("u1"));
    }
}

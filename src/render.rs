//! Terminal rendering for daybook types.
//!
//! Extension traits that add colored output to daybook-core types using
//! owo_colors.

use daybook_core::activity::{ActivityEntry, ActivityKind};
use daybook_core::calendar::ExternalCalendar;
use daybook_core::sync::SyncReport;
use daybook_core::task::{Profile, RepeatPattern, Task};
use owo_colors::OwoColorize;

/// Characters of a task id shown in listings; enough to address it.
pub const SHORT_ID_LEN: usize = 8;

pub trait Render {
    fn render(&self) -> String;
}

pub fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

impl Render for Task {
    fn render(&self) -> String {
        let check = if self.completed { "[x]" } else { "[ ]" };
        let title = if self.title.trim().is_empty() {
            "(untitled)".dimmed().to_string()
        } else if self.completed {
            self.title.strikethrough().dimmed().to_string()
        } else {
            self.title.clone()
        };

        let mut line = format!("{} {}", short_id(&self.id).dimmed(), check);
        if let Some(slot) = &self.time_slot {
            line.push_str(&format!(" {}", format!("{}-{}", slot.start, slot.end).cyan()));
        }
        line.push(' ');
        line.push_str(&title);

        if !self.subtasks.is_empty() {
            let done = self.subtasks.iter().filter(|s| s.completed).count();
            line.push_str(&format!(" {}", format!("({}/{})", done, self.subtasks.len()).dimmed()));
        }
        if self.repeat_pattern != RepeatPattern::None {
            line.push_str(&format!(" {}", self.repeat_pattern.as_str().magenta()));
        }
        if let Some(end) = &self.end_date {
            line.push_str(&format!(" {}", format!("until {}", end).dimmed()));
        }
        if self.is_external() {
            line.push_str(&format!(" {}", "(calendar)".blue()));
        }
        line
    }
}

impl Render for ActivityKind {
    fn render(&self) -> String {
        match self {
            ActivityKind::Added => "added".green().to_string(),
            ActivityKind::Completed => "completed".cyan().to_string(),
            ActivityKind::Deleted => "deleted".red().to_string(),
            ActivityKind::Updated => "moved".yellow().to_string(),
        }
    }
}

impl Render for ActivityEntry {
    fn render(&self) -> String {
        let when = self
            .timestamp
            .with_timezone(&chrono::Local)
            .format("%b %d %H:%M");
        format!(
            "{} {} {} {}",
            short_id(&self.id).dimmed(),
            when.to_string().dimmed(),
            self.kind.render(),
            self.task_title
        )
    }
}

impl Render for Profile {
    fn render(&self) -> String {
        format!("{} {} {}", short_id(&self.id).dimmed(), self.name, self.color.dimmed())
    }
}

impl Render for ExternalCalendar {
    fn render(&self) -> String {
        let mut line = format!("📅 {} {}", self.name, self.id.dimmed());
        if self.primary {
            line.push_str(&format!(" {}", "(primary)".green()));
        }
        line
    }
}

impl Render for SyncReport {
    fn render(&self) -> String {
        let counts = [
            (self.created, "created"),
            (self.updated, "updated"),
            (self.imported, "imported"),
            (self.linked, "linked"),
            (self.backfilled, "profiles backfilled"),
        ];
        let parts: Vec<String> = counts
            .iter()
            .filter(|(n, _)| *n > 0)
            .map(|(n, label)| format!("{} {}", n, label))
            .collect();

        let mut lines = Vec::new();
        if parts.is_empty() {
            lines.push("   No changes".dimmed().to_string());
        } else {
            lines.push(format!("   {}", parts.join(", ")));
        }
        for error in &self.errors {
            lines.push(format!("   {}", error.red()));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_sync_report_lists_only_nonzero_counts() {
        let report = SyncReport {
            created: 2,
            imported: 1,
            ..Default::default()
        };
        let text = report.render();
        assert!(text.contains("2 created"));
        assert!(text.contains("1 imported"));
        assert!(!text.contains("updated"));
    }
}

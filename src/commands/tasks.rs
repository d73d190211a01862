use anyhow::Result;
use clap::Subcommand;
use daybook_core::ordering::sorted_bucket;
use daybook_core::task::{Subtask, Task, TaskPatch};
use owo_colors::OwoColorize;

use super::show::visible_bucket;
use super::{is_clear, parse_time_slot};
use crate::app::App;
use crate::render::Render;

pub fn move_task(app: &App, reference: &str, to: &str, position: Option<usize>) -> Result<()> {
    let task = app.find_task(reference)?;
    let date = if to.eq_ignore_ascii_case("inbox") {
        None
    } else {
        Some(app.parse_day_key(to)?)
    };
    let index = match position {
        Some(0) => anyhow::bail!("Positions start at 1"),
        Some(p) => {
            let shown: Vec<String> = visible_bucket(app, date.as_deref())
                .into_iter()
                .filter(|t| t.id != task.id)
                .map(|t| t.id)
                .collect();
            let tasks = app.scheduler.tasks();
            let bucket: Vec<&str> = sorted_bucket(&tasks, date.as_deref(), Some(task.id.as_str()))
                .into_iter()
                .map(|t| t.id.as_str())
                .collect();
            bucket_index(&shown, &bucket, p)
        }
        None => None,
    };

    app.scheduler.move_task(&task.id, date.as_deref(), index);

    let bucket = date.unwrap_or_else(|| "inbox".to_string());
    println!("{} {} {}", "Moved".yellow(), task.title, format!("to {}", bucket).dimmed());
    Ok(())
}

/// Translate a 1-based position in the list `show` prints (`shown`) into an
/// insertion index in the full bucket (`bucket`, every profile, order keys
/// only). The task lands just after the row above that position, or before
/// the first row for position 1. `None` appends.
fn bucket_index(shown: &[String], bucket: &[&str], position: usize) -> Option<usize> {
    let index_of = |id: &str| bucket.iter().position(|b| *b == id);
    if position <= 1 {
        return shown.first().and_then(|first| index_of(first.as_str()));
    }
    let above = shown.get(position - 2).or(shown.last())?;
    index_of(above.as_str()).map(|i| i + 1)
}

pub fn done(app: &App, reference: &str) -> Result<()> {
    let task = app.find_task(reference)?;
    app.scheduler.toggle_task_complete(&task.id);

    let Some(task) = app.scheduler.task(&task.id) else {
        return Ok(());
    };
    if task.completed {
        println!("{} {}", "Completed".green(), task.title);
        if app.scheduler.preferences().auto_trash {
            println!("   {}", "Auto-trash is on; it will be deleted shortly".dimmed());
        }
    } else {
        println!("{} {}", "Reopened".yellow(), task.title);
    }
    Ok(())
}

pub struct EditArgs {
    pub title: Option<String>,
    pub time: Option<String>,
    pub notes: Option<String>,
    pub profile: Option<String>,
    pub color: Option<String>,
}

fn parse_color(value: &str) -> Result<String> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        anyhow::bail!("Invalid color '{}'. Expected #rrggbb", value);
    }
    Ok(format!("#{}", hex.to_ascii_lowercase()))
}

pub fn edit(app: &App, reference: &str, args: EditArgs) -> Result<()> {
    let task = app.find_task(reference)?;

    let time_slot = match args.time.as_deref() {
        None => None,
        Some(v) if is_clear(v) => Some(None),
        Some(v) => {
            if task.date.is_none() {
                anyhow::bail!("Schedule the task on a day before giving it a time slot");
            }
            Some(Some(parse_time_slot(v)?))
        }
    };
    let project_id = match args.profile.as_deref() {
        None => None,
        Some(v) if is_clear(v) => Some(None),
        Some(v) => Some(Some(app.find_profile(v)?.id)),
    };
    let color = match args.color.as_deref() {
        None => None,
        Some(v) if is_clear(v) => Some(None),
        Some(v) => Some(Some(parse_color(v)?)),
    };
    let notes = args.notes.map(|n| if n.trim().is_empty() { None } else { Some(n) });

    let patch = TaskPatch {
        title: args.title,
        time_slot,
        project_id,
        color,
        notes,
        ..Default::default()
    };
    if patch == TaskPatch::default() {
        anyhow::bail!("Nothing to change");
    }

    app.scheduler.update_task_checked(&task.id, patch)?;
    if let Some(task) = app.scheduler.task(&task.id) {
        println!("{}", "Updated".green());
        println!("   {}", task.render());
    }
    Ok(())
}

pub fn remove(app: &App, reference: &str) -> Result<()> {
    let task = app.find_task(reference)?;
    app.scheduler.delete_task(&task.id);
    println!("{} {}", "Deleted".red(), task.title);
    println!("   {}", "Run `daybook undo` to bring it back".dimmed());
    Ok(())
}

#[derive(Subcommand)]
pub enum SubtaskAction {
    /// Add a checklist item
    Add { task: String, title: String },
    /// Check or uncheck an item (by position, starting at 1, or id prefix)
    Toggle { task: String, subtask: String },
    /// Remove an item
    Rm { task: String, subtask: String },
    /// List a task's checklist
    List { task: String },
}

fn find_subtask<'a>(task: &'a Task, reference: &str) -> Result<&'a Subtask> {
    let by_position = reference
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| task.subtasks.get(i));
    by_position
        .or_else(|| task.subtasks.iter().find(|s| s.id.starts_with(reference)))
        .ok_or_else(|| anyhow::anyhow!("No checklist item '{}' on \"{}\"", reference, task.title))
}

fn print_subtasks(task: &Task) {
    println!("{}", task.render());
    if task.subtasks.is_empty() {
        println!("   {}", "No checklist items".dimmed());
    }
    for (i, subtask) in task.subtasks.iter().enumerate() {
        let check = if subtask.completed { "[x]" } else { "[ ]" };
        println!("   {} {} {}", format!("{}.", i + 1).dimmed(), check, subtask.title);
    }
}

pub fn subtask(app: &App, action: SubtaskAction) -> Result<()> {
    let task_ref = match &action {
        SubtaskAction::Add { task, .. }
        | SubtaskAction::Toggle { task, .. }
        | SubtaskAction::Rm { task, .. }
        | SubtaskAction::List { task } => task.clone(),
    };
    let task = app.find_task(&task_ref)?;

    match action {
        SubtaskAction::Add { title, .. } => {
            app.scheduler.add_subtask(&task.id, &title);
        }
        SubtaskAction::Toggle { subtask, .. } => {
            let id = find_subtask(&task, &subtask)?.id.clone();
            app.scheduler.toggle_subtask(&task.id, &id);
        }
        SubtaskAction::Rm { subtask, .. } => {
            let id = find_subtask(&task, &subtask)?.id.clone();
            app.scheduler.remove_subtask(&task.id, &id);
        }
        SubtaskAction::List { .. } => {}
    }

    if let Some(task) = app.scheduler.task(&task.id) {
        print_subtasks(&task);
    }
    Ok(())
}

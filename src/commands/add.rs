use anyhow::Result;
use daybook_core::task::{RepeatPattern, TaskDraft};
use owo_colors::OwoColorize;

use super::parse_time_slot;
use crate::app::App;
use crate::render::Render;

pub struct AddArgs {
    pub title: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub until: Option<String>,
    pub repeat: Option<String>,
    pub notes: Option<String>,
    pub profile: Option<String>,
}

pub fn run(app: &App, args: AddArgs) -> Result<()> {
    let date = args.date.as_deref().map(|d| app.parse_day_key(d)).transpose()?;
    let end_date = args.until.as_deref().map(|d| app.parse_day_key(d)).transpose()?;
    if end_date.is_some() && date.is_none() {
        anyhow::bail!("--until needs a start day (--date)");
    }

    let time_slot = args.time.as_deref().map(parse_time_slot).transpose()?;
    if time_slot.is_some() && date.is_none() {
        anyhow::bail!("A time slot needs a day (--date)");
    }

    let repeat_pattern = match args.repeat.as_deref() {
        None => RepeatPattern::None,
        Some(value) => match RepeatPattern::parse(value) {
            RepeatPattern::None if !super::is_clear(value) => {
                anyhow::bail!("Unknown repeat '{}'. Use daily, weekly, monthly or yearly", value)
            }
            pattern => pattern,
        },
    };

    let project_id = match args.profile.as_deref() {
        Some(reference) => Some(app.find_profile(reference)?.id),
        None => app.scheduler.active_profile(),
    };

    let draft = TaskDraft {
        end_date,
        time_slot,
        project_id,
        repeat_pattern,
        notes: args.notes,
        ..TaskDraft::new(args.title, date.as_deref())
    };

    let task = app.scheduler.add_task_checked(draft)?;
    let bucket = task.date.clone().unwrap_or_else(|| "inbox".to_string());
    println!("{} {}", "Added".green(), bucket.dimmed());
    println!("   {}", task.render());
    Ok(())
}

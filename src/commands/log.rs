use anyhow::Result;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::Render;

pub fn run(app: &App, limit: usize) -> Result<()> {
    let entries = app.scheduler.activity().list(limit);
    if entries.is_empty() {
        println!("{}", "No recent activity".dimmed());
    }
    for entry in &entries {
        println!("{}", entry.render());
    }
    Ok(())
}

/// Undo `reference` (an entry id or prefix), or the newest entry.
pub fn undo(app: &App, reference: Option<&str>) -> Result<()> {
    let entries = app.scheduler.activity().list(usize::MAX);
    let entry = match reference {
        Some(reference) => entries.into_iter().find(|e| e.id.starts_with(reference)),
        None => entries.into_iter().next(),
    };
    let Some(entry) = entry else {
        anyhow::bail!("Nothing to undo");
    };

    if !app.scheduler.undo(&entry.id) {
        anyhow::bail!("Activity entry {} is gone", entry.id);
    }
    println!("{} {}", "Undid".yellow(), entry.render());
    Ok(())
}

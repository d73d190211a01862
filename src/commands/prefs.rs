use anyhow::{Context, Result};
use daybook_core::dates::WeekStart;
use daybook_core::settings::Preferences;
use owo_colors::OwoColorize;

use super::is_clear;
use crate::app::App;

const KEYS: &[&str] = &[
    "auto-trash",
    "move-completed-to-bottom",
    "external-as-non-tasks",
    "week-start",
    "two-way-sync",
    "sync-all-tasks",
    "sync-time-blocked-only",
    "import-profile",
    "calendar",
];

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => anyhow::bail!("{} expects on or off, got '{}'", key, value),
    }
}

fn apply(app: &App, prefs: &mut Preferences, key: &str, value: &str) -> Result<()> {
    match key {
        "auto-trash" => prefs.auto_trash = parse_bool(key, value)?,
        "move-completed-to-bottom" => prefs.move_completed_to_bottom = parse_bool(key, value)?,
        "external-as-non-tasks" => prefs.external_as_non_tasks = parse_bool(key, value)?,
        "week-start" => {
            prefs.week_start = match value.trim().to_ascii_lowercase().as_str() {
                "monday" | "mon" => WeekStart::Monday,
                "sunday" | "sun" => WeekStart::Sunday,
                _ => anyhow::bail!("week-start expects monday or sunday"),
            }
        }
        "two-way-sync" => prefs.sync.two_way_sync = parse_bool(key, value)?,
        "sync-all-tasks" => prefs.sync.sync_all_tasks = parse_bool(key, value)?,
        "sync-time-blocked-only" => prefs.sync.sync_time_blocked_only = parse_bool(key, value)?,
        "import-profile" => {
            prefs.sync.import_profile_id = if is_clear(value) {
                None
            } else {
                Some(app.find_profile(value)?.id)
            }
        }
        "calendar" => {
            prefs.sync.calendar_id = if is_clear(value) {
                None
            } else {
                Some(value.trim().to_string())
            }
        }
        _ => anyhow::bail!("Unknown preference '{}'. Known: {}", key, KEYS.join(", ")),
    }
    Ok(())
}

pub fn run(app: &App, key: Option<&str>, value: Option<&str>) -> Result<()> {
    let mut prefs = app.store.preferences();

    match (key, value) {
        (None, _) => {
            let text = toml::to_string_pretty(&prefs).context("Failed to render preferences")?;
            print!("{}", text);
        }
        (Some(key), None) => {
            anyhow::bail!("Missing value for {}", key);
        }
        (Some(key), Some(value)) => {
            apply(app, &mut prefs, key, value)?;
            app.store.save_preferences(&prefs)?;
            println!("{} {} = {}", "Set".green(), key, value.bold());
        }
    }
    Ok(())
}

pub mod add;
pub mod auth;
pub mod calendars;
pub mod log;
pub mod module;
pub mod prefs;
pub mod profile;
pub mod restore;
pub mod show;
pub mod sync;
pub mod tasks;

use anyhow::{Context, Result};
use daybook_core::task::TimeSlot;

/// Parse a `HH:MM-HH:MM` time slot.
pub fn parse_time_slot(input: &str) -> Result<TimeSlot> {
    let (start, end) = input
        .split_once('-')
        .with_context(|| format!("Invalid time slot '{}'. Expected HH:MM-HH:MM", input))?;
    Ok(TimeSlot::new(start.trim(), end.trim())?)
}

/// Values that clear an optional field.
pub fn is_clear(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "" | "none")
}

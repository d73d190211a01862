use anyhow::Result;
use daybook_core::calendar::CalendarApi;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::Render;
use crate::utils::tui;

pub async fn run(app: &App) -> Result<()> {
    let calendar = app.google_calendar().await?;

    let spinner = tui::create_spinner("Fetching calendars".to_string());
    let result = calendar.list_calendars().await;
    spinner.finish_and_clear();

    let selected = app.calendar_id();
    for cal in result? {
        let marker = if cal.id == selected || (cal.primary && selected == daybook_provider_google::DEFAULT_CALENDAR_ID) {
            "*".green().to_string()
        } else {
            " ".to_string()
        };
        println!("{} {}", marker, cal.render());
    }
    Ok(())
}

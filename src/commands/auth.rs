use anyhow::Result;
use daybook_core::calendar::CalendarApi;
use daybook_provider_google::GoogleCalendar;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::Render;

pub async fn run(app: &App, provider_name: &str) -> Result<()> {
    if !provider_name.eq_ignore_ascii_case("google") {
        anyhow::bail!("Unknown provider '{}'. Only \"google\" is supported", provider_name);
    }

    let session = app.google_session()?;
    println!("Authenticating with Google...");

    // Opens the browser and stores the tokens in the local store
    daybook_provider_google::authenticate(&session).await?;

    println!("Fetching calendars...");
    let calendar = GoogleCalendar::new(session);
    let calendars = calendar.list_calendars().await?;

    if calendars.is_empty() {
        println!("No writable calendars found.");
        return Ok(());
    }

    println!("Found {} calendar(s):\n", calendars.len());
    for cal in &calendars {
        println!("  {}", cal.render());
    }

    println!(
        "\nSyncing with {}. Pick another with `daybook prefs calendar <id>`, then run `daybook sync`.",
        app.calendar_id().bold()
    );
    Ok(())
}
